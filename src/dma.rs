use crate::bus::Device;

pub const OAM_DMA_REGISTER: u16 = 0x4014;
pub const OAM_DATA_REGISTER: u16 = 0x2004;
pub const TRANSFER_BYTES: u16 = 256;

/// CPU cycles the DMA steals, not counting the odd-cycle alignment.
pub const TRANSFER_CYCLES: u64 = 513;

/// OAMDMA ($4014). A write latches the source page; the CPU side performs
/// the copy once the current instruction has finished.
#[derive(Debug, Clone, Default)]
pub struct OamDma {
    pending: Option<u8>,
    transfers: u64,
}

impl OamDma {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_page(&mut self) -> Option<u8> {
        let page = self.pending.take();
        if page.is_some() {
            self.transfers += 1;
        }
        page
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of transfers started so far.
    pub fn transfers(&self) -> u64 {
        self.transfers
    }
}

impl Device for OamDma {
    fn claims(&self, addr: u16) -> bool {
        addr == OAM_DMA_REGISTER
    }

    // write-only
    fn read(&mut self, _addr: u16) -> u8 {
        0
    }

    fn write(&mut self, _addr: u16, data: u8) {
        log::trace!("OAM DMA from page ${:02X}", data);
        self.pending = Some(data);
    }
}

/// Cycles the CPU is held for a transfer started at `cycle`.
pub fn stall_cycles(cycle: u64) -> u64 {
    TRANSFER_CYCLES + (cycle % 2)
}
