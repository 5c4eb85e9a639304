use crate::bus::Device;

pub const RAM_SIZE: usize = 0x800;
pub const SAVE_RAM_SIZE: usize = 0x2000;
pub const PRG_BANK_SIZE: usize = 0x4000;
pub const CHR_BANK_SIZE: usize = 0x2000;

/// Plain byte storage answering `base..base + len`.
#[derive(Debug, Clone)]
pub struct Memory {
    base: u16,
    data: Vec<u8>,
}

impl Memory {
    pub fn new(base: u16, size: usize) -> Self {
        Self::from_vec(base, vec![0; size])
    }

    pub fn from_vec(base: u16, data: Vec<u8>) -> Self {
        Memory { base, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn offset(&self, addr: u16) -> Option<usize> {
        let offset = addr.checked_sub(self.base)? as usize;
        (offset < self.data.len()).then_some(offset)
    }
}

impl Device for Memory {
    fn claims(&self, addr: u16) -> bool {
        self.offset(addr).is_some()
    }

    fn read(&mut self, addr: u16) -> u8 {
        self.offset(addr).map(|i| self.data[i]).unwrap_or(0)
    }

    fn write(&mut self, addr: u16, data: u8) {
        if let Some(i) = self.offset(addr) {
            self.data[i] = data;
        }
    }
}

/// Folds `start..=end` onto the first `period` bytes of the window before
/// handing the access to the wrapped device.
#[derive(Debug, Clone)]
pub struct Mirrored<D> {
    inner: D,
    start: u16,
    end: u16,
    period: u16,
}

impl<D: Device> Mirrored<D> {
    pub fn new(inner: D, start: u16, end: u16, period: u16) -> Self {
        Mirrored {
            inner,
            start,
            end,
            period: period.max(1),
        }
    }

    fn fold(&self, addr: u16) -> u16 {
        self.start + (addr - self.start) % self.period
    }
}

impl<D: Device> Device for Mirrored<D> {
    fn claims(&self, addr: u16) -> bool {
        (self.start..=self.end).contains(&addr)
    }

    fn read(&mut self, addr: u16) -> u8 {
        let addr = self.fold(addr);
        self.inner.read(addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        let addr = self.fold(addr);
        self.inner.write(addr, data);
    }
}

/// Drops writes to the wrapped device.
#[derive(Debug, Clone)]
pub struct ReadOnly<D>(pub D);

impl<D: Device> Device for ReadOnly<D> {
    fn claims(&self, addr: u16) -> bool {
        self.0.claims(addr)
    }

    fn read(&mut self, addr: u16) -> u8 {
        self.0.read(addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        log::trace!("write of {:02X} to read-only ${:04X} ignored", data, addr);
    }
}

/// 2 KiB work RAM mirrored four times across $0000-$1FFF.
pub fn work_ram() -> Mirrored<Memory> {
    Mirrored::new(Memory::new(0x0000, RAM_SIZE), 0x0000, 0x1FFF, RAM_SIZE as u16)
}

/// 8 KiB battery/work RAM at $6000-$7FFF.
pub fn save_ram() -> Memory {
    Memory::new(0x6000, SAVE_RAM_SIZE)
}

/// PRG-ROM at $8000-$FFFF. A single 16 KiB bank appears twice.
pub fn prg_rom(prg: Vec<u8>) -> ReadOnly<Mirrored<Memory>> {
    let period = prg.len().clamp(1, 0x8000) as u16;
    ReadOnly(Mirrored::new(Memory::from_vec(0x8000, prg), 0x8000, 0xFFFF, period))
}

/// Pattern tables at $0000-$1FFF on the video bus.
pub fn pattern_tables(chr: Vec<u8>, writable: bool) -> Box<dyn Device> {
    let period = chr.len().clamp(1, CHR_BANK_SIZE) as u16;
    let window = Mirrored::new(Memory::from_vec(0x0000, chr), 0x0000, 0x1FFF, period);
    if writable {
        Box::new(window)
    } else {
        Box::new(ReadOnly(window))
    }
}
