use crate::bus::{AddressBus, Device};
use crate::cartridge::Mirroring;
use crate::memory::pattern_tables;

const NAMETABLE_SIZE: usize = 0x400;

/// Nametable RAM at $2000-$3EFF. The four logical tables fold onto
/// physical 1 KiB pages according to the cartridge's mirroring.
#[derive(Debug, Clone)]
pub struct NameTables {
    mirroring: Mirroring,
    ram: Vec<u8>,
}

impl NameTables {
    pub fn new(mirroring: Mirroring) -> Self {
        let pages = if mirroring == Mirroring::FourScreen { 4 } else { 2 };
        NameTables {
            mirroring,
            ram: vec![0; pages * NAMETABLE_SIZE],
        }
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    fn index(&self, addr: u16) -> usize {
        let addr = (addr as usize - 0x2000) % 0x1000;
        let table = addr / NAMETABLE_SIZE;
        let page = match self.mirroring {
            // $2000=$2400, $2800=$2C00
            Mirroring::Horizontal => table / 2,
            // $2000=$2800, $2400=$2C00
            Mirroring::Vertical => table % 2,
            Mirroring::FourScreen => table,
            Mirroring::SingleScreenLower => 0,
            Mirroring::SingleScreenUpper => 1,
        };
        page * NAMETABLE_SIZE + addr % NAMETABLE_SIZE
    }
}

impl Device for NameTables {
    fn claims(&self, addr: u16) -> bool {
        (0x2000..=0x3EFF).contains(&addr)
    }

    fn read(&mut self, addr: u16) -> u8 {
        self.ram[self.index(addr)]
    }

    fn write(&mut self, addr: u16, data: u8) {
        let index = self.index(addr);
        self.ram[index] = data;
    }
}

/// 32 palette entries at $3F00-$3FFF.
#[derive(Debug, Clone)]
pub struct PaletteMemory {
    entries: [u8; 32],
}

impl Default for PaletteMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl PaletteMemory {
    pub fn new() -> Self {
        PaletteMemory {
            entries: [0x0F; 32],
        }
    }

    fn index(addr: u16) -> usize {
        let addr = (addr & 0x1F) as usize;
        // $3F10/$3F14/$3F18/$3F1C mirror $3F00/$3F04/$3F08/$3F0C
        if addr >= 16 && addr % 4 == 0 {
            addr - 16
        } else {
            addr
        }
    }
}

impl Device for PaletteMemory {
    fn claims(&self, addr: u16) -> bool {
        (0x3F00..=0x3FFF).contains(&addr)
    }

    fn read(&mut self, addr: u16) -> u8 {
        self.entries[Self::index(addr)]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.entries[Self::index(addr)] = data;
    }
}

/// Assembles the PPU's private bus: pattern tables, nametables, palette.
pub fn video_bus(chr: Vec<u8>, chr_writable: bool, mirroring: Mirroring) -> AddressBus {
    let mut bus = AddressBus::new("video");
    bus.attach(pattern_tables(chr, chr_writable));
    bus.attach(Box::new(NameTables::new(mirroring)));
    bus.attach(Box::new(PaletteMemory::new()));
    bus
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_horizontal_mirroring() {
        let mut nt = NameTables::new(Mirroring::Horizontal);
        nt.write(0x2005, 0x11);
        nt.write(0x2805, 0x22);
        assert_eq!(nt.read(0x2405), 0x11);
        assert_eq!(nt.read(0x2C05), 0x22);
    }

    #[test]
    fn test_vertical_mirroring() {
        let mut nt = NameTables::new(Mirroring::Vertical);
        nt.write(0x2005, 0x11);
        nt.write(0x2405, 0x22);
        assert_eq!(nt.read(0x2805), 0x11);
        assert_eq!(nt.read(0x2C05), 0x22);
    }

    #[test]
    fn test_single_screen_and_four_screen() {
        let mut lower = NameTables::new(Mirroring::SingleScreenLower);
        lower.write(0x2C00, 0x33);
        assert_eq!(lower.read(0x2000), 0x33);

        let mut four = NameTables::new(Mirroring::FourScreen);
        for (i, base) in [0x2000u16, 0x2400, 0x2800, 0x2C00].into_iter().enumerate() {
            four.write(base, i as u8);
        }
        for (i, base) in [0x2000u16, 0x2400, 0x2800, 0x2C00].into_iter().enumerate() {
            assert_eq!(four.read(base), i as u8);
        }
    }

    #[test]
    fn test_nametables_repeat_below_palette() {
        let mut nt = NameTables::new(Mirroring::Vertical);
        nt.write(0x2123, 0x44);
        assert_eq!(nt.read(0x3123), 0x44);
        assert!(nt.claims(0x3EFF));
        assert!(!nt.claims(0x3F00));
    }

    #[test]
    fn test_palette_backdrop_mirrors() {
        let mut palette = PaletteMemory::new();
        palette.write(0x3F10, 0x2A);
        assert_eq!(palette.read(0x3F00), 0x2A);
        palette.write(0x3F04, 0x15);
        assert_eq!(palette.read(0x3F14), 0x15);
        // not mirrored
        palette.write(0x3F11, 0x01);
        assert_ne!(palette.read(0x3F01), 0x01);
        // repeats every 32 bytes
        assert_eq!(palette.read(0x3FE0), 0x2A);
    }

    #[test]
    fn test_video_bus_layout() {
        let mut bus = video_bus(vec![0; 0x2000], true, Mirroring::Vertical);
        bus.write(0x0010, 0x01);
        bus.write(0x2000, 0x02);
        bus.write(0x3F01, 0x03);
        assert_eq!(bus.read(0x0010), 0x01);
        assert_eq!(bus.read(0x2800), 0x02);
        assert_eq!(bus.read(0x3F21), 0x03);
    }

    #[test]
    fn test_palette_keeps_the_full_byte() {
        let mut palette = PaletteMemory::new();
        palette.write(0x3F05, 0xC5);
        assert_eq!(palette.read(0x3F05), 0xC5);
    }
}
