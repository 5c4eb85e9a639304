use super::registers::VramAddress;
use crate::bus::AddressBus;

/// Background fetch latches and the 16-bit shifters they feed.
#[derive(Debug, Clone, Default)]
pub struct Background {
    address: u16,

    // Next tile data waiting to be loaded
    next_tile_id: u8,
    next_attribute: u8,
    next_pattern_low: u8,
    next_pattern_high: u8,

    // Shift registers for the tile being drawn
    pattern_low: u16,
    pattern_high: u16,
    attribute_low: u16,
    attribute_high: u16,
}

impl Background {
    pub fn new() -> Self {
        Self::default()
    }

    /// One step of the 8-dot fetch cycle. Even steps latch an address,
    /// odd steps read it.
    pub fn fetch(&mut self, step: u16, v: VramAddress, pattern_base: u16, bus: &mut AddressBus) {
        match step {
            0 => {
                self.reload();
                self.address = v.tile_address();
            }
            1 => self.next_tile_id = bus.read(self.address),
            2 => self.address = v.attribute_address(),
            3 => {
                let attribute = bus.read(self.address);
                self.next_attribute = (attribute >> v.attribute_shift()) & 0x03;
            }
            4 => self.address = pattern_base + self.next_tile_id as u16 * 16 + v.fine_y(),
            5 => self.next_pattern_low = bus.read(self.address),
            6 => self.address += 8,
            _ => self.next_pattern_high = bus.read(self.address),
        }
    }

    pub fn shift(&mut self) {
        self.pattern_low <<= 1;
        self.pattern_high <<= 1;
        self.attribute_low <<= 1;
        self.attribute_high <<= 1;
    }

    pub fn reload(&mut self) {
        self.pattern_low = (self.pattern_low & 0xFF00) | self.next_pattern_low as u16;
        self.pattern_high = (self.pattern_high & 0xFF00) | self.next_pattern_high as u16;

        self.attribute_low = (self.attribute_low & 0xFF00) | fill(self.next_attribute & 0x01);
        self.attribute_high = (self.attribute_high & 0xFF00) | fill(self.next_attribute & 0x02);
    }

    /// (pixel value, palette select) under fine X.
    pub fn pixel(&self, fine_x: u8) -> (u8, u8) {
        let bit = 15 - (fine_x & 0x07) as u16;
        let pixel = (((self.pattern_high >> bit) & 1) << 1) | ((self.pattern_low >> bit) & 1);
        let palette = (((self.attribute_high >> bit) & 1) << 1) | ((self.attribute_low >> bit) & 1);
        (pixel as u8, palette as u8)
    }
}

fn fill(bit: u8) -> u16 {
    if bit != 0 {
        0x00FF
    } else {
        0x0000
    }
}
