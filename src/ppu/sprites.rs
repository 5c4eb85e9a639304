use super::registers::PpuControl;
use crate::bus::AddressBus;

pub const OAM_SIZE: usize = 256;
pub const SPRITES_PER_LINE: usize = 8;

const ATTR_PALETTE: u8 = 0x03;
const ATTR_BEHIND_BACKGROUND: u8 = 0x20;
const ATTR_FLIP_HORIZONTAL: u8 = 0x40;
const ATTR_FLIP_VERTICAL: u8 = 0x80;

/// Opaque sprite pixel picked for the current dot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpritePixel {
    pub pixel: u8,
    pub palette: u8,
    pub behind_background: bool,
    pub sprite_zero: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    tile: u8,
    attributes: u8,
    x: u8,
    row: u8,
    pattern_low: u8,
    pattern_high: u8,
}

/// Secondary OAM for the next scanline plus the pattern bytes fetched for it.
#[derive(Debug, Clone, Default)]
pub struct Sprites {
    slots: [Slot; SPRITES_PER_LINE],
    count: usize,
    sprite_zero: bool,
    address: u16,
}

impl Sprites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.count = 0;
        self.sprite_zero = false;
    }

    /// Picks the first eight sprites covering `line` for drawing on the line
    /// after it. Returns true when more than eight were in range.
    pub fn evaluate(&mut self, oam: &[u8; OAM_SIZE], line: u16, height: u8) -> bool {
        self.clear();
        let mut overflow = false;

        for (index, entry) in oam.chunks_exact(4).enumerate() {
            let row = line.wrapping_sub(entry[0] as u16);
            if row >= height as u16 {
                continue;
            }
            if self.count == SPRITES_PER_LINE {
                overflow = true;
                break;
            }
            self.slots[self.count] = Slot {
                tile: entry[1],
                attributes: entry[2],
                x: entry[3],
                row: row as u8,
                pattern_low: 0,
                pattern_high: 0,
            };
            if index == 0 {
                self.sprite_zero = true;
            }
            self.count += 1;
        }
        overflow
    }

    /// One dot of the sprite fetch window (dots 257-320). Each slot takes
    /// eight dots; the pattern bytes come in on the last four.
    pub fn fetch(&mut self, step: u16, control: PpuControl, bus: &mut AddressBus) {
        let index = (step / 8) as usize;
        if index >= SPRITES_PER_LINE {
            return;
        }
        let active = index < self.count;
        match step % 8 {
            4 => {
                self.address = if active {
                    pattern_address(&self.slots[index], control)
                } else {
                    // empty slots fetch tile $FF
                    pattern_address(&Slot { tile: 0xFF, ..Slot::default() }, control)
                };
            }
            5 => {
                let data = bus.read(self.address);
                if active {
                    self.slots[index].pattern_low = oriented(&self.slots[index], data);
                }
            }
            6 => self.address += 8,
            7 => {
                let data = bus.read(self.address);
                if active {
                    self.slots[index].pattern_high = oriented(&self.slots[index], data);
                }
            }
            _ => {}
        }
    }

    /// First opaque sprite pixel at screen column `x`, in OAM order.
    pub fn pixel(&self, x: u8) -> Option<SpritePixel> {
        for (index, slot) in self.slots[..self.count].iter().enumerate() {
            let offset = x.wrapping_sub(slot.x);
            if x < slot.x || offset >= 8 {
                continue;
            }
            let bit = 7 - offset;
            let pixel = (((slot.pattern_high >> bit) & 1) << 1) | ((slot.pattern_low >> bit) & 1);
            if pixel == 0 {
                continue;
            }
            return Some(SpritePixel {
                pixel,
                palette: slot.attributes & ATTR_PALETTE,
                behind_background: slot.attributes & ATTR_BEHIND_BACKGROUND != 0,
                sprite_zero: index == 0 && self.sprite_zero,
            });
        }
        None
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

fn pattern_address(slot: &Slot, control: PpuControl) -> u16 {
    let height = control.sprite_height();
    let row = slot.row & (height - 1);
    let row = if slot.attributes & ATTR_FLIP_VERTICAL != 0 {
        height - 1 - row
    } else {
        row
    };
    let row = row as u16;

    if height == 16 {
        // 8x16 sprites: bit 0 selects the table, the bottom half is the next tile
        let table = (slot.tile & 0x01) as u16 * 0x1000;
        let tile = (slot.tile & 0xFE) as u16 + (row >= 8) as u16;
        table + tile * 16 + (row & 0x07)
    } else {
        control.sprite_pattern_base() + slot.tile as u16 * 16 + row
    }
}

fn oriented(slot: &Slot, data: u8) -> u8 {
    if slot.attributes & ATTR_FLIP_HORIZONTAL != 0 {
        data.reverse_bits()
    } else {
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::Mirroring;
    use crate::ppu::memory::video_bus;

    fn oam_with(sprites: &[[u8; 4]]) -> [u8; OAM_SIZE] {
        let mut oam = [0xFF; OAM_SIZE];
        for (i, s) in sprites.iter().enumerate() {
            oam[i * 4..i * 4 + 4].copy_from_slice(s);
        }
        oam
    }

    fn fetch_all(sprites: &mut Sprites, control: PpuControl, bus: &mut AddressBus) {
        for step in 0..64 {
            sprites.fetch(step, control, bus);
        }
    }

    #[test]
    fn test_evaluation_caps_at_eight_and_flags_overflow() {
        let oam = oam_with(&[[10, 0, 0, 0]; 9]);
        let mut sprites = Sprites::new();
        assert!(sprites.evaluate(&oam, 12, 8));
        assert_eq!(sprites.count(), 8);

        let oam = oam_with(&[[10, 0, 0, 0]; 8]);
        assert!(!sprites.evaluate(&oam, 12, 8));
    }

    #[test]
    fn test_evaluation_respects_height() {
        let oam = oam_with(&[[10, 0, 0, 0]]);
        let mut sprites = Sprites::new();
        sprites.evaluate(&oam, 18, 8);
        assert_eq!(sprites.count(), 0);
        sprites.evaluate(&oam, 18, 16);
        assert_eq!(sprites.count(), 1);
    }

    #[test]
    fn test_horizontal_flip() {
        let mut bus = video_bus(vec![0; 0x2000], true, Mirroring::Vertical);
        // tile 1 row 0: leftmost pixel only
        bus.write(0x0010, 0x80);
        let oam = oam_with(&[[0, 1, ATTR_FLIP_HORIZONTAL | 0x02, 20]]);

        let mut sprites = Sprites::new();
        sprites.evaluate(&oam, 0, 8);
        fetch_all(&mut sprites, PpuControl::empty(), &mut bus);

        assert!(sprites.pixel(20).is_none());
        let pixel = sprites.pixel(27).unwrap();
        assert_eq!(pixel.pixel, 1);
        assert_eq!(pixel.palette, 2);
        assert!(pixel.sprite_zero);
    }

    #[test]
    fn test_tall_sprite_bottom_half_uses_next_tile() {
        let mut bus = video_bus(vec![0; 0x2000], true, Mirroring::Vertical);
        // tile 5 (odd) selects $1000; bottom half is tile 5 & !1 + 1 = 5, row 1
        bus.write(0x1000 + 5 * 16 + 1, 0xFF);
        let oam = oam_with(&[[0xFF, 0, 0, 0], [0, 5, 0, 0]]);

        let mut sprites = Sprites::new();
        sprites.evaluate(&oam, 9, 16);
        fetch_all(&mut sprites, PpuControl::SPRITE_SIZE, &mut bus);

        let pixel = sprites.pixel(3).unwrap();
        assert_eq!(pixel.pixel, 1);
        assert!(!pixel.sprite_zero);
    }
}
