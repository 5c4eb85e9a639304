use bitflags::bitflags;
use serde::Serialize;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PpuControl: u8 {
        const NAMETABLE_X = 0b00000001;
        const NAMETABLE_Y = 0b00000010;
        const VRAM_INCREMENT = 0b00000100;
        const SPRITE_PATTERN = 0b00001000;
        const BG_PATTERN = 0b00010000;
        const SPRITE_SIZE = 0b00100000;
        const PPU_MASTER_SLAVE = 0b01000000;
        const NMI_ENABLE = 0b10000000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PpuMask: u8 {
        const GRAYSCALE = 0b00000001;
        const BG_LEFT_ENABLE = 0b00000010;
        const SPRITE_LEFT_ENABLE = 0b00000100;
        const BG_ENABLE = 0b00001000;
        const SPRITE_ENABLE = 0b00010000;
        const EMPHASIZE_RED = 0b00100000;
        const EMPHASIZE_GREEN = 0b01000000;
        const EMPHASIZE_BLUE = 0b10000000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PpuStatus: u8 {
        const SPRITE_OVERFLOW = 0b00100000;
        const SPRITE_0_HIT = 0b01000000;
        const VBLANK = 0b10000000;
    }
}

impl PpuControl {
    pub fn vram_increment(self) -> u16 {
        if self.contains(PpuControl::VRAM_INCREMENT) {
            32
        } else {
            1
        }
    }

    pub fn background_pattern_base(self) -> u16 {
        if self.contains(PpuControl::BG_PATTERN) {
            0x1000
        } else {
            0x0000
        }
    }

    /// Only meaningful for 8x8 sprites; 8x16 sprites pick their table from
    /// bit 0 of the tile index.
    pub fn sprite_pattern_base(self) -> u16 {
        if self.contains(PpuControl::SPRITE_PATTERN) {
            0x1000
        } else {
            0x0000
        }
    }

    pub fn sprite_height(self) -> u8 {
        if self.contains(PpuControl::SPRITE_SIZE) {
            16
        } else {
            8
        }
    }
}

impl PpuMask {
    pub fn rendering_enabled(self) -> bool {
        self.intersects(PpuMask::BG_ENABLE | PpuMask::SPRITE_ENABLE)
    }
}

/// Loopy V/T register: `yyy NN YYYYY XXXXX` (fine Y, nametable, coarse Y,
/// coarse X). Only the low 15 bits are ever kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VramAddress(u16);

impl VramAddress {
    const MASK: u16 = 0x7FFF;
    const COARSE_X: u16 = 0x001F;
    const COARSE_Y: u16 = 0x03E0;
    const NAMETABLE_X: u16 = 0x0400;
    const NAMETABLE_Y: u16 = 0x0800;
    const FINE_Y: u16 = 0x7000;
    const HORIZONTAL: u16 = Self::NAMETABLE_X | Self::COARSE_X;
    const VERTICAL: u16 = Self::FINE_Y | Self::NAMETABLE_Y | Self::COARSE_Y;

    pub fn new(raw: u16) -> Self {
        VramAddress(raw & Self::MASK)
    }

    pub fn raw(self) -> u16 {
        self.0
    }

    pub fn coarse_x(self) -> u16 {
        self.0 & Self::COARSE_X
    }

    pub fn coarse_y(self) -> u16 {
        (self.0 & Self::COARSE_Y) >> 5
    }

    pub fn fine_y(self) -> u16 {
        (self.0 & Self::FINE_Y) >> 12
    }

    pub fn set_nametable(&mut self, select: u8) {
        self.0 = (self.0 & !(Self::NAMETABLE_X | Self::NAMETABLE_Y)) | ((select as u16 & 0x03) << 10);
    }

    /// First PPUSCROLL write.
    pub fn set_coarse_x(&mut self, data: u8) {
        self.0 = (self.0 & !Self::COARSE_X) | (data as u16 >> 3);
    }

    /// Second PPUSCROLL write.
    pub fn set_vertical_scroll(&mut self, data: u8) {
        let fine = (data as u16 & 0x07) << 12;
        let coarse = (data as u16 & 0xF8) << 2;
        self.0 = (self.0 & !(Self::FINE_Y | Self::COARSE_Y)) | fine | coarse;
    }

    /// First PPUADDR write. Bit 14 is cleared along with the high byte.
    pub fn set_high_byte(&mut self, data: u8) {
        self.0 = (self.0 & 0x00FF) | ((data as u16 & 0x3F) << 8);
    }

    pub fn set_low_byte(&mut self, data: u8) {
        self.0 = (self.0 & 0x7F00) | data as u16;
    }

    pub fn increment(&mut self, amount: u16) {
        self.0 = self.0.wrapping_add(amount) & Self::MASK;
    }

    /// Coarse X +1, wrapping into the horizontal nametable bit.
    pub fn increment_x(&mut self) {
        if self.coarse_x() == 31 {
            self.0 &= !Self::COARSE_X;
            self.0 ^= Self::NAMETABLE_X;
        } else {
            self.0 += 1;
        }
    }

    /// Fine Y +1, carrying into coarse Y. Row 29 wraps into the vertical
    /// nametable bit; rows 30 and 31 (attribute memory) wrap without it.
    pub fn increment_y(&mut self) {
        if self.fine_y() < 7 {
            self.0 += 0x1000;
            return;
        }
        self.0 &= !Self::FINE_Y;
        let mut y = self.coarse_y();
        if y == 29 {
            y = 0;
            self.0 ^= Self::NAMETABLE_Y;
        } else if y == 31 {
            y = 0;
        } else {
            y += 1;
        }
        self.0 = (self.0 & !Self::COARSE_Y) | (y << 5);
    }

    pub fn copy_horizontal(&mut self, from: VramAddress) {
        self.0 = (self.0 & !Self::HORIZONTAL) | (from.0 & Self::HORIZONTAL);
    }

    pub fn copy_vertical(&mut self, from: VramAddress) {
        self.0 = (self.0 & !Self::VERTICAL) | (from.0 & Self::VERTICAL);
    }

    pub fn tile_address(self) -> u16 {
        0x2000 | (self.0 & 0x0FFF)
    }

    pub fn attribute_address(self) -> u16 {
        0x23C0 | (self.0 & 0x0C00) | ((self.0 >> 4) & 0x38) | ((self.0 >> 2) & 0x07)
    }

    /// Shift selecting this tile's quadrant inside its attribute byte.
    pub fn attribute_shift(self) -> u8 {
        (((self.coarse_y() & 0x02) << 1) | (self.coarse_x() & 0x02)) as u8
    }
}

/// Register snapshot for debuggers and the register dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PpuRegisters {
    pub control: u8,
    pub mask: u8,
    pub status: u8,
    pub oam_addr: u8,

    // Scroll registers (Loopy registers)
    pub v: u16,
    pub t: u16,
    pub x: u8,
    pub w: bool,

    // Timing
    pub dot: u16,
    pub scanline: u16,
    pub frame: u64,
}
