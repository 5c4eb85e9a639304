pub mod background;
pub mod frame_format;
pub mod memory;
pub mod registers;
pub mod renderer;
pub mod sprites;


use crate::bus::{AddressBus, Device};
use crate::config::Diagnostics;
use background::Background;
use sprites::{Sprites, OAM_SIZE};

pub use frame_format::{DotPhase, FrameFormat, LineKind, DOTS_PER_LINE};
pub use registers::{PpuControl, PpuMask, PpuRegisters, PpuStatus, VramAddress};
pub use renderer::{FrameBuffer, NullSink, VideoSink};

const PALETTE_BASE: u16 = 0x3F00;

pub struct Ppu {
    control: PpuControl,
    mask: PpuMask,
    status: PpuStatus,
    oam_addr: u8,

    v: VramAddress,
    t: VramAddress,
    x: u8,
    w: bool,

    dot: u16,
    scanline: u16,
    frame: u64,

    oam: [u8; OAM_SIZE],
    read_buffer: u8,
    // last value driven onto the register data bus
    io_latch: u8,
    nmi_request: bool,

    background: Background,
    sprites: Sprites,
    bus: AddressBus,
    format: FrameFormat,
    sink: Box<dyn VideoSink>,
    diagnostics: Diagnostics,
}

impl Ppu {
    /// Takes ownership of the video bus; the PPU is its only master. The
    /// PPU powers up at the start of the pre-render line.
    pub fn new(bus: AddressBus, format: FrameFormat, diagnostics: Diagnostics) -> Self {
        Ppu {
            control: PpuControl::empty(),
            mask: PpuMask::empty(),
            status: PpuStatus::empty(),
            oam_addr: 0,

            v: VramAddress::default(),
            t: VramAddress::default(),
            x: 0,
            w: false,

            dot: 0,
            scanline: format.pre_render_line,
            frame: 0,

            oam: [0xFF; OAM_SIZE],
            read_buffer: 0,
            io_latch: 0,
            nmi_request: false,

            background: Background::new(),
            sprites: Sprites::new(),
            bus,
            format,
            sink: Box::new(NullSink),
            diagnostics,
        }
    }

    pub fn set_video_sink(&mut self, sink: Box<dyn VideoSink>) {
        self.sink = sink;
    }

    /// Back to power-on timing; memory contents survive.
    pub fn reset(&mut self) {
        self.control = PpuControl::empty();
        self.mask = PpuMask::empty();
        self.status = PpuStatus::empty();
        self.w = false;
        self.x = 0;
        self.t = VramAddress::default();
        self.read_buffer = 0;
        self.nmi_request = false;
        self.dot = 0;
        self.scanline = self.format.pre_render_line;
        self.frame = 0;
        self.sprites.clear();
    }

    /// Advances one dot.
    pub fn step(&mut self) {
        match self.format.line_kind(self.scanline) {
            LineKind::Visible => self.render_dot(false),
            LineKind::PreRender => self.render_dot(true),
            LineKind::VBlankStart if self.dot == 1 => self.enter_vblank(),
            _ => {}
        }
        self.advance();
    }

    /// Returns and clears the pending NMI request.
    pub fn take_nmi_request(&mut self) -> bool {
        std::mem::take(&mut self.nmi_request)
    }

    pub fn nmi_pending(&self) -> bool {
        self.nmi_request
    }

    pub fn rendering_enabled(&self) -> bool {
        self.mask.rendering_enabled()
    }

    pub fn dot(&self) -> u16 {
        self.dot
    }

    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    pub fn oam(&self) -> &[u8; OAM_SIZE] {
        &self.oam
    }

    pub fn video_bus(&self) -> &AddressBus {
        &self.bus
    }

    pub fn video_bus_mut(&mut self) -> &mut AddressBus {
        &mut self.bus
    }

    pub fn registers(&self) -> PpuRegisters {
        PpuRegisters {
            control: self.control.bits(),
            mask: self.mask.bits(),
            status: self.status.bits(),
            oam_addr: self.oam_addr,
            v: self.v.raw(),
            t: self.t.raw(),
            x: self.x,
            w: self.w,
            dot: self.dot,
            scanline: self.scanline,
            frame: self.frame,
        }
    }

    pub fn read_register(&mut self, addr: u16) -> u8 {
        let value = match addr & 0x07 {
            2 => {
                let value = (self.status.bits() & 0xE0) | (self.io_latch & 0x1F);
                self.status.remove(PpuStatus::VBLANK);
                self.w = false;
                value
            }
            4 => self.oam[self.oam_addr as usize],
            7 => {
                let addr = self.v.raw() & 0x3FFF;
                let value = if addr >= PALETTE_BASE {
                    // palette reads skip the buffer, which picks up the
                    // nametable byte underneath instead
                    self.read_buffer = self.bus.read(addr - 0x1000);
                    // six bits of colour; the top two come from the latch
                    (self.bus.read(addr) & 0x3F) | (self.io_latch & 0xC0)
                } else {
                    let buffered = self.read_buffer;
                    self.read_buffer = self.bus.read(addr);
                    buffered
                };
                self.v.increment(self.control.vram_increment());
                value
            }
            // write-only registers
            _ => self.io_latch,
        };
        self.io_latch = value;
        value
    }

    pub fn write_register(&mut self, addr: u16, data: u8) {
        if self.diagnostics.trace_ppu {
            log::debug!(
                target: "ppu",
                "${:04X} <- {:02X} (line {} dot {})",
                0x2000 | (addr & 0x07),
                data,
                self.scanline,
                self.dot
            );
        }
        self.io_latch = data;

        match addr & 0x07 {
            0 => {
                let was_enabled = self.control.contains(PpuControl::NMI_ENABLE);
                self.control = PpuControl::from_bits_retain(data);
                self.t.set_nametable(data & 0x03);
                if !was_enabled
                    && self.control.contains(PpuControl::NMI_ENABLE)
                    && self.status.contains(PpuStatus::VBLANK)
                {
                    self.nmi_request = true;
                }
            }
            1 => self.mask = PpuMask::from_bits_retain(data),
            3 => self.oam_addr = data,
            4 => {
                self.oam[self.oam_addr as usize] = data;
                self.oam_addr = self.oam_addr.wrapping_add(1);
            }
            5 => {
                if !self.w {
                    self.t.set_coarse_x(data);
                    self.x = data & 0x07;
                } else {
                    self.t.set_vertical_scroll(data);
                }
                self.w = !self.w;
            }
            6 => {
                if !self.w {
                    self.t.set_high_byte(data);
                } else {
                    self.t.set_low_byte(data);
                    self.v = self.t;
                }
                self.w = !self.w;
            }
            7 => {
                self.bus.write(self.v.raw() & 0x3FFF, data);
                self.v.increment(self.control.vram_increment());
            }
            // STATUS is read-only
            _ => {}
        }
    }

    fn render_dot(&mut self, pre_render: bool) {
        let dot = self.dot;
        if pre_render && dot == 1 {
            self.status
                .remove(PpuStatus::VBLANK | PpuStatus::SPRITE_0_HIT | PpuStatus::SPRITE_OVERFLOW);
        }

        let phase = DotPhase::of(dot);
        if !pre_render && phase == DotPhase::Render {
            self.emit_pixel(dot - 1);
        }
        if !self.rendering_enabled() {
            return;
        }

        match phase {
            DotPhase::Render => {
                self.fetch_background(dot);
                if dot == 256 {
                    self.v.increment_y();
                }
                self.background.shift();
            }
            DotPhase::SpriteFetch => {
                if dot == 257 {
                    self.background.reload();
                    self.v.copy_horizontal(self.t);
                    self.evaluate_sprites(pre_render);
                }
                self.sprites.fetch(dot - 257, self.control, &mut self.bus);
                if pre_render && (280..=304).contains(&dot) {
                    self.v.copy_vertical(self.t);
                }
            }
            DotPhase::TilePrefetch => {
                self.fetch_background(dot);
                self.background.shift();
            }
            DotPhase::UnusedFetch => {
                if dot == 337 {
                    self.background.reload();
                }
                if dot % 2 == 0 {
                    self.bus.read(self.v.tile_address());
                }
            }
            DotPhase::Idle => {}
        }
    }

    fn fetch_background(&mut self, dot: u16) {
        let step = (dot - 1) % 8;
        let base = self.control.background_pattern_base();
        self.background.fetch(step, self.v, base, &mut self.bus);
        if step == 7 {
            self.v.increment_x();
        }
    }

    fn evaluate_sprites(&mut self, pre_render: bool) {
        if pre_render {
            self.sprites.clear();
            return;
        }
        let height = self.control.sprite_height();
        if self.sprites.evaluate(&self.oam, self.scanline, height) {
            self.status.insert(PpuStatus::SPRITE_OVERFLOW);
        }
    }

    fn emit_pixel(&mut self, x: u16) {
        let x = x as u8;
        let index = if self.rendering_enabled() {
            self.composite(x)
        } else {
            self.backdrop_index()
        };
        let mut color = self.bus.read(PALETTE_BASE | index as u16) & 0x3F;
        if self.mask.contains(PpuMask::GRAYSCALE) {
            color &= 0x30;
        }
        self.sink.video_out(x, self.scanline as u8, color);
    }

    /// Palette index for a pixel with rendering on. Also latches sprite-zero hit.
    fn composite(&mut self, x: u8) -> u8 {
        let left_column = x < 8;

        let (bg_pixel, bg_palette) = if self.mask.contains(PpuMask::BG_ENABLE)
            && (!left_column || self.mask.contains(PpuMask::BG_LEFT_ENABLE))
        {
            self.background.pixel(self.x)
        } else {
            (0, 0)
        };

        let sprite = if self.mask.contains(PpuMask::SPRITE_ENABLE)
            && (!left_column || self.mask.contains(PpuMask::SPRITE_LEFT_ENABLE))
        {
            self.sprites.pixel(x)
        } else {
            None
        };

        match (bg_pixel, sprite) {
            (0, None) => 0,
            (0, Some(s)) => 0x10 | (s.palette << 2) | s.pixel,
            (_, None) => (bg_palette << 2) | bg_pixel,
            (_, Some(s)) => {
                if s.sprite_zero && x != 255 {
                    self.status.insert(PpuStatus::SPRITE_0_HIT);
                }
                if s.behind_background {
                    (bg_palette << 2) | bg_pixel
                } else {
                    0x10 | (s.palette << 2) | s.pixel
                }
            }
        }
    }

    // With rendering off the PPU shows the backdrop, or the palette entry V
    // points at when V is inside palette memory.
    fn backdrop_index(&self) -> u8 {
        let addr = self.v.raw() & 0x3FFF;
        if addr >= PALETTE_BASE {
            (addr & 0x1F) as u8
        } else {
            0
        }
    }

    fn enter_vblank(&mut self) {
        self.status.insert(PpuStatus::VBLANK);
        if self.diagnostics.trace_ppu {
            log::trace!(target: "ppu", "vblank, frame {}", self.frame);
        }
        self.sink.frame_end();
        if self.control.contains(PpuControl::NMI_ENABLE) {
            self.nmi_request = true;
            self.sink.vblank();
        }
    }

    fn advance(&mut self) {
        let odd_frame = self.frame % 2 == 1;
        if self.scanline == self.format.pre_render_line
            && self.dot == DOTS_PER_LINE - 2
            && odd_frame
            && self.format.skips_odd_dot
            && self.rendering_enabled()
        {
            // the idle dot 340 is dropped
            self.dot = DOTS_PER_LINE;
        } else {
            self.dot += 1;
        }

        if self.dot >= DOTS_PER_LINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline >= self.format.lines_per_frame {
                self.scanline = 0;
            }
            if self.scanline == 0 {
                self.frame += 1;
            }
        }
    }
}

/// The register window on the CPU bus, eight bytes mirrored up to $3FFF.
impl Device for Ppu {
    fn claims(&self, addr: u16) -> bool {
        (0x2000..=0x3FFF).contains(&addr)
    }

    fn read(&mut self, addr: u16) -> u8 {
        self.read_register(addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.write_register(addr, data);
    }
}
