use std::cell::RefCell;
use std::io::{self, Write};
use std::path::Path;
use std::rc::Rc;

use super::frame_format::{VISIBLE_DOTS, VISIBLE_LINES};

pub const SCREEN_WIDTH: usize = VISIBLE_DOTS as usize;
pub const SCREEN_HEIGHT: usize = VISIBLE_LINES as usize;

/// Receives the PPU's output. `color` is a 6-bit master palette index.
pub trait VideoSink {
    fn video_out(&mut self, x: u8, y: u8, color: u8);

    /// Once per frame, as vertical blanking starts.
    fn frame_end(&mut self) {}

    /// Vblank with NMI enabled.
    fn vblank(&mut self) {}
}

/// Lets the owner keep a handle on a sink after handing it to the PPU.
impl<S: VideoSink + ?Sized> VideoSink for Rc<RefCell<S>> {
    fn video_out(&mut self, x: u8, y: u8, color: u8) {
        self.borrow_mut().video_out(x, y, color);
    }

    fn frame_end(&mut self) {
        self.borrow_mut().frame_end();
    }

    fn vblank(&mut self) {
        self.borrow_mut().vblank();
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl VideoSink for NullSink {
    fn video_out(&mut self, _x: u8, _y: u8, _color: u8) {}
}

/// Palette indices of the last frame drawn.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    pixels: Vec<u8>,
    frames: u64,
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self {
            pixels: vec![0x0F; SCREEN_WIDTH * SCREEN_HEIGHT],
            frames: 0,
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> u8 {
        self.pixels[y * SCREEN_WIDTH + x]
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.pixels.len() * 3);
        for &index in &self.pixels {
            let (r, g, b) = nes_color(index);
            rgb.extend_from_slice(&[r, g, b]);
        }
        rgb
    }

    /// Binary PPM (P6).
    pub fn write_ppm<W: Write>(&self, out: &mut W) -> io::Result<()> {
        write!(out, "P6\n{} {}\n255\n", SCREEN_WIDTH, SCREEN_HEIGHT)?;
        out.write_all(&self.to_rgb())
    }

    pub fn save_ppm(&self, path: impl AsRef<Path>) -> io::Result<()> {
        let mut file = io::BufWriter::new(std::fs::File::create(path)?);
        self.write_ppm(&mut file)?;
        file.flush()
    }

    /// Writes the frame in whatever format `path`'s extension names.
    #[cfg(feature = "screenshot")]
    pub fn save_image(&self, path: impl AsRef<Path>) -> image::ImageResult<()> {
        use image::error::{ParameterError, ParameterErrorKind};

        let image = image::RgbImage::from_raw(
            SCREEN_WIDTH as u32,
            SCREEN_HEIGHT as u32,
            self.to_rgb(),
        )
        .ok_or_else(|| {
            image::ImageError::Parameter(ParameterError::from_kind(
                ParameterErrorKind::DimensionMismatch,
            ))
        })?;
        image.save(path)
    }
}

impl VideoSink for FrameBuffer {
    fn video_out(&mut self, x: u8, y: u8, color: u8) {
        let index = y as usize * SCREEN_WIDTH + x as usize;
        if let Some(pixel) = self.pixels.get_mut(index) {
            *pixel = color;
        }
    }

    fn frame_end(&mut self) {
        self.frames += 1;
    }
}

pub fn nes_color(index: u8) -> (u8, u8, u8) {
    #[rustfmt::skip]
    const PALETTE: [(u8, u8, u8); 64] = [
        (0x80, 0x80, 0x80), (0x00, 0x3D, 0xA6), (0x00, 0x12, 0xB0), (0x44, 0x00, 0x96),
        (0xA1, 0x00, 0x5E), (0xC7, 0x00, 0x28), (0xBA, 0x06, 0x00), (0x8C, 0x17, 0x00),
        (0x5C, 0x2F, 0x00), (0x10, 0x45, 0x00), (0x05, 0x4A, 0x00), (0x00, 0x47, 0x2E),
        (0x00, 0x41, 0x66), (0x00, 0x00, 0x00), (0x05, 0x05, 0x05), (0x05, 0x05, 0x05),
        (0xC7, 0xC7, 0xC7), (0x00, 0x77, 0xFF), (0x21, 0x55, 0xFF), (0x82, 0x37, 0xFA),
        (0xEB, 0x2F, 0xB5), (0xFF, 0x29, 0x50), (0xFF, 0x22, 0x00), (0xD6, 0x32, 0x00),
        (0xC4, 0x62, 0x00), (0x35, 0x80, 0x00), (0x05, 0x8F, 0x00), (0x00, 0x8A, 0x55),
        (0x00, 0x99, 0xCC), (0x21, 0x21, 0x21), (0x09, 0x09, 0x09), (0x09, 0x09, 0x09),
        (0xFF, 0xFF, 0xFF), (0x0F, 0xD7, 0xFF), (0x69, 0xA2, 0xFF), (0xD4, 0x80, 0xFF),
        (0xFF, 0x45, 0xF3), (0xFF, 0x61, 0x8B), (0xFF, 0x88, 0x33), (0xFF, 0x9C, 0x12),
        (0xFA, 0xBC, 0x20), (0x9F, 0xE3, 0x0E), (0x2B, 0xF0, 0x35), (0x0C, 0xF0, 0xA4),
        (0x05, 0xFB, 0xFF), (0x5E, 0x5E, 0x5E), (0x0D, 0x0D, 0x0D), (0x0D, 0x0D, 0x0D),
        (0xFF, 0xFF, 0xFF), (0xA6, 0xFC, 0xFF), (0xB3, 0xEC, 0xFF), (0xDA, 0xAB, 0xEB),
        (0xFF, 0xA8, 0xF9), (0xFF, 0xAB, 0xB3), (0xFF, 0xD2, 0xB0), (0xFF, 0xEF, 0xA6),
        (0xFF, 0xF7, 0x9C), (0xD7, 0xFF, 0xB3), (0xC6, 0xFF, 0xC2), (0xC6, 0xFF, 0xD7),
        (0xC4, 0xFF, 0xFF), (0xB9, 0xB9, 0xB9), (0xA4, 0xA4, 0xA4), (0xA4, 0xA4, 0xA4),
    ];

    PALETTE[(index & 0x3F) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_buffer_records_pixels_and_frames() {
        let mut fb = FrameBuffer::new();
        fb.video_out(3, 2, 0x21);
        fb.frame_end();
        assert_eq!(fb.pixel(3, 2), 0x21);
        assert_eq!(fb.frames(), 1);
    }

    #[test]
    fn test_ppm_header_and_size() {
        let mut fb = FrameBuffer::new();
        fb.video_out(0, 0, 0x20);
        let mut out = Vec::new();
        fb.write_ppm(&mut out).unwrap();

        let header = b"P6\n256 240\n255\n";
        assert!(out.starts_with(header));
        assert_eq!(out.len(), header.len() + SCREEN_WIDTH * SCREEN_HEIGHT * 3);
        assert_eq!(&out[header.len()..header.len() + 3], &[0xFF, 0xFF, 0xFF]);
    }

    #[cfg(feature = "screenshot")]
    #[test]
    fn test_png_screenshot_round_trips() {
        let mut fb = FrameBuffer::new();
        fb.video_out(5, 7, 0x16);
        let path = std::env::temp_dir().join(format!("nes-hardware-{}.png", std::process::id()));
        fb.save_image(&path).unwrap();

        let decoded = image::open(&path).unwrap().to_rgb8();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(decoded.dimensions(), (256, 240));
        let (r, g, b) = nes_color(0x16);
        assert_eq!(decoded.get_pixel(5, 7).0, [r, g, b]);
    }

    #[test]
    fn test_shared_sink_forwards() {
        let shared = Rc::new(RefCell::new(FrameBuffer::new()));
        let mut sink: Box<dyn VideoSink> = Box::new(shared.clone());
        sink.video_out(10, 10, 0x16);
        sink.frame_end();
        assert_eq!(shared.borrow().pixel(10, 10), 0x16);
        assert_eq!(shared.borrow().frames(), 1);
    }
}
