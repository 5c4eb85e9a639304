use std::cell::RefCell;
use std::rc::Rc;

use nes_hardware::config::Region;
use nes_hardware::ppu::{PpuStatus, VideoSink};
use nes_hardware::{shutdown, Board, Cartridge, Config};

const PRG_SIZE: usize = 0x4000;

/// NROM-128 image: enable NMI and spin; the NMI handler bumps $10.
fn nmi_counter_rom() -> Vec<u8> {
    let mut prg = vec![0xEA; PRG_SIZE];
    // LDA #$80; STA $2000; loop: JMP loop
    prg[..8].copy_from_slice(&[0xA9, 0x80, 0x8D, 0x00, 0x20, 0x4C, 0x05, 0x80]);
    // INC $10; RTI
    prg[0x10..0x13].copy_from_slice(&[0xE6, 0x10, 0x40]);
    // NMI, reset and IRQ vectors
    prg[0x3FFA..].copy_from_slice(&[0x10, 0x80, 0x00, 0x80, 0x10, 0x80]);

    let mut image = vec![0; 16];
    image[..4].copy_from_slice(b"NES\x1a");
    image[4] = 1;
    image[6] = 0x01;
    image.extend_from_slice(&prg);
    image
}

fn board_with(config: &Config) -> Board {
    let cartridge = Cartridge::from_bytes(&nmi_counter_rom()).unwrap();
    Board::new(&cartridge, config)
}

#[derive(Default)]
struct PixelCounter {
    pixels: usize,
    per_frame: Vec<usize>,
}

impl VideoSink for PixelCounter {
    fn video_out(&mut self, _x: u8, _y: u8, _color: u8) {
        self.pixels += 1;
    }

    fn frame_end(&mut self) {
        self.per_frame.push(self.pixels);
        self.pixels = 0;
    }
}

#[test]
fn nmi_handler_runs_once_per_frame() {
    let mut board = board_with(&Config::default());
    board.run_frame();
    for _ in 0..3 {
        board.run_frame();
    }
    assert_eq!(board.bus_mut().read(0x0010), 3);
}

#[test]
fn every_frame_emits_a_full_picture() {
    let mut board = board_with(&Config::default());
    let counter = Rc::new(RefCell::new(PixelCounter::default()));
    board.set_video_sink(Box::new(counter.clone()));

    board.run_frame();
    for _ in 0..3 {
        board.run_frame();
    }

    let counter = counter.borrow();
    assert_eq!(counter.per_frame.len(), 3);
    assert!(counter.per_frame.iter().all(|&n| n == 256 * 240));
}

#[test]
fn run_until_stops_at_vblank() {
    let mut board = board_with(&Config::default());
    board.run_until(|b| {
        b.ppu()
            .map_or(false, |ppu| ppu.registers().status & PpuStatus::VBLANK.bits() != 0)
    });

    let ppu = board.ppu().unwrap();
    assert_eq!(ppu.scanline(), 241);
    assert!(ppu.dot() >= 2 && ppu.dot() <= 4);
}

#[test]
fn frame_length_follows_the_cpu_ratio() {
    let mut board = board_with(&Config::default());
    board.run_frame();
    let pulses = board.run_frame();
    // 262 lines of 341 dots at three dots per cycle
    assert!((29780..=29781).contains(&pulses), "pulses {}", pulses);
}

#[test]
fn pal_board_uses_pal_timing() {
    let config = Config {
        region: Region::Pal,
        ..Config::default()
    };
    let mut board = board_with(&config);
    assert_eq!(board.format().lines_per_frame, 312);

    board.run_frame();
    let pulses = board.run_frame();
    assert!((35464..=35465).contains(&pulses), "pulses {}", pulses);
    board.run_frame();
    assert!(board.bus_mut().read(0x0010) >= 1);
}

#[test]
fn register_dump_is_json() {
    let mut board = board_with(&Config::default());
    board.run_frame();
    board.run_frame();

    let dump = board.registers().unwrap();
    assert_eq!(dump.ppu.control, 0x80);
    assert_eq!(dump.cpu.a, 0x80);

    let json = serde_json::to_string(&dump).unwrap();
    assert!(json.contains("\"scanline\""));
    assert!(json.contains("\"pc\""));
}

#[test]
fn reset_restarts_the_program() {
    let mut board = board_with(&Config::default());
    board.run_frame();
    board.run_frame();
    board.reset();

    let cpu = board.cpu().unwrap();
    assert_eq!(cpu.pc, 0x8000);
    assert_eq!(board.ppu().unwrap().registers().control, 0);
}

#[test]
fn quit_request_stops_mid_frame() {
    let mut board = board_with(&Config::default());
    board.run_frame();
    let start = board.frame();

    let mut polls = 0;
    let pulses = board.run_until(|b| {
        polls += 1;
        if polls == 1000 {
            shutdown::request_quit();
        }
        shutdown::should_quit() || b.frame() != start
    });

    assert_eq!(pulses, 999);
    assert_eq!(board.frame(), start);
    assert!(board.ppu().unwrap().scanline() < 20);
}
