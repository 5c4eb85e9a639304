//! Cycle-stepped 6502 CPU and 2C02 PPU wired together the way the console
//! board does it: a CPU bus, a video bus, and one clock driving both.

pub mod board;
pub mod bus;
pub mod cartridge;
pub mod clock;
pub mod config;
pub mod cpu;
pub mod dma;
pub mod error;
pub mod memory;
pub mod ppu;
pub mod shutdown;

pub use board::{Board, RegisterDump};
pub use cartridge::{Cartridge, Mirroring};
pub use config::{Config, Diagnostics, Region};
pub use error::{ConfigError, LoadError};
