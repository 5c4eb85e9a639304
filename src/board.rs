//! The motherboard: both buses, the clock and the units it drives.
//!
//! The PPU sits on the CPU bus as the device behind $2000-$3FFF and owns the
//! video bus. Each clock pulse is one CPU cycle followed by however many PPU
//! dots the frame format asks for.

use serde::Serialize;

use crate::bus::{AddressBus, DeviceId};
use crate::cartridge::Cartridge;
use crate::clock::{Clock, TickHandle, Tickable};
use crate::config::Config;
use crate::cpu::{Cpu, CpuRegisters};
use crate::dma::{self, OamDma};
use crate::memory::{prg_rom, save_ram, work_ram};
use crate::ppu::memory::video_bus;
use crate::ppu::{FrameFormat, Ppu, PpuRegisters, VideoSink};

/// What the clocked units share: the CPU bus and the NMI line.
pub struct Backplane {
    pub bus: AddressBus,
    pub nmi: bool,
}

/// Drives the CPU one cycle per pulse. A whole instruction runs on its first
/// cycle and the unit idles for the rest of its duration.
pub struct CpuUnit {
    cpu: Cpu,
    dma: DeviceId,
    // pulses left before the next instruction
    busy: u64,
    cycles: u64,
}

impl CpuUnit {
    pub fn new(cpu: Cpu, dma: DeviceId) -> Self {
        CpuUnit {
            cpu,
            dma,
            busy: 0,
            cycles: 0,
        }
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn reset(&mut self, bus: &mut AddressBus) {
        let cycles = self.cpu.reset(bus);
        self.busy = u64::from(cycles);
        self.cycles = 0;
    }

    /// Cycles elapsed since reset, DMA stalls included.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    fn oam_dma(&mut self, page: u8, bus: &mut AddressBus) -> u64 {
        let base = u16::from(page) << 8;
        for offset in 0..dma::TRANSFER_BYTES {
            let data = bus.read(base | offset);
            bus.write(dma::OAM_DATA_REGISTER, data);
        }
        dma::stall_cycles(self.cycles)
    }
}

impl Tickable<Backplane> for CpuUnit {
    fn step(&mut self, ctx: &mut Backplane) {
        self.cycles += 1;
        if self.busy > 0 {
            self.busy -= 1;
            return;
        }

        let mut cycles = if std::mem::take(&mut ctx.nmi) {
            u64::from(self.cpu.nmi(&mut ctx.bus))
        } else {
            u64::from(self.cpu.step(&mut ctx.bus))
        };

        let page = ctx
            .bus
            .device_mut::<OamDma>(self.dma)
            .and_then(|dma| dma.take_page());
        if let Some(page) = page {
            cycles += self.oam_dma(page, &mut ctx.bus);
        }
        // this pulse was the first of them
        self.busy = cycles - 1;
    }
}

/// Drives the PPU one dot per step and raises NMI on the backplane.
pub struct PpuUnit {
    ppu: DeviceId,
}

impl Tickable<Backplane> for PpuUnit {
    fn step(&mut self, ctx: &mut Backplane) {
        if let Some(ppu) = ctx.bus.device_mut::<Ppu>(self.ppu) {
            ppu.step();
            if ppu.take_nmi_request() {
                ctx.nmi = true;
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegisterDump {
    pub cpu: CpuRegisters,
    pub ppu: PpuRegisters,
}

pub struct Board {
    clock: Clock<Backplane>,
    backplane: Backplane,
    cpu: TickHandle,
    ppu: DeviceId,
    format: FrameFormat,
}

impl Board {
    pub fn new(cartridge: &Cartridge, config: &Config) -> Self {
        let format = FrameFormat::for_region(config.region);
        let diagnostics = config.diagnostics();

        let video = video_bus(
            cartridge.chr().to_vec(),
            cartridge.chr_is_ram(),
            cartridge.mirroring(),
        );

        let mut bus = AddressBus::new("cpu");
        bus.attach(Box::new(work_ram()));
        let ppu = bus.attach(Box::new(Ppu::new(video, format, diagnostics)));
        let dma = bus.attach(Box::new(OamDma::new()));
        bus.attach(Box::new(save_ram()));
        bus.attach(Box::new(prg_rom(cartridge.prg_rom().to_vec())));

        let mut clock: Clock<Backplane> = Clock::new();
        let cpu = clock.attach(
            Box::new(CpuUnit::new(Cpu::with_diagnostics(diagnostics), dma)),
            1,
        );
        clock.attach(Box::new(PpuUnit { ppu }), format.dots_per_cpu_cycle);

        log::info!(
            "board: {:?} timing, {} lines, {} dots per CPU cycle",
            format.region,
            format.lines_per_frame,
            format.dots_per_cpu_cycle
        );

        let mut board = Board {
            clock,
            backplane: Backplane { bus, nmi: false },
            cpu,
            ppu,
            format,
        };
        board.reset();
        board
    }

    /// Reset button: CPU to the reset vector, PPU back to the pre-render line.
    pub fn reset(&mut self) {
        self.backplane.nmi = false;
        if let Some(ppu) = self.ppu_mut() {
            ppu.reset();
        }
        if let Some(unit) = self.clock.unit_mut::<CpuUnit>(self.cpu) {
            unit.reset(&mut self.backplane.bus);
        }
    }

    /// One CPU cycle.
    pub fn tick(&mut self) {
        self.clock.tick(&mut self.backplane);
    }

    /// Ticks until `stop` returns true, checking before every pulse.
    /// Returns the number of pulses run.
    pub fn run_until(&mut self, mut stop: impl FnMut(&Board) -> bool) -> u64 {
        let mut pulses = 0;
        while !stop(self) {
            self.tick();
            pulses += 1;
        }
        pulses
    }

    /// Runs until the PPU's frame counter moves on. The board powers up on
    /// the pre-render line, so the first call only finishes that line.
    pub fn run_frame(&mut self) -> u64 {
        let start = self.frame();
        self.run_until(|board| board.frame() != start)
    }

    pub fn set_video_sink(&mut self, sink: Box<dyn VideoSink>) {
        if let Some(ppu) = self.ppu_mut() {
            ppu.set_video_sink(sink);
        }
    }

    pub fn registers(&self) -> Option<RegisterDump> {
        Some(RegisterDump {
            cpu: self.cpu()?.registers(),
            ppu: self.ppu()?.registers(),
        })
    }

    pub fn cpu(&self) -> Option<&Cpu> {
        self.clock.unit::<CpuUnit>(self.cpu).map(CpuUnit::cpu)
    }

    pub fn cpu_cycles(&self) -> u64 {
        self.clock
            .unit::<CpuUnit>(self.cpu)
            .map_or(0, CpuUnit::cycles)
    }

    pub fn ppu(&self) -> Option<&Ppu> {
        self.backplane.bus.device::<Ppu>(self.ppu)
    }

    pub fn ppu_mut(&mut self) -> Option<&mut Ppu> {
        self.backplane.bus.device_mut::<Ppu>(self.ppu)
    }

    pub fn frame(&self) -> u64 {
        self.ppu().map_or(0, Ppu::frame)
    }

    pub fn format(&self) -> FrameFormat {
        self.format
    }

    pub fn pulses(&self) -> u64 {
        self.clock.pulses()
    }

    pub fn bus_mut(&mut self) -> &mut AddressBus {
        &mut self.backplane.bus
    }
}
