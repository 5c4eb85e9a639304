use bitflags::bitflags;
use serde::Serialize;

use crate::config::Diagnostics;

mod addressing;
mod alu;
pub mod opcodes;

pub use addressing::Operand;
pub use opcodes::{Access, AddressingMode, Instruction, Opcode, OPCODES};


bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusFlags: u8 {
        const CARRY = 0b00000001;
        const ZERO = 0b00000010;
        const INTERRUPT_DISABLE = 0b00000100;
        const DECIMAL = 0b00001000;
        const BREAK = 0b00010000;
        const UNUSED = 0b00100000;
        const OVERFLOW = 0b01000000;
        const NEGATIVE = 0b10000000;
    }
}

pub const STACK_PAGE: u16 = 0x0100;
pub const NMI_VECTOR: u16 = 0xFFFA;
pub const RESET_VECTOR: u16 = 0xFFFC;
pub const IRQ_VECTOR: u16 = 0xFFFE;

const POWER_ON_SP: u8 = 0xFD;
const INTERRUPT_CYCLES: u8 = 7;

pub trait CpuBus {
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
}

/// Register file snapshot for debuggers and the register dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CpuRegisters {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub sp: u8,
    pub pc: u16,
    pub p: u8,
    pub ir: u8,
    pub cycles: u64,
}

pub struct Cpu {
    pub a: u8,      // Accumulator
    pub x: u8,      // X register
    pub y: u8,      // Y register
    pub sp: u8,     // Stack pointer
    pub pc: u16,    // Program counter
    pub status: StatusFlags,
    ir: u8,         // Instruction register
    data: u8,       // Last value seen on the data bus
    cycles: u64,
    diagnostics: Diagnostics,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    pub fn new() -> Self {
        Self::with_diagnostics(Diagnostics::default())
    }

    pub fn with_diagnostics(diagnostics: Diagnostics) -> Self {
        Cpu {
            a: 0,
            x: 0,
            y: 0,
            sp: POWER_ON_SP,
            pc: 0,
            status: StatusFlags::INTERRUPT_DISABLE | StatusFlags::UNUSED,
            ir: 0,
            data: 0,
            cycles: 0,
            diagnostics,
        }
    }

    /// Loads PC from the reset vector and restores the power-on register
    /// state. Returns the cycles the reset sequence takes.
    pub fn reset(&mut self, bus: &mut dyn CpuBus) -> u8 {
        self.a = 0;
        self.x = 0;
        self.y = 0;
        self.sp = POWER_ON_SP;
        self.status = StatusFlags::INTERRUPT_DISABLE | StatusFlags::UNUSED;
        self.pc = self.read_word(bus, RESET_VECTOR);
        self.cycles = u64::from(INTERRUPT_CYCLES);
        log::debug!("cpu reset, pc=${:04X}", self.pc);
        INTERRUPT_CYCLES
    }

    /// Runs one whole instruction and returns the cycles it took.
    pub fn step(&mut self, bus: &mut dyn CpuBus) -> u8 {
        let pc = self.pc;
        self.ir = self.fetch(bus);
        let opcode = OPCODES[self.ir as usize];

        if self.diagnostics.trace_cpu {
            log::trace!(
                target: "cpu",
                "{:04X}  {:02X}  {}  A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
                pc,
                self.ir,
                opcode.instruction.mnemonic(),
                self.a,
                self.x,
                self.y,
                self.status.bits(),
                self.sp,
                self.cycles
            );
        }
        if opcode.instruction == Instruction::Unknown {
            log::debug!("opcode ${:02X} at ${:04X} executed as NOP", self.ir, pc);
        }

        let access = opcode.instruction.access();
        let operand = self.resolve(opcode.mode, access, bus);
        let mut cycles = opcode.cycles;
        if access == Access::Read && operand.page_crossed() {
            cycles += 1;
        }
        cycles += self.execute(opcode.instruction, operand, bus);

        self.cycles += u64::from(cycles);
        cycles
    }

    pub fn nmi(&mut self, bus: &mut dyn CpuBus) -> u8 {
        self.interrupt(bus, NMI_VECTOR, false);
        self.cycles += u64::from(INTERRUPT_CYCLES);
        INTERRUPT_CYCLES
    }

    /// Maskable interrupt. Returns 0 when masked by the I flag.
    pub fn irq(&mut self, bus: &mut dyn CpuBus) -> u8 {
        if self.status.contains(StatusFlags::INTERRUPT_DISABLE) {
            return 0;
        }
        self.interrupt(bus, IRQ_VECTOR, false);
        self.cycles += u64::from(INTERRUPT_CYCLES);
        INTERRUPT_CYCLES
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn registers(&self) -> CpuRegisters {
        CpuRegisters {
            a: self.a,
            x: self.x,
            y: self.y,
            sp: self.sp,
            pc: self.pc,
            p: self.status.bits(),
            ir: self.ir,
            cycles: self.cycles,
        }
    }

    fn execute(&mut self, instruction: Instruction, operand: Operand, bus: &mut dyn CpuBus) -> u8 {
        match instruction.access() {
            Access::Read => {
                let value = self.load(operand, bus);
                self.execute_read(instruction, value);
                0
            }
            Access::Write => {
                let value = match instruction {
                    Instruction::Sta => self.a,
                    Instruction::Stx => self.x,
                    Instruction::Sty => self.y,
                    Instruction::Sax => self.a & self.x,
                    _ => self.data,
                };
                self.save(operand, value, bus);
                0
            }
            Access::ReadModifyWrite => {
                let value = self.load(operand, bus);
                // the chip writes the unmodified value back first
                if let Operand::Memory { addr, .. } = operand {
                    self.write(bus, addr, value);
                }
                let result = self.execute_rmw(instruction, value);
                self.save(operand, result, bus);
                0
            }
            Access::None => self.execute_control(instruction, operand, bus),
        }
    }

    fn load(&mut self, operand: Operand, bus: &mut dyn CpuBus) -> u8 {
        match operand {
            Operand::Immediate(value) => value,
            Operand::Memory { addr, .. } => self.read(bus, addr),
            Operand::Accumulator => self.a,
            Operand::Implied | Operand::Relative(_) => self.data,
        }
    }

    fn save(&mut self, operand: Operand, value: u8, bus: &mut dyn CpuBus) {
        match operand {
            Operand::Memory { addr, .. } => self.write(bus, addr, value),
            Operand::Accumulator => self.a = value,
            _ => {}
        }
    }

    /// Instructions that do not load or store an operand: branches, jumps,
    /// stack traffic, flag and register transfers. Returns extra cycles.
    fn execute_control(
        &mut self,
        instruction: Instruction,
        operand: Operand,
        bus: &mut dyn CpuBus,
    ) -> u8 {
        use Instruction::*;

        let flag = |cpu: &Cpu, f: StatusFlags| cpu.status.contains(f);
        match instruction {
            Bcc => return self.branch(operand, !flag(self, StatusFlags::CARRY)),
            Bcs => return self.branch(operand, flag(self, StatusFlags::CARRY)),
            Beq => return self.branch(operand, flag(self, StatusFlags::ZERO)),
            Bne => return self.branch(operand, !flag(self, StatusFlags::ZERO)),
            Bmi => return self.branch(operand, flag(self, StatusFlags::NEGATIVE)),
            Bpl => return self.branch(operand, !flag(self, StatusFlags::NEGATIVE)),
            Bvs => return self.branch(operand, flag(self, StatusFlags::OVERFLOW)),
            Bvc => return self.branch(operand, !flag(self, StatusFlags::OVERFLOW)),

            Brk => {
                // padding byte after BRK
                self.pc = self.pc.wrapping_add(1);
                self.interrupt(bus, IRQ_VECTOR, true);
            }
            Jmp => {
                if let Some(addr) = operand.address() {
                    self.pc = addr;
                }
            }
            Jsr => {
                if let Some(addr) = operand.address() {
                    let ret = self.pc.wrapping_sub(1);
                    self.push_word(bus, ret);
                    self.pc = addr;
                }
            }
            Rts => {
                self.pc = self.pull_word(bus).wrapping_add(1);
            }
            Rti => {
                let status = self.pull(bus);
                self.set_status_from_stack(status);
                self.pc = self.pull_word(bus);
            }

            Pha => self.push(bus, self.a),
            Php => {
                let pushed = self.status | StatusFlags::BREAK | StatusFlags::UNUSED;
                self.push(bus, pushed.bits());
            }
            Pla => {
                self.a = self.pull(bus);
                self.set_zero_negative_flags(self.a);
            }
            Plp => {
                let status = self.pull(bus);
                self.set_status_from_stack(status);
            }

            Clc => self.status.remove(StatusFlags::CARRY),
            Cld => self.status.remove(StatusFlags::DECIMAL),
            Cli => self.status.remove(StatusFlags::INTERRUPT_DISABLE),
            Clv => self.status.remove(StatusFlags::OVERFLOW),
            Sec => self.status.insert(StatusFlags::CARRY),
            Sed => self.status.insert(StatusFlags::DECIMAL),
            Sei => self.status.insert(StatusFlags::INTERRUPT_DISABLE),

            Dex => {
                self.x = self.x.wrapping_sub(1);
                self.set_zero_negative_flags(self.x);
            }
            Dey => {
                self.y = self.y.wrapping_sub(1);
                self.set_zero_negative_flags(self.y);
            }
            Inx => {
                self.x = self.x.wrapping_add(1);
                self.set_zero_negative_flags(self.x);
            }
            Iny => {
                self.y = self.y.wrapping_add(1);
                self.set_zero_negative_flags(self.y);
            }
            Tax => {
                self.x = self.a;
                self.set_zero_negative_flags(self.x);
            }
            Tay => {
                self.y = self.a;
                self.set_zero_negative_flags(self.y);
            }
            Tsx => {
                self.x = self.sp;
                self.set_zero_negative_flags(self.x);
            }
            Txa => {
                self.a = self.x;
                self.set_zero_negative_flags(self.a);
            }
            Tya => {
                self.a = self.y;
                self.set_zero_negative_flags(self.a);
            }
            Txs => self.sp = self.x,

            _ => {}
        }
        0
    }

    fn branch(&mut self, operand: Operand, condition: bool) -> u8 {
        let Operand::Relative(offset) = operand else {
            return 0;
        };
        if !condition {
            return 0;
        }
        let target = self.pc.wrapping_add(offset as i16 as u16);
        let extra = if target & 0xFF00 != self.pc & 0xFF00 { 2 } else { 1 };
        self.pc = target;
        extra
    }

    fn interrupt(&mut self, bus: &mut dyn CpuBus, vector: u16, brk: bool) {
        self.push_word(bus, self.pc);
        let mut pushed = self.status | StatusFlags::UNUSED;
        pushed.set(StatusFlags::BREAK, brk);
        self.push(bus, pushed.bits());
        self.status.insert(StatusFlags::INTERRUPT_DISABLE);
        self.pc = self.read_word(bus, vector);
    }

    /// B does not exist as a latch and bit 5 always reads back set.
    fn set_status_from_stack(&mut self, value: u8) {
        self.status = (StatusFlags::from_bits_truncate(value) - StatusFlags::BREAK)
            | StatusFlags::UNUSED;
    }

    fn read(&mut self, bus: &mut dyn CpuBus, addr: u16) -> u8 {
        self.data = bus.read(addr);
        self.data
    }

    fn write(&mut self, bus: &mut dyn CpuBus, addr: u16, value: u8) {
        self.data = value;
        bus.write(addr, value);
    }

    fn fetch(&mut self, bus: &mut dyn CpuBus) -> u8 {
        let value = self.read(bus, self.pc);
        self.pc = self.pc.wrapping_add(1);
        value
    }

    fn read_word(&mut self, bus: &mut dyn CpuBus, addr: u16) -> u16 {
        let low = self.read(bus, addr) as u16;
        let high = self.read(bus, addr.wrapping_add(1)) as u16;
        (high << 8) | low
    }

    fn push(&mut self, bus: &mut dyn CpuBus, value: u8) {
        self.write(bus, STACK_PAGE | self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    fn pull(&mut self, bus: &mut dyn CpuBus) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.read(bus, STACK_PAGE | self.sp as u16)
    }

    fn push_word(&mut self, bus: &mut dyn CpuBus, value: u16) {
        self.push(bus, (value >> 8) as u8);
        self.push(bus, value as u8);
    }

    fn pull_word(&mut self, bus: &mut dyn CpuBus) -> u16 {
        let low = self.pull(bus) as u16;
        let high = self.pull(bus) as u16;
        (high << 8) | low
    }
}
