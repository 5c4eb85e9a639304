use super::opcodes::{Access, AddressingMode};
use super::{Cpu, CpuBus};

/// Where an instruction's operand lives once its addressing bytes have been
/// consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Implied,
    Accumulator,
    Immediate(u8),
    Memory { addr: u16, page_crossed: bool },
    Relative(i8),
}

impl Operand {
    pub fn address(self) -> Option<u16> {
        match self {
            Operand::Memory { addr, .. } => Some(addr),
            _ => None,
        }
    }

    pub fn page_crossed(self) -> bool {
        matches!(self, Operand::Memory { page_crossed: true, .. })
    }
}

impl Cpu {
    /// Consumes the operand bytes after the opcode and works out the
    /// effective address, issuing the same dummy reads the chip does.
    pub(crate) fn resolve(
        &mut self,
        mode: AddressingMode,
        access: Access,
        bus: &mut dyn CpuBus,
    ) -> Operand {
        match mode {
            AddressingMode::Implied => Operand::Implied,
            AddressingMode::Accumulator => Operand::Accumulator,
            AddressingMode::Immediate => Operand::Immediate(self.fetch(bus)),
            AddressingMode::Relative => Operand::Relative(self.fetch(bus) as i8),
            AddressingMode::ZeroPage => {
                let addr = self.fetch(bus) as u16;
                memory(addr)
            }
            AddressingMode::ZeroPageX => {
                let base = self.fetch(bus);
                self.read(bus, base as u16);
                memory(base.wrapping_add(self.x) as u16)
            }
            AddressingMode::ZeroPageY => {
                let base = self.fetch(bus);
                self.read(bus, base as u16);
                memory(base.wrapping_add(self.y) as u16)
            }
            AddressingMode::Absolute => {
                let addr = self.fetch_word(bus);
                memory(addr)
            }
            AddressingMode::AbsoluteX => {
                let base = self.fetch_word(bus);
                self.indexed(bus, base, self.x, access)
            }
            AddressingMode::AbsoluteY => {
                let base = self.fetch_word(bus);
                self.indexed(bus, base, self.y, access)
            }
            AddressingMode::IndexedIndirect => {
                let pointer = self.fetch(bus);
                self.read(bus, pointer as u16);
                let pointer = pointer.wrapping_add(self.x);
                memory(self.read_zero_page_word(bus, pointer))
            }
            AddressingMode::IndirectIndexed => {
                let pointer = self.fetch(bus);
                let base = self.read_zero_page_word(bus, pointer);
                self.indexed(bus, base, self.y, access)
            }
            AddressingMode::Indirect => {
                let pointer = self.fetch_word(bus);
                // the high byte is fetched without carrying into the page
                let high_pointer = (pointer & 0xFF00) | (pointer as u8).wrapping_add(1) as u16;
                let low = self.read(bus, pointer) as u16;
                let high = self.read(bus, high_pointer) as u16;
                memory((high << 8) | low)
            }
        }
    }

    fn indexed(&mut self, bus: &mut dyn CpuBus, base: u16, index: u8, access: Access) -> Operand {
        let addr = base.wrapping_add(index as u16);
        let page_crossed = (base & 0xFF00) != (addr & 0xFF00);
        let dummy = match access {
            Access::Read => page_crossed,
            Access::Write | Access::ReadModifyWrite => true,
            Access::None => false,
        };
        if dummy {
            // address formed before the high byte is fixed up
            self.read(bus, (base & 0xFF00) | (addr & 0x00FF));
        }
        Operand::Memory { addr, page_crossed }
    }

    fn fetch_word(&mut self, bus: &mut dyn CpuBus) -> u16 {
        let low = self.fetch(bus) as u16;
        let high = self.fetch(bus) as u16;
        (high << 8) | low
    }

    fn read_zero_page_word(&mut self, bus: &mut dyn CpuBus, pointer: u8) -> u16 {
        let low = self.read(bus, pointer as u16) as u16;
        let high = self.read(bus, pointer.wrapping_add(1) as u16) as u16;
        (high << 8) | low
    }
}

fn memory(addr: u16) -> Operand {
    Operand::Memory {
        addr,
        page_crossed: false,
    }
}
