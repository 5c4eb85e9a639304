use super::opcodes::Instruction;
use super::{Cpu, StatusFlags};

impl Cpu {
    pub(super) fn execute_read(&mut self, instruction: Instruction, value: u8) {
        use Instruction::*;

        match instruction {
            Adc => self.adc(value),
            Sbc => self.sbc(value),
            And => self.and(value),
            Ora => self.ora(value),
            Eor => self.eor(value),
            Bit => self.bit(value),
            Cmp => self.compare(self.a, value),
            Cpx => self.compare(self.x, value),
            Cpy => self.compare(self.y, value),
            Lda => {
                self.a = value;
                self.set_zero_negative_flags(value);
            }
            Ldx => {
                self.x = value;
                self.set_zero_negative_flags(value);
            }
            Ldy => {
                self.y = value;
                self.set_zero_negative_flags(value);
            }
            Lax => {
                self.a = value;
                self.x = value;
                self.set_zero_negative_flags(value);
            }
            Anc => {
                self.and(value);
                let negative = self.status.contains(StatusFlags::NEGATIVE);
                self.status.set(StatusFlags::CARRY, negative);
            }
            Alr => {
                self.and(value);
                self.a = self.lsr(self.a);
            }
            Arr => {
                let carry_in = if self.status.contains(StatusFlags::CARRY) { 0x80 } else { 0 };
                self.a = ((self.a & value) >> 1) | carry_in;
                self.set_zero_negative_flags(self.a);
                let bit6 = self.a & 0x40 != 0;
                let bit5 = self.a & 0x20 != 0;
                self.status.set(StatusFlags::CARRY, bit6);
                self.status.set(StatusFlags::OVERFLOW, bit6 ^ bit5);
            }
            Axs => {
                let masked = self.a & self.x;
                self.status.set(StatusFlags::CARRY, masked >= value);
                self.x = masked.wrapping_sub(value);
                self.set_zero_negative_flags(self.x);
            }
            _ => {}
        }
    }

    /// Returns the value written back to the operand.
    pub(super) fn execute_rmw(&mut self, instruction: Instruction, value: u8) -> u8 {
        use Instruction::*;

        match instruction {
            Asl => self.asl(value),
            Lsr => self.lsr(value),
            Rol => self.rol(value),
            Ror => self.ror(value),
            Inc => {
                let result = value.wrapping_add(1);
                self.set_zero_negative_flags(result);
                result
            }
            Dec => {
                let result = value.wrapping_sub(1);
                self.set_zero_negative_flags(result);
                result
            }
            Dcp => {
                let result = value.wrapping_sub(1);
                self.compare(self.a, result);
                result
            }
            Isb => {
                let result = value.wrapping_add(1);
                self.sbc(result);
                result
            }
            Slo => {
                let result = self.asl(value);
                self.ora(result);
                result
            }
            Rla => {
                let result = self.rol(value);
                self.and(result);
                result
            }
            Sre => {
                let result = self.lsr(value);
                self.eor(result);
                result
            }
            Rra => {
                let result = self.ror(value);
                self.adc(result);
                result
            }
            _ => value,
        }
    }

    pub(super) fn set_zero_negative_flags(&mut self, value: u8) {
        self.status.set(StatusFlags::ZERO, value == 0);
        self.status.set(StatusFlags::NEGATIVE, value & 0x80 != 0);
    }

    // Binary only; the 2A03 has no decimal unit.
    fn adc(&mut self, value: u8) {
        let carry = self.status.contains(StatusFlags::CARRY) as u16;
        let sum = self.a as u16 + value as u16 + carry;
        let result = sum as u8;

        self.status.set(StatusFlags::CARRY, sum > 0xFF);
        self.status.set(
            StatusFlags::OVERFLOW,
            (!(self.a ^ value) & (self.a ^ result) & 0x80) != 0,
        );
        self.a = result;
        self.set_zero_negative_flags(result);
    }

    fn sbc(&mut self, value: u8) {
        self.adc(!value);
    }

    fn and(&mut self, value: u8) {
        self.a &= value;
        self.set_zero_negative_flags(self.a);
    }

    fn ora(&mut self, value: u8) {
        self.a |= value;
        self.set_zero_negative_flags(self.a);
    }

    fn eor(&mut self, value: u8) {
        self.a ^= value;
        self.set_zero_negative_flags(self.a);
    }

    fn bit(&mut self, value: u8) {
        self.status.set(StatusFlags::ZERO, self.a & value == 0);
        self.status.set(StatusFlags::OVERFLOW, value & 0x40 != 0);
        self.status.set(StatusFlags::NEGATIVE, value & 0x80 != 0);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.status.set(StatusFlags::CARRY, register >= value);
        self.set_zero_negative_flags(register.wrapping_sub(value));
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.status.set(StatusFlags::CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.set_zero_negative_flags(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.status.set(StatusFlags::CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.set_zero_negative_flags(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = self.status.contains(StatusFlags::CARRY) as u8;
        self.status.set(StatusFlags::CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.set_zero_negative_flags(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = if self.status.contains(StatusFlags::CARRY) { 0x80 } else { 0 };
        self.status.set(StatusFlags::CARRY, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.set_zero_negative_flags(result);
        result
    }
}
