//! The 256-entry opcode table.
//!
//! Every byte value decodes to an entry. Opcodes that jam the real chip or
//! whose behaviour depends on analog bus effects decode to `Opcode::UNKNOWN`,
//! a one-byte, two-cycle no-op.

use AddressingMode::*;
use Instruction::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Relative,
    IndexedIndirect,
    IndirectIndexed,
    Indirect,
}

impl AddressingMode {
    /// Operand bytes following the opcode.
    pub const fn operand_bytes(self) -> u8 {
        match self {
            Implied | Accumulator => 0,
            Immediate | ZeroPage | ZeroPageX | ZeroPageY | Relative | IndexedIndirect
            | IndirectIndexed => 1,
            Absolute | AbsoluteX | AbsoluteY | Indirect => 2,
        }
    }
}

/// How an instruction touches its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// No operand load or store; the executor drives the bus itself.
    None,
    Read,
    Write,
    ReadModifyWrite,
}

#[rustfmt::skip]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Adc, And, Asl, Bcc, Bcs, Beq, Bit, Bmi, Bne, Bpl, Brk, Bvc, Bvs, Clc,
    Cld, Cli, Clv, Cmp, Cpx, Cpy, Dec, Dex, Dey, Eor, Inc, Inx, Iny, Jmp,
    Jsr, Lda, Ldx, Ldy, Lsr, Nop, Ora, Pha, Php, Pla, Plp, Rol, Ror, Rti,
    Rts, Sbc, Sec, Sed, Sei, Sta, Stx, Sty, Tax, Tay, Tsx, Txa, Txs, Tya,
    // stable unofficial opcodes
    Alr, Anc, Arr, Axs, Dcp, Isb, Lax, Rla, Rra, Sax, Slo, Sre,
    Unknown,
}

impl Instruction {
    pub const fn access(self) -> Access {
        match self {
            Adc | And | Bit | Cmp | Cpx | Cpy | Eor | Lda | Ldx | Ldy | Nop | Ora | Sbc
            | Alr | Anc | Arr | Axs | Lax => Access::Read,
            Sta | Stx | Sty | Sax => Access::Write,
            Asl | Dec | Inc | Lsr | Rol | Ror | Dcp | Isb | Rla | Rra | Slo | Sre => {
                Access::ReadModifyWrite
            }
            Bcc | Bcs | Beq | Bmi | Bne | Bpl | Bvc | Bvs | Brk | Clc | Cld | Cli | Clv
            | Dex | Dey | Inx | Iny | Jmp | Jsr | Pha | Php | Pla | Plp | Rti | Rts | Sec
            | Sed | Sei | Tax | Tay | Tsx | Txa | Txs | Tya | Unknown => Access::None,
        }
    }

    #[rustfmt::skip]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Adc => "ADC", And => "AND", Asl => "ASL", Bcc => "BCC", Bcs => "BCS",
            Beq => "BEQ", Bit => "BIT", Bmi => "BMI", Bne => "BNE", Bpl => "BPL",
            Brk => "BRK", Bvc => "BVC", Bvs => "BVS", Clc => "CLC", Cld => "CLD",
            Cli => "CLI", Clv => "CLV", Cmp => "CMP", Cpx => "CPX", Cpy => "CPY",
            Dec => "DEC", Dex => "DEX", Dey => "DEY", Eor => "EOR", Inc => "INC",
            Inx => "INX", Iny => "INY", Jmp => "JMP", Jsr => "JSR", Lda => "LDA",
            Ldx => "LDX", Ldy => "LDY", Lsr => "LSR", Nop => "NOP", Ora => "ORA",
            Pha => "PHA", Php => "PHP", Pla => "PLA", Plp => "PLP", Rol => "ROL",
            Ror => "ROR", Rti => "RTI", Rts => "RTS", Sbc => "SBC", Sec => "SEC",
            Sed => "SED", Sei => "SEI", Sta => "STA", Stx => "STX", Sty => "STY",
            Tax => "TAX", Tay => "TAY", Tsx => "TSX", Txa => "TXA", Txs => "TXS",
            Tya => "TYA", Alr => "ALR", Anc => "ANC", Arr => "ARR", Axs => "AXS",
            Dcp => "DCP", Isb => "ISB", Lax => "LAX", Rla => "RLA", Rra => "RRA",
            Sax => "SAX", Slo => "SLO", Sre => "SRE", Unknown => "???",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub instruction: Instruction,
    pub mode: AddressingMode,
    /// Base cost. Page-cross and branch penalties are added at run time.
    pub cycles: u8,
}

impl Opcode {
    pub const UNKNOWN: Opcode = op(Unknown, Implied, 2);

    pub const fn len(self) -> u8 {
        1 + self.mode.operand_bytes()
    }
}

const fn op(instruction: Instruction, mode: AddressingMode, cycles: u8) -> Opcode {
    Opcode {
        instruction,
        mode,
        cycles,
    }
}

pub static OPCODES: [Opcode; 256] = build_table();

const fn build_table() -> [Opcode; 256] {
    let mut table = [Opcode::UNKNOWN; 256];
    let mut code = 0;
    while code < 256 {
        table[code] = decode(code as u8);
        code += 1;
    }
    table
}

const fn decode(code: u8) -> Opcode {
    match code {
        0x00 => op(Brk, Implied, 7),
        0x01 => op(Ora, IndexedIndirect, 6),
        0x03 => op(Slo, IndexedIndirect, 8),
        0x04 => op(Nop, ZeroPage, 3),
        0x05 => op(Ora, ZeroPage, 3),
        0x06 => op(Asl, ZeroPage, 5),
        0x07 => op(Slo, ZeroPage, 5),
        0x08 => op(Php, Implied, 3),
        0x09 => op(Ora, Immediate, 2),
        0x0A => op(Asl, Accumulator, 2),
        0x0B => op(Anc, Immediate, 2),
        0x0C => op(Nop, Absolute, 4),
        0x0D => op(Ora, Absolute, 4),
        0x0E => op(Asl, Absolute, 6),
        0x0F => op(Slo, Absolute, 6),

        0x10 => op(Bpl, Relative, 2),
        0x11 => op(Ora, IndirectIndexed, 5),
        0x13 => op(Slo, IndirectIndexed, 8),
        0x14 => op(Nop, ZeroPageX, 4),
        0x15 => op(Ora, ZeroPageX, 4),
        0x16 => op(Asl, ZeroPageX, 6),
        0x17 => op(Slo, ZeroPageX, 6),
        0x18 => op(Clc, Implied, 2),
        0x19 => op(Ora, AbsoluteY, 4),
        0x1A => op(Nop, Implied, 2),
        0x1B => op(Slo, AbsoluteY, 7),
        0x1C => op(Nop, AbsoluteX, 4),
        0x1D => op(Ora, AbsoluteX, 4),
        0x1E => op(Asl, AbsoluteX, 7),
        0x1F => op(Slo, AbsoluteX, 7),

        0x20 => op(Jsr, Absolute, 6),
        0x21 => op(And, IndexedIndirect, 6),
        0x23 => op(Rla, IndexedIndirect, 8),
        0x24 => op(Bit, ZeroPage, 3),
        0x25 => op(And, ZeroPage, 3),
        0x26 => op(Rol, ZeroPage, 5),
        0x27 => op(Rla, ZeroPage, 5),
        0x28 => op(Plp, Implied, 4),
        0x29 => op(And, Immediate, 2),
        0x2A => op(Rol, Accumulator, 2),
        0x2B => op(Anc, Immediate, 2),
        0x2C => op(Bit, Absolute, 4),
        0x2D => op(And, Absolute, 4),
        0x2E => op(Rol, Absolute, 6),
        0x2F => op(Rla, Absolute, 6),

        0x30 => op(Bmi, Relative, 2),
        0x31 => op(And, IndirectIndexed, 5),
        0x33 => op(Rla, IndirectIndexed, 8),
        0x34 => op(Nop, ZeroPageX, 4),
        0x35 => op(And, ZeroPageX, 4),
        0x36 => op(Rol, ZeroPageX, 6),
        0x37 => op(Rla, ZeroPageX, 6),
        0x38 => op(Sec, Implied, 2),
        0x39 => op(And, AbsoluteY, 4),
        0x3A => op(Nop, Implied, 2),
        0x3B => op(Rla, AbsoluteY, 7),
        0x3C => op(Nop, AbsoluteX, 4),
        0x3D => op(And, AbsoluteX, 4),
        0x3E => op(Rol, AbsoluteX, 7),
        0x3F => op(Rla, AbsoluteX, 7),

        0x40 => op(Rti, Implied, 6),
        0x41 => op(Eor, IndexedIndirect, 6),
        0x43 => op(Sre, IndexedIndirect, 8),
        0x44 => op(Nop, ZeroPage, 3),
        0x45 => op(Eor, ZeroPage, 3),
        0x46 => op(Lsr, ZeroPage, 5),
        0x47 => op(Sre, ZeroPage, 5),
        0x48 => op(Pha, Implied, 3),
        0x49 => op(Eor, Immediate, 2),
        0x4A => op(Lsr, Accumulator, 2),
        0x4B => op(Alr, Immediate, 2),
        0x4C => op(Jmp, Absolute, 3),
        0x4D => op(Eor, Absolute, 4),
        0x4E => op(Lsr, Absolute, 6),
        0x4F => op(Sre, Absolute, 6),

        0x50 => op(Bvc, Relative, 2),
        0x51 => op(Eor, IndirectIndexed, 5),
        0x53 => op(Sre, IndirectIndexed, 8),
        0x54 => op(Nop, ZeroPageX, 4),
        0x55 => op(Eor, ZeroPageX, 4),
        0x56 => op(Lsr, ZeroPageX, 6),
        0x57 => op(Sre, ZeroPageX, 6),
        0x58 => op(Cli, Implied, 2),
        0x59 => op(Eor, AbsoluteY, 4),
        0x5A => op(Nop, Implied, 2),
        0x5B => op(Sre, AbsoluteY, 7),
        0x5C => op(Nop, AbsoluteX, 4),
        0x5D => op(Eor, AbsoluteX, 4),
        0x5E => op(Lsr, AbsoluteX, 7),
        0x5F => op(Sre, AbsoluteX, 7),

        0x60 => op(Rts, Implied, 6),
        0x61 => op(Adc, IndexedIndirect, 6),
        0x63 => op(Rra, IndexedIndirect, 8),
        0x64 => op(Nop, ZeroPage, 3),
        0x65 => op(Adc, ZeroPage, 3),
        0x66 => op(Ror, ZeroPage, 5),
        0x67 => op(Rra, ZeroPage, 5),
        0x68 => op(Pla, Implied, 4),
        0x69 => op(Adc, Immediate, 2),
        0x6A => op(Ror, Accumulator, 2),
        0x6B => op(Arr, Immediate, 2),
        0x6C => op(Jmp, Indirect, 5),
        0x6D => op(Adc, Absolute, 4),
        0x6E => op(Ror, Absolute, 6),
        0x6F => op(Rra, Absolute, 6),

        0x70 => op(Bvs, Relative, 2),
        0x71 => op(Adc, IndirectIndexed, 5),
        0x73 => op(Rra, IndirectIndexed, 8),
        0x74 => op(Nop, ZeroPageX, 4),
        0x75 => op(Adc, ZeroPageX, 4),
        0x76 => op(Ror, ZeroPageX, 6),
        0x77 => op(Rra, ZeroPageX, 6),
        0x78 => op(Sei, Implied, 2),
        0x79 => op(Adc, AbsoluteY, 4),
        0x7A => op(Nop, Implied, 2),
        0x7B => op(Rra, AbsoluteY, 7),
        0x7C => op(Nop, AbsoluteX, 4),
        0x7D => op(Adc, AbsoluteX, 4),
        0x7E => op(Ror, AbsoluteX, 7),
        0x7F => op(Rra, AbsoluteX, 7),

        0x80 => op(Nop, Immediate, 2),
        0x81 => op(Sta, IndexedIndirect, 6),
        0x82 => op(Nop, Immediate, 2),
        0x83 => op(Sax, IndexedIndirect, 6),
        0x84 => op(Sty, ZeroPage, 3),
        0x85 => op(Sta, ZeroPage, 3),
        0x86 => op(Stx, ZeroPage, 3),
        0x87 => op(Sax, ZeroPage, 3),
        0x88 => op(Dey, Implied, 2),
        0x89 => op(Nop, Immediate, 2),
        0x8A => op(Txa, Implied, 2),
        0x8C => op(Sty, Absolute, 4),
        0x8D => op(Sta, Absolute, 4),
        0x8E => op(Stx, Absolute, 4),
        0x8F => op(Sax, Absolute, 4),

        0x90 => op(Bcc, Relative, 2),
        0x91 => op(Sta, IndirectIndexed, 6),
        0x94 => op(Sty, ZeroPageX, 4),
        0x95 => op(Sta, ZeroPageX, 4),
        0x96 => op(Stx, ZeroPageY, 4),
        0x97 => op(Sax, ZeroPageY, 4),
        0x98 => op(Tya, Implied, 2),
        0x99 => op(Sta, AbsoluteY, 5),
        0x9A => op(Txs, Implied, 2),
        0x9D => op(Sta, AbsoluteX, 5),

        0xA0 => op(Ldy, Immediate, 2),
        0xA1 => op(Lda, IndexedIndirect, 6),
        0xA2 => op(Ldx, Immediate, 2),
        0xA3 => op(Lax, IndexedIndirect, 6),
        0xA4 => op(Ldy, ZeroPage, 3),
        0xA5 => op(Lda, ZeroPage, 3),
        0xA6 => op(Ldx, ZeroPage, 3),
        0xA7 => op(Lax, ZeroPage, 3),
        0xA8 => op(Tay, Implied, 2),
        0xA9 => op(Lda, Immediate, 2),
        0xAA => op(Tax, Implied, 2),
        0xAC => op(Ldy, Absolute, 4),
        0xAD => op(Lda, Absolute, 4),
        0xAE => op(Ldx, Absolute, 4),
        0xAF => op(Lax, Absolute, 4),

        0xB0 => op(Bcs, Relative, 2),
        0xB1 => op(Lda, IndirectIndexed, 5),
        0xB3 => op(Lax, IndirectIndexed, 5),
        0xB4 => op(Ldy, ZeroPageX, 4),
        0xB5 => op(Lda, ZeroPageX, 4),
        0xB6 => op(Ldx, ZeroPageY, 4),
        0xB7 => op(Lax, ZeroPageY, 4),
        0xB8 => op(Clv, Implied, 2),
        0xB9 => op(Lda, AbsoluteY, 4),
        0xBA => op(Tsx, Implied, 2),
        0xBC => op(Ldy, AbsoluteX, 4),
        0xBD => op(Lda, AbsoluteX, 4),
        0xBE => op(Ldx, AbsoluteY, 4),
        0xBF => op(Lax, AbsoluteY, 4),

        0xC0 => op(Cpy, Immediate, 2),
        0xC1 => op(Cmp, IndexedIndirect, 6),
        0xC2 => op(Nop, Immediate, 2),
        0xC3 => op(Dcp, IndexedIndirect, 8),
        0xC4 => op(Cpy, ZeroPage, 3),
        0xC5 => op(Cmp, ZeroPage, 3),
        0xC6 => op(Dec, ZeroPage, 5),
        0xC7 => op(Dcp, ZeroPage, 5),
        0xC8 => op(Iny, Implied, 2),
        0xC9 => op(Cmp, Immediate, 2),
        0xCA => op(Dex, Implied, 2),
        0xCB => op(Axs, Immediate, 2),
        0xCC => op(Cpy, Absolute, 4),
        0xCD => op(Cmp, Absolute, 4),
        0xCE => op(Dec, Absolute, 6),
        0xCF => op(Dcp, Absolute, 6),

        0xD0 => op(Bne, Relative, 2),
        0xD1 => op(Cmp, IndirectIndexed, 5),
        0xD3 => op(Dcp, IndirectIndexed, 8),
        0xD4 => op(Nop, ZeroPageX, 4),
        0xD5 => op(Cmp, ZeroPageX, 4),
        0xD6 => op(Dec, ZeroPageX, 6),
        0xD7 => op(Dcp, ZeroPageX, 6),
        0xD8 => op(Cld, Implied, 2),
        0xD9 => op(Cmp, AbsoluteY, 4),
        0xDA => op(Nop, Implied, 2),
        0xDB => op(Dcp, AbsoluteY, 7),
        0xDC => op(Nop, AbsoluteX, 4),
        0xDD => op(Cmp, AbsoluteX, 4),
        0xDE => op(Dec, AbsoluteX, 7),
        0xDF => op(Dcp, AbsoluteX, 7),

        0xE0 => op(Cpx, Immediate, 2),
        0xE1 => op(Sbc, IndexedIndirect, 6),
        0xE2 => op(Nop, Immediate, 2),
        0xE3 => op(Isb, IndexedIndirect, 8),
        0xE4 => op(Cpx, ZeroPage, 3),
        0xE5 => op(Sbc, ZeroPage, 3),
        0xE6 => op(Inc, ZeroPage, 5),
        0xE7 => op(Isb, ZeroPage, 5),
        0xE8 => op(Inx, Implied, 2),
        0xE9 => op(Sbc, Immediate, 2),
        0xEA => op(Nop, Implied, 2),
        0xEB => op(Sbc, Immediate, 2),
        0xEC => op(Cpx, Absolute, 4),
        0xED => op(Sbc, Absolute, 4),
        0xEE => op(Inc, Absolute, 6),
        0xEF => op(Isb, Absolute, 6),

        0xF0 => op(Beq, Relative, 2),
        0xF1 => op(Sbc, IndirectIndexed, 5),
        0xF3 => op(Isb, IndirectIndexed, 8),
        0xF4 => op(Nop, ZeroPageX, 4),
        0xF5 => op(Sbc, ZeroPageX, 4),
        0xF6 => op(Inc, ZeroPageX, 6),
        0xF7 => op(Isb, ZeroPageX, 6),
        0xF8 => op(Sed, Implied, 2),
        0xF9 => op(Sbc, AbsoluteY, 4),
        0xFA => op(Nop, Implied, 2),
        0xFB => op(Isb, AbsoluteY, 7),
        0xFC => op(Nop, AbsoluteX, 4),
        0xFD => op(Sbc, AbsoluteX, 4),
        0xFE => op(Inc, AbsoluteX, 7),
        0xFF => op(Isb, AbsoluteX, 7),

        // JAM: 02 12 22 32 42 52 62 72 92 B2 D2 F2
        // unstable: 8B 93 9B 9C 9E 9F AB BB
        _ => Opcode::UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::AddressingMode::*;
    use super::Instruction::*;

    #[test]
    fn test_table_covers_every_byte() {
        assert_eq!(OPCODES.len(), 256);
        let unknown = OPCODES.iter().filter(|o| o.instruction == Unknown).count();
        assert_eq!(unknown, 20);
    }

    #[test]
    fn test_official_opcode_count() {
        let official = OPCODES
            .iter()
            .enumerate()
            .filter(|(code, o)| {
                !matches!(
                    o.instruction,
                    Alr | Anc | Arr | Axs | Dcp | Isb | Lax | Rla | Rra | Sax | Slo | Sre | Unknown
                ) && !(o.instruction == Nop && *code != 0xEA)
                    && *code != 0xEB
            })
            .count();
        assert_eq!(official, 151);
    }

    #[test]
    fn test_known_entries() {
        assert_eq!(OPCODES[0xA9], op(Lda, Immediate, 2));
        assert_eq!(OPCODES[0x6C], op(Jmp, Indirect, 5));
        assert_eq!(OPCODES[0x91].len(), 2);
        assert_eq!(OPCODES[0x20].len(), 3);
        assert_eq!(OPCODES[0x02], Opcode::UNKNOWN);
        assert_eq!(OPCODES[0x02].len(), 1);
    }

    #[rustfmt::skip]
    #[test]
    fn test_every_mode_appears() {
        for mode in [
            Implied, Accumulator, Immediate, ZeroPage, ZeroPageX, ZeroPageY, Absolute,
            AbsoluteX, AbsoluteY, Relative, IndexedIndirect, IndirectIndexed, Indirect,
        ] {
            assert!(OPCODES.iter().any(|o| o.mode == mode), "{:?} unused", mode);
        }
    }
}
