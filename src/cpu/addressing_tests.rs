use super::*;

#[test]
fn test_zero_page_x_wraps_inside_page_zero() {
    // LDA $F0,X with X=$20 reads $0010
    let (mut cpu, mut bus) = run(&[0xB5, 0xF0]);
    cpu.x = 0x20;
    bus.memory[0x0010] = 0x99;
    bus.memory[0x0110] = 0x11;

    assert_eq!(cpu.step(&mut bus), 4);
    assert_eq!(cpu.a, 0x99);
}

#[test]
fn test_zero_page_y() {
    // LDX $10,Y
    let (mut cpu, mut bus) = run(&[0xB6, 0x10]);
    cpu.y = 0x05;
    bus.memory[0x15] = 0x42;

    assert_eq!(cpu.step(&mut bus), 4);
    assert_eq!(cpu.x, 0x42);
}

#[test]
fn test_absolute_y_page_cross() {
    // LDA $20F0,Y with Y=$20
    let (mut cpu, mut bus) = run(&[0xB9, 0xF0, 0x20]);
    cpu.y = 0x20;
    bus.memory[0x2110] = 0x7E;

    assert_eq!(cpu.step(&mut bus), 5);
    assert_eq!(cpu.a, 0x7E);
}

#[test]
fn test_indexed_indirect_pointer_wraps() {
    // LDA ($FE,X) with X=$01 takes the pointer from $FF/$00
    let (mut cpu, mut bus) = run(&[0xA1, 0xFE]);
    cpu.x = 0x01;
    bus.memory[0x00FF] = 0x34;
    bus.memory[0x0000] = 0x12;
    bus.memory[0x1234] = 0xAB;

    assert_eq!(cpu.step(&mut bus), 6);
    assert_eq!(cpu.a, 0xAB);
}

#[test]
fn test_indirect_indexed_page_cross() {
    // LDA ($40),Y
    let (mut cpu, mut bus) = run(&[0xB1, 0x40, 0xB1, 0x40]);
    bus.memory[0x40] = 0xF0;
    bus.memory[0x41] = 0x10;
    bus.memory[0x1100] = 0x01;
    bus.memory[0x10F1] = 0x02;

    cpu.y = 0x10;
    assert_eq!(cpu.step(&mut bus), 6);
    assert_eq!(cpu.a, 0x01);

    cpu.y = 0x01;
    assert_eq!(cpu.step(&mut bus), 5);
    assert_eq!(cpu.a, 0x02);
}

#[test]
fn test_indirect_indexed_store_never_adds_a_cycle() {
    // STA ($40),Y across a page
    let (mut cpu, mut bus) = run(&[0x91, 0x40]);
    bus.memory[0x40] = 0xFF;
    bus.memory[0x41] = 0x02;
    cpu.y = 0x01;
    cpu.a = 0x66;

    assert_eq!(cpu.step(&mut bus), 6);
    assert_eq!(bus.memory[0x0300], 0x66);
}

#[test]
fn test_jmp_indirect_does_not_carry_into_high_byte() {
    // JMP ($02FF) fetches the high byte from $0200
    let (mut cpu, mut bus) = run(&[0x6C, 0xFF, 0x02]);
    bus.memory[0x02FF] = 0x00;
    bus.memory[0x0200] = 0x90;
    bus.memory[0x0300] = 0xA0;

    assert_eq!(cpu.step(&mut bus), 5);
    assert_eq!(cpu.pc, 0x9000);
}

#[test]
fn test_jmp_absolute() {
    let (mut cpu, mut bus) = run(&[0x4C, 0x34, 0x12]);
    assert_eq!(cpu.step(&mut bus), 3);
    assert_eq!(cpu.pc, 0x1234);
}

#[test]
fn test_absolute_x_rmw_reads_unfixed_address_first() {
    // INC $12F0,X with X=$20 touches $1210 before the real $1310
    let (mut cpu, mut bus) = run(&[0xFE, 0xF0, 0x12]);
    cpu.x = 0x20;
    bus.memory[0x1310] = 0x01;

    assert_eq!(cpu.step(&mut bus), 7);
    assert_eq!(bus.memory[0x1310], 0x02);
    assert_eq!(bus.writes, vec![(0x1310, 0x01), (0x1310, 0x02)]);
}

#[test]
fn test_resolve_is_repeatable_for_every_mode() {
    let modes = [
        AddressingMode::Implied,
        AddressingMode::Accumulator,
        AddressingMode::Immediate,
        AddressingMode::ZeroPage,
        AddressingMode::ZeroPageX,
        AddressingMode::ZeroPageY,
        AddressingMode::Absolute,
        AddressingMode::AbsoluteX,
        AddressingMode::AbsoluteY,
        AddressingMode::Relative,
        AddressingMode::IndexedIndirect,
        AddressingMode::IndirectIndexed,
        AddressingMode::Indirect,
    ];

    for mode in modes {
        let (mut cpu, mut bus) = run(&[0xC5, 0x80]);
        bus.memory[0x00C5] = 0x10;
        bus.memory[0x00C6] = 0x22;
        bus.memory[0x00D0] = 0xEF;
        bus.memory[0x00D1] = 0x33;
        bus.memory[0x80C5] = 0x44;
        cpu.x = 0x0B;
        cpu.y = 0x21;

        let first = cpu.resolve(mode, Access::Read, &mut bus);
        let consumed = cpu.pc - 0x8000;
        cpu.pc = 0x8000;
        let second = cpu.resolve(mode, Access::Read, &mut bus);

        assert_eq!(first, second, "{:?}", mode);
        assert_eq!(consumed, mode.operand_bytes() as u16, "{:?}", mode);
        assert_eq!(cpu.pc - 0x8000, consumed, "{:?}", mode);
    }
}
