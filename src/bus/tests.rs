use super::*;
use crate::cartridge::Mirroring;
use crate::memory::{save_ram, work_ram, Memory};
use crate::ppu::memory::video_bus;

/// Claims everything and remembers how often it was hit.
struct Probe {
    value: u8,
    reads: u32,
    writes: u32,
}

impl Device for Probe {
    fn claims(&self, _addr: u16) -> bool {
        true
    }

    fn read(&mut self, _addr: u16) -> u8 {
        self.reads += 1;
        self.value
    }

    fn write(&mut self, _addr: u16, data: u8) {
        self.writes += 1;
        self.value = data;
    }
}

fn probe(value: u8) -> Box<Probe> {
    Box::new(Probe {
        value,
        reads: 0,
        writes: 0,
    })
}

#[test]
fn test_unmapped_access_is_harmless() {
    let mut bus = AddressBus::new("cpu");
    assert_eq!(bus.read(0x4020), UNMAPPED_READ);
    bus.write(0x4020, 0xFF);
    assert_eq!(bus.read(0x4020), UNMAPPED_READ);
    assert_eq!(bus.last_address(), 0x4020);
}

#[test]
fn test_write_then_read_round_trips_for_claimed_addresses() {
    let mut bus = AddressBus::new("cpu");
    bus.attach(Box::new(work_ram()));
    bus.attach(Box::new(save_ram()));

    for addr in (0x0000u16..0x2000).step_by(0x11).chain((0x6000..0x8000).step_by(0x13)) {
        let value = (addr >> 3) as u8 ^ 0xA5;
        bus.write(addr, value);
        assert_eq!(bus.read(addr), value, "addr {:04X}", addr);
    }
}

#[test]
fn test_video_bus_round_trips_chr_ram_nametables_and_palette() {
    let mut bus = video_bus(vec![0; 0x2000], true, Mirroring::Vertical);

    for addr in (0x0000u16..0x4000).step_by(7) {
        bus.write(addr, 0xC5);
        assert_eq!(bus.read(addr), 0xC5, "addr {:04X}", addr);
        bus.write(addr, addr as u8);
        assert_eq!(bus.read(addr), addr as u8, "addr {:04X}", addr);
    }
}

#[test]
fn test_ram_mirroring_through_bus() {
    let mut bus = AddressBus::new("cpu");
    bus.attach(Box::new(work_ram()));

    bus.write(0x0042, 0x99);
    for k in 0..4u16 {
        assert_eq!(bus.read(0x0042 + 0x800 * k), 0x99);
    }
    bus.write(0x1842, 0x17);
    assert_eq!(bus.read(0x0042), 0x17);
}

#[test]
fn test_first_attached_claimant_wins() {
    let mut bus = AddressBus::new("cpu");
    let first = bus.attach(probe(0x11));
    let second = bus.attach(probe(0x22));

    assert_eq!(bus.read(0x1234), 0x11);
    bus.write(0x1234, 0x33);

    assert_eq!(bus.device::<Probe>(first).map(|p| p.writes), Some(1));
    assert_eq!(bus.device::<Probe>(second).map(|p| p.reads), Some(0));
    assert_eq!(bus.device::<Probe>(second).map(|p| p.writes), Some(0));
}

#[test]
fn test_detach_invalidates_handle() {
    let mut bus = AddressBus::new("cpu");
    let first = bus.attach(probe(0x11));
    let second = bus.attach(probe(0x22));

    assert!(bus.detach(first).is_some());
    assert!(!bus.is_attached(first));
    assert!(bus.device::<Probe>(first).is_none());
    assert!(bus.detach(first).is_none());

    // the other device now answers
    assert_eq!(bus.read(0x0000), 0x22);

    // a reused slot does not revive the stale handle
    let third = bus.attach(probe(0x33));
    assert!(bus.device::<Probe>(first).is_none());
    assert!(bus.device::<Probe>(third).is_some());
    assert!(bus.is_attached(second));
}

#[test]
fn test_device_downcast_checks_type() {
    let mut bus = AddressBus::new("video");
    let id = bus.attach(Box::new(Memory::new(0x2000, 0x10)));
    assert!(bus.device::<Probe>(id).is_none());
    assert_eq!(bus.device::<Memory>(id).map(|m| m.len()), Some(0x10));
    if let Some(mem) = bus.device_mut::<Memory>(id) {
        mem.write(0x2001, 0x42);
    }
    assert_eq!(bus.read(0x2001), 0x42);
}
