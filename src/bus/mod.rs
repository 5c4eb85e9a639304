//! Address bus with device dispatch.
//!
//! A bus owns the devices attached to it in an arena. Every access is routed
//! to the first attached device (in attachment order) whose `claims` returns
//! true. Unclaimed reads return 0 and unclaimed writes are dropped.

use std::any::Any;

use crate::cpu::CpuBus;

#[cfg(test)]
mod tests;

/// Value returned for reads nothing on the bus answers.
pub const UNMAPPED_READ: u8 = 0;

/// Object-safe access to `Any` for boxed units, so the owner of an arena can
/// hand out typed references to what it holds.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Something that answers a range of bus addresses.
pub trait Device: AsAny {
    fn claims(&self, addr: u16) -> bool;
    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, data: u8);
}

/// Handle to an attached device. Stale once the device is detached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId {
    index: usize,
    generation: u32,
}

struct Slot {
    device: Option<Box<dyn Device>>,
    generation: u32,
}

pub struct AddressBus {
    name: &'static str,
    address: u16,
    slots: Vec<Slot>,
    // attachment order, indices into `slots`
    order: Vec<usize>,
}

impl AddressBus {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            address: 0,
            slots: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn attach(&mut self, device: Box<dyn Device>) -> DeviceId {
        let index = match self.slots.iter().position(|s| s.device.is_none()) {
            Some(free) => {
                self.slots[free].device = Some(device);
                free
            }
            None => {
                self.slots.push(Slot {
                    device: Some(device),
                    generation: 0,
                });
                self.slots.len() - 1
            }
        };
        self.order.push(index);
        log::debug!("{} bus: attached device in slot {}", self.name, index);
        DeviceId {
            index,
            generation: self.slots[index].generation,
        }
    }

    /// Removes the device and invalidates `id`.
    pub fn detach(&mut self, id: DeviceId) -> Option<Box<dyn Device>> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        let device = slot.device.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.order.retain(|&i| i != id.index);
        log::debug!("{} bus: detached device from slot {}", self.name, id.index);
        Some(device)
    }

    pub fn is_attached(&self, id: DeviceId) -> bool {
        self.slot(id).is_some()
    }

    pub fn device<T: Device>(&self, id: DeviceId) -> Option<&T> {
        <dyn Device as AsAny>::as_any(self.slot(id)?).downcast_ref::<T>()
    }

    pub fn device_mut<T: Device>(&mut self, id: DeviceId) -> Option<&mut T> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        let device = slot.device.as_deref_mut()?;
        <dyn Device as AsAny>::as_any_mut(device).downcast_mut::<T>()
    }

    /// Address most recently driven onto the bus.
    pub fn last_address(&self) -> u16 {
        self.address
    }

    pub fn read(&mut self, addr: u16) -> u8 {
        self.address = addr;
        match self.claimant(addr) {
            Some(index) => match self.slots[index].device.as_mut() {
                Some(device) => device.read(addr),
                None => UNMAPPED_READ,
            },
            None => UNMAPPED_READ,
        }
    }

    pub fn write(&mut self, addr: u16, data: u8) {
        self.address = addr;
        if let Some(index) = self.claimant(addr) {
            if let Some(device) = self.slots[index].device.as_mut() {
                device.write(addr, data);
            }
        }
    }

    fn claimant(&self, addr: u16) -> Option<usize> {
        self.order.iter().copied().find(|&i| {
            self.slots[i]
                .device
                .as_ref()
                .is_some_and(|d| d.claims(addr))
        })
    }

    fn slot(&self, id: DeviceId) -> Option<&(dyn Device + 'static)> {
        let slot = self.slots.get(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.device.as_deref()
    }
}

impl CpuBus for AddressBus {
    fn read(&mut self, addr: u16) -> u8 {
        AddressBus::read(self, addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        AddressBus::write(self, addr, data)
    }
}
