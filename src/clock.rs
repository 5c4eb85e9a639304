//! Shared oscillator fanning pulses out to the units that run off it.
//!
//! Each consumer is attached with a fixed multiplier. One `tick` runs every
//! consumer, in attachment order, exactly `multiplier` times before moving on
//! to the next one.

use crate::bus::AsAny;

/// A unit driven by the clock. `Ctx` is whatever the units share (buses,
/// interrupt lines) and is lent to each step in turn.
pub trait Tickable<Ctx: ?Sized>: AsAny {
    fn step(&mut self, ctx: &mut Ctx);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TickHandle {
    index: usize,
    generation: u32,
}

struct Consumer<Ctx: ?Sized> {
    unit: Box<dyn Tickable<Ctx>>,
    multiplier: u32,
    steps: u64,
}

struct Slot<Ctx: ?Sized> {
    consumer: Option<Consumer<Ctx>>,
    generation: u32,
}

pub struct Clock<Ctx: ?Sized> {
    slots: Vec<Slot<Ctx>>,
    order: Vec<usize>,
    pulses: u64,
}

impl<Ctx: ?Sized + 'static> Default for Clock<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx: ?Sized + 'static> Clock<Ctx> {
    pub fn new() -> Self {
        Clock {
            slots: Vec::new(),
            order: Vec::new(),
            pulses: 0,
        }
    }

    pub fn attach(&mut self, unit: Box<dyn Tickable<Ctx>>, multiplier: u32) -> TickHandle {
        let consumer = Consumer {
            unit,
            multiplier,
            steps: 0,
        };
        let index = match self.slots.iter().position(|s| s.consumer.is_none()) {
            Some(free) => {
                self.slots[free].consumer = Some(consumer);
                free
            }
            None => {
                self.slots.push(Slot {
                    consumer: Some(consumer),
                    generation: 0,
                });
                self.slots.len() - 1
            }
        };
        self.order.push(index);
        TickHandle {
            index,
            generation: self.slots[index].generation,
        }
    }

    pub fn detach(&mut self, handle: TickHandle) -> Option<Box<dyn Tickable<Ctx>>> {
        let slot = self.slots.get_mut(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        let consumer = slot.consumer.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.order.retain(|&i| i != handle.index);
        Some(consumer.unit)
    }

    /// One oscillator pulse.
    pub fn tick(&mut self, ctx: &mut Ctx) {
        for &index in &self.order {
            if let Some(consumer) = self.slots[index].consumer.as_mut() {
                for _ in 0..consumer.multiplier {
                    consumer.unit.step(ctx);
                }
                consumer.steps += u64::from(consumer.multiplier);
            }
        }
        self.pulses += 1;
    }

    pub fn pulses(&self) -> u64 {
        self.pulses
    }

    /// Step calls made to the consumer so far.
    pub fn steps(&self, handle: TickHandle) -> Option<u64> {
        self.consumer(handle).map(|c| c.steps)
    }

    pub fn multiplier(&self, handle: TickHandle) -> Option<u32> {
        self.consumer(handle).map(|c| c.multiplier)
    }

    pub fn unit<T: Tickable<Ctx>>(&self, handle: TickHandle) -> Option<&T> {
        let unit = self.consumer(handle)?.unit.as_ref();
        <dyn Tickable<Ctx> as AsAny>::as_any(unit).downcast_ref::<T>()
    }

    pub fn unit_mut<T: Tickable<Ctx>>(&mut self, handle: TickHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        let unit = slot.consumer.as_mut()?.unit.as_mut();
        <dyn Tickable<Ctx> as AsAny>::as_any_mut(unit).downcast_mut::<T>()
    }

    fn consumer(&self, handle: TickHandle) -> Option<&Consumer<Ctx>> {
        let slot = self.slots.get(handle.index)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.consumer.as_ref()
    }
}
