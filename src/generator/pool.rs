//! Generator lease pool
//!
//! Stations borrow generators through [`GeneratorLease`] tokens. A lease is
//! neither `Clone` nor `Copy` and `release` consumes it, so a generator can
//! only be handed back once and only by whoever holds it.

use super::wavegen::{Generator, GeneratorCommand};
use crate::config::GENERATOR_COUNT;
use crate::types::StationId;
use heapless::Vec;

/// Exclusive right to drive one generator
#[derive(Debug, PartialEq, Eq)]
pub struct GeneratorLease {
    slot: u8,
}

impl GeneratorLease {
    /// Pool slot this lease refers to
    #[must_use]
    pub const fn slot(&self) -> usize {
        self.slot as usize
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for GeneratorLease {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "gen{}", self.slot);
    }
}

#[derive(Debug)]
struct Slot {
    generator: Generator,
    holder: Option<StationId>,
}

/// Fixed set of generators with first-fit leasing
#[derive(Debug)]
pub struct GeneratorPool {
    slots: Vec<Slot, GENERATOR_COUNT>,
}

impl Default for GeneratorPool {
    fn default() -> Self {
        Self::new(GENERATOR_COUNT)
    }
}

impl GeneratorPool {
    /// Pool of `count` generators (capped at the board's generator count)
    #[must_use]
    pub fn new(count: usize) -> Self {
        let mut slots = Vec::new();
        for _ in 0..count.min(GENERATOR_COUNT) {
            let _ = slots.push(Slot {
                generator: Generator::new(),
                holder: None,
            });
        }
        Self { slots }
    }

    /// Lease the lowest-indexed free generator
    #[allow(clippy::cast_possible_truncation)]
    pub fn acquire(&mut self, requester: StationId) -> Option<GeneratorLease> {
        let Some(index) = self.slots.iter().position(|s| s.holder.is_none()) else {
            trace!("pool exhausted for {}", requester);
            return None;
        };
        self.slots[index].holder = Some(requester);
        trace!("gen{} -> {}", index, requester);
        Some(GeneratorLease { slot: index as u8 })
    }

    /// Lease two generators at once, or none at all
    #[allow(clippy::cast_possible_truncation)]
    pub fn acquire_pair(&mut self, requester: StationId) -> Option<(GeneratorLease, GeneratorLease)> {
        let mut free = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.holder.is_none())
            .map(|(i, _)| i);
        let (Some(first), Some(second)) = (free.next(), free.next()) else {
            trace!("no generator pair for {}", requester);
            return None;
        };
        self.slots[first].holder = Some(requester);
        self.slots[second].holder = Some(requester);
        Some((
            GeneratorLease { slot: first as u8 },
            GeneratorLease { slot: second as u8 },
        ))
    }

    /// Return a generator to the pool
    ///
    /// `requester` is only checked for diagnostics; the lease itself is the
    /// authority.
    pub fn release(&mut self, lease: GeneratorLease, requester: StationId) {
        let Some(slot) = self.slots.get_mut(lease.slot()) else {
            return;
        };
        if slot.holder != Some(requester) {
            warn!("gen{} released by {} but held by another", lease.slot(), requester);
        }
        slot.holder = None;
        trace!("gen{} released by {}", lease.slot(), requester);
    }

    /// Generator behind a lease
    pub fn generator_mut(&mut self, lease: &GeneratorLease) -> Option<&mut Generator> {
        self.slots.get_mut(lease.slot()).map(|s| &mut s.generator)
    }

    /// Generator in a slot, for inspection
    #[must_use]
    pub fn generator(&self, slot: usize) -> Option<&Generator> {
        self.slots.get(slot).map(|s| &s.generator)
    }

    /// Station currently holding a slot
    #[must_use]
    pub fn holder(&self, slot: usize) -> Option<StationId> {
        self.slots.get(slot).and_then(|s| s.holder)
    }

    /// Free generators
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.slots.iter().filter(|s| s.holder.is_none()).count()
    }

    /// All generators
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.slots.len()
    }

    /// Hand every queued hardware write to `apply` as `(slot, command)`
    pub fn drain_commands(&mut self, mut apply: impl FnMut(usize, GeneratorCommand)) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            slot.generator.drain(|command| apply(index, command));
        }
    }

    /// Schedule a full rewrite of every chip nobody holds
    pub fn force_refresh_idle(&mut self) {
        for slot in self.slots.iter_mut().filter(|s| s.holder.is_none()) {
            slot.generator.force_refresh();
        }
    }

    /// Schedule a full rewrite of every chip, held or not
    pub fn force_refresh_all(&mut self) {
        for slot in &mut self.slots {
            slot.generator.force_refresh();
        }
    }
}
