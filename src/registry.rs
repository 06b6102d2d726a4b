//! Per-container handle registry.
//!
//! Handles are plain values naming a slot in their container's arena together with the slot's
//! generation at the time the handle was minted. Releasing a handle or tearing down the
//! container bumps the generation, so any copy of the old value stops validating. Container ids
//! are never reused, and a handle whose container is gone is invalid regardless of its slot.

use crate::error::{Error, Result};

/// Identifies a loaded container. Zero is never assigned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContainerId(pub(crate) u64);

impl ContainerId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Position of a symbol inside its container: section index and index within that section's
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SymbolRef {
    pub(crate) section: usize,
    pub(crate) index: usize,
}

/// An externally held reference to a minimal symbol.
///
/// The default value was never minted and is always invalid.
#[derive(Debug, Default, PartialEq, Eq, Hash)]
pub struct SymbolHandle {
    container: ContainerId,
    slot: u32,
    generation: u32,
}

impl SymbolHandle {
    pub fn container(&self) -> ContainerId {
        self.container
    }
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    symbol: Option<SymbolRef>,
}

/// Arena of the handles referencing one container's symbols.
#[derive(Debug)]
pub struct HandleRegistry {
    container: ContainerId,
    slots: Vec<Slot>,
    /// Detached slots available for reuse. Has capacity for every slot, so pushing never
    /// allocates.
    free: Vec<u32>,
    live: usize,
    limit: usize,
}

impl HandleRegistry {
    pub fn new(container: ContainerId, limit: usize) -> Self {
        Self {
            container,
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            limit: limit.min(u32::MAX as usize),
        }
    }

    /// Number of handles currently registered.
    pub fn live(&self) -> usize {
        self.live
    }

    pub(crate) fn register(&mut self, symbol: SymbolRef) -> Result<SymbolHandle> {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => self.grow()?,
        };
        let entry = &mut self.slots[slot as usize];
        entry.symbol = Some(symbol);
        self.live += 1;
        Ok(SymbolHandle {
            container: self.container,
            slot,
            generation: entry.generation,
        })
    }

    fn grow(&mut self) -> Result<u32> {
        if self.slots.len() >= self.limit {
            return Err(Error::AllocationFailure);
        }
        let slot = u32::try_from(self.slots.len()).map_err(|_| Error::AllocationFailure)?;
        self.slots
            .try_reserve(1)
            .map_err(|_| Error::AllocationFailure)?;
        let needed = self.slots.len() + 1 - self.free.len();
        self.free
            .try_reserve(needed)
            .map_err(|_| Error::AllocationFailure)?;
        self.slots.push(Slot {
            generation: 1,
            symbol: None,
        });
        Ok(slot)
    }

    /// Looks up the symbol a handle refers to, if the handle is still registered here.
    pub(crate) fn get(&self, handle: &SymbolHandle) -> Result<SymbolRef> {
        if handle.container != self.container {
            return Err(Error::InvalidHandle);
        }
        self.slots
            .get(handle.slot as usize)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.symbol)
            .ok_or(Error::InvalidHandle)
    }

    /// Removes one handle, leaving all others untouched. Returns whether it was registered.
    pub(crate) fn unregister(&mut self, handle: &SymbolHandle) -> bool {
        if self.get(handle).is_err() {
            return false;
        }
        self.detach(handle.slot);
        self.live -= 1;
        true
    }

    /// Invalidates every registered handle. Calling it again is a no-op. Returns how many
    /// handles were invalidated.
    pub(crate) fn invalidate_all(&mut self) -> usize {
        let mut invalidated = 0;
        for slot in 0..self.slots.len() {
            if self.slots[slot].symbol.is_some() {
                self.detach(slot as u32);
                invalidated += 1;
            }
        }
        self.live = 0;
        invalidated
    }

    fn detach(&mut self, slot: u32) {
        let entry = &mut self.slots[slot as usize];
        entry.symbol = None;
        entry.generation = entry.generation.wrapping_add(1);
        // A slot whose generation would wrap is retired instead of risking a stale match.
        if entry.generation != 0 {
            self.free.push(slot);
        }
    }
}
