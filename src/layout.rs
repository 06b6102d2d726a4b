//! Address assignment for relocatable inputs.
//!
//! Relocatable objects carry section-relative symbols and no load addresses. `Placement` lays
//! their sections out one after another from a base address, starting each object on a fresh
//! page, so that their symbols can be looked up as if the objects had been loaded.

pub const PAGE_SIZE: u64 = 0x1000;
pub const DEFAULT_BASE: u64 = 0x400000;

/// Rounds `addr` up to a multiple of `align`. An alignment of zero means unaligned.
pub fn align_up(addr: u64, align: u64) -> Option<u64> {
    addr.checked_next_multiple_of(align.max(1))
}

#[derive(Debug, Clone)]
pub struct Placement {
    cursor: u64,
}

impl Placement {
    pub fn new(base: u64) -> Self {
        Self { cursor: base }
    }

    /// Moves to the next page boundary. Called once per object before placing its sections.
    pub fn begin_object(&mut self) -> Option<u64> {
        self.cursor = align_up(self.cursor, PAGE_SIZE)?;
        Some(self.cursor)
    }

    /// Reserves `size` bytes at the next suitably aligned address and returns that address.
    pub fn place(&mut self, size: u64, align: u64) -> Option<u64> {
        let start = align_up(self.cursor, align)?;
        self.cursor = start.checked_add(size)?;
        Some(start)
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::new(DEFAULT_BASE)
    }
}
