//! Error types for symbol lookup and handle access.

use thiserror::Error;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors reported by the symbol session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The address is not inside any loaded section, or no symbol precedes it in its section.
    #[error("no symbol at or before 0x{address:x}")]
    NotFound { address: u64 },

    /// The handle's container has been unloaded, the handle was released, or it was never minted.
    #[error("symbol handle is invalid")]
    InvalidHandle,

    /// The container's handle arena could not grow.
    #[error("failed to allocate a symbol handle")]
    AllocationFailure,

    /// A section with an empty or inverted address range.
    #[error("section range 0x{start:x}..0x{end:x} is empty")]
    EmptySection { start: u64, end: u64 },

    /// Two sections of the same container share addresses.
    #[error("sections overlap: 0x{:x}..0x{:x} and 0x{:x}..0x{:x}", first.0, first.1, second.0, second.1)]
    OverlappingSections { first: (u64, u64), second: (u64, u64) },
}
