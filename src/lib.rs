//! Minimal symbol lookup library.
//!
//! This library resolves raw addresses to the nearest preceding minimal symbol and hands out
//! handles that report themselves invalid once the symbol's container is unloaded.
//! It is organized into several modules:
//! - `section`: Sections, overlay translation and the per-container address space index.
//! - `symbol`: Minimal symbols and per-section symbol tables.
//! - `registry`: Handle arenas with generation-checked slots.
//! - `session`: Lookup service and container load/unload notifications.
//! - `loader`: Container images from object files and archives.
//! - `layout`: Address assignment for relocatable inputs.
//! - `config`: CLI configuration.

pub mod config;
pub mod error;
pub mod layout;
pub mod loader;
pub mod registry;
pub mod section;
pub mod session;
pub mod symbol;

pub use error::{Error, Result};
pub use registry::{ContainerId, SymbolHandle};
pub use section::{Overlay, SectionImage};
pub use session::{ContainerImage, SessionOptions, SymbolSession};
pub use symbol::MinimalSymbol;
