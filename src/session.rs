//! Symbol lookup session.
//!
//! `SymbolSession` owns every loaded container: its sections, their minimal symbol tables, and
//! the registry of handles minted against them. The host loader announces containers with
//! [`SymbolSession::notify_container_loaded`] and must call
//! [`SymbolSession::notify_container_unloaded`] before discarding one. Unloading invalidates all
//! of the container's handles before it returns.

use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::registry::{ContainerId, HandleRegistry, SymbolHandle, SymbolRef};
use crate::section::{AddressSpace, Section, SectionImage};
use crate::symbol::MinimalSymbol;

/// A container as produced by the loader.
#[derive(Debug, Clone)]
pub struct ContainerImage {
    pub name: String,
    pub sections: Vec<SectionImage>,
}

impl ContainerImage {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sections: Vec::new(),
        }
    }

    pub fn with_section(mut self, section: SectionImage) -> Self {
        self.sections.push(section);
        self
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    /// Maximum number of simultaneously registered handles per container.
    pub handle_limit: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            handle_limit: u32::MAX as usize,
        }
    }
}

#[derive(Debug)]
struct Container {
    id: ContainerId,
    name: String,
    space: AddressSpace,
    registry: HandleRegistry,
}

#[derive(Debug, Default)]
pub struct SymbolSession {
    /// Live containers in load order, which is also ascending id order.
    containers: Vec<Container>,
    last_id: u64,
    options: SessionOptions,
}

impl SymbolSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: SessionOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    /// Indexes a container's sections and symbols and makes them visible to lookups.
    pub fn notify_container_loaded(&mut self, image: ContainerImage) -> Result<ContainerId> {
        let space = AddressSpace::new(image.sections)?;
        self.last_id += 1;
        let id = ContainerId(self.last_id);
        debug!(
            container = id.get(),
            name = %image.name,
            sections = space.sections().len(),
            symbols = space.sections().iter().map(|s| s.symbols().len()).sum::<usize>(),
            "container loaded"
        );
        self.containers.push(Container {
            id,
            name: image.name,
            space,
            registry: HandleRegistry::new(id, self.options.handle_limit),
        });
        Ok(id)
    }

    /// Tears down a container, invalidating every handle minted against it. Returns the number
    /// of handles invalidated. Unknown or already unloaded containers are ignored.
    pub fn notify_container_unloaded(&mut self, id: ContainerId) -> usize {
        let Ok(position) = self.position(id) else {
            trace!(container = id.get(), "container already unloaded");
            return 0;
        };
        let mut container = self.containers.remove(position);
        let invalidated = container.registry.invalidate_all();
        debug!(
            container = id.get(),
            name = %container.name,
            invalidated,
            "container unloaded"
        );
        invalidated
    }

    /// Ids and names of the live containers, in load order.
    pub fn containers(&self) -> impl Iterator<Item = (ContainerId, &str)> {
        self.containers.iter().map(|c| (c.id, c.name.as_str()))
    }

    /// Number of registered handles for `id`, or zero if it isn't loaded.
    pub fn live_handles(&self, id: ContainerId) -> usize {
        self.container(id).map_or(0, |c| c.registry.live())
    }

    /// Finds the section whose runtime range holds `raw`, searching containers in load order.
    pub fn find_section(&self, raw: u64) -> Option<&Section> {
        self.containers
            .iter()
            .find_map(|c| c.space.find_section(raw).and_then(|i| c.space.section(i)))
    }

    /// Resolves `raw` to its nearest preceding minimal symbol without minting a handle.
    pub fn lookup(&self, raw: u64) -> Result<&MinimalSymbol> {
        let (position, symbol) = self.locate(raw)?;
        self.containers[position]
            .space
            .symbol(symbol.section, symbol.index)
            .ok_or(Error::NotFound { address: raw })
    }

    /// Resolves `raw` and mints a handle to the symbol found.
    pub fn resolve(&mut self, raw: u64) -> Result<SymbolHandle> {
        let (position, symbol) = self.locate(raw)?;
        self.containers[position].registry.register(symbol)
    }

    fn locate(&self, raw: u64) -> Result<(usize, SymbolRef)> {
        let not_found = Error::NotFound { address: raw };
        for (position, container) in self.containers.iter().enumerate() {
            let Some(section_index) = container.space.find_section(raw) else {
                continue;
            };
            let Some(section) = container.space.section(section_index) else {
                continue;
            };
            let logical = section.translate(raw);
            if !section.contains(logical) {
                trace!(raw, logical, section = section.name(), "overlay maps outside section");
                return Err(not_found);
            }
            let Some(index) = section.symbols().nearest_at_or_before(logical) else {
                trace!(raw, section = section.name(), "no preceding symbol");
                return Err(not_found);
            };
            trace!(raw, logical, container = container.id.get(), index, "resolved");
            return Ok((
                position,
                SymbolRef {
                    section: section_index,
                    index,
                },
            ));
        }
        trace!(raw, "address outside all sections");
        Err(not_found)
    }

    /// Releases a handle before its container is unloaded. Other handles are unaffected.
    pub fn release(&mut self, handle: SymbolHandle) {
        if let Ok(position) = self.position(handle.container()) {
            self.containers[position].registry.unregister(&handle);
        }
    }

    pub fn is_valid(&self, handle: &SymbolHandle) -> bool {
        self.symbol(handle).is_ok()
    }

    /// The symbol behind `handle`, or `InvalidHandle` if it no longer refers to one.
    pub fn symbol(&self, handle: &SymbolHandle) -> Result<&MinimalSymbol> {
        let container = self
            .container(handle.container())
            .ok_or(Error::InvalidHandle)?;
        let symbol = container.registry.get(handle)?;
        container
            .space
            .symbol(symbol.section, symbol.index)
            .ok_or(Error::InvalidHandle)
    }

    pub fn name(&self, handle: &SymbolHandle) -> Result<String> {
        Ok(self.symbol(handle)?.name().to_owned())
    }

    /// The symbol's address as stored in its table.
    pub fn address(&self, handle: &SymbolHandle) -> Result<u64> {
        Ok(self.symbol(handle)?.address())
    }

    /// Display form of a handle. Same as its name.
    pub fn display(&self, handle: &SymbolHandle) -> Result<String> {
        self.name(handle)
    }

    fn position(&self, id: ContainerId) -> Result<usize, usize> {
        self.containers.binary_search_by_key(&id, |c| c.id)
    }

    fn container(&self, id: ContainerId) -> Option<&Container> {
        self.position(id).ok().map(|position| &self.containers[position])
    }
}
