//! Sections and the per-container address space index.
//!
//! A container's sections are kept sorted by their declared start address. Lookups first
//! consult overlay sections (whose runtime range may differ from the declared one), then
//! binary search the plain sections.

use std::ops::Range;

use crate::error::{Error, Result};
use crate::symbol::{MinimalSymbol, SymbolTable};

/// Runtime placement of an overlay-mapped section.
///
/// While mapped, the section's contents live at `runtime_start..runtime_end` instead of at the
/// address range the symbol table was built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlay {
    pub runtime_start: u64,
    pub runtime_end: u64,
}

impl Overlay {
    pub fn new(runtime: Range<u64>) -> Self {
        Self {
            runtime_start: runtime.start,
            runtime_end: runtime.end,
        }
    }

    fn contains(&self, raw: u64) -> bool {
        self.runtime_start <= raw && raw < self.runtime_end
    }
}

/// A section as handed over by the loader, before it is indexed.
#[derive(Debug, Clone)]
pub struct SectionImage {
    pub name: String,
    pub range: Range<u64>,
    pub overlay: Option<Overlay>,
    /// Symbols in original table order. Sorted when the section is indexed.
    pub symbols: Vec<MinimalSymbol>,
}

impl SectionImage {
    pub fn new(name: impl Into<String>, range: Range<u64>) -> Self {
        Self {
            name: name.into(),
            range,
            overlay: None,
            symbols: Vec::new(),
        }
    }

    pub fn with_overlay(mut self, overlay: Overlay) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn with_symbol(mut self, name: impl Into<String>, address: u64) -> Self {
        self.symbols.push(MinimalSymbol::new(name, address));
        self
    }
}

/// An indexed, immutable section of a loaded container.
#[derive(Debug)]
pub struct Section {
    name: String,
    start: u64,
    end: u64,
    overlay: Option<Overlay>,
    symbols: SymbolTable,
}

impl Section {
    fn from_image(image: SectionImage) -> Result<Self> {
        let Range { start, end } = image.range;
        if start >= end {
            return Err(Error::EmptySection { start, end });
        }
        Ok(Self {
            name: image.name,
            start,
            end,
            overlay: image.overlay,
            symbols: SymbolTable::new(image.symbols),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn end(&self) -> u64 {
        self.end
    }

    pub fn overlay(&self) -> Option<Overlay> {
        self.overlay
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Whether `address` lies in the declared range the symbols were built against.
    pub fn contains(&self, address: u64) -> bool {
        self.start <= address && address < self.end
    }

    /// Converts a raw runtime address into the address space the symbol table uses.
    ///
    /// Identity for plain sections. For overlay sections the offset into the runtime range is
    /// applied to the declared start; the result may land past `end` when the overlay's runtime
    /// range is larger than the section, and callers must bounds check it.
    pub fn translate(&self, raw: u64) -> u64 {
        match self.overlay {
            Some(overlay) if overlay.contains(raw) => {
                self.start.saturating_add(raw - overlay.runtime_start)
            }
            _ => raw,
        }
    }
}

/// All sections of one container, ordered by start address.
#[derive(Debug)]
pub struct AddressSpace {
    sections: Vec<Section>,
    /// Indices into `sections` of the overlay-mapped ones, in declaration order.
    overlays: Vec<usize>,
}

impl AddressSpace {
    pub fn new(images: Vec<SectionImage>) -> Result<Self> {
        let mut sections = images
            .into_iter()
            .map(Section::from_image)
            .collect::<Result<Vec<_>>>()?;
        sections.sort_by_key(|section| section.start);

        for pair in sections.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            if second.start < first.end {
                return Err(Error::OverlappingSections {
                    first: (first.start, first.end),
                    second: (second.start, second.end),
                });
            }
        }

        let overlays = sections
            .iter()
            .enumerate()
            .filter(|(_, section)| section.overlay.is_some())
            .map(|(index, _)| index)
            .collect();

        Ok(Self { sections, overlays })
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// Finds the section whose runtime range holds `raw`, returning its index.
    pub fn find_section(&self, raw: u64) -> Option<usize> {
        let mapped = self.overlays.iter().copied().find(|&index| {
            self.sections[index]
                .overlay
                .is_some_and(|overlay| overlay.contains(raw))
        });
        if mapped.is_some() {
            return mapped;
        }

        // First section starting after `raw`; the candidate is the one before it.
        let after = self.sections.partition_point(|section| section.start <= raw);
        let index = after.checked_sub(1)?;
        let section = &self.sections[index];
        (section.overlay.is_none() && section.contains(raw)).then_some(index)
    }

    pub(crate) fn symbol(&self, section: usize, index: usize) -> Option<&MinimalSymbol> {
        self.sections.get(section)?.symbols.get(index)
    }
}
