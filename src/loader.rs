//! Container images from object files.
//!
//! This is the host side of the session: it reads ELF objects (or every member of an `ar`
//! archive) with the `object` crate and turns each into a `ContainerImage` of allocated
//! sections and their minimal symbols.

use std::collections::HashMap;

use anyhow::{Context, Result};
use object::read::archive::ArchiveFile;
use object::read::{Object, ObjectSection, ObjectSymbol, SectionIndex};
use object::{ObjectKind, SectionKind, SymbolKind};

use crate::layout::Placement;
use crate::section::SectionImage;
use crate::session::ContainerImage;
use crate::symbol::MinimalSymbol;

/// Builds one image per object contained in `data`. `name` labels the images; archive members
/// are labelled `name(member)`.
pub fn load_images(
    name: &str,
    data: &[u8],
    placement: &mut Placement,
) -> Result<Vec<ContainerImage>> {
    if !data.starts_with(b"!<arch>\n") {
        let obj = object::File::parse(data)
            .with_context(|| format!("failed to parse object file {name}"))?;
        return Ok(vec![image_from_object(name.to_owned(), &obj, placement)?]);
    }

    let archive = ArchiveFile::parse(data).with_context(|| format!("failed to parse {name}"))?;
    let mut images = Vec::new();
    for member in archive.members() {
        let member = member?;
        let member_name = format!("{name}({})", String::from_utf8_lossy(member.name()));
        let member_data = member.data(data)?;
        let obj = object::File::parse(member_data)
            .with_context(|| format!("failed to parse archive member {member_name}"))?;
        images.push(image_from_object(member_name, &obj, placement)?);
    }
    Ok(images)
}

fn is_loaded(kind: SectionKind) -> bool {
    matches!(
        kind,
        SectionKind::Text
            | SectionKind::Data
            | SectionKind::ReadOnlyData
            | SectionKind::ReadOnlyString
            | SectionKind::UninitializedData
    )
}

/// Builds the image of a single object.
pub fn image_from_object(
    name: String,
    obj: &object::File,
    placement: &mut Placement,
) -> Result<ContainerImage> {
    let relocatable = obj.kind() == ObjectKind::Relocatable;
    if relocatable {
        placement
            .begin_object()
            .context("load address space exhausted")?;
    }

    let mut sections: Vec<(SectionIndex, SectionImage)> = Vec::new();
    for section in obj.sections() {
        let size = section.size();
        let kind = section.kind();
        if size == 0 || !is_loaded(kind) {
            tracing::debug!(
                "Skipping section {} (kind: {:?}, size: {})",
                section.name().unwrap_or("?"),
                kind,
                size
            );
            continue;
        }
        let start = if relocatable {
            placement
                .place(size, section.align())
                .context("load address space exhausted")?
        } else {
            section.address()
        };
        let end = start
            .checked_add(size)
            .with_context(|| format!("section at 0x{start:x} overflows the address space"))?;
        let section_name = section.name().unwrap_or("?");
        sections.push((section.index(), SectionImage::new(section_name, start..end)));
    }

    // TLS templates and similar can share addresses with ordinary sections; keep the first.
    sections.sort_by_key(|(_, section)| section.range.start);
    let mut kept: Vec<(SectionIndex, SectionImage)> = Vec::with_capacity(sections.len());
    for (index, section) in sections {
        if let Some((_, previous)) = kept.last() {
            if section.range.start < previous.range.end {
                tracing::debug!(
                    "Skipping section {} overlapping {} in {}",
                    section.name,
                    previous.name,
                    name
                );
                continue;
            }
        }
        kept.push((index, section));
    }

    let by_index: HashMap<SectionIndex, usize> = kept
        .iter()
        .enumerate()
        .map(|(position, (index, _))| (*index, position))
        .collect();

    for symbol in obj.symbols() {
        if symbol.is_undefined()
            || matches!(
                symbol.kind(),
                SymbolKind::Section | SymbolKind::File | SymbolKind::Tls
            )
        {
            continue;
        }
        let Some(&position) = symbol.section_index().and_then(|i| by_index.get(&i)) else {
            continue;
        };
        let symbol_name = symbol.name()?;
        if symbol_name.is_empty() {
            continue;
        }
        let section = &mut kept[position].1;
        let address = if relocatable {
            section
                .range
                .start
                .checked_add(symbol.address())
                .with_context(|| format!("symbol {symbol_name} overflows the address space"))?
        } else {
            symbol.address()
        };
        section
            .symbols
            .push(MinimalSymbol::new(symbol_name, address));
    }

    Ok(ContainerImage {
        name,
        sections: kept.into_iter().map(|(_, section)| section).collect(),
    })
}
