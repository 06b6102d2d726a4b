use minisym::layout::Placement;
use minisym::loader::load_images;
use minisym::{Error, SymbolSession};
use object::write::{Object, SectionId, Symbol, SymbolSection};
use object::{
    Architecture, BinaryFormat, Endianness, SectionKind, SymbolFlags, SymbolKind, SymbolScope,
};

fn add_symbol(obj: &mut Object, name: &str, value: u64, section: SectionId, kind: SymbolKind) {
    obj.add_symbol(Symbol {
        name: name.as_bytes().to_vec(),
        value,
        size: 0,
        kind,
        scope: SymbolScope::Linkage,
        weak: false,
        section: SymbolSection::Section(section),
        flags: SymbolFlags::None,
    });
}

/// A relocatable object with 0x40 bytes of text holding `foo` and `bar`, plus 8 bytes of data.
fn relocatable_object() -> Vec<u8> {
    let mut obj = Object::new(BinaryFormat::Elf, Architecture::X86_64, Endianness::Little);
    let text = obj.add_section(Vec::new(), b".text".to_vec(), SectionKind::Text);
    obj.append_section_data(text, &[0x90; 0x40], 16);
    let data = obj.add_section(Vec::new(), b".data".to_vec(), SectionKind::Data);
    obj.append_section_data(data, &[0; 8], 8);

    add_symbol(&mut obj, "foo", 0, text, SymbolKind::Text);
    add_symbol(&mut obj, "bar", 0x20, text, SymbolKind::Text);
    add_symbol(&mut obj, "counter", 0, data, SymbolKind::Data);
    obj.add_symbol(Symbol {
        name: b"external".to_vec(),
        value: 0,
        size: 0,
        kind: SymbolKind::Text,
        scope: SymbolScope::Dynamic,
        weak: false,
        section: SymbolSection::Undefined,
        flags: SymbolFlags::None,
    });
    obj.write().unwrap()
}

#[test]
fn relocatable_objects_are_placed_from_base() {
    let bytes = relocatable_object();
    let mut placement = Placement::new(0x400000);
    let images = load_images("test.o", &bytes, &mut placement).unwrap();
    assert_eq!(images.len(), 1);
    let image = &images[0];
    assert_eq!(image.name, "test.o");

    let text = image.sections.iter().find(|s| s.name == ".text").unwrap();
    assert_eq!(text.range, 0x400000..0x400040);
    let names: Vec<_> = text.symbols.iter().map(|s| (s.name(), s.address())).collect();
    assert_eq!(names, vec![("foo", 0x400000), ("bar", 0x400020)]);

    let data = image.sections.iter().find(|s| s.name == ".data").unwrap();
    assert_eq!(data.range, 0x400040..0x400048);
    assert!(image
        .sections
        .iter()
        .flat_map(|s| &s.symbols)
        .all(|s| s.name() != "external"));
}

#[test]
fn second_object_starts_on_next_page() {
    let bytes = relocatable_object();
    let mut placement = Placement::new(0x400000);
    load_images("first.o", &bytes, &mut placement).unwrap();
    let images = load_images("second.o", &bytes, &mut placement).unwrap();
    let text = images[0].sections.iter().find(|s| s.name == ".text").unwrap();
    assert_eq!(text.range.start, 0x401000);
}

#[test]
fn loaded_objects_resolve_and_invalidate() {
    let bytes = relocatable_object();
    let mut placement = Placement::new(0x400000);
    let mut session = SymbolSession::new();
    let mut ids = Vec::new();
    for image in load_images("test.o", &bytes, &mut placement).unwrap() {
        ids.push(session.notify_container_loaded(image).unwrap());
    }

    let bar = session.resolve(0x400031).unwrap();
    assert_eq!(session.name(&bar).unwrap(), "bar");
    assert_eq!(session.address(&bar).unwrap(), 0x400020);
    assert_eq!(session.lookup(0x400044).unwrap().name(), "counter");
    assert!(matches!(session.resolve(0x3fffff), Err(Error::NotFound { .. })));

    for id in ids {
        session.notify_container_unloaded(id);
    }
    assert_eq!(session.name(&bar), Err(Error::InvalidHandle));
}

#[test]
fn garbage_input_is_an_error() {
    let mut placement = Placement::default();
    assert!(load_images("junk", b"not an object", &mut placement).is_err());
}
