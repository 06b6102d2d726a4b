//! Minimal symbol tables.
//!
//! A minimal symbol carries only a name and an address. Each section owns one table, sorted by
//! address once at load time and never modified afterwards.

/// A name and address pair, without type or line information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimalSymbol {
    name: String,
    address: u64,
}

impl MinimalSymbol {
    pub fn new(name: impl Into<String>, address: u64) -> Self {
        Self {
            name: name.into(),
            address,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn address(&self) -> u64 {
        self.address
    }
}

/// Address-ordered symbols of a single section.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<MinimalSymbol>,
}

impl SymbolTable {
    /// Builds a table from symbols in their original order. Symbols sharing an address keep
    /// that order.
    pub fn new(mut symbols: Vec<MinimalSymbol>) -> Self {
        symbols.sort_by_key(|symbol| symbol.address);
        Self { symbols }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MinimalSymbol> {
        self.symbols.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MinimalSymbol> {
        self.symbols.iter()
    }

    /// Index of the symbol with the greatest address not above `address`.
    ///
    /// When several symbols share that address, the one that came first in the original table
    /// wins.
    pub fn nearest_at_or_before(&self, address: u64) -> Option<usize> {
        let after = self.symbols.partition_point(|symbol| symbol.address <= address);
        let best = self.symbols.get(after.checked_sub(1)?)?.address;
        Some(self.symbols.partition_point(|symbol| symbol.address < best))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(symbols: &[(&str, u64)]) -> SymbolTable {
        SymbolTable::new(
            symbols
                .iter()
                .map(|&(name, address)| MinimalSymbol::new(name, address))
                .collect(),
        )
    }

    fn nearest_name(table: &SymbolTable, address: u64) -> Option<&str> {
        table
            .nearest_at_or_before(address)
            .and_then(|index| table.get(index))
            .map(|symbol| symbol.name())
    }

    #[test]
    fn nearest_prefers_greatest_preceding_address() {
        let table = table(&[("c", 30), ("a", 10), ("b", 20)]);
        assert_eq!(nearest_name(&table, 25), Some("b"));
        assert_eq!(nearest_name(&table, 30), Some("c"));
        assert_eq!(nearest_name(&table, 10), Some("a"));
        assert_eq!(nearest_name(&table, u64::MAX), Some("c"));
        assert_eq!(nearest_name(&table, 5), None);
    }

    #[test]
    fn aliases_resolve_to_first_inserted() {
        let table = table(&[("early", 50), ("x", 100), ("y", 100), ("z", 100)]);
        for _ in 0..3 {
            assert_eq!(nearest_name(&table, 100), Some("x"));
            assert_eq!(nearest_name(&table, 150), Some("x"));
        }
        assert_eq!(nearest_name(&table, 99), Some("early"));
    }

    #[test]
    fn empty_table_finds_nothing() {
        let table = SymbolTable::default();
        assert!(table.is_empty());
        assert_eq!(table.nearest_at_or_before(0), None);
        assert_eq!(table.nearest_at_or_before(u64::MAX), None);
    }
}
