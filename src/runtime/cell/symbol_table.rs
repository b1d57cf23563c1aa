use std::{collections::HashMap, rc::Rc};

use super::CellIndex;

/// Two-way map between symbol names and their cells.
///
/// Entries are never removed: a symbol cell lives as long as its store.
#[derive(Debug, Default)]
pub struct SymbolTable {
    by_name: HashMap<Rc<str>, CellIndex>,
    by_cell: HashMap<CellIndex, Rc<str>>,
}

impl SymbolTable {
    pub fn get(&self, name: &str) -> Option<CellIndex> {
        self.by_name.get(name).copied()
    }

    pub fn resolve(&self, index: CellIndex) -> Option<&str> {
        self.by_cell.get(&index).map(|name| name.as_ref())
    }

    pub fn insert(&mut self, name: &str, index: CellIndex) {
        let name: Rc<str> = Rc::from(name);
        self.by_cell.insert(index, name.clone());
        self.by_name.insert(name, index);
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
