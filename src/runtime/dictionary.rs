use std::collections::HashMap;

use crate::runtime::cell::CellIndex;

/// Index into the VM's builtin table.
pub type BuiltinId = u32;

/// Name resolution for one interpreter mode: symbol to native operation and
/// symbol to compiled word.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    builtins: HashMap<CellIndex, BuiltinId>,
    words: HashMap<CellIndex, CellIndex>,
}

impl Dictionary {
    pub fn builtin(&self, sym: CellIndex) -> Option<BuiltinId> {
        self.builtins.get(&sym).copied()
    }

    pub fn word(&self, sym: CellIndex) -> Option<CellIndex> {
        self.words.get(&sym).copied()
    }

    pub fn define_builtin(&mut self, sym: CellIndex, id: BuiltinId) {
        self.builtins.insert(sym, id);
    }

    pub fn define_word(&mut self, sym: CellIndex, address: CellIndex) {
        self.words.insert(sym, address);
    }

    /// Name of the word compiled at `address`, if any.
    pub fn word_at(&self, address: CellIndex) -> Option<CellIndex> {
        self.words
            .iter()
            .filter(|&(_, &target)| target == address)
            .map(|(&sym, _)| sym)
            .min()
    }

    pub fn word_count(&self) -> usize {
        self.words.len()
    }
}

/// The run-mode and compile-mode dictionaries a task resolves names with.
#[derive(Debug, Clone, Default)]
pub struct Dictionaries {
    pub run: Dictionary,
    pub compile: Dictionary,
}

impl Dictionaries {
    /// Makes a compiled word callable at run time and referable from later
    /// compilations.
    pub fn define_word(&mut self, sym: CellIndex, address: CellIndex) {
        self.run.define_word(sym, address);
        self.compile.define_word(sym, address);
    }
}
