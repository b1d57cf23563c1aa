//! Tagged cells, their store and symbol interning.

pub mod cell_store;
pub mod cell_type;
pub mod symbol_table;

pub use cell_store::CellStore;
pub use cell_type::{Cell, CellType};

/// Position of a cell in its [`CellStore`].
pub type CellIndex = u32;

#[cfg(test)]
mod cell_store_test;
