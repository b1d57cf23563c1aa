use crate::error::{Result, VmError};

use super::{Cell, CellIndex, CellType, symbol_table::SymbolTable};

/// Index-addressed table of fixed-width cells.
///
/// Cell 0 is a permanent void sentinel, so index 0 doubles as "none" in
/// link fields. Released cells are threaded onto a free list through their
/// `name` field and handed out again before the top grows.
pub struct CellStore {
    cells: Vec<Cell>,
    free_head: CellIndex,
    free_count: usize,
    limit: usize,
    symbols: SymbolTable,
}

impl CellStore {
    /// Creates a store that holds at most `limit` cells, sentinel included.
    pub fn new(limit: usize) -> Self {
        let limit = limit.clamp(2, u32::MAX as usize);
        let mut cells = Vec::with_capacity(limit.min(4096));
        cells.push(Cell::VOID);
        Self {
            cells,
            free_head: 0,
            free_count: 0,
            limit,
            symbols: SymbolTable::default(),
        }
    }

    /// Returns the symbol cell for `name`, creating it on first use.
    pub fn intern(&mut self, name: &str) -> Result<CellIndex> {
        if let Some(index) = self.symbols.get(name) {
            return Ok(index);
        }
        let index = self.alloc(CellType::Symbol, 0, 0)?;
        self.cells[index as usize] = Cell::symbol(index);
        self.symbols.insert(name, index);
        Ok(index)
    }

    pub fn lookup_symbol(&self, name: &str) -> Option<CellIndex> {
        self.symbols.get(name)
    }

    pub fn symbol_name(&self, index: CellIndex) -> Option<&str> {
        self.symbols.resolve(index)
    }

    pub fn symbol_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn alloc(&mut self, ty: CellType, name: u32, value: u32) -> Result<CellIndex> {
        let index = if self.free_head != 0 {
            let index = self.free_head;
            self.free_head = self.cells[index as usize].name;
            self.free_count -= 1;
            index
        } else {
            if self.cells.len() >= self.limit {
                return Err(VmError::OutOfCells);
            }
            self.cells.push(Cell::VOID);
            (self.cells.len() - 1) as CellIndex
        };
        self.cells[index as usize] = Cell::new(ty, name, value);
        Ok(index)
    }

    /// Appends a contiguous run at the top, bypassing the free list.
    ///
    /// Threaded code relies on this: the dispatcher steps to `ip + 1`.
    pub fn append(&mut self, run: &[Cell]) -> Result<CellIndex> {
        if self.cells.len() + run.len() > self.limit {
            return Err(VmError::OutOfCells);
        }
        let start = self.cells.len() as CellIndex;
        self.cells.extend_from_slice(run);
        Ok(start)
    }

    /// Pushes a cell back onto the free list. Symbols and the sentinel are
    /// permanent and ignored.
    pub fn release(&mut self, index: CellIndex) {
        let Some(cell) = self.cells.get(index as usize) else {
            return;
        };
        if index == 0 || matches!(cell.ty, CellType::Symbol | CellType::Free) {
            return;
        }
        self.cells[index as usize] = Cell::new(CellType::Free, self.free_head, 0);
        self.free_head = index;
        self.free_count += 1;
    }

    pub fn get(&self, index: CellIndex) -> Option<Cell> {
        self.cells.get(index as usize).copied()
    }

    /// Overwrites type, name and value.
    pub fn set_content(&mut self, index: CellIndex, ty: CellType, name: u32, value: u32) {
        if index == 0 {
            return;
        }
        if let Some(cell) = self.cells.get_mut(index as usize) {
            *cell = Cell::new(ty, name, value);
        }
    }

    /// Overwrites type and value, keeping the existing name.
    pub fn set_value(&mut self, index: CellIndex, ty: CellType, value: u32) {
        if index == 0 {
            return;
        }
        if let Some(cell) = self.cells.get_mut(index as usize) {
            cell.ty = ty;
            cell.value = value;
        }
    }

    /// Overwrites only the name field; used to relink list nodes.
    pub fn set_name(&mut self, index: CellIndex, name: u32) {
        if index == 0 {
            return;
        }
        if let Some(cell) = self.cells.get_mut(index as usize) {
            cell.name = name;
        }
    }

    /// Next index the bump allocator would hand out.
    pub fn top(&self) -> CellIndex {
        self.cells.len() as CellIndex
    }

    /// Cells in use, excluding the sentinel and the free list.
    pub fn live_count(&self) -> usize {
        self.cells.len() - 1 - self.free_count
    }

    pub fn free_count(&self) -> usize {
        self.free_count
    }
}

impl Default for CellStore {
    fn default() -> Self {
        Self::new(1 << 20)
    }
}
