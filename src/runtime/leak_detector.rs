use serde::Serialize;

use crate::runtime::vm::Vm;

/// Live resource counts, for spotting what a run left behind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LeakStats {
    pub heap_blocks: usize,
    /// Non-symbol cells in use, compiled code included.
    pub cells: usize,
    pub symbols: usize,
    /// Activations other than the root.
    pub acts: usize,
    pub tasks: usize,
}

impl LeakStats {
    /// Resources present now that were not in `baseline`.
    pub fn since(&self, baseline: &LeakStats) -> LeakStats {
        LeakStats {
            heap_blocks: self.heap_blocks.saturating_sub(baseline.heap_blocks),
            cells: self.cells.saturating_sub(baseline.cells),
            symbols: self.symbols.saturating_sub(baseline.symbols),
            acts: self.acts.saturating_sub(baseline.acts),
            tasks: self.tasks.saturating_sub(baseline.tasks),
        }
    }
}

pub fn snapshot(vm: &Vm) -> LeakStats {
    let cells = vm.cells();
    LeakStats {
        heap_blocks: vm.heap().live_blocks(),
        cells: cells.live_count() - cells.symbol_count(),
        symbols: cells.symbol_count(),
        acts: vm.acts().live_count() - 1,
        tasks: vm.scheduler().live_count(),
    }
}
