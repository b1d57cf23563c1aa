//! VM configuration.
//!
//! Values come from [`VmConfig::default`], a JSON file, or environment
//! variables with the `KNOT_` prefix:
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `KNOT_HEAP_BYTES` | Byte heap capacity | 1048576 (1MB) |
//! | `KNOT_MAX_CELLS` | Cell store limit, sentinel included | 1048576 |
//! | `KNOT_STACK_SLOTS` | Shared operand/return stack slots per task | 1024 |
//! | `KNOT_TRACE` | Print every dispatched cell ("true"/"false") | false |
//! | `KNOT_SELF_TEST` | Run the heap self-test on start | true |

use std::{env, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::runtime::heap::MIN_CAPACITY;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    pub heap_bytes: usize,
    pub max_cells: usize,
    pub stack_slots: usize,
    pub trace: bool,
    pub self_test: bool,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            heap_bytes: 1024 * 1024,
            max_cells: 1 << 20,
            stack_slots: 1024,
            trace: false,
            self_test: true,
        }
    }
}

impl VmConfig {
    /// Defaults overridden by any `KNOT_*` variables that parse.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = parse_env_usize("KNOT_HEAP_BYTES") {
            if val >= MIN_CAPACITY {
                config.heap_bytes = val;
            } else {
                tracing::warn!(value = val, "KNOT_HEAP_BYTES below minimum, ignored");
            }
        }

        if let Some(val) = parse_env_usize("KNOT_MAX_CELLS") {
            if val > 1 {
                config.max_cells = val;
            }
        }

        if let Some(val) = parse_env_usize("KNOT_STACK_SLOTS") {
            if val > 0 {
                config.stack_slots = val;
            }
        }

        if let Some(val) = parse_env_bool("KNOT_TRACE") {
            config.trace = val;
        }

        if let Some(val) = parse_env_bool("KNOT_SELF_TEST") {
            config.self_test = val;
        }

        config
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
        Self::from_json(&text).map_err(|e| format!("{}: {}", path.display(), e))
    }

    pub fn from_json(text: &str) -> Result<Self, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    pub fn with_heap_bytes(mut self, heap_bytes: usize) -> Self {
        self.heap_bytes = heap_bytes;
        self
    }

    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = max_cells;
        self
    }

    pub fn with_stack_slots(mut self, stack_slots: usize) -> Self {
        self.stack_slots = stack_slots;
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }
}

fn parse_env_usize(name: &str) -> Option<usize> {
    env::var(name).ok().and_then(|s| s.parse().ok())
}

fn parse_env_bool(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .and_then(|s| match s.to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        })
}
