use std::fmt::Write as _;

use crate::{
    error::Result,
    runtime::{
        cell::{Cell, CellIndex, CellType},
        payload,
        task::TaskId,
    },
};

use super::Vm;

impl Vm {
    /// User-facing rendering, as printed by `.`.
    pub fn display_cell(&self, cell: Cell) -> Result<String> {
        Ok(match cell.ty {
            CellType::Integer => cell.as_int().to_string(),
            CellType::Float => format_float(cell.as_float()),
            CellType::String => self.string_of(cell)?,
            CellType::Symbol => self.symbol_text(cell.value),
            CellType::Array => {
                let len = payload::payload_len(&self.heap, cell.value)?;
                let mut items = Vec::with_capacity(len);
                for index in 0..len {
                    let element = payload::array_get(&self.heap, cell.value, index as i64)?;
                    items.push(self.display_cell(element)?);
                }
                format!("[{}]", items.join(" "))
            }
            CellType::Function => format!("&{}", self.word_name(cell.value)),
            CellType::Void => "void".to_string(),
            other => format!("<{} {}>", other, cell.value),
        })
    }

    /// Debug rendering of a threaded-code cell.
    pub fn describe_cell(&self, cell: Cell) -> String {
        match cell.ty {
            CellType::Builtin => self.symbol_text(cell.name),
            CellType::Code => format!("call {}", self.word_name(cell.value)),
            CellType::Integer => format!("int {}", cell.as_int()),
            CellType::Float => format!("float {}", format_float(cell.as_float())),
            CellType::String => match self.string_of(cell) {
                Ok(text) => format!("string {:?}", text),
                Err(_) => format!("string <bad {:#x}>", cell.value),
            },
            CellType::Symbol => format!("symbol '{}", self.symbol_text(cell.value)),
            CellType::Function => format!("fn &{}", self.word_name(cell.value)),
            other => format!("{} {}", other, cell.value),
        }
    }

    fn word_name(&self, address: CellIndex) -> String {
        self.defaults()
            .run
            .word_at(address)
            .map_or_else(|| format!("@{}", address), |sym| self.symbol_text(sym))
    }

    /// Lists `len` cells starting at `start`, one per line, with offsets
    /// relative to `start`.
    pub fn disassemble(&self, start: CellIndex, len: usize) -> String {
        let mut out = String::new();
        for offset in 0..len {
            let Some(cell) = self.cells.get(start + offset as CellIndex) else {
                break;
            };
            let _ = writeln!(out, "{:04} {}", offset, self.describe_cell(cell));
        }
        out
    }

    /// Disassembles a compiled word through its closing `next`.
    pub fn disassemble_word(&self, name: &str) -> Option<String> {
        let sym = self.cells.lookup_symbol(name)?;
        let start = self.defaults().run.word(sym)?;
        let mut len = 0;
        let mut at = start;
        while let Some(cell) = self.cells.get(at) {
            len += 1;
            at += 1;
            if cell.ty == CellType::Builtin && cell.name == self.symbols.next {
                break;
            }
        }
        Some(self.disassemble(start, len))
    }

    pub(super) fn trace_step(&self, task: TaskId, ip: CellIndex, cell: Cell) {
        eprintln!("{} IP={:04} {}", task, ip, self.describe_cell(cell));
        self.trace_stack(task);
    }

    fn trace_stack(&self, task: TaskId) {
        let Some(task) = self.scheduler.get(task) else {
            return;
        };
        let items: Vec<String> = task
            .stacks
            .operands()
            .iter()
            .map(|&cell| self.describe_cell(cell))
            .collect();
        eprintln!("  stack: [{}]", items.join(", "));
    }
}

fn format_float(value: f32) -> String {
    if value.fract() == 0.0 && value.is_finite() {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
