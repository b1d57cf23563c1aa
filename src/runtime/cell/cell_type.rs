use std::fmt;

use super::CellIndex;

/// Type tag stored in every cell.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    /// Cell 0 and uninitialized slots.
    Void = 0,
    /// On the free list; `name` links to the next free cell.
    Free = 1,
    /// Interned name; never freed.
    Symbol = 2,
    /// Threaded-code reference to a native operation, by name.
    Builtin = 3,
    /// Threaded-code call; `value` is the target cell index.
    Code = 4,
    Integer = 5,
    /// `value` holds the `f32` bit pattern.
    Float = 6,
    /// `value` is a byte-heap address: u32 length, then UTF-8 bytes.
    String = 7,
    /// List node; `value` is the element cell, `name` the next node.
    List = 8,
    /// `value` is a byte-heap address: u32 length, then (tag, value) pairs.
    Array = 9,
    Map = 10,
    /// Opaque host handle.
    Object = 11,
    /// First-class word reference; `value` is the code address.
    Function = 12,
}

impl CellType {
    pub fn name(self) -> &'static str {
        match self {
            CellType::Void => "void",
            CellType::Free => "free",
            CellType::Symbol => "symbol",
            CellType::Builtin => "builtin",
            CellType::Code => "code",
            CellType::Integer => "integer",
            CellType::Float => "float",
            CellType::String => "string",
            CellType::List => "list",
            CellType::Array => "array",
            CellType::Map => "map",
            CellType::Object => "object",
            CellType::Function => "function",
        }
    }

    pub fn from_tag(tag: u32) -> Option<Self> {
        Some(match tag {
            0 => CellType::Void,
            1 => CellType::Free,
            2 => CellType::Symbol,
            3 => CellType::Builtin,
            4 => CellType::Code,
            5 => CellType::Integer,
            6 => CellType::Float,
            7 => CellType::String,
            8 => CellType::List,
            9 => CellType::Array,
            10 => CellType::Map,
            11 => CellType::Object,
            12 => CellType::Function,
            _ => return None,
        })
    }

    /// Whether `value` is a byte-heap address owning a reference.
    pub fn is_heap_backed(self) -> bool {
        matches!(self, CellType::String | CellType::Array)
    }
}

impl fmt::Display for CellType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fixed-width unit of VM data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ty: CellType,
    pub name: u32,
    pub value: u32,
}

impl Cell {
    pub const VOID: Cell = Cell {
        ty: CellType::Void,
        name: 0,
        value: 0,
    };

    pub fn new(ty: CellType, name: u32, value: u32) -> Self {
        Self { ty, name, value }
    }

    pub fn int(value: i32) -> Self {
        Self::new(CellType::Integer, 0, value as u32)
    }

    pub fn float(value: f32) -> Self {
        Self::new(CellType::Float, 0, value.to_bits())
    }

    pub fn symbol(index: CellIndex) -> Self {
        Self::new(CellType::Symbol, index, index)
    }

    pub fn builtin(name: CellIndex) -> Self {
        Self::new(CellType::Builtin, name, 0)
    }

    pub fn code(target: CellIndex) -> Self {
        Self::new(CellType::Code, 0, target)
    }

    pub fn function(target: CellIndex) -> Self {
        Self::new(CellType::Function, 0, target)
    }

    pub fn as_int(self) -> i32 {
        self.value as i32
    }

    pub fn as_float(self) -> f32 {
        f32::from_bits(self.value)
    }

    pub fn is_truthy(self) -> bool {
        match self.ty {
            CellType::Void => false,
            CellType::Integer => self.value != 0,
            CellType::Float => self.as_float() != 0.0,
            _ => true,
        }
    }
}
