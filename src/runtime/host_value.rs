use std::fmt;

use serde::Serialize;

/// A VM value copied out to, or in from, the host.
///
/// Strings and arrays are deep copies; functions and objects are opaque
/// handles into the VM.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum HostValue {
    Void,
    Int(i32),
    Float(f32),
    Str(String),
    Symbol(String),
    Array(Vec<HostValue>),
    Function(u32),
    Object(u32),
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        HostValue::Int(value)
    }
}

impl From<f32> for HostValue {
    fn from(value: f32) -> Self {
        HostValue::Float(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::Str(value.to_string())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::Str(value)
    }
}

impl<T: Into<HostValue>> From<Vec<T>> for HostValue {
    fn from(values: Vec<T>) -> Self {
        HostValue::Array(values.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Void => write!(f, "void"),
            HostValue::Int(v) => write!(f, "{}", v),
            HostValue::Float(v) => write!(f, "{}", v),
            HostValue::Str(s) => write!(f, "{:?}", s),
            HostValue::Symbol(s) => write!(f, "'{}", s),
            HostValue::Array(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            HostValue::Function(addr) => write!(f, "<fn @{}>", addr),
            HostValue::Object(handle) => write!(f, "<object {}>", handle),
        }
    }
}
