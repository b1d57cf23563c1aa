pub mod config;
pub mod error;
pub mod runtime;
pub mod syntax;

pub use config::VmConfig;
pub use error::{Result, VmError};
pub use runtime::{host_value::HostValue, vm::Vm};
