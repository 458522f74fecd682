//! Error types

mod command;
mod host;
mod provider;

pub use command::*;
pub use host::*;
pub use provider::*;
