//! Tree data model
//!
//! Nodes as returned by providers, the keys the engine addresses them by,
//! and the action/menu types used for per-node and title actions.

mod action;
mod node;

pub use action::*;
pub use node::*;
