//! Selection, expansion and action coordination
//!
//! Translates raw widget notifications into domain events, drives
//! expansion through the cache, and resolves the actions that apply to the
//! view's title bar and to individual nodes.

mod contributions;
mod menus;
mod selection;

pub use contributions::*;
pub use menus::*;
pub use selection::*;
