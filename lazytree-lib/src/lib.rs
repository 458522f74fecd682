//! Lazy, asynchronously populated tree view engine.
//!
//! A [`TreeView`](view::TreeView) presents a hierarchy whose children are
//! fetched on demand from pluggable [`TreeDataProvider`](provider::TreeDataProvider)s,
//! cached per node, selectively invalidated and re-rendered through a
//! [`TreeWidget`](widget::TreeWidget) without losing expansion or selection.
//!
//! The crate is split into:
//! - [`model`]: nodes, node keys, commands, actions and menu contexts;
//! - [`provider`] and [`source`]: the provider contracts and the adapter
//!   that dispatches between the default and delegated providers;
//! - [`cache`]: the per-node fetch state machine;
//! - [`view`]: the refresh engine, visibility lifecycle and message handling;
//! - [`coordinator`]: selection, expansion and action resolution;
//! - [`widget`] and [`host`]: the collaborators the engine drives.

pub mod cache;
pub mod coordinator;
pub mod error;
pub mod host;
pub mod model;
pub mod provider;
pub mod source;
pub mod view;
pub mod widget;

pub use model::{CollapsibleState, Command, Handle, NodeKey, TreeNode};
pub use view::{TreeView, TreeViewBuilder, TreeViewConfig, TreeViewEvent};
