//! Per-node children cache
//!
//! Every materialized node owns a fetch state:
//!
//! ```text
//! Unfetched ──▶ Fetching ──▶ Fetched
//!                  ▲            │ invalidate
//!                  └─ Invalidated ◀┘
//! ```
//!
//! The cache is an arena keyed by handle. Parents own the list of their
//! children's handles; the child → parent direction is a plain reverse
//! index used for eviction, never an owning reference.
//!
//! A fetch is identified by a [`Ticket`] combining the identity of the node
//! entry it was started for and a cache-wide epoch. Results are only
//! committed if the node is still in the `Fetching` state for that exact
//! ticket, so a late result can neither overwrite a newer fetch nor land on
//! a different entry that happens to reuse the same handle.

use std::collections::{HashMap, HashSet};

use futures::future::{BoxFuture, Shared};

use crate::model::{Handle, NodeKey, TreeNode};

/// Shared, in-flight fetch of one node's children.
pub type FetchFuture = Shared<BoxFuture<'static, Vec<TreeNode>>>;

/// Public view of a node's fetch state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// Children were never requested.
    Unfetched,
    /// A fetch is outstanding.
    Fetching,
    /// Children are cached (possibly empty).
    Fetched,
    /// Children were cached and then cleared by a refresh.
    Invalidated,
}

/// Identifies one fetch of one node entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    entry: u64,
    epoch: u64,
}

enum Children {
    Unfetched,
    Fetching { ticket: Ticket, future: FetchFuture },
    Fetched,
    Invalidated,
}

impl Children {
    fn state(&self) -> FetchState {
        match self {
            Self::Unfetched => FetchState::Unfetched,
            Self::Fetching { .. } => FetchState::Fetching,
            Self::Fetched => FetchState::Fetched,
            Self::Invalidated => FetchState::Invalidated,
        }
    }
}

struct Entry {
    id: u64,
    node: TreeNode,
    children: Children,
    /// Handles of the child entries this node owns in the arena.
    owned: Vec<Handle>,
}

/// What the cache knows about a node's children.
pub enum Lookup {
    /// The node is not in the cache.
    Missing,
    /// The node is a leaf; its children are never queried.
    Leaf,
    /// Children are cached.
    Cached(Vec<TreeNode>),
    /// A fetch is outstanding; await it instead of starting another.
    InFlight(FetchFuture),
    /// Children must be fetched for this node.
    NeedsFetch(TreeNode),
}

/// Result of a committed fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed {
    /// The children as stored (parent handles normalized).
    pub children: Vec<TreeNode>,
    /// Handles evicted from the cache by the commit.
    pub evicted: Vec<Handle>,
}

/// Arena of materialized nodes rooted at the root sentinel.
pub struct NodeCache {
    root: Entry,
    nodes: HashMap<Handle, Entry>,
    parents: HashMap<Handle, NodeKey>,
    next_entry: u64,
    next_epoch: u64,
}

impl Default for NodeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeCache {
    /// Creates a cache holding only the root sentinel.
    pub fn new() -> Self {
        Self {
            root: Entry {
                id: 0,
                node: TreeNode::root(),
                children: Children::Unfetched,
                owned: Vec::new(),
            },
            nodes: HashMap::new(),
            parents: HashMap::new(),
            next_entry: 1,
            next_epoch: 1,
        }
    }

    fn entry(&self, key: &NodeKey) -> Option<&Entry> {
        match key {
            NodeKey::Root => Some(&self.root),
            NodeKey::Item(handle) => self.nodes.get(handle),
        }
    }

    fn entry_mut(&mut self, key: &NodeKey) -> Option<&mut Entry> {
        match key {
            NodeKey::Root => Some(&mut self.root),
            NodeKey::Item(handle) => self.nodes.get_mut(handle),
        }
    }

    /// Returns the node addressed by `key`.
    pub fn node(&self, key: &NodeKey) -> Option<&TreeNode> {
        self.entry(key).map(|entry| &entry.node)
    }

    /// Returns `true` if the node is materialized.
    pub fn contains(&self, key: &NodeKey) -> bool {
        self.entry(key).is_some()
    }

    /// Returns the fetch state of a node.
    pub fn state(&self, key: &NodeKey) -> Option<FetchState> {
        self.entry(key).map(|entry| entry.children.state())
    }

    /// Returns the cached children: `None` when not fetched, `Some(empty)`
    /// when fetched with no children.
    pub fn children(&self, key: &NodeKey) -> Option<Vec<TreeNode>> {
        let entry = self.entry(key)?;
        match entry.children {
            Children::Fetched => Some(self.materialize(&entry.owned)),
            _ => None,
        }
    }

    fn materialize(&self, handles: &[Handle]) -> Vec<TreeNode> {
        handles
            .iter()
            .filter_map(|handle| self.nodes.get(handle))
            .map(|entry| entry.node.clone())
            .collect()
    }

    /// Returns the parent key of a materialized node.
    pub fn parent(&self, handle: &str) -> Option<&NodeKey> {
        self.parents.get(handle)
    }

    /// Number of materialized nodes, excluding the root.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if only the root is materialized.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of nodes with an outstanding fetch.
    pub fn fetching(&self) -> usize {
        std::iter::once(&self.root)
            .chain(self.nodes.values())
            .filter(|entry| matches!(entry.children, Children::Fetching { .. }))
            .count()
    }

    /// Decides how a children request for `key` is served.
    pub fn lookup(&self, key: &NodeKey) -> Lookup {
        let Some(entry) = self.entry(key) else {
            return Lookup::Missing;
        };
        if !key.is_root() && entry.node.is_leaf() {
            return Lookup::Leaf;
        }
        match &entry.children {
            Children::Fetched => Lookup::Cached(self.materialize(&entry.owned)),
            Children::Fetching { future, .. } => Lookup::InFlight(future.clone()),
            Children::Unfetched | Children::Invalidated => Lookup::NeedsFetch(entry.node.clone()),
        }
    }

    /// Allocates a ticket for a new fetch of `key`.
    pub fn reserve(&mut self, key: &NodeKey) -> Option<Ticket> {
        let entry = self.entry(key)?.id;
        let epoch = self.next_epoch;
        self.next_epoch += 1;
        Some(Ticket { entry, epoch })
    }

    /// Moves a node to `Fetching` with the given fetch.
    pub fn begin_fetch(&mut self, key: &NodeKey, ticket: Ticket, future: FetchFuture) -> bool {
        match self.entry_mut(key) {
            Some(entry) if entry.id == ticket.entry => {
                entry.children = Children::Fetching { ticket, future };
                true
            }
            _ => false,
        }
    }

    fn is_current(&self, key: &NodeKey, ticket: Ticket) -> bool {
        matches!(
            self.entry(key),
            Some(Entry { id, children: Children::Fetching { ticket: current, .. }, .. })
                if *id == ticket.entry && *current == ticket
        )
    }

    /// Stores fetched children for `key`.
    ///
    /// Returns `None` without touching the cache if the ticket is stale.
    /// Children that were previously owned by the node and are absent from
    /// the new set are evicted together with their subtrees; children that
    /// are present again get fresh, unfetched entries.
    pub fn commit(&mut self, key: &NodeKey, ticket: Ticket, children: Vec<TreeNode>) -> Option<Committed> {
        if !self.is_current(key, ticket) {
            return None;
        }

        let parent_handle = key.handle().map(str::to_string);
        let lineage = self.lineage(key);
        let mut evicted = Vec::new();

        let previous = self
            .entry_mut(key)
            .map(|entry| std::mem::take(&mut entry.owned))
            .unwrap_or_default();
        for handle in previous {
            self.evict(&handle, &mut evicted);
        }

        let mut stored = Vec::with_capacity(children.len());
        let mut owned = Vec::with_capacity(children.len());
        let mut seen = HashSet::new();
        for mut child in children {
            if !seen.insert(child.handle.clone()) {
                log::warn!("Duplicate handle '{}' under '{}', keeping first", child.handle, key);
                continue;
            }
            if lineage.contains(&child.handle) {
                log::warn!("Handle '{}' is '{}' or one of its ancestors, skipping", child.handle, key);
                continue;
            }
            if self.nodes.contains_key(&child.handle) {
                // Materialized elsewhere in the tree; detach it from there.
                log::warn!("Handle '{}' moved under '{}'", child.handle, key);
                self.detach(&child.handle);
                self.evict(&child.handle, &mut evicted);
            }
            child.parent_handle = parent_handle.clone();
            let id = self.next_entry;
            self.next_entry += 1;
            self.parents.insert(child.handle.clone(), key.clone());
            self.nodes.insert(
                child.handle.clone(),
                Entry {
                    id,
                    node: child.clone(),
                    children: Children::Unfetched,
                    owned: Vec::new(),
                },
            );
            owned.push(child.handle.clone());
            stored.push(child);
        }

        if let Some(entry) = self.entry_mut(key) {
            entry.owned = owned;
            entry.children = Children::Fetched;
        }

        // Handles that came back are not evicted from the caller's view.
        evicted.retain(|handle| !self.nodes.contains_key(handle));
        Some(Committed {
            children: stored,
            evicted,
        })
    }

    /// Records a failed fetch: the node becomes `Invalidated` so the next
    /// request fetches again. Returns `false` if the ticket is stale.
    pub fn fail(&mut self, key: &NodeKey, ticket: Ticket) -> bool {
        if !self.is_current(key, ticket) {
            return false;
        }
        if let Some(entry) = self.entry_mut(key) {
            entry.children = Children::Invalidated;
        }
        true
    }

    /// Clears the cached children of `key`. Any outstanding fetch for it
    /// becomes stale. Descendants stay materialized until the next commit
    /// replaces them.
    pub fn invalidate(&mut self, key: &NodeKey) -> bool {
        match self.entry_mut(key) {
            Some(entry) => {
                if !matches!(entry.children, Children::Unfetched) {
                    entry.children = Children::Invalidated;
                }
                true
            }
            None => false,
        }
    }

    /// Handles of `key` and all of its ancestors.
    fn lineage(&self, key: &NodeKey) -> HashSet<Handle> {
        let mut lineage = HashSet::new();
        let mut current = key.handle();
        while let Some(handle) = current {
            if !lineage.insert(handle.to_string()) {
                break;
            }
            current = self.parents.get(handle).and_then(NodeKey::handle);
        }
        lineage
    }

    fn detach(&mut self, handle: &str) {
        if let Some(parent) = self.parents.get(handle).cloned()
            && let Some(entry) = self.entry_mut(&parent)
        {
            entry.owned.retain(|owned| owned != handle);
        }
    }

    fn evict(&mut self, handle: &str, evicted: &mut Vec<Handle>) {
        let Some(entry) = self.nodes.remove(handle) else {
            return;
        };
        self.parents.remove(handle);
        evicted.push(entry.node.handle);
        for child in entry.owned {
            self.evict(&child, evicted);
        }
    }
}
