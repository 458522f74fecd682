//! Menu contribution registry

use std::sync::{PoisonError, RwLock};

use tokio::sync::broadcast;

use crate::model::{Action, ContextKeys, MenuId, MenuItem};

/// Source of contributed menu items.
pub trait MenuRegistry: Send + Sync {
    /// Returns the items of `menu` whose conditions hold for `context`, in
    /// contribution order.
    fn menu_items(&self, menu: MenuId, context: &ContextKeys) -> Vec<MenuItem>;

    /// Subscribes to change notifications; each message names the menu
    /// that changed.
    fn subscribe(&self) -> broadcast::Receiver<MenuId>;
}

/// An action contributed to a menu, optionally guarded by context keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    /// Target menu.
    pub menu: MenuId,
    /// The contributed item.
    pub item: MenuItem,
    /// Key/value pairs that must all match.
    pub when: Vec<(String, String)>,
}

impl Contribution {
    /// Contributes `action` to `menu` unconditionally and without a group.
    pub fn new(menu: MenuId, action: Action) -> Self {
        Self {
            menu,
            item: MenuItem { action, group: None },
            when: Vec::new(),
        }
    }

    /// Places the item in a menu group.
    pub fn group(mut self, group: impl Into<String>) -> Self {
        self.item.group = Some(group.into());
        self
    }

    /// Adds a condition on a context key.
    pub fn when(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.when.push((key.into(), value.into()));
        self
    }
}

/// In-memory [`MenuRegistry`].
pub struct ContributionRegistry {
    contributions: RwLock<Vec<Contribution>>,
    changes: broadcast::Sender<MenuId>,
}

impl Default for ContributionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ContributionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(16);
        Self {
            contributions: RwLock::new(Vec::new()),
            changes,
        }
    }

    /// Adds a contribution and notifies subscribers.
    pub fn contribute(&self, contribution: Contribution) {
        let menu = contribution.menu;
        self.contributions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(contribution);
        let _ = self.changes.send(menu);
    }

    /// Removes every contribution of `action_id` to `menu`. Returns `true`
    /// if anything was removed.
    pub fn remove(&self, menu: MenuId, action_id: &str) -> bool {
        let removed = {
            let mut contributions = self.contributions.write().unwrap_or_else(PoisonError::into_inner);
            let before = contributions.len();
            contributions.retain(|c| c.menu != menu || c.item.action.id != action_id);
            before != contributions.len()
        };
        if removed {
            let _ = self.changes.send(menu);
        }
        removed
    }
}

impl MenuRegistry for ContributionRegistry {
    fn menu_items(&self, menu: MenuId, context: &ContextKeys) -> Vec<MenuItem> {
        self.contributions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|c| c.menu == menu && context.matches(&c.when))
            .map(|c| c.item.clone())
            .collect()
    }

    fn subscribe(&self) -> broadcast::Receiver<MenuId> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{VIEW_ITEM_KEY, VIEW_KEY};

    fn ids(items: &[MenuItem]) -> Vec<&str> {
        items.iter().map(|i| i.action.id.as_str()).collect()
    }

    #[test]
    fn test_menu_items_filter_by_menu_and_context() {
        let registry = ContributionRegistry::new();
        registry.contribute(
            Contribution::new(MenuId::ViewItemContext, Action::new("db.refresh", "Refresh"))
                .group("inline")
                .when(VIEW_ITEM_KEY, "database"),
        );
        registry.contribute(
            Contribution::new(MenuId::ViewItemContext, Action::new("table.drop", "Drop"))
                .when(VIEW_ITEM_KEY, "table"),
        );
        registry.contribute(Contribution::new(MenuId::ViewTitle, Action::new("add", "Add")));

        let database = ContextKeys::scoped()
            .with(VIEW_KEY, "connections")
            .with(VIEW_ITEM_KEY, "database");
        assert_eq!(ids(&registry.menu_items(MenuId::ViewItemContext, &database)), ["db.refresh"]);
        assert_eq!(ids(&registry.menu_items(MenuId::ViewTitle, &database)), ["add"]);
        assert!(registry.menu_items(MenuId::DataExplorerContext, &database).is_empty());
    }

    #[test]
    fn test_changes_are_announced() {
        let registry = ContributionRegistry::new();
        let mut changes = registry.subscribe();

        registry.contribute(Contribution::new(MenuId::ViewTitle, Action::new("add", "Add")));
        assert_eq!(changes.try_recv().ok(), Some(MenuId::ViewTitle));

        assert!(!registry.remove(MenuId::ViewTitle, "missing"));
        assert!(changes.try_recv().is_err());

        assert!(registry.remove(MenuId::ViewTitle, "add"));
        assert_eq!(changes.try_recv().ok(), Some(MenuId::ViewTitle));
    }

    #[test]
    fn test_poisoned_lock_keeps_contributions() {
        let registry = std::sync::Arc::new(ContributionRegistry::new());
        registry.contribute(Contribution::new(MenuId::ViewTitle, Action::new("add", "Add")));

        let poisoner = std::sync::Arc::clone(&registry);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.contributions.write().unwrap();
            panic!("poison the registry lock");
        })
        .join();
        assert!(registry.contributions.is_poisoned());

        let items = registry.menu_items(MenuId::ViewTitle, &ContextKeys::scoped());
        assert_eq!(ids(&items), ["add"]);
    }
}
