//! Lazy tree view engine
//!
//! [`TreeView`] owns the root sentinel and the node cache, fetches children
//! on demand through the [`DataSource`], and gates refresh work on
//! visibility: refreshes requested while hidden are queued and flushed in
//! one batch when the view is shown again.
//!
//! The view is cheap to clone (uses `Arc` internally). Background work
//! (activation, title menu tracking, environment subscriptions) runs on
//! tasks the view owns and aborts when it is disposed or dropped.

mod config;
mod events;
mod message;
mod refresh;

pub use config::*;
pub use events::TreeViewEvent;
pub use message::*;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};

use tokio::sync::broadcast;
use tokio::time::{Instant, sleep_until, timeout_at};

use crate::cache::{FetchState, NodeCache};
use crate::coordinator::{ContributionRegistry, MenuRegistry, NodeContext, TitleMenus, TreeMenus};
use crate::host::{CommandService, EnvironmentChange, ExtensionHost, NoopHost, UnhandledCommands};
use crate::model::{Handle, NodeKey, TreeNode};
use crate::provider::{DelegatedProviders, ProviderRegistry, TreeDataProvider};
use crate::source::DataSource;
use crate::widget::{TreeWidget, WidgetFactory};

use events::Subscriptions;

/// Shell-side state: visibility lifecycle, queued work, messages, focus
/// and expansion.
#[derive(Default)]
pub(crate) struct ShellState {
    pub(crate) visible: bool,
    pub(crate) activated: bool,
    pub(crate) focused: bool,
    /// Number of batched refreshes in progress.
    pub(crate) refreshing: usize,
    pub(crate) pending_refresh: Vec<NodeKey>,
    pub(crate) pending_selection: Option<Vec<NodeKey>>,
    /// Message set by the view's owner.
    pub(crate) message: Option<ViewMessage>,
    /// Message currently shown.
    pub(crate) shown_message: Option<ViewMessage>,
    pub(crate) size: u32,
    pub(crate) expanded: HashSet<Handle>,
    pub(crate) node_context: Option<NodeContext>,
    pub(crate) show_collapse_all: bool,
}

pub(crate) struct TreeViewInner {
    pub(crate) id: String,
    pub(crate) config: TreeViewConfig,
    pub(crate) source: Arc<DataSource>,
    pub(crate) cache: Mutex<NodeCache>,
    pub(crate) shell: Mutex<ShellState>,
    pub(crate) widget_factory: WidgetFactory,
    pub(crate) widget: RwLock<Option<Arc<dyn TreeWidget>>>,
    pub(crate) commands: Arc<dyn CommandService>,
    pub(crate) host: Arc<dyn ExtensionHost>,
    pub(crate) menus: TreeMenus,
    pub(crate) title: TitleMenus,
    pub(crate) events: broadcast::Sender<TreeViewEvent>,
    pub(crate) tasks: Subscriptions,
}

/// A lazily populated tree view.
///
/// # Example
///
/// ```ignore
/// let view = TreeView::builder("connections", move || widget.clone())
///     .delegated(registry)
///     .commands(commands)
///     .build();
///
/// view.set_data_provider(Some(provider)).await;
/// view.set_visibility(true).await;
///
/// let top = view.get_children(&NodeKey::Root).await;
/// ```
#[derive(Clone)]
pub struct TreeView {
    pub(crate) inner: Arc<TreeViewInner>,
}

impl TreeView {
    /// Creates a new builder. `widget` is called once, on first activation.
    pub fn builder<F>(id: impl Into<String>, widget: F) -> TreeViewBuilder
    where
        F: Fn() -> Arc<dyn TreeWidget> + Send + Sync + 'static,
    {
        TreeViewBuilder::new(id.into(), Box::new(widget))
    }

    fn from_weak(weak: &Weak<TreeViewInner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    pub(crate) fn downgrade(&self) -> Weak<TreeViewInner> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn cache(&self) -> MutexGuard<'_, NodeCache> {
        self.inner.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn shell(&self) -> MutexGuard<'_, ShellState> {
        self.inner.shell.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn widget(&self) -> Option<Arc<dyn TreeWidget>> {
        self.inner
            .widget
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub(crate) fn emit(&self, event: TreeViewEvent) {
        // No receivers is fine.
        let _ = self.inner.events.send(event);
    }

    /// The view id.
    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// The view configuration.
    pub fn config(&self) -> &TreeViewConfig {
        &self.inner.config
    }

    /// Subscribes to view events.
    pub fn subscribe(&self) -> broadcast::Receiver<TreeViewEvent> {
        self.inner.events.subscribe()
    }

    // -------------------------------------------------------------------------
    // Provider
    // -------------------------------------------------------------------------

    /// Replaces the default data provider.
    ///
    /// Setting a provider clears the "no data provider" message and
    /// refreshes from the root; clearing it shows the message again.
    pub async fn set_data_provider(&self, provider: Option<Arc<dyn TreeDataProvider>>) {
        let present = provider.is_some();
        self.inner.source.set_provider(provider);
        self.update_message();
        if present {
            log::info!("Data provider set for view '{}'", self.id());
            self.refresh(None).await;
        } else {
            log::info!("Data provider cleared for view '{}'", self.id());
        }
    }

    /// Returns `true` if a default data provider is set.
    pub fn has_data_provider(&self) -> bool {
        self.inner.source.has_provider()
    }

    // -------------------------------------------------------------------------
    // Cache inspection
    // -------------------------------------------------------------------------

    /// Returns a materialized node.
    pub fn node(&self, key: &NodeKey) -> Option<TreeNode> {
        self.cache().node(key).cloned()
    }

    /// Returns cached children without fetching: `None` when not fetched,
    /// `Some(empty)` when fetched with no children.
    pub fn children(&self, key: &NodeKey) -> Option<Vec<TreeNode>> {
        self.cache().children(key)
    }

    /// Returns a node's fetch state.
    pub fn fetch_state(&self, key: &NodeKey) -> Option<FetchState> {
        self.cache().state(key)
    }

    /// Returns the key of the node's parent in this view.
    pub fn parent_key(&self, key: &NodeKey) -> Option<NodeKey> {
        let handle = key.handle()?;
        self.cache().parent(handle).cloned()
    }

    /// Returns `true` while any fetch is outstanding.
    pub fn is_busy(&self) -> bool {
        self.cache().fetching() > 0
    }

    // -------------------------------------------------------------------------
    // Visibility
    // -------------------------------------------------------------------------

    /// Returns `true` if the view is visible.
    pub fn visible(&self) -> bool {
        self.shell().visible
    }

    /// Shows or hides the view.
    ///
    /// The first time the view is shown the widget is created and bound to
    /// the root, and contributors are activated in the background. Every
    /// time it is shown, refreshes queued while hidden are flushed in one
    /// batch. Hiding never evicts cached children.
    pub async fn set_visibility(&self, visible: bool) {
        {
            let mut shell = self.shell();
            if shell.visible == visible {
                return;
            }
            shell.visible = visible;
        }

        let activated = visible && self.activate();

        if let Some(widget) = self.widget() {
            widget.set_visible(visible);
            if visible {
                let mut batch = std::mem::take(&mut self.shell().pending_refresh);
                if activated {
                    batch.insert(0, NodeKey::Root);
                }
                if !batch.is_empty() {
                    log::debug!("Flushing {} queued refreshes for view '{}'", batch.len(), self.id());
                    self.do_refresh(batch).await;
                }
            }
        }

        self.emit(TreeViewEvent::DidChangeVisibility(visible));
    }

    /// First-time activation. Returns `true` if this call activated.
    fn activate(&self) -> bool {
        if std::mem::replace(&mut self.shell().activated, true) {
            return false;
        }
        log::info!("Activating view '{}'", self.id());
        self.create_widget();

        let weak = self.downgrade();
        let host = Arc::clone(&self.inner.host);
        let event = format!("onView:{}", self.id());
        let wait = self.inner.config.activation_wait;
        let task = tokio::spawn(async move {
            let deadline = Instant::now() + wait;
            match timeout_at(deadline, host.activate_by_event(&event)).await {
                Ok(Ok(())) => log::debug!("Activated '{}'", event),
                Ok(Err(err)) => log::warn!("{}", err),
                Err(_) => log::info!("Activation of '{}' still running after {:?}", event, wait),
            }
            sleep_until(deadline).await;
            if let Some(view) = Self::from_weak(&weak) {
                view.update_message();
            }
        });
        self.inner.tasks.push(task);
        true
    }

    fn create_widget(&self) {
        let widget = (self.inner.widget_factory)();
        {
            let mut guard = self.inner.widget.write().unwrap_or_else(PoisonError::into_inner);
            *guard = Some(Arc::clone(&widget));
        }
        widget.set_input(&TreeNode::root());

        let (message, pending) = {
            let mut shell = self.shell();
            (shell.shown_message.clone(), shell.pending_selection.take())
        };
        widget.show_message(message.as_ref());
        if let Some(selection) = pending {
            self.apply_selection(&widget, &selection);
        }
        self.update_content_areas();
    }

    // -------------------------------------------------------------------------
    // Subscriptions
    // -------------------------------------------------------------------------

    /// Re-renders the view when the theme or the decorations configuration
    /// changes. The subscription lives as long as the view.
    pub fn watch_environment(&self, mut changes: broadcast::Receiver<EnvironmentChange>) {
        let weak = self.downgrade();
        let key = self.inner.config.decorations_key.clone();
        let task = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(change) if change.requires_rerender(&key) => {
                        let Some(view) = Self::from_weak(&weak) else { break };
                        log::debug!("Soft refresh of view '{}' after {:?}", view.id(), change);
                        view.do_refresh(vec![NodeKey::Root]).await;
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        log::debug!("Environment subscription lagged by {}", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
        self.inner.tasks.push(task);
    }

    /// Stops all background work and releases the widget.
    pub fn dispose(&self) {
        log::debug!("Disposing view '{}'", self.id());
        self.inner.tasks.abort_all();
        let mut guard = self.inner.widget.write().unwrap_or_else(PoisonError::into_inner);
        *guard = None;
    }
}

/// Builder for a [`TreeView`].
///
/// Only the id and the widget factory are required; every other
/// collaborator has an inert default.
pub struct TreeViewBuilder {
    id: String,
    widget: WidgetFactory,
    config: TreeViewConfig,
    delegated: Arc<dyn DelegatedProviders>,
    commands: Arc<dyn CommandService>,
    host: Arc<dyn ExtensionHost>,
    menus: Arc<dyn MenuRegistry>,
}

impl TreeViewBuilder {
    fn new(id: String, widget: WidgetFactory) -> Self {
        Self {
            id,
            widget,
            config: TreeViewConfig::default(),
            delegated: Arc::new(ProviderRegistry::new()),
            commands: Arc::new(UnhandledCommands),
            host: Arc::new(NoopHost),
            menus: Arc::new(ContributionRegistry::new()),
        }
    }

    /// Sets the configuration.
    pub fn config(mut self, config: TreeViewConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the delegated provider lookup.
    pub fn delegated(mut self, delegated: Arc<dyn DelegatedProviders>) -> Self {
        self.delegated = delegated;
        self
    }

    /// Sets the command service.
    pub fn commands(mut self, commands: Arc<dyn CommandService>) -> Self {
        self.commands = commands;
        self
    }

    /// Sets the extension host.
    pub fn host(mut self, host: Arc<dyn ExtensionHost>) -> Self {
        self.host = host;
        self
    }

    /// Sets the menu contribution registry.
    pub fn menus(mut self, menus: Arc<dyn MenuRegistry>) -> Self {
        self.menus = menus;
        self
    }

    /// Builds the view.
    ///
    /// Title menus are tracked on a background task; without a Tokio
    /// runtime they are computed once and never updated.
    pub fn build(self) -> TreeView {
        let (events, _) = broadcast::channel(self.config.event_capacity.max(1));
        let title = TitleMenus::new(&self.id, Arc::clone(&self.menus));
        let shell = ShellState {
            show_collapse_all: self.config.show_collapse_all_action,
            ..Default::default()
        };
        let view = TreeView {
            inner: Arc::new(TreeViewInner {
                source: Arc::new(DataSource::new(self.id.clone(), self.delegated)),
                menus: TreeMenus::new(&self.id, self.menus),
                id: self.id,
                config: self.config,
                cache: Mutex::new(NodeCache::new()),
                shell: Mutex::new(shell),
                widget_factory: self.widget,
                widget: RwLock::new(None),
                commands: self.commands,
                host: self.host,
                title,
                events,
                tasks: Subscriptions::default(),
            }),
        };

        match tokio::runtime::Handle::try_current() {
            Ok(_) => {
                let task = view.inner.title.track(view.inner.events.clone());
                view.inner.tasks.push(task);
            }
            Err(_) => log::warn!("No runtime; title actions of '{}' will not update", view.id()),
        }
        view
    }
}
