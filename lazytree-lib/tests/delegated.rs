//! Delegated providers and node-level failure recovery.

mod common;

use std::sync::Arc;

use common::*;
use lazytree_lib::cache::FetchState;
use lazytree_lib::provider::ProviderRegistry;
use lazytree_lib::widget::TreeWidget;
use lazytree_lib::{TreeNode, TreeView, TreeViewConfig, TreeViewEvent};

struct Fixture {
    view: TreeView,
    widget: Arc<RecordingWidget>,
    local: Arc<MockProvider>,
    remote: Arc<MockProvider>,
    registry: Arc<ProviderRegistry>,
}

fn remote_folder(handle: &str) -> TreeNode {
    folder(handle).with_child_provider("remote-db")
}

async fn fixture() -> Fixture {
    let local = MockProvider::new("local");
    local.roots(vec![remote_folder("server"), folder("local")]);
    let remote = MockProvider::new("remote-db");
    remote.children("server", vec![folder("db1"), folder("db2")]);

    let registry = Arc::new(ProviderRegistry::new());
    registry.register("remote-db", remote.clone());

    let widget = RecordingWidget::new();
    let factory = Arc::clone(&widget);
    let view = TreeView::builder(VIEW_ID, move || factory.clone() as Arc<dyn TreeWidget>)
        .config(TreeViewConfig::no_wait())
        .delegated(registry.clone())
        .build();
    view.set_data_provider(Some(local.clone())).await;
    view.set_visibility(true).await;

    Fixture {
        view,
        widget,
        local,
        remote,
        registry,
    }
}

// ============================================================================
// Dispatch
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_children_come_from_delegated_provider() {
    let f = fixture().await;

    let children = f.view.get_children(&key("server")).await;

    assert_eq!(handles(&children), ["db1", "db2"]);
    assert_eq!(f.remote.calls_for(Some("server")), 1);
    assert_eq!(f.local.calls_for(Some("server")), 0);
    assert_eq!(f.view.parent_key(&key("db1")), Some(key("server")));
}

#[tokio::test(start_paused = true)]
async fn test_unregistered_provider_is_not_expandable() {
    let f = fixture().await;
    assert!(f.view.has_children(&key("server")));

    assert!(f.registry.unregister("remote-db"));

    assert!(!f.view.has_children(&key("server")));
    f.view.expand(&[key("server")]).await;
    assert!(!f.view.is_expanded(&key("server")));
    assert_eq!(f.remote.total_calls(), 0);
    assert!(f.view.has_children(&key("local")));
}

#[tokio::test(start_paused = true)]
async fn test_registration_is_rechecked_on_every_fetch() {
    let f = fixture().await;
    let replacement = MockProvider::new("replacement");
    replacement.children("server", vec![leaf("other")]);

    f.registry.register("remote-db", replacement.clone());
    let children = f.view.get_children(&key("server")).await;

    assert_eq!(handles(&children), ["other"]);
    assert_eq!(f.remote.total_calls(), 0);
}

// ============================================================================
// Failure recovery
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_collapses_and_retries_on_expand() {
    let f = fixture().await;
    let mut events = f.view.subscribe();
    f.remote.fail("server");
    f.widget.clear();

    f.view.expand(&[key("server")]).await;

    assert!(!f.view.is_expanded(&key("server")));
    assert_eq!(f.view.children(&key("server")), None);
    assert_eq!(f.view.fetch_state(&key("server")), Some(FetchState::Invalidated));
    let calls = f.widget.calls();
    assert!(calls.contains(&WidgetCall::Expand(key("server"))));
    assert!(calls.contains(&WidgetCall::Collapse(key("server"))));
    let kinds: Vec<_> = drain(&mut events)
        .into_iter()
        .map(|e| match e {
            TreeViewEvent::DidExpandItem(n) => format!("expand:{}", n.handle),
            TreeViewEvent::DidCollapseItem(n) => format!("collapse:{}", n.handle),
            other => format!("{:?}", other),
        })
        .collect();
    assert_eq!(kinds, ["expand:server", "collapse:server"]);

    f.remote.recover("server");
    f.view.expand(&[key("server")]).await;

    assert_eq!(f.remote.calls_for(Some("server")), 2);
    assert!(f.view.is_expanded(&key("server")));
    assert_eq!(handles(&f.view.children(&key("server")).unwrap()), ["db1", "db2"]);
}

#[tokio::test(start_paused = true)]
async fn test_failure_does_not_touch_rest_of_tree() {
    let f = fixture().await;
    f.view.expand(&[key("local")]).await;
    f.remote.fail("server");

    let children = f.view.get_children(&key("server")).await;

    assert!(children.is_empty());
    assert!(f.view.is_expanded(&key("local")));
    assert_eq!(f.view.children(&key("local")), Some(Vec::new()));
    assert_eq!(f.view.children(&lazytree_lib::NodeKey::Root).map(|c| c.len()), Some(2));
}

#[tokio::test(start_paused = true)]
async fn test_top_level_failure_leaves_empty_retryable_root() {
    let f = fixture().await;
    f.local.fail_top_level();

    f.view.refresh(None).await;

    assert_eq!(f.view.fetch_state(&lazytree_lib::NodeKey::Root), Some(FetchState::Invalidated));

    f.local.recover_top_level();
    f.view.refresh(None).await;
    assert_eq!(f.view.children(&lazytree_lib::NodeKey::Root).map(|c| c.len()), Some(2));
}
