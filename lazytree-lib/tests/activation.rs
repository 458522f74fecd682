//! First activation, the activation window, messages and layout.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use lazytree_lib::host::EnvironmentChange;
use lazytree_lib::view::{NO_DATA_PROVIDER_MESSAGE, ViewMessage};
use lazytree_lib::widget::TreeWidget;
use lazytree_lib::{NodeKey, TreeView, TreeViewConfig};
use tokio::sync::broadcast;

fn view_with_host(host: Arc<RecordingHost>) -> (TreeView, Arc<RecordingWidget>) {
    let widget = RecordingWidget::new();
    let factory = Arc::clone(&widget);
    let view = TreeView::builder(VIEW_ID, move || factory.clone() as Arc<dyn TreeWidget>)
        .host(host)
        .build();
    (view, widget)
}

fn no_provider() -> Option<ViewMessage> {
    Some(ViewMessage::no_data_provider())
}

// ============================================================================
// Activation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_activates_once_on_first_show() {
    let host = RecordingHost::new();
    let (view, widget) = view_with_host(host.clone());
    assert!(widget.calls().is_empty());

    view.set_visibility(true).await;
    view.set_visibility(false).await;
    view.set_visibility(true).await;
    settle().await;

    assert_eq!(host.events(), ["onView:connections"]);
    let inputs = widget.calls().into_iter().filter(|c| *c == WidgetCall::SetInput).count();
    assert_eq!(inputs, 1);
}

#[tokio::test(start_paused = true)]
async fn test_no_provider_message_after_activation_window() {
    let (view, widget) = view_with_host(RecordingHost::new());

    view.set_visibility(true).await;
    tokio::time::sleep(Duration::from_millis(1990)).await;
    assert_eq!(view.shown_message(), None);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(view.shown_message(), no_provider());
    assert!(widget.calls().contains(&WidgetCall::ShowMessage(no_provider())));
    assert_eq!(widget.body_hidden(), Some(true));
}

#[tokio::test(start_paused = true)]
async fn test_slow_host_does_not_extend_window() {
    let (view, _widget) = view_with_host(RecordingHost::slow(Duration::from_secs(30)));

    view.set_visibility(true).await;
    tokio::time::sleep(Duration::from_millis(2010)).await;

    assert_eq!(view.shown_message(), no_provider());
}

#[tokio::test(start_paused = true)]
async fn test_provider_within_window_suppresses_message() {
    let (view, widget) = view_with_host(RecordingHost::new());
    let provider = MockProvider::new("catalog");
    provider.roots(vec![folder("a")]);

    view.set_visibility(true).await;
    tokio::time::sleep(Duration::from_millis(1000)).await;
    view.set_data_provider(Some(provider.clone())).await;
    tokio::time::sleep(Duration::from_millis(2000)).await;

    assert_eq!(view.shown_message(), None);
    assert!(!widget.calls().iter().any(|c| matches!(c, WidgetCall::ShowMessage(Some(_)))));
    assert_eq!(provider.calls_for(None), 1);
}

#[tokio::test(start_paused = true)]
async fn test_message_cleared_and_restored_with_provider() {
    let (view, _widget) = view_with(TreeViewConfig::no_wait());
    view.set_visibility(true).await;
    settle().await;
    assert_eq!(view.shown_message(), no_provider());

    view.set_data_provider(Some(MockProvider::new("catalog"))).await;
    assert_eq!(view.shown_message(), None);

    view.set_data_provider(None).await;
    assert_eq!(view.shown_message(), no_provider());
    assert!(!view.has_data_provider());
}

// ============================================================================
// Messages and layout
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_custom_message_takes_precedence() {
    let (view, widget) = view_with(TreeViewConfig::no_wait());
    view.set_visibility(true).await;
    settle().await;

    let custom = ViewMessage::Markdown("**Connect** to a server".to_string());
    view.set_message(Some(custom.clone()));
    assert_eq!(view.shown_message(), Some(custom.clone()));
    assert_eq!(view.message(), Some(custom.clone()));

    widget.clear();
    view.set_message(Some(custom));
    assert!(!widget.calls().iter().any(|c| matches!(c, WidgetCall::ShowMessage(_))));

    view.set_message(None);
    assert_eq!(view.shown_message(), no_provider());
}

#[tokio::test(start_paused = true)]
async fn test_body_visible_when_tree_has_rows() {
    let provider = MockProvider::new("catalog");
    provider.roots(vec![folder("a")]);
    let (view, widget) = shown_view(provider).await;

    view.set_message(Some(ViewMessage::Text("Read only".to_string())));

    assert_eq!(widget.body_hidden(), Some(false));
}

#[tokio::test(start_paused = true)]
async fn test_body_not_hidden_during_refresh() {
    let config = TreeViewConfig::no_wait().with_activation_wait(Duration::from_millis(100));
    let (view, widget) = view_with(config);
    let provider = MockProvider::new("catalog");
    view.set_data_provider(Some(provider.clone())).await;
    view.set_visibility(true).await;
    view.set_message(Some(ViewMessage::Text("Loading".to_string())));
    assert_eq!(widget.body_hidden(), Some(true));

    provider.set_delay(Duration::from_millis(500));
    let refresh = tokio::spawn({
        let view = view.clone();
        async move { view.refresh(None).await }
    });

    // The activation timer re-evaluates the message mid-batch.
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(view.is_busy());
    assert_eq!(widget.body_hidden(), Some(false));

    refresh.await.unwrap();
    assert_eq!(view.children(&NodeKey::Root), Some(Vec::new()));
    assert_eq!(widget.body_hidden(), Some(true));
}

#[tokio::test(start_paused = true)]
async fn test_host_error_does_not_cut_window_short() {
    let (view, _widget) = view_with_host(RecordingHost::failing());

    view.set_visibility(true).await;
    tokio::time::sleep(Duration::from_millis(1990)).await;
    assert_eq!(view.shown_message(), None);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(view.shown_message(), no_provider());
}

#[tokio::test(start_paused = true)]
async fn test_layout_subtracts_message_height() {
    let (view, widget) = view_with(TreeViewConfig::no_wait());
    view.set_visibility(true).await;
    settle().await;
    widget.clear();

    view.layout(0);
    assert!(widget.calls().is_empty());

    view.layout(300);
    assert_eq!(widget.calls(), [WidgetCall::Layout(300 - MESSAGE_HEIGHT)]);

    view.set_data_provider(Some(MockProvider::new("catalog"))).await;
    assert!(widget.calls().contains(&WidgetCall::Layout(300)));
}

#[test]
fn test_no_provider_text() {
    assert_eq!(
        ViewMessage::no_data_provider(),
        ViewMessage::Text(NO_DATA_PROVIDER_MESSAGE.to_string())
    );
}

// ============================================================================
// Environment
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_environment_changes_soft_refresh() {
    let provider = MockProvider::new("catalog");
    provider.roots(vec![folder("a")]);
    let (view, widget) = shown_view(provider.clone()).await;
    let (changes, receiver) = broadcast::channel(8);
    view.watch_environment(receiver);
    widget.clear();

    changes.send(EnvironmentChange::ColorTheme).unwrap();
    changes
        .send(EnvironmentChange::Configuration(vec!["editor.fontSize".to_string()]))
        .unwrap();
    changes
        .send(EnvironmentChange::Configuration(vec!["explorer.decorations.badges".to_string()]))
        .unwrap();
    settle().await;

    assert_eq!(widget.refreshes().len(), 2);
    assert_eq!(provider.calls_for(None), 1);
}

#[tokio::test(start_paused = true)]
async fn test_dispose_stops_subscriptions() {
    let provider = MockProvider::new("catalog");
    let (view, widget) = shown_view(provider).await;
    let (changes, receiver) = broadcast::channel(8);
    view.watch_environment(receiver);

    view.dispose();
    widget.clear();
    let _ = changes.send(EnvironmentChange::FileIconTheme);
    settle().await;

    assert!(widget.calls().is_empty());
}
