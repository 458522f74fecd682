//! Scripted, headless session against a lazy tree view.

mod catalog;
mod paths;
mod widget;

use std::fs::File;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lazytree_lib::coordinator::{Contribution, ContributionRegistry};
use lazytree_lib::error::CommandError;
use lazytree_lib::host::{CommandService, EnvironmentChange};
use lazytree_lib::model::{Action, MenuId, VIEW_ITEM_KEY};
use lazytree_lib::provider::ProviderRegistry;
use lazytree_lib::widget::{InputOrigin, SelectionChange, TreeWidget};
use lazytree_lib::{NodeKey, TreeView, TreeViewConfig, TreeViewEvent};
use simplelog::{Config, LevelFilter, WriteLogger};
use tokio::sync::broadcast;

use catalog::{CatalogProvider, REMOTE_PROVIDER_ID, RemoteProvider};
use widget::LogWidget;

const VIEW_ID: &str = "connections";

/// Prints every command instead of running it.
struct PrintCommands;

#[async_trait]
impl CommandService for PrintCommands {
    async fn execute_command(&self, id: &str, arguments: Vec<serde_json::Value>) -> Result<(), CommandError> {
        println!("  > {} {}", id, serde_json::Value::Array(arguments));
        Ok(())
    }
}

fn init_logging() {
    let path = paths::log_file();
    match File::create(&path) {
        Ok(file) => {
            if WriteLogger::init(LevelFilter::Debug, Config::default(), file).is_ok() {
                println!("Logging to {}", path.display());
            }
        }
        Err(e) => eprintln!("Logging disabled: {}: {}", path.display(), e),
    }
}

fn contributions() -> Arc<ContributionRegistry> {
    let registry = Arc::new(ContributionRegistry::new());
    registry.contribute(Contribution::new(MenuId::ViewTitle, Action::new("catalog.addServer", "Add Server")).group("inline"));
    registry.contribute(
        Contribution::new(MenuId::ViewItemContext, Action::new("catalog.refresh", "Refresh"))
            .group("inline")
            .when(VIEW_ITEM_KEY, "database"),
    );
    registry.contribute(
        Contribution::new(MenuId::ViewItemContext, Action::new("catalog.newQuery", "New Query"))
            .group("navigation")
            .when(VIEW_ITEM_KEY, "database"),
    );
    registry.contribute(
        Contribution::new(MenuId::DataExplorerContext, Action::new("catalog.newQuery", "New Query"))
            .when(VIEW_ITEM_KEY, "database"),
    );
    registry.contribute(
        Contribution::new(MenuId::DataExplorerContext, Action::new("catalog.properties", "Properties"))
            .group("z_properties")
            .when(VIEW_ITEM_KEY, "database"),
    );
    registry
}

/// Prints the materialized, expanded part of the tree.
fn render(view: &TreeView) {
    fn walk(view: &TreeView, key: &NodeKey, depth: usize) {
        let Some(children) = view.children(key) else {
            return;
        };
        for child in children {
            let child_key = child.key();
            let twistie = match (view.has_children(&child_key), view.is_expanded(&child_key)) {
                (false, _) => " ",
                (true, false) => "+",
                (true, true) => "-",
            };
            let description = child.description.as_deref().map(|d| format!("  ({})", d)).unwrap_or_default();
            println!("  {}{} {}{}", "  ".repeat(depth), twistie, child.label, description);
            if view.is_expanded(&child_key) {
                walk(view, &child_key, depth + 1);
            }
        }
    }
    walk(view, &NodeKey::Root, 0);
}

fn print_events(events: &mut broadcast::Receiver<TreeViewEvent>) {
    while let Ok(event) = events.try_recv() {
        let text = match event {
            TreeViewEvent::DidExpandItem(node) => format!("expanded {}", node.label),
            TreeViewEvent::DidCollapseItem(node) => format!("collapsed {}", node.label),
            TreeViewEvent::DidChangeSelection(nodes) => format!("selected {} nodes", nodes.len()),
            TreeViewEvent::DidChangeVisibility(visible) => format!("visible: {}", visible),
            TreeViewEvent::DidChangeActions => "title actions changed".to_string(),
        };
        println!("  event: {}", text);
    }
}

fn step(title: &str) {
    println!("\n== {}", title);
}

#[tokio::main]
async fn main() {
    init_logging();

    let catalog = match CatalogProvider::new() {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => {
            eprintln!("Error: invalid catalog: {}", e);
            return;
        }
    };
    let delegated = Arc::new(ProviderRegistry::new());
    delegated.register(REMOTE_PROVIDER_ID, Arc::new(RemoteProvider::new(Duration::from_millis(200))));
    let menus = contributions();

    let widget = Arc::new(LogWidget::new());
    let factory = Arc::clone(&widget);
    let config = TreeViewConfig::default()
        .with_activation_wait(Duration::from_millis(300))
        .with_collapse_all_action(true);
    let view = TreeView::builder(VIEW_ID, move || factory.clone() as Arc<dyn TreeWidget>)
        .config(config)
        .delegated(delegated.clone())
        .commands(Arc::new(PrintCommands))
        .menus(menus.clone())
        .build();
    let mut events = view.subscribe();
    let (environment, environment_rx) = broadcast::channel(8);
    view.watch_environment(environment_rx);

    step("Show the view before any provider registered");
    view.set_visibility(true).await;
    tokio::time::sleep(Duration::from_millis(350)).await;
    if let Some(message) = widget.message() {
        println!("  message: {:?}", message);
    }
    print_events(&mut events);

    step("Register the catalog provider");
    view.set_data_provider(Some(catalog)).await;
    view.layout(40);
    render(&view);

    step("Expand localhost and the sales database");
    view.expand(&[NodeKey::item("local")]).await;
    view.expand(&[NodeKey::item("local/sales")]).await;
    render(&view);
    print_events(&mut events);

    step("Expand the remote server (first request times out)");
    view.expand(&[NodeKey::item("remote")]).await;
    render(&view);
    print_events(&mut events);

    step("Expand the remote server again");
    view.expand(&[NodeKey::item("remote")]).await;
    render(&view);
    print_events(&mut events);

    step("Refresh localhost while hidden");
    view.set_visibility(false).await;
    view.refresh(Some(vec![NodeKey::item("local")])).await;
    view.refresh(Some(vec![NodeKey::item("local")])).await;
    println!("  busy: {}, cached: {:?}", view.is_busy(), view.children(&NodeKey::item("local")).map(|c| c.len()));
    view.set_visibility(true).await;
    render(&view);
    print_events(&mut events);

    step("Open a table with the keyboard");
    let orders = NodeKey::item("local/sales/orders");
    widget.select(std::slice::from_ref(&orders));
    view.on_selection_changed(SelectionChange::user(vec![orders.clone()], InputOrigin::Keyboard))
        .await;
    view.set_selection(&[NodeKey::item("notes")]);
    print_events(&mut events);

    step("Database actions");
    let sales = NodeKey::item("local/sales");
    if let Some(row) = view.bind_row(&sales) {
        let inline: Vec<_> = row.actions.iter().map(|a| a.label.as_str()).collect();
        println!("  row {:?} {:?} inline {:?}", row.template, row.file_kind, inline);
    }
    let menu = view.context_menu(&sales);
    let labels: Vec<_> = menu.iter().map(|a| a.label.as_str()).collect();
    println!("  context menu: {:?}", labels);
    if let Some(action) = menu.first()
        && let Err(e) = view.run_item_action(action, &sales).await
    {
        eprintln!("Error: {}", e);
    }

    step("Title actions");
    menus.contribute(Contribution::new(MenuId::ViewTitle, Action::new("catalog.filter", "Filter")).group("inline"));
    tokio::time::sleep(Duration::from_millis(10)).await;
    let titles: Vec<_> = view.primary_actions().into_iter().map(|a| a.label).collect();
    println!("  {:?}", titles);
    let _ = environment.send(EnvironmentChange::ColorTheme);
    for action in view.primary_actions() {
        if let Err(e) = view.run_title_action(&action.id).await {
            eprintln!("Error: {}", e);
        }
    }
    render(&view);
    print_events(&mut events);

    view.dispose();
}
