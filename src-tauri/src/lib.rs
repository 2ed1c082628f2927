//! Shopping List Backend
//!
//! Layered architecture:
//! - repository: SQLite document store with live queries
//! - identity: Google sign-in and the persisted session
//! - commands: Tauri command handlers
//!
//! The list state itself lives in the `shopping-sync` actor; this crate
//! supplies its backends and forwards its output to the webview.

use std::sync::Arc;
use tauri::{Emitter, Manager};
use tokio::sync::{broadcast, Mutex};

mod commands;
mod config;
mod identity;
mod repository;

use config::{AppPaths, GoogleConfig};
use identity::{GoogleIdentity, SessionFile};
use repository::{init_db, SqliteItemStore};
use shopping_sync::{ShoppingListActor, ShoppingListHandle};

pub const VIEW_EVENT: &str = "shopping-view";
pub const ALERT_EVENT: &str = "shopping-alert";

/// Application state shared across commands
pub struct AppState {
    pub list: ShoppingListHandle,
}

/// Open the backends and start the list actor
fn start_list(paths: &AppPaths) -> Result<ShoppingListHandle, String> {
    let conn = init_db(&paths.db_path)?;
    let store = Arc::new(SqliteItemStore::new(Arc::new(Mutex::new(conn))));
    let identity = Arc::new(GoogleIdentity::new(
        GoogleConfig::from_env(),
        SessionFile::new(&paths.session_path),
    ));

    let (actor, handle) = ShoppingListActor::new(store, identity);
    tauri::async_runtime::spawn(actor.run());
    Ok(handle)
}

/// Push every view change and alert to the webview
fn forward_to_webview(app_handle: tauri::AppHandle, list: &ShoppingListHandle) {
    let mut views = list.watch_view();
    let view_app = app_handle.clone();
    tauri::async_runtime::spawn(async move {
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            if let Err(e) = view_app.emit(VIEW_EVENT, &view) {
                log::error!("Failed to emit {}: {}", VIEW_EVENT, e);
            }
        }
    });

    let mut alerts = list.alerts();
    tauri::async_runtime::spawn(async move {
        loop {
            match alerts.recv().await {
                Ok(message) => {
                    if let Err(e) = app_handle.emit(ALERT_EVENT, &message) {
                        log::error!("Failed to emit {}: {}", ALERT_EVENT, e);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    log::warn!("Dropped {} alerts", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    tauri::Builder::default()
        .setup(|app| {
            // Single instance check - must be first!
            #[cfg(desktop)]
            app.handle().plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
                // Focus the existing window when a new instance tries to start
                if let Some(window) = app.get_webview_window("main") {
                    let _ = window.set_focus();
                }
            }))?;

            let app_handle = app.handle().clone();
            let paths = AppPaths::resolve(&app_handle)?;

            rolling_logger::init_logger(paths.log_dir.clone(), "ShoppingList")?;
            let _ = rolling_logger::info(&format!("Data in {}", paths.db_path.display()));

            let list = start_list(&paths).inspect_err(|e| {
                let _ = rolling_logger::error(&format!("Startup failed: {}", e));
            })?;
            forward_to_webview(app_handle, &list);
            app.manage(AppState { list });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            // Session
            commands::get_view,
            commands::sign_in,
            commands::sign_out,
            // Items
            commands::add_item,
            commands::add_item_to_store,
            commands::set_draft,
            commands::toggle_item,
            commands::delete_item,
            commands::clear_completed,
            // Diagnostics
            commands::get_recent_logs,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
