//! Tauri Commands for the session and the current view

use shopping_sync::{Identity, ListView, ProviderKind};
use tauri::State;

use crate::AppState;

/// Latest published view
#[tauri::command]
pub fn get_view(state: State<'_, AppState>) -> ListView {
    state.list.view()
}

/// Run the interactive sign-in; only Google is offered
#[tauri::command]
pub async fn sign_in(state: State<'_, AppState>) -> Result<Identity, String> {
    state
        .list
        .sign_in(ProviderKind::Google)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn sign_out(state: State<'_, AppState>) -> Result<(), String> {
    state.list.sign_out().await.map_err(|e| e.to_string())
}
