//! Tauri Commands for shopping items
//!
//! Writes go through the list actor; the resulting view arrives on the
//! `shopping-view` event once the store redelivers.

use shopping_sync::ItemId;
use tauri::State;

use crate::AppState;

/// Add an item from the global form
#[tauri::command]
pub async fn add_item(state: State<'_, AppState>, name: String, store: String) -> Result<ItemId, String> {
    state.list.add_item(name, store).await.map_err(|e| e.to_string())
}

/// Add the draft typed in a store section
#[tauri::command]
pub async fn add_item_to_store(state: State<'_, AppState>, store: String) -> Result<ItemId, String> {
    state.list.add_item_to_store(store).await.map_err(|e| e.to_string())
}

#[tauri::command]
pub fn set_draft(state: State<'_, AppState>, store: String, text: String) {
    state.list.set_draft(store, text);
}

/// Flip an item; `completed` is the value currently shown
#[tauri::command]
pub async fn toggle_item(state: State<'_, AppState>, id: String, completed: bool) -> Result<(), String> {
    state.list.toggle_item(ItemId::new(id), completed).await;
    Ok(())
}

#[tauri::command]
pub async fn delete_item(state: State<'_, AppState>, id: String) -> Result<(), String> {
    state.list.delete_item(ItemId::new(id)).await;
    Ok(())
}

/// Delete every completed item; returns how many were removed
#[tauri::command]
pub async fn clear_completed(state: State<'_, AppState>) -> Result<usize, String> {
    let outcome = state.list.clear_completed().await;
    Ok(outcome.succeeded())
}
