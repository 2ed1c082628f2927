//! Item Commands
//!
//! Frontend bindings for shopping item commands.

use serde::Serialize;
use super::call;

// ========================
// Argument Structs
// ========================

#[derive(Serialize)]
struct AddItemArgs<'a> {
    name: &'a str,
    store: &'a str,
}

#[derive(Serialize)]
struct StoreArgs<'a> {
    store: &'a str,
}

#[derive(Serialize)]
struct DraftArgs<'a> {
    store: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct ToggleArgs<'a> {
    id: &'a str,
    completed: bool,
}

#[derive(Serialize)]
struct IdArgs<'a> {
    id: &'a str,
}

fn to_args<T: Serialize>(args: &T) -> Result<wasm_bindgen::JsValue, String> {
    serde_wasm_bindgen::to_value(args).map_err(|e| e.to_string())
}

// ========================
// Commands
// ========================

/// Returns the new item's id
pub async fn add_item(name: &str, store: &str) -> Result<String, String> {
    call("add_item", to_args(&AddItemArgs { name, store })?).await
}

pub async fn add_item_to_store(store: &str) -> Result<String, String> {
    call("add_item_to_store", to_args(&StoreArgs { store })?).await
}

pub async fn set_draft(store: &str, text: &str) -> Result<(), String> {
    call("set_draft", to_args(&DraftArgs { store, text })?).await
}

/// `completed` is the value currently shown
pub async fn toggle_item(id: &str, completed: bool) -> Result<(), String> {
    call("toggle_item", to_args(&ToggleArgs { id, completed })?).await
}

pub async fn delete_item(id: &str) -> Result<(), String> {
    call("delete_item", to_args(&IdArgs { id })?).await
}

/// Returns how many items were removed
pub async fn clear_completed() -> Result<usize, String> {
    call("clear_completed", wasm_bindgen::JsValue::NULL).await
}
