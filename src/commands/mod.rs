//! Tauri Command Wrappers
//!
//! Frontend bindings to backend commands and events, organized by domain.

mod item;
mod session;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "core"], catch)]
    async fn invoke(cmd: &str, args: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(js_namespace = ["window", "__TAURI__", "event"])]
    async fn listen(event: &str, handler: &Closure<dyn FnMut(JsValue)>) -> JsValue;
}

// Re-export all public items
pub use item::*;
pub use session::*;

pub const VIEW_EVENT: &str = "shopping-view";
pub const ALERT_EVENT: &str = "shopping-alert";

#[derive(Deserialize)]
struct TauriEvent<T> {
    payload: T,
}

/// Rejections carry the command's error string
fn rejection(err: JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

async fn call<T: DeserializeOwned>(cmd: &str, args: JsValue) -> Result<T, String> {
    let result = invoke(cmd, args).await.map_err(rejection)?;
    serde_wasm_bindgen::from_value(result).map_err(|e| e.to_string())
}

/// Listen to a backend event for the lifetime of the page
pub async fn on_event<T, F>(event: &str, mut handler: F)
where
    T: DeserializeOwned + 'static,
    F: FnMut(T) + 'static,
{
    let name = event.to_string();
    let closure = Closure::<dyn FnMut(JsValue)>::new(move |raw: JsValue| {
        match serde_wasm_bindgen::from_value::<TauriEvent<T>>(raw) {
            Ok(event) => handler(event.payload),
            Err(e) => web_sys::console::error_1(&format!("[EVENT] Bad {} payload: {}", name, e).into()),
        }
    });
    let _ = listen(event, &closure).await;
    closure.forget();
}
