//! Session Commands
//!
//! Frontend bindings for sign-in and the current view.

use wasm_bindgen::prelude::*;
use crate::models::{Identity, ListView};
use super::call;

pub async fn get_view() -> Result<ListView, String> {
    call("get_view", JsValue::NULL).await
}

pub async fn sign_in() -> Result<Identity, String> {
    call("sign_in", JsValue::NULL).await
}

pub async fn sign_out() -> Result<(), String> {
    call("sign_out", JsValue::NULL).await
}
