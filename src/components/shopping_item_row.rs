//! Shopping Item Row Component
//!
//! Checkbox, name and delete button for one item.

use leptos::prelude::*;
use leptos::task::spawn_local;
use wasm_bindgen::JsCast;

use crate::commands;
use crate::models::Item;

#[component]
pub fn ShoppingItemRow(item: Item) -> impl IntoView {
    let completed = item.completed;
    let toggle_id = item.id.clone();
    let delete_id = item.id;

    // The row only changes once the backend redelivers the item
    let toggle = move |ev: web_sys::Event| {
        if let Some(input) = ev
            .target()
            .and_then(|target| target.dyn_into::<web_sys::HtmlInputElement>().ok())
        {
            input.set_checked(completed);
        }
        let id = toggle_id.clone();
        spawn_local(async move {
            if let Err(e) = commands::toggle_item(&id, completed).await {
                web_sys::console::warn_1(&format!("[ITEM] Toggle failed: {}", e).into());
            }
        });
    };

    let delete = move |_| {
        let id = delete_id.clone();
        spawn_local(async move {
            if let Err(e) = commands::delete_item(&id).await {
                web_sys::console::warn_1(&format!("[ITEM] Delete failed: {}", e).into());
            }
        });
    };

    let row_class = if completed { "item completed" } else { "item" };

    view! {
        <li class=row_class>
            <label class="item-label">
                <input type="checkbox" class="checkbox" prop:checked=completed on:change=toggle />
                <span class="item-text">{item.name}</span>
            </label>
            <button class="delete-btn" aria-label="Delete item" on:click=delete>
                "×"
            </button>
        </li>
    }
}
