//! New Item Form Component
//!
//! Global form taking an item name and a store name.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::commands;

/// Inputs clear only after the item was created
#[component]
pub fn NewItemForm() -> impl IntoView {
    let (name, set_name) = signal(String::new());
    let (store_name, set_store_name) = signal(String::new());

    let add_item = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let item_name = name.get();
        let item_store = store_name.get();

        spawn_local(async move {
            match commands::add_item(&item_name, &item_store).await {
                Ok(_) => {
                    set_name.set(String::new());
                    set_store_name.set(String::new());
                }
                Err(e) => web_sys::console::log_1(&format!("[FORM] Item not added: {}", e).into()),
            }
        });
    };

    view! {
        <form class="add-form" on:submit=add_item>
            <input
                type="text"
                class="item-input"
                placeholder="Item name"
                prop:value=move || name.get()
                on:input=move |ev| set_name.set(event_target_value(&ev))
            />
            <input
                type="text"
                class="store-input"
                placeholder="Store name"
                prop:value=move || store_name.get()
                on:input=move |ev| set_store_name.set(event_target_value(&ev))
            />
            <button type="submit" class="add-btn">"Add Item"</button>
        </form>
    }
}
