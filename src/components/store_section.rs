//! Store Section Component
//!
//! One store's items with an inline form adding to that store.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::commands;
use crate::components::ShoppingItemRow;
use crate::store::{store_set_draft, use_app_store, AppStateStoreFields};

/// Reads its own section from the store so typing a draft does not
/// rebuild the other sections
#[component]
pub fn StoreSection(store_name: String) -> impl IntoView {
    let store = use_app_store();
    let name = store_name.clone();
    let section = Memo::new(move |_| {
        store
            .view()
            .read()
            .sections
            .iter()
            .find(|section| section.store == name)
            .cloned()
    });
    let items = move || section.get().map(|s| s.items).unwrap_or_default();
    let draft = move || section.get().map(|s| s.draft).unwrap_or_default();

    let input_store = store_name.clone();
    let on_input = move |ev: web_sys::Event| {
        let text = event_target_value(&ev);
        store_set_draft(&store, &input_store, &text);
        let target = input_store.clone();
        spawn_local(async move {
            let _ = commands::set_draft(&target, &text).await;
        });
    };

    // The page owns the draft, so it clears its own copy once the item exists
    let submit_store = store_name.clone();
    let add_to_store = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let target = submit_store.clone();
        spawn_local(async move {
            match commands::add_item_to_store(&target).await {
                Ok(_) => store_set_draft(&store, &target, ""),
                Err(e) => {
                    web_sys::console::log_1(&format!("[FORM] Item not added to {}: {}", target, e).into())
                }
            }
        });
    };

    view! {
        <div class="store-section">
            <h2 class="store-name">{store_name}</h2>
            <ul class="items-list">
                <For
                    each=items
                    key=|item| (item.id.clone(), item.completed)
                    children=move |item| view! { <ShoppingItemRow item=item /> }
                />
            </ul>
            <form class="add-form" on:submit=add_to_store>
                <input
                    type="text"
                    class="item-input"
                    placeholder="Item name"
                    prop:value=draft
                    on:input=on_input
                />
                <button type="submit" class="add-btn">"Add Item"</button>
            </form>
        </div>
    }
}
