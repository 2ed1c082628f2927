//! Clear Completed Button Component

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::commands;
use crate::store::{use_app_store, AppStateStoreFields};

/// Shown while the list has items; deletes every completed one
#[component]
pub fn ClearCompletedButton() -> impl IntoView {
    let store = use_app_store();
    let total = Memo::new(move |_| store.view().read().total_items);
    let completed = Memo::new(move |_| store.view().read().completed_items);

    let clear = move |_| {
        spawn_local(async move {
            match commands::clear_completed().await {
                Ok(removed) => web_sys::console::log_1(&format!("[LIST] Cleared {} items", removed).into()),
                Err(e) => web_sys::console::warn_1(&format!("[LIST] Clear failed: {}", e).into()),
            }
        });
    };

    view! {
        <Show when=move || { total.get() > 0 }>
            <div class="actions">
                <button class="clear-btn" on:click=clear>
                    "Clear Completed (" {move || completed.get()} ")"
                </button>
            </div>
        </Show>
    }
}
