//! Auth Bar Component
//!
//! Sign-in button when signed out; account label and sign-out otherwise.

use leptos::prelude::*;
use leptos::task::spawn_local;

use crate::commands;
use crate::store::{store_session, use_app_store};

#[component]
pub fn AuthBar() -> impl IntoView {
    let store = use_app_store();
    let session = Memo::new(move |_| store_session(&store));
    let (busy, set_busy) = signal(false);

    // Failures arrive as alerts from the backend
    let sign_in = move |_| {
        set_busy.set(true);
        spawn_local(async move {
            if let Err(e) = commands::sign_in().await {
                web_sys::console::warn_1(&format!("[AUTH] Sign in failed: {}", e).into());
            }
            set_busy.set(false);
        });
    };

    let sign_out = move |_| {
        set_busy.set(true);
        spawn_local(async move {
            if let Err(e) = commands::sign_out().await {
                web_sys::console::warn_1(&format!("[AUTH] Sign out failed: {}", e).into());
            }
            set_busy.set(false);
        });
    };

    view! {
        <div class="auth-bar">
            {move || match session.get() {
                Some(identity) => view! {
                    <span class="user-label">{identity.label().to_string()}</span>
                    <button class="auth-btn" disabled=move || busy.get() on:click=sign_out>
                        "Sign Out"
                    </button>
                }.into_any(),
                None => view! {
                    <button class="auth-btn" disabled=move || busy.get() on:click=sign_in>
                        "Sign in with Google"
                    </button>
                }.into_any(),
            }}
        </div>
    }
}
