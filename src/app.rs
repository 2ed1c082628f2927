//! Shopping List Frontend App
//!
//! Mirrors the backend's published view and renders it by store.

use leptos::prelude::*;
use leptos::task::spawn_local;
use reactive_stores::Store;

use crate::commands::{self, on_event, ALERT_EVENT, VIEW_EVENT};
use crate::components::{show_alert, AuthBar, ClearCompletedButton, NewItemForm, StoreSection};
use crate::models::ListView;
use crate::store::{store_set_view, AppState, AppStateStoreFields};

#[component]
pub fn App() -> impl IntoView {
    let store = Store::new(AppState::default());
    provide_context(store);

    // Subscribe first so no update falls between the fetch and the listener
    let (got_live, set_got_live) = signal(false);
    spawn_local(async move {
        on_event::<ListView, _>(VIEW_EVENT, move |view| {
            set_got_live.set(true);
            store_set_view(&store, view);
        })
        .await;
        on_event::<String, _>(ALERT_EVENT, |message| show_alert(&message)).await;

        match commands::get_view().await {
            Ok(view) if !got_live.get_untracked() => store_set_view(&store, view),
            Ok(_) => {}
            Err(e) => web_sys::console::error_1(&format!("[APP] Failed to load view: {}", e).into()),
        }
    });

    let page = Memo::new(move |_| store.view().with(Page::for_view));
    let has_items = Memo::new(move |_| store.view().read().total_items > 0);
    let store_names = Memo::new(move |_| {
        store
            .view()
            .read()
            .sections
            .iter()
            .map(|section| section.store.clone())
            .collect::<Vec<_>>()
    });
    let stats = move || {
        store
            .view()
            .with(|view| format!("{} of {} items completed", view.completed_items, view.total_items))
    };

    view! {
        <div class="container">
            <header>
                <h1>"🛍️ Shopping List"</h1>
                <AuthBar />
                <Show when=move || has_items.get()>
                    <div class="stats">{stats}</div>
                </Show>
            </header>

            {move || match page.get() {
                Page::Loading => view! { <div class="loading">"Loading your shopping list..."</div> }.into_any(),
                // The form stays usable so a signed-out add gets the sign-in alert
                Page::SignedOut => view! {
                    <NewItemForm />
                    <div class="empty-state">
                        <p>"Sign in to see your shopping list."</p>
                    </div>
                }.into_any(),
                Page::List => view! {
                    <NewItemForm />
                    <ClearCompletedButton />
                    <div class="stores">
                        <Show
                            when=move || !store_names.get().is_empty()
                            fallback=|| view! {
                                <div class="empty-state">
                                    <p>"No items in your shopping list yet."</p>
                                    <p>"Add your first item above!"</p>
                                </div>
                            }
                        >
                            <For
                                each=move || store_names.get()
                                key=|name| name.clone()
                                children=move |name| view! { <StoreSection store_name=name /> }
                            />
                        </Show>
                    </div>
                }.into_any(),
            }}
        </div>
    }
}

/// Which body the list renders
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Page {
    Loading,
    SignedOut,
    List,
}

impl Page {
    fn for_view(view: &ListView) -> Self {
        if view.loading {
            Page::Loading
        } else if view.session.is_none() {
            Page::SignedOut
        } else {
            Page::List
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Identity;

    #[test]
    fn signed_out_view_still_gets_a_page_with_the_form() {
        let view = ListView {
            loading: false,
            ..ListView::default()
        };
        assert_eq!(Page::for_view(&view), Page::SignedOut);
    }

    #[test]
    fn loading_wins_over_session_state() {
        assert_eq!(Page::for_view(&ListView::default()), Page::Loading);
    }

    #[test]
    fn signed_in_view_renders_the_list() {
        let view = ListView {
            loading: false,
            session: Some(Identity {
                uid: "u1".to_string(),
                display_name: None,
                email: None,
            }),
            ..ListView::default()
        };
        assert_eq!(Page::for_view(&view), Page::List);
    }
}
