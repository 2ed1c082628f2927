//! Global Application State Store
//!
//! Uses Leptos reactive_stores for fine-grained reactivity. The backend owns
//! the list; this store only mirrors the last published view.

use leptos::prelude::*;
use reactive_stores::Store;
use crate::models::{Identity, ListView};

/// Global application state with field-level reactivity
#[derive(Clone, Debug, Default, Store)]
pub struct AppState {
    /// Latest view from the backend
    pub view: ListView,
}

/// Type alias for the store
pub type AppStore = Store<AppState>;

/// Get the app store from context
pub fn use_app_store() -> AppStore {
    expect_context::<AppStore>()
}

// ========================
// Store Helper Functions
// ========================

/// Replace the mirrored view.
///
/// Drafts are owned by this page: the backend only echoes what it was sent,
/// and an echo can arrive after newer keystrokes. A section already on the
/// page keeps its local draft; new sections take the backend's value.
pub fn store_set_view(store: &AppStore, view: ListView) {
    let view_field = store.view();
    let mut current = view_field.write();
    let merged = keep_local_drafts(&current, view);
    *current = merged;
}

fn keep_local_drafts(current: &ListView, mut incoming: ListView) -> ListView {
    for section in incoming.sections.iter_mut() {
        if let Some(local) = current.sections.iter().find(|local| local.store == section.store) {
            section.draft = local.draft.clone();
        }
    }
    incoming
}

pub fn store_session(store: &AppStore) -> Option<Identity> {
    store.view().read().session.clone()
}

/// Set one section's draft on the page; the caller also tells the backend
pub fn store_set_draft(store: &AppStore, store_name: &str, text: &str) {
    if let Some(section) = store
        .view()
        .write()
        .sections
        .iter_mut()
        .find(|section| section.store == store_name)
    {
        section.draft = text.to_string();
    }
}
