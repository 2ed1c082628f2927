//! List State
//!
//! The single owned state of the shopping list and the view derived from it.

use serde::{Deserialize, Serialize};

use crate::drafts::DraftMap;
use crate::grouping::group_by_store;
use crate::model::{Identity, Item};
use crate::session::{SessionChange, SessionTracker};

/// Everything the UI renders, recomputed after each state change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListView {
    pub session: Option<Identity>,
    pub loading: bool,
    pub sections: Vec<StoreSection>,
    pub total_items: usize,
    pub completed_items: usize,
}

impl Default for ListView {
    fn default() -> Self {
        Self {
            session: None,
            loading: true,
            sections: Vec::new(),
            total_items: 0,
            completed_items: 0,
        }
    }
}

/// One store's items plus its inline form draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSection {
    pub store: String,
    pub items: Vec<Item>,
    pub draft: String,
}

#[derive(Debug, Clone)]
pub struct ListState {
    session: SessionTracker,
    items: Vec<Item>,
    drafts: DraftMap,
    loading: bool,
}

impl Default for ListState {
    fn default() -> Self {
        Self::new()
    }
}

impl ListState {
    pub fn new() -> Self {
        Self {
            session: SessionTracker::new(),
            items: Vec::new(),
            drafts: DraftMap::new(),
            loading: true,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.current()
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn draft(&self, store: &str) -> &str {
        self.drafts.draft(store)
    }

    pub fn set_draft(&mut self, store: &str, text: impl Into<String>) {
        self.drafts.set_draft(store, text);
    }

    pub fn reset_draft(&mut self, store: &str) {
        self.drafts.reset(store);
    }

    /// Record an auth-state report.
    ///
    /// Becoming signed out while nothing is shown stops the spinner right
    /// away, since no subscription will ever deliver.
    pub fn apply_identity(&mut self, identity: Option<Identity>) -> SessionChange {
        let signed_out = identity.is_none();
        let change = self.session.update(identity);
        if signed_out && self.items.is_empty() {
            self.loading = false;
        }
        change
    }

    /// Empty view for a missing or replaced session. A signed-in session
    /// stays loading until its first snapshot arrives.
    pub fn clear_view(&mut self) {
        self.items.clear();
        self.drafts.clear();
        self.loading = self.session.is_signed_in();
    }

    /// Full-replace with a fresh snapshot
    pub fn apply_snapshot(&mut self, items: Vec<Item>) {
        self.items = items;
        self.loading = false;
    }

    /// A live query failed; the last known items stay
    pub fn apply_subscription_error(&mut self) {
        self.loading = false;
    }

    pub fn completed(&self) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(|item| item.completed)
    }

    pub fn view(&self) -> ListView {
        let sections = group_by_store(&self.items)
            .into_iter()
            .map(|group| StoreSection {
                draft: self.drafts.draft(&group.store).to_string(),
                store: group.store,
                items: group.items,
            })
            .collect();

        ListView {
            session: self.session.current().cloned(),
            loading: self.loading,
            sections,
            total_items: self.items.len(),
            completed_items: self.completed().count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemId;

    fn item(id: &str, store: &str, completed: bool) -> Item {
        Item {
            id: ItemId::new(id),
            name: id.to_string(),
            store: store.to_string(),
            completed,
            owner_id: "u".to_string(),
            created_at: 0,
        }
    }

    #[test]
    fn starts_loading_and_signed_out() {
        let state = ListState::new();
        assert!(state.is_loading());
        assert!(state.identity().is_none());
        assert!(state.view().sections.is_empty());
    }

    #[test]
    fn signed_out_with_empty_view_stops_loading() {
        let mut state = ListState::new();
        state.apply_identity(None);
        assert!(!state.is_loading());
    }

    #[test]
    fn signed_out_with_items_waits_for_clear() {
        let mut state = ListState::new();
        state.apply_identity(Some(Identity::new("u")));
        state.apply_snapshot(vec![item("1", "Aldi", false)]);
        state.loading = true;
        state.apply_identity(None);
        assert!(state.is_loading());
        state.clear_view();
        assert!(!state.is_loading());
        assert!(state.items().is_empty());
    }

    #[test]
    fn clear_view_while_signed_in_awaits_first_snapshot() {
        let mut state = ListState::new();
        state.apply_identity(Some(Identity::new("u")));
        state.apply_snapshot(vec![item("1", "Aldi", false)]);
        state.apply_identity(Some(Identity::new("v")));
        state.clear_view();
        assert!(state.is_loading());
        assert!(state.items().is_empty());
    }

    #[test]
    fn error_keeps_last_items() {
        let mut state = ListState::new();
        state.apply_identity(Some(Identity::new("u")));
        state.apply_snapshot(vec![item("1", "Aldi", false)]);
        state.apply_subscription_error();
        assert_eq!(state.items().len(), 1);
        assert!(!state.is_loading());
    }

    #[test]
    fn view_counts_and_drafts() {
        let mut state = ListState::new();
        state.apply_identity(Some(Identity::new("u")));
        state.apply_snapshot(vec![
            item("1", "Aldi", true),
            item("2", "Lidl", false),
            item("3", "Aldi", false),
        ]);
        state.set_draft("Lidl", "Bread");

        let view = state.view();
        assert_eq!(view.total_items, 3);
        assert_eq!(view.completed_items, 1);
        assert_eq!(view.sections.len(), 2);
        assert_eq!(view.sections[0].store, "Aldi");
        assert_eq!(view.sections[0].draft, "");
        assert_eq!(view.sections[1].draft, "Bread");
    }
}
