//! Per-Store Drafts
//!
//! Pending "new item" text for each store section's inline form.

use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DraftMap {
    entries: HashMap<String, String>,
}

impl DraftMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert the draft for `store`. No validation here.
    pub fn set_draft(&mut self, store: &str, text: impl Into<String>) {
        self.entries.insert(store.to_string(), text.into());
    }

    /// Draft for `store`, or "" when none was typed yet
    pub fn draft(&self, store: &str) -> &str {
        self.entries.get(store).map(String::as_str).unwrap_or("")
    }

    /// Reset one store's draft after a successful submit
    pub fn reset(&mut self, store: &str) {
        if let Some(entry) = self.entries.get_mut(store) {
            entry.clear();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_draft_is_empty() {
        let drafts = DraftMap::new();
        assert_eq!(drafts.draft("Aldi"), "");
    }

    #[test]
    fn reset_leaves_other_stores() {
        let mut drafts = DraftMap::new();
        drafts.set_draft("Aldi", "Milk");
        drafts.set_draft("Lidl", "Bread");
        drafts.reset("Aldi");
        assert_eq!(drafts.draft("Aldi"), "");
        assert_eq!(drafts.draft("Lidl"), "Bread");
    }

    #[test]
    fn set_draft_overwrites() {
        let mut drafts = DraftMap::new();
        drafts.set_draft("Aldi", "Mi");
        drafts.set_draft("Aldi", "Milk");
        assert_eq!(drafts.draft("Aldi"), "Milk");
    }

    #[test]
    fn clear_drops_everything() {
        let mut drafts = DraftMap::new();
        drafts.set_draft("Aldi", "Milk");
        drafts.set_draft("Lidl", "Bread");
        drafts.clear();
        assert_eq!(drafts.draft("Aldi"), "");
        assert_eq!(drafts.draft("Lidl"), "");
    }
}
