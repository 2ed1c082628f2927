//! Store Grouping
//!
//! Projects the flat, newest-first item list into per-store sections.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::Item;

/// Items sharing one `store` value, in source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreGroup {
    pub store: String,
    pub items: Vec<Item>,
}

/// Group `items` by store in a single pass.
///
/// Groups appear in order of their first item; items keep their relative
/// order inside each group. Store names are never sorted.
pub fn group_by_store(items: &[Item]) -> Vec<StoreGroup> {
    let mut groups: Vec<StoreGroup> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in items {
        let slot = *index.entry(item.store.as_str()).or_insert_with(|| {
            groups.push(StoreGroup {
                store: item.store.clone(),
                items: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].items.push(item.clone());
    }

    groups
}
