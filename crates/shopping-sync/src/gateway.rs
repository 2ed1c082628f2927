//! Mutation Gateway
//!
//! Validates user intents and forwards them to the document store. Nothing
//! here touches local state: changes become visible only when the live
//! query redelivers.

use std::sync::Arc;
use tokio::task::JoinSet;

use crate::backend::DocumentStore;
use crate::error::{Field, SyncError, SyncResult};
use crate::model::{Identity, Item, ItemId, ItemPatch, NewItem, ITEMS_COLLECTION};

/// Trim both inputs and reject blanks
pub fn validate_new_item(name: &str, store: &str) -> SyncResult<(String, String)> {
    let name = name.trim();
    let store = store.trim();
    if name.is_empty() {
        return Err(SyncError::EmptyField(Field::Name));
    }
    if store.is_empty() {
        return Err(SyncError::EmptyField(Field::Store));
    }
    Ok((name.to_string(), store.to_string()))
}

/// Result of a bulk delete of completed items
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearOutcome {
    pub attempted: usize,
    pub failed: Vec<ItemId>,
}

#[derive(Clone)]
pub struct MutationGateway {
    store: Arc<dyn DocumentStore>,
    collection: String,
}

impl MutationGateway {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            collection: ITEMS_COLLECTION.to_string(),
        }
    }

    /// Create an item owned by `owner` from the global form
    pub async fn add_item(&self, owner: Option<&Identity>, name: &str, store: &str) -> SyncResult<ItemId> {
        let (name, store) = validate_new_item(name, store)?;
        let owner = owner.ok_or(SyncError::NotAuthenticated)?;

        let id = self
            .store
            .create(&self.collection, NewItem::new(name, store, owner))
            .await
            .map_err(|e| {
                log::error!("Error adding item: {}", e);
                e
            })?;
        log::debug!("Created item {} for {}", id, owner.uid);
        Ok(id)
    }

    /// Create an item from one store section's draft text
    pub async fn add_item_to_store(&self, owner: Option<&Identity>, store: &str, name: &str) -> SyncResult<ItemId> {
        self.add_item(owner, name, store).await
    }

    /// Flip completion. Errors are logged and swallowed.
    pub async fn toggle_item(&self, owner: Option<&Identity>, id: &ItemId, current_completed: bool) {
        let Some(owner) = owner else {
            log::debug!("Ignoring toggle of {} without a session", id);
            return;
        };
        let patch = ItemPatch::completed(!current_completed);
        if let Err(e) = self.store.update_partial(&self.collection, id, patch, owner).await {
            log::error!("Error updating item {}: {}", id, e);
        }
    }

    /// Errors are logged and swallowed.
    pub async fn delete_item(&self, owner: Option<&Identity>, id: &ItemId) {
        let Some(owner) = owner else {
            log::debug!("Ignoring delete of {} without a session", id);
            return;
        };
        if let Err(e) = self.store.delete(&self.collection, id, owner).await {
            log::error!("Error deleting item {}: {}", id, e);
        }
    }

    /// Delete every completed item in `items` concurrently.
    ///
    /// Deletes are independent: a failure neither stops the others nor is
    /// rolled back or retried.
    pub async fn clear_completed(&self, owner: Option<&Identity>, items: &[Item]) -> ClearOutcome {
        let Some(owner) = owner else {
            log::debug!("Ignoring clear completed without a session");
            return ClearOutcome::default();
        };

        let mut deletes = JoinSet::new();
        for item in items.iter().filter(|item| item.completed) {
            let store = self.store.clone();
            let collection = self.collection.clone();
            let id = item.id.clone();
            let owner = owner.clone();
            deletes.spawn(async move {
                let result = store.delete(&collection, &id, &owner).await;
                (id, result)
            });
        }

        let mut outcome = ClearOutcome {
            attempted: deletes.len(),
            failed: Vec::new(),
        };
        let mut failures = 0;
        let mut first_error = None;
        while let Some(joined) = deletes.join_next().await {
            match joined {
                Ok((_, Ok(()))) => continue,
                Ok((id, Err(e))) => {
                    first_error.get_or_insert_with(|| e.to_string());
                    outcome.failed.push(id);
                }
                Err(e) => {
                    first_error.get_or_insert_with(|| e.to_string());
                }
            }
            failures += 1;
        }

        if let Some(err) = first_error {
            log::error!(
                "Error clearing completed items ({} of {} failed): {}",
                failures,
                outcome.attempted,
                err
            );
        }
        outcome
    }
}

impl ClearOutcome {
    /// Deletes reported as done by the store
    pub fn succeeded(&self) -> usize {
        self.attempted.saturating_sub(self.failed.len())
    }
}
