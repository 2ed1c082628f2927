//! Backend Traits
//!
//! Abstract interfaces for the identity provider and the document store.
//! The list state machine only talks to these; the desktop host supplies
//! SQLite and Google implementations, tests use `testing`.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;

use crate::error::SyncResult;
use crate::model::{Identity, Item, ItemId, ItemPatch, ItemQuery, NewItem, ProviderKind};

/// Callback receiving every full snapshot (or error) of a live query
pub type SnapshotSink = Arc<dyn Fn(SyncResult<Vec<Item>>) + Send + Sync>;

/// Source of the current session
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Identity signed in right now, if any
    fn current(&self) -> Option<Identity>;

    /// Watch auth-state changes. Dropping the receiver unsubscribes.
    fn observe(&self) -> watch::Receiver<Option<Identity>>;

    /// Run the interactive sign-in flow
    async fn sign_in(&self, provider: ProviderKind) -> SyncResult<Identity>;

    async fn sign_out(&self) -> SyncResult<()>;
}

/// Real-time document store holding the shopping items
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Open a live query on behalf of `viewer`. The store delivers a full
    /// snapshot on open and after every change until the handle is cancelled.
    async fn subscribe(
        &self,
        query: &ItemQuery,
        viewer: &Identity,
        sink: SnapshotSink,
    ) -> SyncResult<SubscriptionHandle>;

    /// Create a document; the store assigns id and `createdAt`
    async fn create(&self, collection: &str, item: NewItem) -> SyncResult<ItemId>;

    /// Patch a document owned by `actor`. Someone else's document is refused.
    async fn update_partial(
        &self,
        collection: &str,
        id: &ItemId,
        patch: ItemPatch,
        actor: &Identity,
    ) -> SyncResult<()>;

    /// Delete a document owned by `actor`. Deleting a missing document
    /// succeeds; someone else's document is refused.
    async fn delete(&self, collection: &str, id: &ItemId, actor: &Identity) -> SyncResult<()>;
}

/// Handle to an open live query. Cancelled on `cancel()` or drop.
pub struct SubscriptionHandle {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl SubscriptionHandle {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("live", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn cancel_runs_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let handle = SubscriptionHandle::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        handle.cancel();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn drop_cancels() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        {
            let _handle = SubscriptionHandle::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
