//! Live List Subscription
//!
//! Holds at most one open live query. Opening a new one always cancels the
//! previous handle first, and every open bumps a generation counter so
//! deliveries already in flight from a cancelled query can be told apart.

use std::sync::Arc;

use crate::backend::{DocumentStore, SnapshotSink, SubscriptionHandle};
use crate::error::SyncResult;
use crate::model::{Identity, Item, ItemQuery};

#[derive(Debug, Default)]
pub struct LiveSubscription {
    handle: Option<SubscriptionHandle>,
    generation: u64,
}

impl LiveSubscription {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    /// Whether a delivery tagged `generation` comes from the open query
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_open() && generation == self.generation
    }

    /// Cancel the open query, if any. Later deliveries from it are stale.
    pub fn close(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
    }

    /// Replace the open query with `query` for `viewer`.
    ///
    /// `deliver` receives the generation of this query with every snapshot.
    pub async fn open<F>(
        &mut self,
        store: &dyn DocumentStore,
        query: &ItemQuery,
        viewer: &Identity,
        deliver: F,
    ) -> SyncResult<u64>
    where
        F: Fn(u64, SyncResult<Vec<Item>>) + Send + Sync + 'static,
    {
        self.close();
        let generation = self.generation;
        let sink: SnapshotSink = Arc::new(move |snapshot| deliver(generation, snapshot));
        let handle = store.subscribe(query, viewer, sink).await?;
        self.handle = Some(handle);
        Ok(generation)
    }
}

impl Drop for LiveSubscription {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewItem;
    use crate::testing::{MemoryStore, StoreEvent};
    use std::sync::Mutex;

    #[tokio::test]
    async fn reopening_cancels_previous_first() {
        let store = MemoryStore::new();
        let mut live = LiveSubscription::new();
        let query = ItemQuery::newest_items();

        live.open(&store, &query, &Identity::new("a"), |_, _| {}).await.unwrap();
        live.open(&store, &query, &Identity::new("b"), |_, _| {}).await.unwrap();

        assert_eq!(
            store.events(),
            vec![
                StoreEvent::Subscribed("a".into()),
                StoreEvent::Cancelled("a".into()),
                StoreEvent::Subscribed("b".into()),
            ]
        );
        assert_eq!(store.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn stale_generation_is_not_current() {
        let store = MemoryStore::new();
        let mut live = LiveSubscription::new();
        let query = ItemQuery::newest_items();

        let first = live.open(&store, &query, &Identity::new("a"), |_, _| {}).await.unwrap();
        assert!(live.is_current(first));
        let second = live.open(&store, &query, &Identity::new("a"), |_, _| {}).await.unwrap();
        assert!(!live.is_current(first));
        assert!(live.is_current(second));

        live.close();
        assert!(!live.is_current(second));
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn delivers_tagged_snapshots() {
        let store = MemoryStore::new();
        let owner = Identity::new("a");
        let seen: Arc<Mutex<Vec<(u64, usize)>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut live = LiveSubscription::new();
        let generation = live
            .open(&store, &ItemQuery::newest_items(), &owner, move |g, snapshot| {
                let len = snapshot.map(|items| items.len()).unwrap_or(0);
                sink.lock().unwrap().push((g, len));
            })
            .await
            .unwrap();

        store.insert(NewItem::new("Milk", "Aldi", &owner));
        let seen = seen.lock().unwrap().clone();
        assert_eq!(seen, vec![(generation, 0), (generation, 1)]);
    }

    #[tokio::test]
    async fn failed_open_leaves_nothing_open() {
        let store = MemoryStore::new();
        store.fail_subscriptions(true);
        let mut live = LiveSubscription::new();
        let result = live.open(&store, &ItemQuery::newest_items(), &Identity::new("a"), |_, _| {}).await;
        assert!(result.is_err());
        assert!(!live.is_open());
    }
}
