//! In-Memory Backends
//!
//! `MemoryStore` and `MemoryIdentity` behave like the hosted services closely
//! enough to drive the list state machine in tests: snapshots are full
//! replacements, delivered on subscribe and after every write.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

use crate::backend::{DocumentStore, IdentityProvider, SnapshotSink, SubscriptionHandle};
use crate::error::{SyncError, SyncResult};
use crate::model::{Identity, Item, ItemId, ItemPatch, ItemQuery, NewItem, ProviderKind};

/// Observable store activity, in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Subscribed(String),
    Cancelled(String),
    Created(ItemId),
    Updated(ItemId),
    Deleted(ItemId),
}

struct Subscriber {
    viewer: String,
    sink: SnapshotSink,
}

#[derive(Default)]
struct MemoryInner {
    docs: Vec<Item>,
    next_id: u64,
    clock: i64,
    subscribers: HashMap<u64, Subscriber>,
    next_subscriber: u64,
    events: Vec<StoreEvent>,
    paused: bool,
    fail_subscribe: bool,
    fail_writes: bool,
    fail_deletes: HashSet<ItemId>,
}

impl MemoryInner {
    /// Documents visible to `viewer`, newest first
    fn snapshot_for(&self, viewer: &str) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .docs
            .iter()
            .filter(|item| item.owner_id == viewer)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        items
    }

    fn pending_deliveries(&self) -> Vec<(SnapshotSink, Vec<Item>)> {
        if self.paused {
            return Vec::new();
        }
        self.subscribers
            .values()
            .map(|sub| (sub.sink.clone(), self.snapshot_for(&sub.viewer)))
            .collect()
    }
}

/// Document store kept in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Sinks run outside the lock so they may call back into the store
    fn deliver(deliveries: Vec<(SnapshotSink, Vec<Item>)>) {
        for (sink, items) in deliveries {
            sink(Ok(items));
        }
    }

    /// Write a document directly, as another client would
    pub fn insert(&self, item: NewItem) -> ItemId {
        let (id, deliveries) = {
            let mut inner = self.lock();
            inner.next_id += 1;
            inner.clock += 1;
            let id = ItemId::new(format!("doc-{:04}", inner.next_id));
            let created_at = inner.clock;
            inner.docs.push(item.into_item(id.clone(), created_at));
            inner.events.push(StoreEvent::Created(id.clone()));
            (id, inner.pending_deliveries())
        };
        Self::deliver(deliveries);
        id
    }

    /// All documents regardless of owner, in insertion order
    pub fn documents(&self) -> Vec<Item> {
        self.lock().docs.clone()
    }

    pub fn events(&self) -> Vec<StoreEvent> {
        self.lock().events.clone()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }

    /// Hold back snapshot deliveries. Resuming delivers the current state.
    pub fn set_paused(&self, paused: bool) {
        let deliveries = {
            let mut inner = self.lock();
            inner.paused = paused;
            inner.pending_deliveries()
        };
        if !paused {
            Self::deliver(deliveries);
        }
    }

    /// Push an error to every open subscription
    pub fn fail_live_queries(&self, message: &str) {
        let sinks: Vec<SnapshotSink> = self.lock().subscribers.values().map(|s| s.sink.clone()).collect();
        for sink in sinks {
            sink(Err(SyncError::Backend(message.to_string())));
        }
    }

    pub fn fail_subscriptions(&self, fail: bool) {
        self.lock().fail_subscribe = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    pub fn fail_delete_of(&self, id: &ItemId) {
        self.lock().fail_deletes.insert(id.clone());
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn subscribe(
        &self,
        _query: &ItemQuery,
        viewer: &Identity,
        sink: SnapshotSink,
    ) -> SyncResult<SubscriptionHandle> {
        let (key, initial) = {
            let mut inner = self.lock();
            if inner.fail_subscribe {
                return Err(SyncError::Backend("permission denied".to_string()));
            }
            inner.next_subscriber += 1;
            let key = inner.next_subscriber;
            inner.subscribers.insert(
                key,
                Subscriber {
                    viewer: viewer.uid.clone(),
                    sink: sink.clone(),
                },
            );
            inner.events.push(StoreEvent::Subscribed(viewer.uid.clone()));
            let initial = (!inner.paused).then(|| inner.snapshot_for(&viewer.uid));
            (key, initial)
        };
        if let Some(items) = initial {
            sink(Ok(items));
        }

        let inner = Arc::downgrade(&self.inner);
        Ok(SubscriptionHandle::new(move || {
            if let Some(inner) = inner.upgrade() {
                let mut inner = inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
                if let Some(sub) = inner.subscribers.remove(&key) {
                    inner.events.push(StoreEvent::Cancelled(sub.viewer));
                }
            }
        }))
    }

    async fn create(&self, _collection: &str, item: NewItem) -> SyncResult<ItemId> {
        if self.lock().fail_writes {
            return Err(SyncError::Backend("write rejected".to_string()));
        }
        Ok(self.insert(item))
    }

    async fn update_partial(
        &self,
        _collection: &str,
        id: &ItemId,
        patch: ItemPatch,
        actor: &Identity,
    ) -> SyncResult<()> {
        let deliveries = {
            let mut inner = self.lock();
            if inner.fail_writes {
                return Err(SyncError::Backend("write rejected".to_string()));
            }
            let doc = inner
                .docs
                .iter_mut()
                .find(|item| &item.id == id)
                .ok_or_else(|| SyncError::Backend(format!("No document {}", id)))?;
            if doc.owner_id != actor.uid {
                return Err(permission_denied(id));
            }
            patch.apply(doc);
            inner.events.push(StoreEvent::Updated(id.clone()));
            inner.pending_deliveries()
        };
        Self::deliver(deliveries);
        Ok(())
    }

    async fn delete(&self, _collection: &str, id: &ItemId, actor: &Identity) -> SyncResult<()> {
        let deliveries = {
            let mut inner = self.lock();
            if inner.fail_writes || inner.fail_deletes.contains(id) {
                return Err(SyncError::Backend(format!("delete of {} rejected", id)));
            }
            if inner.docs.iter().any(|item| &item.id == id && item.owner_id != actor.uid) {
                return Err(permission_denied(id));
            }
            inner.docs.retain(|item| &item.id != id);
            inner.events.push(StoreEvent::Deleted(id.clone()));
            inner.pending_deliveries()
        };
        Self::deliver(deliveries);
        Ok(())
    }
}

fn permission_denied(id: &ItemId) -> SyncError {
    SyncError::Backend(format!("Permission denied for document {}", id))
}

/// Identity provider whose auth state is set by the test
pub struct MemoryIdentity {
    state: watch::Sender<Option<Identity>>,
    account: Mutex<Option<Identity>>,
    fail_with: Mutex<Option<String>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state,
            account: Mutex::new(None),
            fail_with: Mutex::new(None),
        }
    }

    /// Account returned by the next interactive sign-in
    pub fn with_account(self, identity: Identity) -> Self {
        *self.account.lock().unwrap_or_else(|p| p.into_inner()) = Some(identity);
        self
    }

    /// Report an auth-state change, as the provider's callback would
    pub fn set(&self, identity: Option<Identity>) {
        self.state.send_replace(identity);
    }

    /// Make sign-in and sign-out fail with `message`
    pub fn fail_with(&self, message: &str) {
        *self.fail_with.lock().unwrap_or_else(|p| p.into_inner()) = Some(message.to_string());
    }

    fn failure(&self) -> Option<SyncError> {
        self.fail_with
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
            .map(SyncError::Backend)
    }
}

impl Default for MemoryIdentity {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    fn current(&self) -> Option<Identity> {
        self.state.borrow().clone()
    }

    fn observe(&self) -> watch::Receiver<Option<Identity>> {
        self.state.subscribe()
    }

    async fn sign_in(&self, _provider: ProviderKind) -> SyncResult<Identity> {
        if let Some(err) = self.failure() {
            return Err(err);
        }
        let identity = self
            .account
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
            .ok_or_else(|| SyncError::Backend("popup closed by user".to_string()))?;
        self.set(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> SyncResult<()> {
        if let Some(err) = self.failure() {
            return Err(err);
        }
        self.set(None);
        Ok(())
    }
}
