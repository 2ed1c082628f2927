//! Shopping Item Store
//!
//! SQLite-backed `DocumentStore` with live queries: every successful write
//! re-runs each open query and pushes the full result to its sink.

use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

use shopping_sync::{
    Direction, DocumentStore, Identity, Item, ItemId, ItemPatch, ItemQuery, NewItem, SnapshotSink,
    SubscriptionHandle, SyncError, SyncResult, ITEMS_COLLECTION,
};

const ITEM_COLUMNS: &str = "id, name, store, completed, owner_id, created_at";

struct Subscriber {
    query: ItemQuery,
    viewer: String,
    sink: SnapshotSink,
}

type Subscribers = Arc<StdMutex<HashMap<u64, Subscriber>>>;

/// SQLite implementation of the shopping item document store
pub struct SqliteItemStore {
    conn: Arc<Mutex<Connection>>,
    subscribers: Subscribers,
    next_subscriber: AtomicU64,
    next_doc: AtomicU64,
}

impl SqliteItemStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            subscribers: Arc::new(StdMutex::new(HashMap::new())),
            next_subscriber: AtomicU64::new(1),
            next_doc: AtomicU64::new(1),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        lock_subscribers(&self.subscribers).len()
    }

    /// Fresh opaque document id
    fn new_doc_id(&self, owner: &str, created_at: i64) -> ItemId {
        let seq = self.next_doc.fetch_add(1, Ordering::Relaxed);
        let nanos = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let hash = blake3::hash(format!("{}:{}:{}:{}", owner, created_at, nanos, seq).as_bytes());
        ItemId::new(&hash.to_hex()[..20])
    }

    /// Re-run every open query and deliver the results. Deliveries happen
    /// under the connection lock so snapshots reach each sink in write order.
    async fn notify_all(&self) {
        let targets: Vec<(ItemQuery, String, SnapshotSink)> = lock_subscribers(&self.subscribers)
            .values()
            .map(|sub| (sub.query.clone(), sub.viewer.clone(), sub.sink.clone()))
            .collect();
        if targets.is_empty() {
            return;
        }

        let conn = self.conn.lock().await;
        for (query, viewer, sink) in targets {
            sink(query_items(&conn, &query, &viewer));
        }
    }
}

fn lock_subscribers(subscribers: &Subscribers) -> std::sync::MutexGuard<'_, HashMap<u64, Subscriber>> {
    subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn check_collection(collection: &str) -> SyncResult<()> {
    if collection == ITEMS_COLLECTION {
        Ok(())
    } else {
        Err(SyncError::Backend(format!("Unknown collection {}", collection)))
    }
}

/// Map a document field to its column
fn column_for(field: &str) -> SyncResult<&'static str> {
    match field {
        "createdAt" => Ok("created_at"),
        "name" => Ok("name"),
        "store" => Ok("store"),
        "completed" => Ok("completed"),
        other => Err(SyncError::Backend(format!("Cannot order by {}", other))),
    }
}

/// Writes are limited to the caller's own documents
fn owned_by_other(conn: &Connection, id: &ItemId, uid: &str) -> SyncResult<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM shopping_items WHERE id = ?1 AND owner_id != ?2",
            params![id.as_str(), uid],
            |row| row.get(0),
        )
        .map_err(SyncError::backend)?;
    Ok(count > 0)
}

fn permission_denied(id: &ItemId) -> SyncError {
    SyncError::Backend(format!("Permission denied for document {}", id))
}

fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<Item> {
    Ok(Item {
        id: ItemId::new(row.get::<_, String>(0)?),
        name: row.get(1)?,
        store: row.get(2)?,
        completed: row.get(3)?,
        owner_id: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Items the viewer may read, in query order. Documents are readable only
/// by their owner.
fn query_items(conn: &Connection, query: &ItemQuery, viewer: &str) -> SyncResult<Vec<Item>> {
    check_collection(&query.collection)?;
    let column = column_for(&query.order_by.field)?;
    let direction = match query.order_by.direction {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
    };
    let sql = format!(
        "SELECT {} FROM shopping_items WHERE owner_id = ?1 ORDER BY {} {}, rowid {}",
        ITEM_COLUMNS, column, direction, direction
    );

    let mut stmt = conn.prepare(&sql).map_err(SyncError::backend)?;
    let rows = stmt
        .query_map(params![viewer], row_to_item)
        .map_err(SyncError::backend)?;
    rows.collect::<rusqlite::Result<Vec<Item>>>()
        .map_err(SyncError::backend)
}

#[async_trait]
impl DocumentStore for SqliteItemStore {
    async fn subscribe(
        &self,
        query: &ItemQuery,
        viewer: &Identity,
        sink: SnapshotSink,
    ) -> SyncResult<SubscriptionHandle> {
        let conn = self.conn.lock().await;
        let initial = query_items(&conn, query, &viewer.uid)?;

        let key = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        lock_subscribers(&self.subscribers).insert(
            key,
            Subscriber {
                query: query.clone(),
                viewer: viewer.uid.clone(),
                sink: sink.clone(),
            },
        );
        log::debug!("Live query #{} opened for {}", key, viewer.uid);
        sink(Ok(initial));
        drop(conn);

        let subscribers = Arc::downgrade(&self.subscribers);
        Ok(SubscriptionHandle::new(move || {
            if let Some(subscribers) = subscribers.upgrade() {
                lock_subscribers(&subscribers).remove(&key);
                log::debug!("Live query #{} closed", key);
            }
        }))
    }

    async fn create(&self, collection: &str, item: NewItem) -> SyncResult<ItemId> {
        check_collection(collection)?;
        let created_at = chrono::Utc::now().timestamp_millis();
        let id = self.new_doc_id(&item.owner_id, created_at);
        {
            let conn = self.conn.lock().await;
            conn.execute(
                "INSERT INTO shopping_items (id, name, store, completed, owner_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id.as_str(), item.name, item.store, item.completed, item.owner_id, created_at],
            )
            .map_err(SyncError::backend)?;
        }
        self.notify_all().await;
        Ok(id)
    }

    async fn update_partial(
        &self,
        collection: &str,
        id: &ItemId,
        patch: ItemPatch,
        actor: &Identity,
    ) -> SyncResult<()> {
        check_collection(collection)?;
        let Some(completed) = patch.completed else {
            return Ok(());
        };
        {
            let conn = self.conn.lock().await;
            let changed = conn
                .execute(
                    "UPDATE shopping_items SET completed = ?1 WHERE id = ?2 AND owner_id = ?3",
                    params![completed, id.as_str(), actor.uid],
                )
                .map_err(SyncError::backend)?;
            if changed == 0 {
                if owned_by_other(&conn, id, &actor.uid)? {
                    return Err(permission_denied(id));
                }
                return Err(SyncError::Backend(format!("No document to update: {}", id)));
            }
        }
        self.notify_all().await;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &ItemId, actor: &Identity) -> SyncResult<()> {
        check_collection(collection)?;
        {
            let conn = self.conn.lock().await;
            let changed = conn
                .execute(
                    "DELETE FROM shopping_items WHERE id = ?1 AND owner_id = ?2",
                    params![id.as_str(), actor.uid],
                )
                .map_err(SyncError::backend)?;
            if changed == 0 && owned_by_other(&conn, id, &actor.uid)? {
                return Err(permission_denied(id));
            }
        }
        self.notify_all().await;
        Ok(())
    }
}
