//! Repository Integration Tests
//!
//! Tests for SqliteItemStore with an in-memory SQLite database.

use crate::repository::{init_db, SqliteItemStore};
use shopping_sync::{
    DocumentStore, Identity, Item, ItemId, ItemPatch, ItemQuery, NewItem, SnapshotSink, SyncError,
    SyncResult, ITEMS_COLLECTION,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;

fn setup_test_store() -> SqliteItemStore {
    // Use in-memory database for tests
    let db_path = PathBuf::from(":memory:");
    let conn = init_db(&db_path).expect("Failed to init test DB");
    SqliteItemStore::new(Arc::new(Mutex::new(conn)))
}

fn alice() -> Identity {
    Identity {
        display_name: Some("Alice".to_string()),
        ..Identity::new("alice")
    }
}

fn bob() -> Identity {
    Identity {
        email: Some("bob@example.com".to_string()),
        ..Identity::new("bob")
    }
}

/// Sink recording every delivered snapshot
fn recorder() -> (SnapshotSink, Arc<StdMutex<Vec<SyncResult<Vec<Item>>>>>) {
    let seen = Arc::new(StdMutex::new(Vec::new()));
    let target = seen.clone();
    let sink: SnapshotSink = Arc::new(move |snapshot| target.lock().unwrap().push(snapshot));
    (sink, seen)
}

fn last_names(seen: &Arc<StdMutex<Vec<SyncResult<Vec<Item>>>>>) -> Vec<String> {
    let seen = seen.lock().unwrap();
    match seen.last() {
        Some(Ok(items)) => items.iter().map(|i| i.name.clone()).collect(),
        other => panic!("unexpected snapshot: {:?}", other),
    }
}

#[tokio::test]
async fn test_subscribe_delivers_initial_snapshot() {
    let store = setup_test_store();
    let (sink, seen) = recorder();

    let _handle = store
        .subscribe(&ItemQuery::newest_items(), &alice(), sink)
        .await
        .expect("Subscribe failed");

    assert_eq!(seen.lock().unwrap().len(), 1);
    assert!(last_names(&seen).is_empty());
    assert_eq!(store.subscriber_count(), 1);
}

#[tokio::test]
async fn test_create_item() {
    let store = setup_test_store();
    let (sink, seen) = recorder();
    let _handle = store
        .subscribe(&ItemQuery::newest_items(), &alice(), sink)
        .await
        .unwrap();

    let id = store
        .create(ITEMS_COLLECTION, NewItem::new("Milk", "Costco", &alice()))
        .await
        .expect("Failed to create");
    assert_eq!(id.as_str().len(), 20);

    let seen_now = seen.lock().unwrap();
    assert_eq!(seen_now.len(), 2);
    let items = seen_now[1].as_ref().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, id);
    assert_eq!(items[0].store, "Costco");
    assert_eq!(items[0].owner_id, "alice");
    assert!(!items[0].completed);
    assert!(items[0].created_at > 0);
}

#[tokio::test]
async fn test_newest_first() {
    let store = setup_test_store();
    for name in ["Milk", "Eggs", "Bread"] {
        store
            .create(ITEMS_COLLECTION, NewItem::new(name, "Costco", &alice()))
            .await
            .unwrap();
    }

    let (sink, seen) = recorder();
    let _handle = store
        .subscribe(&ItemQuery::newest_items(), &alice(), sink)
        .await
        .unwrap();
    assert_eq!(last_names(&seen), vec!["Bread", "Eggs", "Milk"]);
}

#[tokio::test]
async fn test_documents_scoped_to_owner() {
    let store = setup_test_store();
    store
        .create(ITEMS_COLLECTION, NewItem::new("Milk", "Costco", &alice()))
        .await
        .unwrap();
    store
        .create(ITEMS_COLLECTION, NewItem::new("Nails", "Hardware", &bob()))
        .await
        .unwrap();

    let (sink, seen) = recorder();
    let _handle = store
        .subscribe(&ItemQuery::newest_items(), &bob(), sink)
        .await
        .unwrap();
    assert_eq!(last_names(&seen), vec!["Nails"]);

    // Alice's writes still re-run Bob's query, which stays scoped
    store
        .create(ITEMS_COLLECTION, NewItem::new("Eggs", "Costco", &alice()))
        .await
        .unwrap();
    assert_eq!(seen.lock().unwrap().len(), 2);
    assert_eq!(last_names(&seen), vec!["Nails"]);
}

#[tokio::test]
async fn test_update_partial() {
    let store = setup_test_store();
    let id = store
        .create(ITEMS_COLLECTION, NewItem::new("Milk", "Costco", &alice()))
        .await
        .unwrap();
    let (sink, seen) = recorder();
    let _handle = store
        .subscribe(&ItemQuery::newest_items(), &alice(), sink)
        .await
        .unwrap();

    store
        .update_partial(ITEMS_COLLECTION, &id, ItemPatch::completed(true), &alice())
        .await
        .expect("Update failed");

    let seen = seen.lock().unwrap();
    let items = seen.last().unwrap().as_ref().unwrap();
    assert!(items[0].completed);
    assert_eq!(items[0].name, "Milk");
}

#[tokio::test]
async fn test_update_missing_document_fails() {
    let store = setup_test_store();
    let result = store
        .update_partial(ITEMS_COLLECTION, &ItemId::new("missing"), ItemPatch::completed(true), &alice())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_delete_item() {
    let store = setup_test_store();
    let id = store
        .create(ITEMS_COLLECTION, NewItem::new("Milk", "Costco", &alice()))
        .await
        .unwrap();
    store
        .create(ITEMS_COLLECTION, NewItem::new("Eggs", "Costco", &alice()))
        .await
        .unwrap();
    let (sink, seen) = recorder();
    let _handle = store
        .subscribe(&ItemQuery::newest_items(), &alice(), sink)
        .await
        .unwrap();

    store.delete(ITEMS_COLLECTION, &id, &alice()).await.expect("Delete failed");
    assert_eq!(last_names(&seen), vec!["Eggs"]);

    // Deleting again is not an error
    store.delete(ITEMS_COLLECTION, &id, &alice()).await.expect("Second delete failed");
}

#[tokio::test]
async fn test_writes_limited_to_owner() {
    let store = setup_test_store();
    let id = store
        .create(ITEMS_COLLECTION, NewItem::new("Milk", "Costco", &alice()))
        .await
        .unwrap();

    let update = store
        .update_partial(ITEMS_COLLECTION, &id, ItemPatch::completed(true), &bob())
        .await;
    assert!(matches!(update, Err(SyncError::Backend(ref msg)) if msg.contains("Permission denied")));
    let delete = store.delete(ITEMS_COLLECTION, &id, &bob()).await;
    assert!(matches!(delete, Err(SyncError::Backend(ref msg)) if msg.contains("Permission denied")));

    let (sink, seen) = recorder();
    let _handle = store
        .subscribe(&ItemQuery::newest_items(), &alice(), sink)
        .await
        .unwrap();
    let seen = seen.lock().unwrap();
    let items = seen.last().unwrap().as_ref().unwrap();
    assert_eq!(items.len(), 1);
    assert!(!items[0].completed);
}

#[tokio::test]
async fn test_cancel_stops_deliveries() {
    let store = setup_test_store();
    let (sink, seen) = recorder();
    let handle = store
        .subscribe(&ItemQuery::newest_items(), &alice(), sink)
        .await
        .unwrap();

    handle.cancel();
    assert_eq!(store.subscriber_count(), 0);

    store
        .create(ITEMS_COLLECTION, NewItem::new("Milk", "Costco", &alice()))
        .await
        .unwrap();
    assert_eq!(seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_dropping_handle_cancels() {
    let store = setup_test_store();
    let (sink, _seen) = recorder();
    {
        let _handle = store
            .subscribe(&ItemQuery::newest_items(), &alice(), sink)
            .await
            .unwrap();
        assert_eq!(store.subscriber_count(), 1);
    }
    assert_eq!(store.subscriber_count(), 0);
}

#[tokio::test]
async fn test_unknown_collection_rejected() {
    let store = setup_test_store();
    let result = store
        .create("groceries", NewItem::new("Milk", "Costco", &alice()))
        .await;
    assert!(result.is_err());

    let (sink, _seen) = recorder();
    let mut query = ItemQuery::newest_items();
    query.collection = "groceries".to_string();
    assert!(store.subscribe(&query, &alice(), sink).await.is_err());
}
