//! Shopping List Models
//!
//! Items as delivered by the document store, the identity that owns them,
//! and the query/patch shapes sent back to the store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Collection holding every shopping item document
pub const ITEMS_COLLECTION: &str = "shopping-items";

/// Opaque document identifier assigned by the store on creation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A signed-in account as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Stable account id, written to `ownerId` on created items
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
        }
    }
}

/// Sign-in methods the identity provider can be asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Google,
}

/// A shopping item document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Free-form grouping label, not a reference to any store entity
    pub store: String,
    pub completed: bool,
    pub owner_id: String,
    /// Server-assigned creation time in Unix milliseconds
    pub created_at: i64,
}

/// Fields of a document about to be created. The store assigns `id` and
/// `createdAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: String,
    pub store: String,
    pub completed: bool,
    pub owner_id: String,
}

impl NewItem {
    /// Build an incomplete item owned by `owner`. Callers pass trimmed text.
    pub fn new(name: impl Into<String>, store: impl Into<String>, owner: &Identity) -> Self {
        Self {
            name: name.into(),
            store: store.into(),
            completed: false,
            owner_id: owner.uid.clone(),
        }
    }

    /// Materialize the document as the store would after assigning server fields
    pub fn into_item(self, id: ItemId, created_at: i64) -> Item {
        Item {
            id,
            name: self.name,
            store: self.store,
            completed: self.completed,
            owner_id: self.owner_id,
            created_at,
        }
    }
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl ItemPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
        }
    }

    pub fn apply(&self, item: &mut Item) {
        if let Some(completed) = self.completed {
            item.completed = completed;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

/// A collection query with a single ordering clause
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemQuery {
    pub collection: String,
    pub order_by: OrderBy,
}

impl ItemQuery {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            order_by: OrderBy {
                field: "createdAt".to_string(),
                direction: Direction::Desc,
            },
        }
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = OrderBy {
            field: field.into(),
            direction,
        };
        self
    }

    /// Every shopping item, newest first
    pub fn newest_items() -> Self {
        Self::new(ITEMS_COLLECTION).order_by("createdAt", Direction::Desc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_item_is_incomplete_and_owned() {
        let owner = Identity::new("u-1");
        let item = NewItem::new("Milk", "Aldi", &owner);
        assert!(!item.completed);
        assert_eq!(item.owner_id, "u-1");
    }

    #[test]
    fn document_uses_camel_case_fields() {
        let item = NewItem::new("Milk", "Aldi", &Identity::new("u-1")).into_item(ItemId::new("a"), 7);
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["ownerId"], "u-1");
        assert_eq!(json["createdAt"], 7);
        assert_eq!(json["id"], "a");
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let mut item = NewItem::new("Eggs", "Lidl", &Identity::new("u")).into_item(ItemId::new("x"), 1);
        ItemPatch::default().apply(&mut item);
        assert!(!item.completed);
        ItemPatch::completed(true).apply(&mut item);
        assert!(item.completed);
    }

    #[test]
    fn newest_items_query_orders_by_creation_desc() {
        let q = ItemQuery::newest_items();
        assert_eq!(q.collection, ITEMS_COLLECTION);
        assert_eq!(q.order_by.field, "createdAt");
        assert_eq!(q.order_by.direction, Direction::Desc);
    }
}
