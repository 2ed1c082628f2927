//! Frontend Models
//!
//! Data structures matching the view the backend publishes.

use serde::{Deserialize, Serialize};

/// Signed-in account (matches backend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.uid)
    }
}

/// Shopping item (matches backend)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    pub name: String,
    pub store: String,
    pub completed: bool,
    pub owner_id: String,
    pub created_at: i64,
}

/// One store's items plus its inline draft
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSection {
    pub store: String,
    pub items: Vec<Item>,
    pub draft: String,
}

/// Everything the list renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
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
