//! Sync Errors
//!
//! Error taxonomy shared by the gateway, the subscription and the backends.

use serde::{Deserialize, Serialize};

/// Common result type for list operations
pub type SyncResult<T> = Result<T, SyncError>;

/// Input field that failed the empty check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Store,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncError {
    /// A mutation was attempted with no signed-in identity
    NotAuthenticated,
    /// Item name or store name was blank after trimming
    EmptyField(Field),
    /// Any failure reported by the identity provider or the document store
    Backend(String),
}

impl SyncError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        SyncError::Backend(err.to_string())
    }
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::NotAuthenticated => write!(f, "Please sign in to add items"),
            SyncError::EmptyField(Field::Name) => write!(f, "Item name is empty"),
            SyncError::EmptyField(Field::Store) => write!(f, "Store name is empty"),
            SyncError::Backend(msg) => write!(f, "Backend error: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}
