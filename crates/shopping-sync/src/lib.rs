//! Shopping List Sync
//!
//! Keeps a grouped shopping list in step with a real-time document store:
//! - session: which identity is signed in
//! - subscription: the single live query for that identity
//! - grouping: per-store sections of the newest-first list
//! - gateway: validated writes back to the store
//! - drafts: per-store inline form text
//! - actor: the owner of all of the above

mod actor;
mod backend;
mod drafts;
mod error;
mod gateway;
mod grouping;
mod model;
mod session;
mod state;
mod subscription;
pub mod testing;

pub use actor::{ListCommand, ShoppingListActor, ShoppingListHandle};
pub use backend::{DocumentStore, IdentityProvider, SnapshotSink, SubscriptionHandle};
pub use drafts::DraftMap;
pub use error::{Field, SyncError, SyncResult};
pub use gateway::{validate_new_item, ClearOutcome, MutationGateway};
pub use grouping::{group_by_store, StoreGroup};
pub use model::{
    Direction, Identity, Item, ItemId, ItemPatch, ItemQuery, NewItem, OrderBy, ProviderKind,
    ITEMS_COLLECTION,
};
pub use session::{SessionChange, SessionTracker};
pub use state::{ListState, ListView, StoreSection};
pub use subscription::LiveSubscription;
