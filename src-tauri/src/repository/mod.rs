//! Repository Layer
//!
//! SQLite storage behind the `DocumentStore` seam.

mod db;
mod item_store;

#[cfg(test)]
mod tests;

pub use db::init_db;
pub use item_store::SqliteItemStore;
