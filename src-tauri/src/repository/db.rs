//! Database Connection and Setup
//!
//! Opens the SQLite file backing the document store and runs migrations.

use rusqlite::Connection;
use std::path::Path;

/// Open (or create) the database at `db_path`. `:memory:` gives a private
/// in-memory database.
pub fn init_db(db_path: &Path) -> Result<Connection, String> {
    let conn = if db_path == Path::new(":memory:") {
        Connection::open_in_memory()
    } else {
        Connection::open(db_path)
    }
    .map_err(|e| format!("Failed to open db: {}", e))?;

    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        .map_err(|e| format!("Failed to enable WAL: {}", e))?;

    run_migrations(&conn)?;
    Ok(conn)
}

/// Check if a column exists in a table
fn column_exists(conn: &Connection, table: &str, column: &str) -> Result<bool, String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", table))
        .map_err(|e| e.to_string())?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .map_err(|e| e.to_string())?;
    for name in names {
        if name.map_err(|e| e.to_string())? == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Run database migrations
fn run_migrations(conn: &Connection) -> Result<(), String> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS shopping_items (
            id TEXT PRIMARY KEY NOT NULL,
            name TEXT NOT NULL,
            store TEXT NOT NULL,
            completed INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    // Lists created before sign-in existed have no owner column
    if !column_exists(conn, "shopping_items", "owner_id")? {
        conn.execute(
            "ALTER TABLE shopping_items ADD COLUMN owner_id TEXT NOT NULL DEFAULT ''",
            [],
        )
        .map_err(|e| format!("Failed to add owner_id: {}", e))?;
    }

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_shopping_items_owner
            ON shopping_items(owner_id, created_at)",
        [],
    )
    .map_err(|e| e.to_string())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_idempotent() {
        let conn = init_db(Path::new(":memory:")).unwrap();
        run_migrations(&conn).unwrap();
        assert!(column_exists(&conn, "shopping_items", "owner_id").unwrap());
        assert!(!column_exists(&conn, "shopping_items", "missing").unwrap());
    }

    #[test]
    fn file_database_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shopping.db");
        init_db(&path).unwrap();
        assert!(path.exists());
    }
}
