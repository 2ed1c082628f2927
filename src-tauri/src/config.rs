//! Host Configuration
//!
//! OAuth client credentials come from the environment; data and log files
//! live under the Tauri app directories.

use std::path::PathBuf;
use tauri::Manager;

pub const CLIENT_ID_VAR: &str = "SHOPPING_GOOGLE_CLIENT_ID";
pub const CLIENT_SECRET_VAR: &str = "SHOPPING_GOOGLE_CLIENT_SECRET";

const DB_FILE: &str = "shopping_list.db";
const SESSION_FILE: &str = "session.json";

/// Google OAuth client registered for the installed-app flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl GoogleConfig {
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through `lookup`; blank values count as missing
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Some(Self {
            client_id: read(CLIENT_ID_VAR)?,
            client_secret: read(CLIENT_SECRET_VAR)?,
        })
    }
}

/// Where the host keeps its files
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub db_path: PathBuf,
    pub session_path: PathBuf,
    pub log_dir: PathBuf,
}

impl AppPaths {
    pub fn in_dirs(data_dir: PathBuf, log_dir: PathBuf) -> Self {
        Self {
            db_path: data_dir.join(DB_FILE),
            session_path: data_dir.join(SESSION_FILE),
            log_dir,
        }
    }

    /// Resolve from the app handle, creating the data directory
    pub fn resolve(app_handle: &tauri::AppHandle) -> Result<Self, String> {
        let data_dir = app_handle
            .path()
            .app_data_dir()
            .map_err(|e| format!("No app data dir: {}", e))?;
        std::fs::create_dir_all(&data_dir)
            .map_err(|e| format!("Failed to create {}: {}", data_dir.display(), e))?;
        let log_dir = app_handle
            .path()
            .app_log_dir()
            .map_err(|e| format!("No app log dir: {}", e))?;
        Ok(Self::in_dirs(data_dir, log_dir))
    }
}
