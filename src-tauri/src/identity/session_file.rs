//! Persisted session
//!
//! The signed-in identity as JSON, so a restart comes back signed in.

use shopping_sync::Identity;
use std::io::ErrorKind;
use std::path::PathBuf;

pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Stored identity; an unreadable file counts as signed out
    pub fn load(&self) -> Option<Identity> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                log::warn!("Failed to read {}: {}", self.path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(identity) => Some(identity),
            Err(e) => {
                log::warn!("Ignoring corrupt session file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    pub fn save(&self, identity: &Identity) -> Result<(), String> {
        let json = serde_json::to_string_pretty(identity).map_err(|e| e.to_string())?;
        std::fs::write(&self.path, json)
            .map_err(|e| format!("Failed to write {}: {}", self.path.display(), e))
    }

    pub fn clear(&self) -> Result<(), String> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(format!("Failed to remove {}: {}", self.path.display(), e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Identity {
        Identity {
            display_name: Some("Alice".to_string()),
            email: Some("alice@example.com".to_string()),
            ..Identity::new("1234567890")
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("session.json"));
        file.save(&sample()).unwrap();
        assert_eq!(file.load(), Some(sample()));
    }

    #[test]
    fn missing_file_is_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let file = SessionFile::new(dir.path().join("session.json"));
        assert_eq!(file.load(), None);
        file.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(SessionFile::new(&path).load(), None);
    }

    #[test]
    fn clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let file = SessionFile::new(&path);
        file.save(&sample()).unwrap();
        file.clear().unwrap();
        assert!(!path.exists());
        assert_eq!(file.load(), None);
    }
}
