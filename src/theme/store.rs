//! Per-user theme persistence.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use dashmap::DashMap;
use parking_lot::Mutex;

use super::{Theme, ThemeError};
use crate::core::UserId;

/// Keyed by user id; one value per user, last write wins.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, user: UserId) -> Option<Theme>;
    fn put(&self, user: UserId, theme: Theme) -> Result<(), ThemeError>;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<UserId, Theme>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, user: UserId) -> Option<Theme> {
        self.entries.get(&user).map(|entry| *entry)
    }

    fn put(&self, user: UserId, theme: Theme) -> Result<(), ThemeError> {
        self.entries.insert(user, theme);
        Ok(())
    }
}

/// JSON file store, `{"<user id>": "dark" | "light"}`.
///
/// The whole map is rewritten on every `put`, through a sibling temp file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<u64, Theme>>,
}

impl FileStore {
    /// Open `path`, starting empty when it does not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ThemeError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn persist(&self, entries: &BTreeMap<u64, Theme>) -> Result<(), ThemeError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl PreferenceStore for FileStore {
    fn get(&self, user: UserId) -> Option<Theme> {
        self.entries.lock().get(&user.0).copied()
    }

    fn put(&self, user: UserId, theme: Theme) -> Result<(), ThemeError> {
        let mut entries = self.entries.lock();
        let mut next = entries.clone();
        next.insert(user.0, theme);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}
