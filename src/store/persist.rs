//! Snapshot persistence
//!
//! Only `{theme, user, sidebarOpen}` survives a restart. The snapshot is a
//! versionless JSON object stored under [`super::STORAGE_KEY`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::state::{AppState, Theme};
use crate::schema::Profile;
use crate::types::{EnaaError, Result};

/// Persisted subset of the application state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub user: Option<Profile>,
    #[serde(default)]
    pub sidebar_open: bool,
}

impl PersistedSnapshot {
    pub fn capture(state: &AppState) -> Self {
        Self {
            theme: state.ui.theme,
            user: state.user.user.clone(),
            sidebar_open: state.ui.sidebar_open,
        }
    }

    /// Write the snapshot fields into a fresh state
    pub fn restore_into(self, state: &mut AppState) {
        state.ui.theme = self.theme;
        state.ui.sidebar_open = self.sidebar_open;
        state.user.is_authenticated = self.user.is_some();
        state.user.user = self.user;
    }
}

/// Durable storage for the snapshot
pub trait Persistence: Send + Sync {
    /// Read the stored snapshot, `None` when nothing was saved yet
    fn load(&self) -> Result<Option<PersistedSnapshot>>;

    /// Overwrite the stored snapshot
    fn save(&self, snapshot: &PersistedSnapshot) -> Result<()>;
}

/// JSON file on disk
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for FileStorage {
    fn load(&self) -> Result<Option<PersistedSnapshot>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| EnaaError::Storage(format!("{}: {}", self.path.display(), e))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(EnaaError::Storage(format!("{}: {}", self.path.display(), e))),
        }
    }

    fn save(&self, snapshot: &PersistedSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Write then rename so a crash never leaves a truncated snapshot
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec(snapshot)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Process-local storage holding the serialized JSON
#[derive(Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored JSON
    pub fn raw(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl Persistence for MemoryStorage {
    fn load(&self) -> Result<Option<PersistedSnapshot>> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| EnaaError::Storage("memory storage poisoned".into()))?;

        match slot.as_deref() {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &PersistedSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| EnaaError::Storage("memory storage poisoned".into()))?;
        *slot = Some(json);
        Ok(())
    }
}
