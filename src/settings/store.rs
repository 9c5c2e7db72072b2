use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{info, warn};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to write settings file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Key-value persistence for user overrides.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// Writes every entry or none of them.
    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), SettingsError>;
}

/// Settings kept as one flat JSON object on disk.
pub struct FileSettingsStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileSettingsStore {
    /// A missing or unreadable file opens as an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_entries(&path);
        FileSettingsStore {
            path,
            entries: Mutex::new(entries),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn load_entries(path: &Path) -> BTreeMap<String, String> {
    if !path.exists() {
        info!("Settings file not found at {}", path.display());
        return BTreeMap::new();
    }

    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!("Failed to read settings file {}: {}", path.display(), err);
            return BTreeMap::new();
        }
    };

    match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
        Ok(entries) => {
            info!("Loaded {} setting(s) from {}", entries.len(), path.display());
            entries
        }
        Err(err) => {
            warn!("Failed to parse settings file {}: {}", path.display(), err);
            BTreeMap::new()
        }
    }
}

impl FileSettingsStore {
    /// Replaces the settings file through a sibling temp file and a rename.
    fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), SettingsError> {
        let write_error = |source: io::Error| SettingsError::Write {
            path: self.path.clone(),
            source,
        };

        let encoded = serde_json::to_string_pretty(entries)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_error)?;
        }

        let file_name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "settings.json".to_string());
        let temp_path = self.path.with_file_name(format!("{file_name}.tmp"));
        fs::write(&temp_path, encoded).map_err(write_error)?;
        if let Err(err) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(write_error(err));
        }
        Ok(())
    }
}

impl SettingsStore for FileSettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), SettingsError> {
        let mut current = self.entries.lock();
        let mut updated = current.clone();
        for (key, value) in entries {
            updated.insert(key.to_string(), value.clone());
        }

        self.write_entries(&updated)?;
        *current = updated;
        Ok(())
    }
}

/// In-process store; nothing is written to disk.
#[cfg(test)]
#[derive(Default)]
pub struct MemorySettingsStore {
    entries: Mutex<BTreeMap<String, String>>,
}

#[cfg(test)]
impl MemorySettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<'a>(entries: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let store = Self::new();
        {
            let mut map = store.entries.lock();
            for (key, value) in entries {
                map.insert(key.to_string(), value.to_string());
            }
        }
        store
    }
}

#[cfg(test)]
impl SettingsStore for MemorySettingsStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set_many(&self, entries: &[(&str, String)]) -> Result<(), SettingsError> {
        let mut map = self.entries.lock();
        for (key, value) in entries {
            map.insert(key.to_string(), value.clone());
        }
        Ok(())
    }
}
