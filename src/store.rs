//! Key-value persistence for the settings blob.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::Settings;

/// Entry the settings blob is stored under.
pub const SETTINGS_KEY: &str = "settings";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("could not access {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("could not encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

pub trait SettingsStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Stores each key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn default_location() -> PathBuf {
        match dirs::config_dir() {
            Some(dir) => dir.join("pomo"),
            None => PathBuf::from("."),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SettingsStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        let path = self.path_for(key);
        fs::write(&path, value).map_err(|source| StoreError::Io { path, source })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }
}

/// Keeps entries for the lifetime of the process only.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Reads the raw settings blob. A store that cannot be read is treated as
/// empty.
pub fn read_settings<S: SettingsStore + ?Sized>(store: &S) -> Option<String> {
    match store.get(SETTINGS_KEY) {
        Ok(raw) => raw,
        Err(err) => {
            log::warn!("Could not read settings, using defaults: {err}");
            None
        }
    }
}

/// Persisted settings merged onto the defaults.
pub fn load_settings<S: SettingsStore + ?Sized>(store: &S) -> Settings {
    let Some(raw) = read_settings(store) else {
        return Settings::default();
    };
    Settings::default().merge_blob(&raw).unwrap_or_else(|err| {
        log::warn!("Ignoring persisted settings: {err}");
        Settings::default()
    })
}

pub fn save_settings<S: SettingsStore + ?Sized>(
    store: &mut S,
    settings: &Settings,
) -> Result<(), StoreError> {
    let blob = settings.to_blob()?;
    store.set(SETTINGS_KEY, &blob)?;
    log::info!("Saved settings: {settings:?}");
    Ok(())
}
