#![deny(warnings)]

//! Persistence layer: the company state saved as a single keyed JSON blob.
//!
//! Loading never fails. A missing or corrupt blob yields the default state,
//! and a blob written by an older build is merged over the defaults so new
//! fields pick up their documented default values.

use sim_core::CompanyState;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed save: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid save key: {0:?}")]
    InvalidKey(String),
}

/// Durable storage of keyed text blobs.
pub trait SaveStore {
    /// `Ok(None)` when nothing is stored under `key`.
    fn read(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn write(&mut self, key: &str, blob: &str) -> Result<(), PersistError>;
    /// Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), PersistError>;
}

/// One `<key>.json` file per blob under a root directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(PersistError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl SaveStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.path_for(key)?) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, key: &str, blob: &str) -> Result<(), PersistError> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)?;
        // write-then-rename so a crash never leaves a truncated save
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, blob)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), bytes = blob.len(), "save written");
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        match fs::remove_file(self.path_for(key)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Volatile store, handy for tests and headless runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    blobs: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }
}

impl SaveStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.blobs.get(key).cloned())
    }

    fn write(&mut self, key: &str, blob: &str) -> Result<(), PersistError> {
        self.blobs.insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PersistError> {
        self.blobs.remove(key);
        Ok(())
    }
}

pub fn encode_state(state: &CompanyState) -> Result<String, PersistError> {
    Ok(serde_json::to_string(state)?)
}

/// Parse a blob, merging it over the defaults and coercing every field into
/// range.
pub fn decode_state(blob: &str) -> Result<CompanyState, PersistError> {
    let mut state: CompanyState = serde_json::from_str(blob)?;
    state.sanitize();
    Ok(state)
}

pub fn save_state<S: SaveStore + ?Sized>(
    store: &mut S,
    key: &str,
    state: &CompanyState,
) -> Result<(), PersistError> {
    let blob = encode_state(state)?;
    store.write(key, &blob)
}

/// Load the state stored under `key`, falling back to defaults when it is
/// absent, unreadable or malformed.
pub fn load_state<S: SaveStore + ?Sized>(store: &S, key: &str) -> CompanyState {
    let blob = match store.read(key) {
        Ok(Some(blob)) => blob,
        Ok(None) => {
            debug!(key, "no save found, starting fresh");
            return CompanyState::default();
        }
        Err(e) => {
            warn!(key, error = %e, "save unreadable, starting fresh");
            return CompanyState::default();
        }
    };
    match decode_state(&blob) {
        Ok(state) => state,
        Err(e) => {
            warn!(key, error = %e, "save corrupt, starting fresh");
            CompanyState::default()
        }
    }
}

/// Discard the stored state and return the defaults.
pub fn reset_state<S: SaveStore + ?Sized>(
    store: &mut S,
    key: &str,
) -> Result<CompanyState, PersistError> {
    store.remove(key)?;
    Ok(CompanyState::default())
}
