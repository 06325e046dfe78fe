//! Correction persistence.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use tracing::debug;

use super::Result;
use crate::error::LearningError;
use crate::models::correction::Correction;

/// Persistence interface for learned corrections.
///
/// Keys are storage keys as produced by [`Correction::storage_key`].
pub trait CorrectionStore: Send + Sync {
    /// All corrections stored under a key.
    fn load_corrections(&self, key: &str) -> Result<Vec<Correction>>;

    /// Insert a correction, replacing one with the same id.
    fn save_correction(&self, correction: &Correction) -> Result<()>;

    /// Every key with at least one correction.
    fn keys(&self) -> Result<Vec<String>>;
}

fn poisoned<T>(_: T) -> LearningError {
    LearningError::Store("store lock poisoned".to_string())
}

fn upsert(list: &mut Vec<Correction>, correction: &Correction) {
    match list.iter_mut().find(|c| c.id == correction.id) {
        Some(existing) => *existing = correction.clone(),
        None => list.push(correction.clone()),
    }
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryCorrectionStore {
    corrections: RwLock<HashMap<String, Vec<Correction>>>,
}

impl InMemoryCorrectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CorrectionStore for InMemoryCorrectionStore {
    fn load_corrections(&self, key: &str) -> Result<Vec<Correction>> {
        let map = self.corrections.read().map_err(poisoned)?;
        Ok(map.get(key).cloned().unwrap_or_default())
    }

    fn save_correction(&self, correction: &Correction) -> Result<()> {
        let mut map = self.corrections.write().map_err(poisoned)?;
        upsert(map.entry(correction.storage_key()).or_default(), correction);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let map = self.corrections.read().map_err(poisoned)?;
        let mut keys: Vec<String> = map.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Store persisted as one JSON document keyed by storage key.
#[derive(Debug)]
pub struct JsonFileCorrectionStore {
    path: PathBuf,
    corrections: Mutex<BTreeMap<String, Vec<Correction>>>,
}

impl JsonFileCorrectionStore {
    /// Open a store, creating an empty one when the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let corrections = if path.exists() {
            let content = fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            BTreeMap::new()
        };

        debug!("Opened correction store {}", path.display());
        Ok(Self {
            path,
            corrections: Mutex::new(corrections),
        })
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, corrections: &BTreeMap<String, Vec<Correction>>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(corrections)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl CorrectionStore for JsonFileCorrectionStore {
    fn load_corrections(&self, key: &str) -> Result<Vec<Correction>> {
        let map = self.corrections.lock().map_err(poisoned)?;
        Ok(map.get(key).cloned().unwrap_or_default())
    }

    /// The in-memory view only changes once the file was written.
    fn save_correction(&self, correction: &Correction) -> Result<()> {
        let mut map = self.corrections.lock().map_err(poisoned)?;
        let mut updated = map.clone();
        upsert(updated.entry(correction.storage_key()).or_default(), correction);
        self.persist(&updated)?;
        *map = updated;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let map = self.corrections.lock().map_err(poisoned)?;
        Ok(map.keys().cloned().collect())
    }
}
