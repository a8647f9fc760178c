//! Content-addressed JSON stores for results, bars, and candidate responses.
//!
//! Every entry is keyed by a content hash of its query — never by wall-clock
//! recency — so repeated runs with identical inputs hit the cache and
//! differing inputs can never collide.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::result::SimulationResult;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cache (de)serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A flat directory of `<key>.json` entries.
#[derive(Debug, Clone)]
pub struct KeyedStore {
    dir: PathBuf,
}

impl KeyedStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entry_path(key).exists()
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(value)?;
        std::fs::write(self.entry_path(key), json)?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<(), CacheError> {
        let path = self.entry_path(key);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    /// Number of entries in the store.
    pub fn len(&self) -> Result<usize, CacheError> {
        Ok(std::fs::read_dir(&self.dir)?
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .count())
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }
}

/// Cache key for a (symbol, date-range) bar query.
pub fn bar_cache_key(symbol: &str, start: NaiveDate, end: NaiveDate) -> String {
    let material = format!("bars\n{symbol}\n{start}\n{end}");
    blake3::hash(material.as_bytes()).to_hex().to_string()
}

/// Cache key for a (date, universe-hash) candidate query.
pub fn candidate_cache_key(date: NaiveDate, universe_hash: &str) -> String {
    let material = format!("candidates\n{date}\n{universe_hash}");
    blake3::hash(material.as_bytes()).to_hex().to_string()
}

/// Results store keyed by `RunId`.
#[derive(Debug, Clone)]
pub struct ResultCache {
    store: KeyedStore,
}

impl ResultCache {
    pub fn new(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        Ok(Self {
            store: KeyedStore::new(dir)?,
        })
    }

    pub fn contains(&self, run_id: &str) -> bool {
        self.store.contains(run_id)
    }

    pub fn get(&self, run_id: &str) -> Result<Option<Vec<SimulationResult>>, CacheError> {
        self.store.get(run_id)
    }

    pub fn put(&self, run_id: &str, results: &[SimulationResult]) -> Result<(), CacheError> {
        self.store.put(run_id, &results.to_vec())
    }

    pub fn len(&self) -> Result<usize, CacheError> {
        self.store.len()
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        self.store.is_empty()
    }
}
