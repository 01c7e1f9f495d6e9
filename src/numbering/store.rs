use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::NumberPool;
use crate::error::{BillingError, Result};

/// Client-side key-value storage file shared with other stored lists.
pub const STORAGE_FILE: &str = "storage.json";
/// Key holding the freed invoice numbers as a JSON array of integers.
pub const FREED_KEY: &str = "freedInvoiceNumbers";
/// Key holding the revision bumped on every committed pool change.
pub const REVISION_KEY: &str = "freedInvoiceNumbersRevision";

/// Persisted home of the [`NumberPool`].
///
/// A store remembers the revision it loaded. `commit` refuses to write when
/// the file has moved on since then. Invoice operations open the store while
/// holding [`crate::config::lock_book`], so the check only trips for writers
/// that skip the lock.
#[derive(Debug)]
pub struct PoolStore {
    path: PathBuf,
    revision: u64,
}

impl PoolStore {
    /// Load the pool stored under `dir`. A missing file is an empty pool.
    pub fn open(dir: &Path) -> Result<(Self, NumberPool)> {
        let path = dir.join(STORAGE_FILE);
        let doc = read_document(&path)?;
        let revision = revision_of(&doc);
        let pool = decode_freed(doc.get(FREED_KEY));
        debug!(path = %path.display(), revision, freed = pool.len(), "loaded invoice number pool");
        Ok((Self { path, revision }, pool))
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Write `pool` back, keeping any other keys in the storage file.
    pub fn commit(&mut self, pool: &NumberPool) -> Result<()> {
        let mut doc = read_document(&self.path)?;
        let found = revision_of(&doc);
        if found != self.revision {
            return Err(BillingError::StalePool {
                expected: self.revision,
                found,
            });
        }

        let next = self.revision + 1;
        doc.insert(
            FREED_KEY.to_string(),
            Value::Array(pool.iter().map(Value::from).collect()),
        );
        doc.insert(REVISION_KEY.to_string(), Value::from(next));

        let content = serde_json::to_string_pretty(&Value::Object(doc)).map_err(|e| {
            BillingError::Serialize {
                path: self.path.clone(),
                reason: e.to_string(),
            }
        })?;
        fs::write(&self.path, content)?;
        self.revision = next;
        debug!(revision = next, freed = pool.len(), "committed invoice number pool");
        Ok(())
    }

    /// Open, apply `f` and commit as one unit.
    pub fn transact<T>(dir: &Path, f: impl FnOnce(&mut NumberPool) -> T) -> Result<T> {
        let (mut store, mut pool) = Self::open(dir)?;
        let out = f(&mut pool);
        store.commit(&pool)?;
        Ok(out)
    }
}

fn read_document(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Ok(Map::new());
    }
    let content = fs::read_to_string(path)?;
    match serde_json::from_str(&content) {
        Ok(Value::Object(doc)) => Ok(doc),
        Ok(_) => {
            warn!(path = %path.display(), "storage file is not a JSON object, starting empty");
            Ok(Map::new())
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "unreadable storage file, starting empty");
            Ok(Map::new())
        }
    }
}

fn revision_of(doc: &Map<String, Value>) -> u64 {
    doc.get(REVISION_KEY).and_then(Value::as_u64).unwrap_or(0)
}

/// Malformed entries are skipped rather than reported.
fn decode_freed(value: Option<&Value>) -> NumberPool {
    let Some(Value::Array(entries)) = value else {
        return NumberPool::new();
    };
    entries.iter().filter_map(decode_entry).collect()
}

fn decode_entry(value: &Value) -> Option<u64> {
    let number = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if number.is_none() {
        debug!(entry = %value, "dropping malformed freed invoice number");
    }
    number
}
