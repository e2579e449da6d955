//! JSON Snapshot File
//!
//! Keeps a whole collection in one JSON document, rewritten on every mutation.
//! Writes go to a sibling temp file first and are renamed into place.

use super::StoreResult;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Whole-file JSON store for a `Vec<T>`
#[derive(Debug, Clone)]
pub struct JsonFile<T> {
    path: PathBuf,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _marker: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record; a missing file is an empty collection.
    pub fn load(&self) -> StoreResult<Vec<T>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    /// Replace the file contents with `records`.
    pub fn store(&self, records: &[T]) -> StoreResult<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }

        let json = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        debug!("Wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }

    /// Load, apply `f`, store. Returns whatever `f` returns.
    pub fn update<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> StoreResult<R> {
        let mut records = self.load()?;
        let result = f(&mut records);
        self.store(&records)?;
        Ok(result)
    }
}
