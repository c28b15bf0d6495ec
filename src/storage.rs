//! Local key/value persistence, modelled on the browser's `localStorage`.
//!
//! [`FileStorage`] keeps one JSON file per key under a data directory;
//! [`MemoryStorage`] keeps everything in a map and is used by tests.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Object-safe key/value storage area.
pub trait KeyValueStore: Send + Sync {
  /// Retrieves the value associated with the given key, or `None` if not found.
  fn get_item(&self, key: &str) -> Option<String>;

  /// Sets the value for the given key, overwriting any existing value.
  fn set_item(&self, key: &str, value: &str) -> Result<()>;

  /// Removes the item with the given key. Removing a missing key is not an error.
  fn remove_item(&self, key: &str) -> Result<()>;
}

/// File-backed storage: key `k` lives in `<dir>/k.json`.
pub struct FileStorage {
  dir: PathBuf,
}

impl FileStorage {
  pub fn new(dir: impl Into<PathBuf>) -> Self {
    Self { dir: dir.into() }
  }

  fn path_for(&self, key: &str) -> PathBuf {
    let safe: String =
      key.chars().map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' }).collect();
    self.dir.join(format!("{}.json", safe))
  }
}

impl KeyValueStore for FileStorage {
  fn get_item(&self, key: &str) -> Option<String> {
    std::fs::read_to_string(self.path_for(key)).ok()
  }

  fn set_item(&self, key: &str, value: &str) -> Result<()> {
    std::fs::create_dir_all(&self.dir)
      .with_context(|| format!("Failed to create data directory {}", self.dir.display()))?;
    let path = self.path_for(key);
    // Write to a sibling temp file first so a crash never leaves a half-written value.
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, value).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, &path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<()> {
    let path = self.path_for(key);
    match std::fs::remove_file(&path) {
      Ok(()) => Ok(()),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
      Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
  }
}

/// In-memory storage (no persistence).
#[derive(Default)]
pub struct MemoryStorage {
  map: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

impl KeyValueStore for MemoryStorage {
  fn get_item(&self, key: &str) -> Option<String> {
    self.map.lock().ok()?.get(key).cloned()
  }

  fn set_item(&self, key: &str, value: &str) -> Result<()> {
    let mut map = self.map.lock().map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
    map.insert(key.to_string(), value.to_string());
    Ok(())
  }

  fn remove_item(&self, key: &str) -> Result<()> {
    let mut map = self.map.lock().map_err(|_| anyhow::anyhow!("memory storage lock poisoned"))?;
    map.remove(key);
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn basic_contract(store: &dyn KeyValueStore) {
    assert!(store.get_item("missing").is_none());

    store.set_item("a", "1").unwrap();
    assert_eq!(store.get_item("a").as_deref(), Some("1"));

    // overwrite
    store.set_item("a", "ONE").unwrap();
    assert_eq!(store.get_item("a").as_deref(), Some("ONE"));

    store.remove_item("a").unwrap();
    assert!(store.get_item("a").is_none());

    // removing twice is fine
    store.remove_item("a").unwrap();
  }

  #[test]
  fn memory_storage_basic_contract() {
    basic_contract(&MemoryStorage::new());
  }

  #[test]
  fn file_storage_basic_contract() {
    let dir = tempfile::tempdir().unwrap();
    basic_contract(&FileStorage::new(dir.path()));
  }

  #[test]
  fn file_storage_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("a").join("b");
    let store = FileStorage::new(&nested);
    store.set_item("favorites", "[]").unwrap();
    assert!(nested.join("favorites.json").exists());
  }

  #[test]
  fn file_storage_values_survive_a_new_handle() {
    let dir = tempfile::tempdir().unwrap();
    FileStorage::new(dir.path()).set_item("favorites", "[1,2]").unwrap();
    assert_eq!(FileStorage::new(dir.path()).get_item("favorites").as_deref(), Some("[1,2]"));
  }

  #[test]
  fn file_storage_sanitizes_keys() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStorage::new(dir.path());
    store.set_item("../escape", "x").unwrap();
    assert!(dir.path().join("___escape.json").exists());
  }
}
