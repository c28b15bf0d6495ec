use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::constants::constants;
use crate::movie::MovieDetail;
use crate::storage::KeyValueStore;

/// Outcome of a [`FavoritesStore::toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FavoriteChange {
  Added,
  Removed,
}

/// The favorites list, persisted as a JSON array under a single storage key.
///
/// Every operation reads the persisted value; nothing is cached, so two
/// stores over the same backend never disagree.
pub struct FavoritesStore {
  backend: Box<dyn KeyValueStore>,
  key: String,
}

impl FavoritesStore {
  pub fn new(backend: Box<dyn KeyValueStore>) -> Self {
    Self { backend, key: constants().favorites_key.clone() }
  }

  /// Current favorites in insertion order. A missing or unreadable value
  /// reads as an empty list; unreadable records inside a readable list are
  /// skipped.
  pub fn list(&self) -> Vec<MovieDetail> {
    self.load().0
  }

  /// Stored records plus the number of entries that could not be decoded.
  fn load(&self) -> (Vec<MovieDetail>, usize) {
    let Some(raw) = self.backend.get_item(&self.key) else { return (Vec::new(), 0) };
    let entries = match serde_json::from_str::<Option<Vec<Value>>>(&raw) {
      Ok(entries) => entries.unwrap_or_default(),
      Err(e) => {
        warn!(key = %self.key, err = %e, "favorites: stored list is unreadable, treating as empty");
        return (Vec::new(), 1);
      }
    };
    let total = entries.len();
    let records: Vec<MovieDetail> = entries
      .into_iter()
      .enumerate()
      .filter_map(|(idx, entry)| match serde_json::from_value(entry) {
        Ok(record) => Some(record),
        Err(e) => {
          warn!(key = %self.key, idx, err = %e, "favorites: skipping unreadable record");
          None
        }
      })
      .collect();
    let skipped = total - records.len();
    (dedup_by_id(records), skipped)
  }

  pub fn is_favorite(&self, imdb_id: &str) -> bool {
    self.list().iter().any(|f| f.imdb_id() == imdb_id)
  }

  /// Remove `movie` if it is a favorite, otherwise append it, then persist.
  pub fn toggle(&self, movie: &MovieDetail) -> Result<FavoriteChange> {
    let (mut list, skipped) = self.load();
    if skipped > 0 {
      warn!(key = %self.key, skipped, "favorites: unreadable entries will be dropped on save");
    }
    let change = match list.iter().position(|f| f.imdb_id() == movie.imdb_id()) {
      Some(idx) => {
        list.remove(idx);
        FavoriteChange::Removed
      }
      None => {
        list.push(movie.clone());
        FavoriteChange::Added
      }
    };
    if list.is_empty() {
      self.backend.remove_item(&self.key).context("Failed to clear favorites")?;
    } else {
      let json = serde_json::to_string(&list).context("Failed to serialize favorites")?;
      self.backend.set_item(&self.key, &json).context("Failed to save favorites")?;
    }
    info!(imdb_id = movie.imdb_id(), ?change, total = list.len(), "favorites: toggled");
    Ok(change)
  }
}

/// Keep the first record for each id.
fn dedup_by_id(list: Vec<MovieDetail>) -> Vec<MovieDetail> {
  let mut seen = HashSet::new();
  list.into_iter().filter(|m| seen.insert(m.imdb_id().to_string())).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::movie::{MovieSummary, NOT_AVAILABLE};
  use crate::storage::{FileStorage, MemoryStorage};
  use proptest::prelude::*;

  fn movie(id: &str) -> MovieDetail {
    MovieDetail::from(MovieSummary {
      title: format!("Title {}", id),
      year: "2020".into(),
      imdb_id: id.into(),
      poster: NOT_AVAILABLE.into(),
      kind: None,
    })
  }

  fn store() -> FavoritesStore {
    FavoritesStore::new(Box::new(MemoryStorage::new()))
  }

  fn ids(store: &FavoritesStore) -> Vec<String> {
    store.list().iter().map(|m| m.imdb_id().to_string()).collect()
  }

  #[test]
  fn empty_store_lists_nothing() {
    let s = store();
    assert!(s.list().is_empty());
    assert!(!s.is_favorite("tt1"));
  }

  #[test]
  fn toggle_adds_then_removes() {
    let s = store();
    assert_eq!(s.toggle(&movie("tt1")).unwrap(), FavoriteChange::Added);
    assert!(s.is_favorite("tt1"));
    assert_eq!(s.toggle(&movie("tt1")).unwrap(), FavoriteChange::Removed);
    assert!(!s.is_favorite("tt1"));
  }

  #[test]
  fn toggle_appends_in_order() {
    let s = store();
    s.toggle(&movie("tt1")).unwrap();
    s.toggle(&movie("tt2")).unwrap();
    s.toggle(&movie("tt3")).unwrap();
    s.toggle(&movie("tt2")).unwrap();
    assert_eq!(ids(&s), vec!["tt1", "tt3"]);
  }

  #[test]
  fn membership_is_by_id_not_by_record() {
    let s = store();
    s.toggle(&movie("tt1")).unwrap();
    let mut edited = movie("tt1");
    edited.plot = "Different plot".into();
    assert_eq!(s.toggle(&edited).unwrap(), FavoriteChange::Removed);
    assert!(s.list().is_empty());
  }

  #[test]
  fn removing_last_favorite_drops_the_key() {
    let dir = tempfile::tempdir().unwrap();
    let s = FavoritesStore::new(Box::new(FileStorage::new(dir.path())));
    s.toggle(&movie("tt1")).unwrap();
    s.toggle(&movie("tt1")).unwrap();
    assert!(!dir.path().join("favorites.json").exists());
    assert!(s.list().is_empty());
  }

  #[test]
  fn corrupt_payload_reads_as_empty() {
    let backend = MemoryStorage::new();
    backend.set_item("favorites", "{not json").unwrap();
    let s = FavoritesStore::new(Box::new(backend));
    assert!(s.list().is_empty());
    // and the next toggle overwrites it with a valid list
    s.toggle(&movie("tt9")).unwrap();
    assert_eq!(ids(&s), vec!["tt9"]);
  }

  #[test]
  fn unreadable_record_does_not_hide_the_others() {
    let backend = MemoryStorage::new();
    let raw = r#"[{"Title":"Kept","Year":"1","imdbID":"tt1","Poster":"N/A"},
                  {"Title":"Broken","Year":"2","imdbID":"tt2","Poster":null},
                  null,
                  {"Title":"Also kept","Year":"3","imdbID":"tt3","Poster":"N/A"}]"#;
    backend.set_item("favorites", raw).unwrap();
    let s = FavoritesStore::new(Box::new(backend));
    assert_eq!(ids(&s), vec!["tt1", "tt3"]);

    // saving keeps every readable record
    s.toggle(&movie("tt4")).unwrap();
    assert_eq!(ids(&s), vec!["tt1", "tt3", "tt4"]);
  }

  #[test]
  fn null_payload_reads_as_empty() {
    let backend = MemoryStorage::new();
    backend.set_item("favorites", "null").unwrap();
    assert!(FavoritesStore::new(Box::new(backend)).list().is_empty());
  }

  #[test]
  fn stored_duplicates_collapse_to_first() {
    let backend = MemoryStorage::new();
    let raw = r#"[{"Title":"First","Year":"1","imdbID":"tt1","Poster":"N/A"},
                  {"Title":"Second","Year":"2","imdbID":"tt2","Poster":"N/A"},
                  {"Title":"Again","Year":"1","imdbID":"tt1","Poster":"N/A"}]"#;
    backend.set_item("favorites", raw).unwrap();
    let s = FavoritesStore::new(Box::new(backend));
    let list = s.list();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].summary.title, "First");
  }

  #[test]
  fn persisted_payload_uses_wire_field_names() {
    let dir = tempfile::tempdir().unwrap();
    let s = FavoritesStore::new(Box::new(FileStorage::new(dir.path())));
    s.toggle(&movie("tt0848228")).unwrap();
    let raw = std::fs::read_to_string(dir.path().join("favorites.json")).unwrap();
    assert!(raw.starts_with('['));
    assert!(raw.contains(r#""imdbID":"tt0848228""#));
    assert!(raw.contains(r#""Title":"Title tt0848228""#));

    let reopened = FavoritesStore::new(Box::new(FileStorage::new(dir.path())));
    assert!(reopened.is_favorite("tt0848228"));
  }

  proptest! {
    #[test]
    fn double_toggle_restores_list(
      seed in proptest::collection::vec(0u8..8, 0..12),
      target in 0u8..10,
    ) {
      let s = store();
      for id in &seed {
        let m = movie(&format!("tt{}", id));
        if !s.is_favorite(m.imdb_id()) {
          s.toggle(&m).unwrap();
        }
      }
      let before = s.list();
      let m = movie(&format!("tt{}", target));
      s.toggle(&m).unwrap();
      s.toggle(&m).unwrap();
      let after = s.list();
      // Membership is restored; a removed-then-readded entry moves to the end.
      let mut before_ids: Vec<_> = before.iter().map(|m| m.imdb_id().to_string()).collect();
      let mut after_ids: Vec<_> = after.iter().map(|m| m.imdb_id().to_string()).collect();
      before_ids.sort();
      after_ids.sort();
      prop_assert_eq!(before_ids, after_ids);
    }

    #[test]
    fn toggles_never_produce_duplicates(ops in proptest::collection::vec(0u8..6, 0..40)) {
      let s = store();
      for id in ops {
        s.toggle(&movie(&format!("tt{}", id))).unwrap();
        let list = ids(&s);
        let unique: HashSet<_> = list.iter().collect();
        prop_assert_eq!(unique.len(), list.len());
      }
    }

    #[test]
    fn is_favorite_tracks_toggle_parity(ops in proptest::collection::vec(0u8..4, 1..30)) {
      let s = store();
      for id in &ops {
        s.toggle(&movie(&format!("tt{}", id))).unwrap();
      }
      for id in 0u8..4 {
        let count = ops.iter().filter(|x| **x == id).count();
        prop_assert_eq!(s.is_favorite(&format!("tt{}", id)), count % 2 == 1);
      }
    }
  }
}
