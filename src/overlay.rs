use tracing::debug;

use crate::favorites::FavoritesStore;
use crate::movie::MovieDetail;
use crate::omdb::LookupError;

/// Shown when the detail lookup fails at the transport level.
pub const DETAILS_ERROR: &str = "Error loading details.";

pub const ADD_LABEL: &str = "Add to Favorites";
pub const REMOVE_LABEL: &str = "Remove from Favorites";

/// Details overlay state machine.
///
/// ```text
/// Hidden ──open──▶ Loading ──ok──▶ Shown
///                     └──err──▶ Error
/// Shown / Error ──close──▶ Hidden
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OverlayState {
  #[default]
  Hidden,
  Loading { imdb_id: String },
  Shown(Box<MovieDetail>),
  Error(String),
}

#[derive(Debug, Default)]
pub struct DetailsOverlay {
  state: OverlayState,
}

impl DetailsOverlay {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn state(&self) -> &OverlayState {
    &self.state
  }

  pub fn is_visible(&self) -> bool {
    self.state != OverlayState::Hidden
  }

  /// Show the overlay with a loading placeholder for `imdb_id`.
  /// The caller issues the lookup and feeds the outcome to [`resolve`](Self::resolve).
  pub fn open(&mut self, imdb_id: &str) {
    debug!(imdb_id, "overlay: open");
    self.state = OverlayState::Loading { imdb_id: imdb_id.to_string() };
  }

  /// Apply a finished lookup. Ignored unless the overlay is still loading `imdb_id`.
  pub fn resolve(&mut self, imdb_id: &str, result: Result<MovieDetail, LookupError>) {
    match &self.state {
      OverlayState::Loading { imdb_id: pending } if pending == imdb_id => {}
      _ => {
        debug!(imdb_id, "overlay: dropping stale detail result");
        return;
      }
    }
    self.state = match result {
      Ok(detail) => OverlayState::Shown(Box::new(detail)),
      Err(e) => OverlayState::Error(e.user_message(DETAILS_ERROR)),
    };
  }

  pub fn close(&mut self) {
    self.state = OverlayState::Hidden;
  }

  /// The record on display, if any.
  pub fn detail(&self) -> Option<&MovieDetail> {
    match &self.state {
      OverlayState::Shown(detail) => Some(&**detail),
      _ => None,
    }
  }

  /// Label for the favorite toggle, reflecting the store's current contents.
  pub fn favorite_label(&self, store: &FavoritesStore) -> Option<&'static str> {
    self.detail().map(|d| if store.is_favorite(d.imdb_id()) { REMOVE_LABEL } else { ADD_LABEL })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::movie::{MovieSummary, NOT_AVAILABLE};
  use crate::storage::MemoryStorage;

  fn detail(id: &str) -> MovieDetail {
    MovieDetail::from(MovieSummary {
      title: "Inception".into(),
      year: "2010".into(),
      imdb_id: id.into(),
      poster: NOT_AVAILABLE.into(),
      kind: None,
    })
  }

  #[test]
  fn starts_hidden() {
    let o = DetailsOverlay::new();
    assert_eq!(o.state(), &OverlayState::Hidden);
    assert!(!o.is_visible());
  }

  #[test]
  fn open_then_success_shows_detail() {
    let mut o = DetailsOverlay::new();
    o.open("tt1");
    assert_eq!(o.state(), &OverlayState::Loading { imdb_id: "tt1".into() });
    assert!(o.is_visible());
    o.resolve("tt1", Ok(detail("tt1")));
    assert_eq!(o.detail().map(MovieDetail::imdb_id), Some("tt1"));
  }

  #[test]
  fn network_failure_shows_generic_error_and_close_recovers() {
    let mut o = DetailsOverlay::new();
    o.open("tt1");
    o.resolve("tt1", Err(LookupError::Transport("connection refused".into())));
    assert_eq!(o.state(), &OverlayState::Error(DETAILS_ERROR.into()));
    o.close();
    assert_eq!(o.state(), &OverlayState::Hidden);
  }

  #[test]
  fn api_failure_shows_api_message() {
    let mut o = DetailsOverlay::new();
    o.open("tt1");
    o.resolve("tt1", Err(LookupError::Api("Incorrect IMDb ID.".into())));
    assert_eq!(o.state(), &OverlayState::Error("Incorrect IMDb ID.".into()));
  }

  #[test]
  fn stale_result_is_dropped() {
    let mut o = DetailsOverlay::new();
    o.open("tt1");
    o.open("tt2");
    o.resolve("tt1", Ok(detail("tt1")));
    assert_eq!(o.state(), &OverlayState::Loading { imdb_id: "tt2".into() });
  }

  #[test]
  fn result_after_close_is_dropped() {
    let mut o = DetailsOverlay::new();
    o.open("tt1");
    o.close();
    o.resolve("tt1", Ok(detail("tt1")));
    assert!(!o.is_visible());
  }

  #[test]
  fn favorite_label_follows_store() {
    let store = FavoritesStore::new(Box::new(MemoryStorage::new()));
    let mut o = DetailsOverlay::new();
    assert_eq!(o.favorite_label(&store), None);
    o.open("tt1");
    o.resolve("tt1", Ok(detail("tt1")));
    assert_eq!(o.favorite_label(&store), Some(ADD_LABEL));
    store.toggle(&detail("tt1")).unwrap();
    assert_eq!(o.favorite_label(&store), Some(REMOVE_LABEL));
  }
}
