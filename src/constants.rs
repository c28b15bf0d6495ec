//! Application constants loaded from `constants.ron` at compile time.
//!
//! The RON file is embedded via `include_str!` so it's always available;
//! no runtime file I/O. Parsed once on first access via `LazyLock`.

use serde::Deserialize;
use std::sync::LazyLock;

/// All tuneable application constants.
#[derive(Debug, Deserialize)]
pub struct Constants {
  // OMDb / IMDb endpoints
  pub omdb_base_url: String,
  pub imdb_title_url: String,
  pub placeholder_poster: String,

  // Local persistence
  pub favorites_key: String,

  // Latest releases section
  pub latest_term: String,
  pub latest_per_year: usize,

  // Recommended section
  pub recommended_keywords: Vec<String>,
  pub recommended_per_keyword: usize,

  // News section
  pub news_topics: Vec<String>,
  pub news_per_topic: usize,

  // UI
  pub error_dismiss_secs: u64,
  pub poster_width: u16,
}

static CONSTANTS: LazyLock<Constants> = LazyLock::new(|| {
  // Safety: the RON file is embedded at compile time; if it's malformed this is a build-time error.
  ron::from_str(include_str!("../constants.ron")).expect("constants.ron must be valid RON (embedded at compile time)")
});

/// Returns a reference to the parsed application constants.
pub fn constants() -> &'static Constants {
  &CONSTANTS
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn embedded_constants_parse() {
    let c = constants();
    assert!(c.omdb_base_url.starts_with("https://"));
    assert_eq!(c.favorites_key, "favorites");
  }

  #[test]
  fn section_keyword_lists_keep_their_order() {
    let c = constants();
    assert_eq!(c.recommended_keywords.first().map(String::as_str), Some("Avengers"));
    assert_eq!(c.news_topics, vec!["Hollywood", "Netflix", "Marvel"]);
    assert_eq!(c.latest_per_year, 12);
    assert_eq!(c.recommended_per_keyword, 6);
    assert_eq!(c.news_per_topic, 3);
  }
}
