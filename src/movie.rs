use serde::{Deserialize, Serialize};

use crate::constants::constants;

/// Value OMDb uses for any field it has no data for.
pub const NOT_AVAILABLE: &str = "N/A";

fn not_available() -> String {
  NOT_AVAILABLE.to_string()
}

/// A single entry from a search listing.
///
/// Field names follow the OMDb wire format so that persisted favorites stay
/// readable by anything else that speaks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieSummary {
  #[serde(rename = "Title")]
  pub title: String,
  #[serde(rename = "Year", default)]
  pub year: String,
  /// Catalog identifier, unique per entry (e.g. `tt0848228`).
  #[serde(rename = "imdbID")]
  pub imdb_id: String,
  #[serde(rename = "Poster", default = "not_available")]
  pub poster: String,
  /// `movie`, `series`, `episode`… when the API reports it.
  #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
  pub kind: Option<String>,
}

impl MovieSummary {
  pub fn has_poster(&self) -> bool {
    !self.poster.is_empty() && self.poster != NOT_AVAILABLE
  }

  /// Poster URL to display, falling back to the placeholder image.
  pub fn poster_url(&self) -> &str {
    if self.has_poster() { &self.poster } else { &constants().placeholder_poster }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
  #[serde(rename = "Source")]
  pub source: String,
  #[serde(rename = "Value")]
  pub value: String,
}

/// Full record returned by a detail lookup (`i=<id>&plot=full`).
///
/// Detail fields default to `N/A` so that summary-only records (e.g. a
/// favorite added straight from a result card) deserialize as well.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieDetail {
  #[serde(flatten)]
  pub summary: MovieSummary,
  #[serde(rename = "Genre", default = "not_available")]
  pub genre: String,
  #[serde(rename = "Runtime", default = "not_available")]
  pub runtime: String,
  #[serde(rename = "Director", default = "not_available")]
  pub director: String,
  #[serde(rename = "Actors", default = "not_available")]
  pub actors: String,
  #[serde(rename = "Plot", default = "not_available")]
  pub plot: String,
  #[serde(rename = "Ratings", default)]
  pub ratings: Vec<Rating>,
}

impl MovieDetail {
  pub fn imdb_id(&self) -> &str {
    &self.summary.imdb_id
  }

  /// `Title (Year)` heading.
  pub fn heading(&self) -> String {
    format!("{} ({})", self.summary.title, self.summary.year)
  }

  /// Link to the catalog page for this title.
  pub fn external_link(&self) -> String {
    format!("{}{}", constants().imdb_title_url, self.summary.imdb_id)
  }
}

impl From<MovieSummary> for MovieDetail {
  fn from(summary: MovieSummary) -> Self {
    Self {
      summary,
      genre: not_available(),
      runtime: not_available(),
      director: not_available(),
      actors: not_available(),
      plot: not_available(),
      ratings: Vec::new(),
    }
  }
}
