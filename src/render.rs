//! Turns movie lists into card models held by named grid sections.
//!
//! The UI layer draws whatever the grids contain; this module owns what a
//! card is and what selecting it does.

use crate::movie::MovieSummary;

/// The page sections a grid can belong to, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionKind {
  Search,
  Latest,
  Recommended,
  News,
  Favorites,
}

impl SectionKind {
  pub const ALL: [SectionKind; 5] =
    [SectionKind::Search, SectionKind::Latest, SectionKind::Recommended, SectionKind::News, SectionKind::Favorites];

  pub fn label(self) -> &'static str {
    match self {
      SectionKind::Search => "Search",
      SectionKind::Latest => "Latest",
      SectionKind::Recommended => "Recommended",
      SectionKind::News => "News",
      SectionKind::Favorites => "Favorites",
    }
  }

  /// Config name, e.g. `"recommended"`.
  pub fn from_config(s: &str) -> Option<Self> {
    match s.trim().to_lowercase().as_str() {
      "search" => Some(SectionKind::Search),
      "latest" => Some(SectionKind::Latest),
      "recommended" => Some(SectionKind::Recommended),
      "news" => Some(SectionKind::News),
      "favorites" | "favourites" => Some(SectionKind::Favorites),
      _ => None,
    }
  }
}

/// What happens when a card is activated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardAction {
  OpenDetails(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
  pub title: String,
  pub year: String,
  pub poster_url: String,
  pub action: CardAction,
  /// Source record, kept so a card can be favorited without a detail lookup.
  pub movie: MovieSummary,
}

impl Card {
  pub fn from_movie(movie: &MovieSummary) -> Self {
    Self {
      title: movie.title.clone(),
      year: movie.year.clone(),
      poster_url: movie.poster_url().to_string(),
      action: CardAction::OpenDetails(movie.imdb_id.clone()),
      movie: movie.clone(),
    }
  }

  pub fn imdb_id(&self) -> &str {
    &self.movie.imdb_id
  }
}

/// A section's card container.
#[derive(Debug, Clone)]
pub struct Grid {
  pub kind: SectionKind,
  pub cards: Vec<Card>,
  /// Text shown in place of cards (errors, "no favorites", …).
  pub message: Option<String>,
  pub visible: bool,
}

impl Grid {
  pub fn new(kind: SectionKind) -> Self {
    Self { kind, cards: Vec::new(), message: None, visible: true }
  }

  pub fn clear(&mut self) {
    self.cards.clear();
    self.message = None;
  }

  /// Append one card per movie, keeping input order.
  pub fn append(&mut self, movies: &[MovieSummary]) {
    self.cards.extend(movies.iter().map(Card::from_movie));
  }

  /// Replace the contents with a message.
  pub fn show_message(&mut self, msg: impl Into<String>) {
    self.cards.clear();
    self.message = Some(msg.into());
  }

  pub fn is_empty(&self) -> bool {
    self.cards.is_empty()
  }
}

/// Clear `target` and fill it with one card per movie. Does nothing when
/// there is no target.
pub fn render(movies: &[MovieSummary], target: Option<&mut Grid>) {
  let Some(grid) = target else { return };
  grid.clear();
  grid.append(movies);
}
