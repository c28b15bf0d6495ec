use anyhow::Result;
use chrono::Datelike;
use image::DynamicImage;
use ratatui::widgets::ListState;
use std::collections::HashSet;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::constants;
use crate::display::DisplayMode;
use crate::favorites::{FavoriteChange, FavoritesStore};
use crate::movie::{MovieDetail, MovieSummary};
use crate::omdb::{BatchQuery, LookupError, OmdbClient, SearchQuery, fetch_poster, search_sequence};
use crate::overlay::DetailsOverlay;
use crate::render::{Card, CardAction, Grid, SectionKind, render};
use crate::theme::{self, THEMES};

/// Shown in the search section when the request never got an answer.
pub const NETWORK_ERROR: &str = "Network error";

/// Shown in the favorites section when the list is empty.
pub const NO_FAVORITES: &str = "No favorites added yet.";

// --- Types ---

pub type SearchResult = Result<Vec<MovieSummary>, LookupError>;
pub type DetailResult = Result<MovieDetail, LookupError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppMode {
  /// Typing in the search box.
  Input,
  /// Moving between sections and cards.
  Browse,
}

/// Poster preview state for the selected card.
#[derive(Default)]
pub struct PosterCache {
  /// Last poster downloaded, keyed by URL.
  pub current: Option<(String, DynamicImage)>,
  /// `current` resized for the last area it was drawn into.
  pub resized: Option<(String, u16, u16, DynamicImage)>,
  /// Last URL that failed to download, so it is not retried every frame.
  failed: Option<String>,
}

/// In-flight async task receivers.
#[derive(Default)]
pub(crate) struct AsyncTasks {
  pub(crate) search_rx: Option<oneshot::Receiver<SearchResult>>,
  pub(crate) details_rx: Option<(String, oneshot::Receiver<DetailResult>)>,
  pub(crate) section_rx: Vec<(SectionKind, mpsc::Receiver<Vec<MovieSummary>>)>,
  pub(crate) poster_rx: Option<(String, oneshot::Receiver<Result<DynamicImage>>)>,
}

/// The sequential searches that fill a section at start-up.
pub fn initial_queries(kind: SectionKind, current_year: i32) -> Vec<BatchQuery> {
  let c = constants();
  match kind {
    SectionKind::Latest => [current_year, current_year - 1]
      .into_iter()
      .map(|y| BatchQuery { query: SearchQuery::movies_in_year(c.latest_term.clone(), y), take: c.latest_per_year })
      .collect(),
    SectionKind::Recommended => c
      .recommended_keywords
      .iter()
      .map(|k| BatchQuery { query: SearchQuery::title(k.clone()), take: c.recommended_per_keyword })
      .collect(),
    SectionKind::News => c
      .news_topics
      .iter()
      .map(|t| BatchQuery { query: SearchQuery::title(t.clone()), take: c.news_per_topic })
      .collect(),
    SectionKind::Search | SectionKind::Favorites => Vec::new(),
  }
}

pub struct App {
  pub input: String,
  pub cursor_position: usize,
  pub input_scroll: usize,
  pub mode: AppMode,
  pub theme_index: usize,
  pub display_mode: DisplayMode,
  /// One grid per enabled section, in display order.
  pub grids: Vec<Grid>,
  pub active: SectionKind,
  pub list_state: ListState,
  pub overlay: DetailsOverlay,
  pub favorites: FavoritesStore,
  /// Ids in the favorites list as of the last refresh, for card markers.
  pub favorite_ids: HashSet<String>,
  pub poster: PosterCache,
  pub last_error: Option<String>,
  pub status_message: Option<String>,
  /// Informational message, lower priority than status/error.
  pub info_message: Option<String>,
  pub should_quit: bool,
  pub(crate) tasks: AsyncTasks,
  client: OmdbClient,
  config: Config,
  /// When the last error was set, for auto-dismiss.
  error_time: Option<Instant>,
}

impl App {
  pub fn new(client: OmdbClient, favorites: FavoritesStore, config: Config, display_mode: DisplayMode) -> Self {
    let theme_index = config.theme_name.as_deref().map(theme::index_of).unwrap_or(0);
    let grids: Vec<Grid> = config
      .enabled_sections()
      .into_iter()
      .map(|kind| {
        let mut grid = Grid::new(kind);
        // The search section stays hidden until the first search.
        grid.visible = kind != SectionKind::Search;
        grid
      })
      .collect();
    let active = grids.iter().find(|g| g.visible).map_or(SectionKind::Search, |g| g.kind);

    Self {
      input: String::new(),
      cursor_position: 0,
      input_scroll: 0,
      mode: AppMode::Input,
      theme_index,
      display_mode,
      grids,
      active,
      list_state: ListState::default(),
      overlay: DetailsOverlay::new(),
      favorites,
      favorite_ids: HashSet::new(),
      poster: PosterCache::default(),
      last_error: None,
      status_message: None,
      info_message: None,
      should_quit: false,
      tasks: AsyncTasks::default(),
      client,
      config,
      error_time: None,
    }
  }

  pub fn theme(&self) -> &'static crate::theme::Theme {
    // Safety: theme_index comes from theme::index_of or modular arithmetic in next_theme().
    &THEMES[self.theme_index]
  }

  pub fn next_theme(&mut self) {
    self.theme_index = (self.theme_index + 1) % THEMES.len();
    self.config.theme_name = Some(self.theme().name.to_string());
    self.config.save();
  }

  /// Set an error message with auto-dismiss tracking.
  pub fn set_error(&mut self, msg: String) {
    self.last_error = Some(msg);
    self.error_time = Some(Instant::now());
  }

  /// Clear the current error message and its expiry timer.
  pub fn clear_error(&mut self) {
    self.last_error = None;
    self.error_time = None;
  }

  /// Clear stale error messages.
  pub fn expire_error(&mut self) {
    if let Some(t) = self.error_time
      && t.elapsed() >= Duration::from_secs(constants().error_dismiss_secs)
    {
      self.last_error = None;
      self.error_time = None;
    }
  }

  // --- Sections ---

  pub fn grid(&self, kind: SectionKind) -> Option<&Grid> {
    self.grids.iter().find(|g| g.kind == kind)
  }

  pub fn grid_mut(&mut self, kind: SectionKind) -> Option<&mut Grid> {
    self.grids.iter_mut().find(|g| g.kind == kind)
  }

  pub fn visible_sections(&self) -> Vec<SectionKind> {
    self.grids.iter().filter(|g| g.visible).map(|g| g.kind).collect()
  }

  pub fn active_grid(&self) -> Option<&Grid> {
    self.grid(self.active)
  }

  /// Switch to `kind` and select its first card.
  pub fn focus_section(&mut self, kind: SectionKind) {
    self.active = kind;
    let has_cards = self.grid(kind).is_some_and(|g| !g.is_empty());
    self.list_state.select(if has_cards { Some(0) } else { None });
  }

  fn step_section(&mut self, forward: bool) {
    let visible = self.visible_sections();
    if visible.is_empty() {
      return;
    }
    let pos = visible.iter().position(|k| *k == self.active).unwrap_or(0);
    let next = if forward { (pos + 1) % visible.len() } else { (pos + visible.len() - 1) % visible.len() };
    self.focus_section(visible[next]);
  }

  pub fn next_section(&mut self) {
    self.step_section(true);
  }

  pub fn prev_section(&mut self) {
    self.step_section(false);
  }

  pub fn select_next(&mut self) {
    let count = self.active_grid().map_or(0, |g| g.cards.len());
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| (i + 1) % count);
      self.list_state.select(Some(i));
    }
  }

  pub fn select_prev(&mut self) {
    let count = self.active_grid().map_or(0, |g| g.cards.len());
    if count > 0 {
      let i = self.list_state.selected().map_or(0, |i| if i == 0 { count - 1 } else { i - 1 });
      self.list_state.select(Some(i));
    }
  }

  pub fn selected_card(&self) -> Option<&Card> {
    let idx = self.list_state.selected()?;
    self.active_grid()?.cards.get(idx)
  }

  /// Keep the selection inside the active grid after its contents change.
  fn clamp_selection(&mut self) {
    let count = self.active_grid().map_or(0, |g| g.cards.len());
    match (count, self.list_state.selected()) {
      (0, _) => self.list_state.select(None),
      (_, None) => self.list_state.select(Some(0)),
      (n, Some(i)) if i >= n => self.list_state.select(Some(n - 1)),
      _ => {}
    }
  }

  // --- Start-up ---

  /// Kick off the initial section loads and show persisted favorites.
  pub fn start(&mut self) {
    let year = chrono::Local::now().year();
    for kind in [SectionKind::Latest, SectionKind::Recommended, SectionKind::News] {
      if self.grid(kind).is_some() {
        self.spawn_section_load(kind, initial_queries(kind, year));
      }
    }
    self.refresh_favorites();
    self.clamp_selection();
  }

  fn spawn_section_load(&mut self, kind: SectionKind, batches: Vec<BatchQuery>) {
    let Some(grid) = self.grid_mut(kind) else { return };
    grid.clear();
    info!(section = kind.label(), batches = batches.len(), "section: loading");
    let (tx, rx) = mpsc::channel(8);
    tokio::spawn(search_sequence(self.client.clone(), batches, tx));
    self.tasks.section_rx.push((kind, rx));
  }

  /// Re-read favorites and redraw the favorites section if it is shown.
  pub fn refresh_favorites(&mut self) {
    let list = self.favorites.list();
    self.favorite_ids = list.iter().map(|m| m.imdb_id().to_string()).collect();
    let summaries: Vec<MovieSummary> = list.into_iter().map(|m| m.summary).collect();
    let empty = summaries.is_empty();
    render(&summaries, self.grid_mut(SectionKind::Favorites));
    if empty && let Some(grid) = self.grid_mut(SectionKind::Favorites) {
      grid.show_message(NO_FAVORITES);
    }
    if self.active == SectionKind::Favorites {
      self.clamp_selection();
    }
  }

  // --- Search ---

  pub fn trigger_search(&mut self) {
    let query = self.input.trim().to_string();
    if query.is_empty() {
      self.set_error("Enter a search term.".to_string());
      return;
    }
    let Some(grid) = self.grid_mut(SectionKind::Search) else { return };
    grid.visible = true;
    grid.clear();
    info!(query = %query, "search triggered");
    self.clear_error();
    self.info_message = None;
    self.status_message = Some(format!("Searching '{}'…", query));
    self.focus_section(SectionKind::Search);

    let client = self.client.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(client.search(&SearchQuery::title(query)).await);
    });
    // Replacing the receiver drops any earlier search still in flight.
    self.tasks.search_rx = Some(rx);
  }

  pub fn apply_search_result(&mut self, result: SearchResult) {
    self.status_message = None;
    let Some(grid) = self.grid_mut(SectionKind::Search) else { return };
    match result {
      Ok(movies) => {
        render(&movies, Some(grid));
        if !movies.is_empty() {
          self.mode = AppMode::Browse;
        }
      }
      Err(e) => grid.show_message(e.user_message(NETWORK_ERROR)),
    }
    if self.active == SectionKind::Search {
      self.list_state.select(None);
      self.clamp_selection();
    }
  }

  /// Reset the search box and hide the search section.
  pub fn clear_search(&mut self) {
    self.input.clear();
    self.cursor_position = 0;
    self.input_scroll = 0;
    self.tasks.search_rx = None;
    self.status_message = None;
    if let Some(grid) = self.grid_mut(SectionKind::Search) {
      grid.clear();
      grid.visible = false;
    }
    if self.active == SectionKind::Search
      && let Some(&first) = self.visible_sections().first()
    {
      self.focus_section(first);
    }
  }

  // --- Details overlay ---

  /// Dispatch the selected card's action.
  pub fn activate_selected(&mut self) {
    let Some(card) = self.selected_card() else { return };
    match card.action.clone() {
      CardAction::OpenDetails(imdb_id) => self.open_details(&imdb_id),
    }
  }

  pub fn open_details(&mut self, imdb_id: &str) {
    if imdb_id.is_empty() {
      return;
    }
    self.overlay.open(imdb_id);
    let client = self.client.clone();
    let id = imdb_id.to_string();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(client.details(&id).await);
    });
    self.tasks.details_rx = Some((imdb_id.to_string(), rx));
  }

  pub fn apply_details_result(&mut self, imdb_id: &str, result: DetailResult) {
    self.overlay.resolve(imdb_id, result);
  }

  pub fn close_overlay(&mut self) {
    self.overlay.close();
    self.tasks.details_rx = None;
  }

  // --- Favorites ---

  pub fn toggle_favorite(&mut self, movie: &MovieDetail) {
    match self.favorites.toggle(movie) {
      Ok(change) => {
        let verb = match change {
          FavoriteChange::Added => "Added to",
          FavoriteChange::Removed => "Removed from",
        };
        self.info_message = Some(format!("{} favorites: {}", verb, movie.summary.title));
        self.refresh_favorites();
      }
      Err(e) => {
        warn!(err = %e, "favorites: toggle failed");
        self.set_error(format!("Failed to save favorites: {:#}", e));
      }
    }
  }

  /// Toggle the record currently shown in the overlay.
  pub fn toggle_overlay_favorite(&mut self) {
    if let Some(detail) = self.overlay.detail().cloned() {
      self.toggle_favorite(&detail);
    }
  }

  /// Toggle the selected card using its summary record.
  pub fn toggle_selected_favorite(&mut self) {
    if let Some(card) = self.selected_card() {
      let movie = MovieDetail::from(card.movie.clone());
      self.toggle_favorite(&movie);
    }
  }

  pub fn is_favorite(&self, imdb_id: &str) -> bool {
    self.favorite_ids.contains(imdb_id)
  }

  // --- Posters ---

  /// Start downloading the selected card's poster if it isn't cached,
  /// pending, or known to fail.
  pub fn ensure_poster(&mut self) {
    if !self.display_mode.shows_posters() {
      return;
    }
    let Some(url) = self.selected_card().map(|c| c.poster_url.clone()) else { return };
    let cached = self.poster.current.as_ref().is_some_and(|(u, _)| *u == url);
    let pending = self.tasks.poster_rx.as_ref().is_some_and(|(u, _)| *u == url);
    let failed = self.poster.failed.as_deref() == Some(url.as_str());
    if cached || pending || failed {
      return;
    }
    let http = self.client.http().clone();
    let fetch_url = url.clone();
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
      let _ = tx.send(fetch_poster(&http, &fetch_url).await);
    });
    self.tasks.poster_rx = Some((url, rx));
  }

  /// The cached poster, if it belongs to the selected card.
  pub fn selected_poster(&self) -> Option<&DynamicImage> {
    let url = &self.selected_card()?.poster_url;
    self.poster.current.as_ref().filter(|(u, _)| u == url).map(|(_, img)| img)
  }

  // --- Polling ---

  /// Apply whatever background work has finished since the last frame.
  pub fn check_pending(&mut self) {
    if let Some(mut rx) = self.tasks.search_rx.take() {
      match rx.try_recv() {
        Ok(result) => self.apply_search_result(result),
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.search_rx = Some(rx);
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.status_message = None;
          self.set_error("Search task failed.".to_string());
        }
      }
    }

    if let Some((imdb_id, mut rx)) = self.tasks.details_rx.take() {
      match rx.try_recv() {
        Ok(result) => self.apply_details_result(&imdb_id, result),
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.details_rx = Some((imdb_id, rx));
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.apply_details_result(&imdb_id, Err(LookupError::Transport("detail task failed".to_string())));
        }
      }
    }

    // Drain section batches in arrival order; a closed channel means the load is done.
    let mut receivers = std::mem::take(&mut self.tasks.section_rx);
    receivers.retain_mut(|(kind, rx)| {
      loop {
        match rx.try_recv() {
          Ok(batch) => {
            if let Some(grid) = self.grids.iter_mut().find(|g| g.kind == *kind) {
              grid.append(&batch);
            }
          }
          Err(mpsc::error::TryRecvError::Empty) => return true,
          Err(mpsc::error::TryRecvError::Disconnected) => {
            debug!(section = kind.label(), "section: load finished");
            return false;
          }
        }
      }
    });
    self.tasks.section_rx = receivers;
    if self.list_state.selected().is_none() {
      self.clamp_selection();
    }

    if let Some((url, mut rx)) = self.tasks.poster_rx.take() {
      match rx.try_recv() {
        Ok(Ok(image)) => {
          self.poster.current = Some((url, image));
          self.poster.resized = None;
        }
        Ok(Err(e)) => {
          debug!(url = %url, err = %e, "poster: fetch failed");
          self.poster.failed = Some(url);
        }
        Err(oneshot::error::TryRecvError::Empty) => {
          self.tasks.poster_rx = Some((url, rx));
        }
        Err(oneshot::error::TryRecvError::Closed) => {
          self.poster.failed = Some(url);
        }
      }
    }
  }

  /// Whether any section is still loading.
  pub fn sections_loading(&self) -> bool {
    !self.tasks.section_rx.is_empty()
  }
}
