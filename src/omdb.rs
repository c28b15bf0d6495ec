use anyhow::{Context, Result, anyhow};
use image::DynamicImage;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::movie::{MovieDetail, MovieSummary};

/// Shown when a search comes back with `Response:"False"` and no message.
pub const NO_RESULTS: &str = "No results found.";

/// Shown when a detail lookup comes back with `Response:"False"` and no message.
pub const NO_DETAILS: &str = "No details found.";

/// Why a lookup produced no data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
  /// Network failure, non-2xx status, or an unreadable body.
  #[error("transport error: {0}")]
  Transport(String),
  /// Well-formed response with `Response:"False"`; carries the API's message.
  #[error("{0}")]
  Api(String),
}

impl LookupError {
  /// Text to put in front of the user. Transport failures collapse to the
  /// caller's generic message; API failures show the API's own message.
  pub fn user_message(&self, transport_msg: &str) -> String {
    match self {
      LookupError::Transport(_) => transport_msg.to_string(),
      LookupError::Api(msg) => msg.clone(),
    }
  }
}

/// Title search parameters (`s=`, optional `y=` and `type=movie`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
  pub title: String,
  pub year: Option<i32>,
  pub movies_only: bool,
}

impl SearchQuery {
  pub fn title(title: impl Into<String>) -> Self {
    Self { title: title.into(), year: None, movies_only: false }
  }

  pub fn movies_in_year(title: impl Into<String>, year: i32) -> Self {
    Self { title: title.into(), year: Some(year), movies_only: true }
  }
}

/// One step of a sequential section load: a query and how many hits to keep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchQuery {
  pub query: SearchQuery,
  pub take: usize,
}

#[derive(Debug, Deserialize)]
struct SearchEnvelope {
  #[serde(rename = "Response", default)]
  response: String,
  #[serde(rename = "Error")]
  error: Option<String>,
  #[serde(rename = "Search", default)]
  search: Vec<MovieSummary>,
}

fn is_success(response: &str) -> bool {
  response.eq_ignore_ascii_case("true")
}

/// Decode a search response body.
pub fn parse_search(body: &str) -> Result<Vec<MovieSummary>, LookupError> {
  let envelope: SearchEnvelope =
    serde_json::from_str(body).map_err(|e| LookupError::Transport(format!("invalid search response: {}", e)))?;
  if is_success(&envelope.response) {
    Ok(envelope.search)
  } else {
    Err(LookupError::Api(envelope.error.filter(|e| !e.is_empty()).unwrap_or_else(|| NO_RESULTS.to_string())))
  }
}

/// Decode a detail response body.
pub fn parse_details(body: &str) -> Result<MovieDetail, LookupError> {
  let value: Value =
    serde_json::from_str(body).map_err(|e| LookupError::Transport(format!("invalid detail response: {}", e)))?;
  let response = value.get("Response").and_then(Value::as_str).unwrap_or_default();
  if !is_success(response) {
    let msg = value.get("Error").and_then(Value::as_str).filter(|e| !e.is_empty()).unwrap_or(NO_DETAILS);
    return Err(LookupError::Api(msg.to_string()));
  }
  serde_json::from_value(value).map_err(|e| LookupError::Transport(format!("invalid detail record: {}", e)))
}

/// Thin OMDb client. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct OmdbClient {
  http: Client,
  base_url: String,
  api_key: String,
}

impl OmdbClient {
  pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
    Self { http: Client::new(), base_url: base_url.into(), api_key: api_key.into() }
  }

  pub fn http(&self) -> &Client {
    &self.http
  }

  pub(crate) fn search_url(&self, query: &SearchQuery) -> Result<Url, LookupError> {
    let mut params = vec![("apikey", self.api_key.clone()), ("s", query.title.clone())];
    if let Some(year) = query.year {
      params.push(("y", year.to_string()));
    }
    if query.movies_only {
      params.push(("type", "movie".to_string()));
    }
    Url::parse_with_params(&self.base_url, &params).map_err(|e| LookupError::Transport(format!("bad base URL: {}", e)))
  }

  pub(crate) fn details_url(&self, imdb_id: &str) -> Result<Url, LookupError> {
    Url::parse_with_params(&self.base_url, [("apikey", self.api_key.as_str()), ("i", imdb_id), ("plot", "full")])
      .map_err(|e| LookupError::Transport(format!("bad base URL: {}", e)))
  }

  async fn get_body(&self, url: Url) -> Result<String, LookupError> {
    let response = self.http.get(url).send().await.map_err(|e| LookupError::Transport(e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
      return Err(LookupError::Transport(format!("HTTP {}", status)));
    }
    response.text().await.map_err(|e| LookupError::Transport(e.to_string()))
  }

  pub async fn search(&self, query: &SearchQuery) -> Result<Vec<MovieSummary>, LookupError> {
    debug!(title = %query.title, year = ?query.year, "omdb: search");
    let url = self.search_url(query)?;
    let result = self.get_body(url).await.and_then(|body| parse_search(&body));
    match &result {
      Ok(movies) => debug!(title = %query.title, hits = movies.len(), "omdb: search ok"),
      Err(e) => warn!(title = %query.title, err = %e, "omdb: search failed"),
    }
    result
  }

  pub async fn details(&self, imdb_id: &str) -> Result<MovieDetail, LookupError> {
    debug!(imdb_id, "omdb: details");
    let url = self.details_url(imdb_id)?;
    let result = self.get_body(url).await.and_then(|body| parse_details(&body));
    if let Err(e) = &result {
      warn!(imdb_id, err = %e, "omdb: details failed");
    }
    result
  }
}

/// Run `batches` one after another, sending each successful (truncated) hit
/// list through `tx` in order. Failed batches are skipped.
pub async fn search_sequence(client: OmdbClient, batches: Vec<BatchQuery>, tx: mpsc::Sender<Vec<MovieSummary>>) {
  for batch in batches {
    match client.search(&batch.query).await {
      Ok(movies) => {
        let kept: Vec<MovieSummary> = movies.into_iter().take(batch.take).collect();
        if tx.send(kept).await.is_err() {
          break;
        }
      }
      Err(e) => {
        debug!(title = %batch.query.title, err = %e, "omdb: skipping failed batch");
      }
    }
  }
}

/// Download and decode a poster image.
pub async fn fetch_poster(client: &Client, url: &str) -> Result<DynamicImage> {
  let response = client.get(url).send().await.with_context(|| format!("Failed to request poster {}", url))?;
  if !response.status().is_success() {
    return Err(anyhow!("Poster request returned HTTP {} ({})", response.status(), url));
  }
  let bytes = response.bytes().await.with_context(|| format!("Failed to read poster bytes from {}", url))?;
  image::load_from_memory(&bytes).with_context(|| format!("Failed to decode poster image (URL: {})", url))
}
