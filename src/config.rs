use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

use crate::render::SectionKind;

const APP_NAME: &str = "reel";

/// User preferences stored in `prefs.toml`.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub theme_name: Option<String>,
  pub api_key: Option<String>,
  /// Sections to show, by name. `None` shows all of them.
  pub sections: Option<Vec<String>>,
}

pub fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", APP_NAME)
}

/// Where persisted key/value data (favorites) lives.
pub fn data_dir() -> Option<PathBuf> {
  project_dirs().map(|d| d.data_dir().to_path_buf())
}

/// Where rolling log files are written.
pub fn log_dir() -> Option<PathBuf> {
  project_dirs().map(|d| d.state_dir().unwrap_or_else(|| d.cache_dir()).to_path_buf())
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = project_dirs() {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file) {
        return Self::parse(&content);
      }
    }
    Self::default()
  }

  /// Parse `prefs.toml` content; anything unreadable yields defaults.
  pub fn parse(content: &str) -> Self {
    toml::from_str(content).unwrap_or_else(|e| {
      warn!(err = %e, "config: prefs.toml is invalid, using defaults");
      Self::default()
    })
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = project_dirs() {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }

  /// Enabled sections in display order. Unknown names are ignored; the
  /// search section is always present.
  pub fn enabled_sections(&self) -> Vec<SectionKind> {
    let Some(ref names) = self.sections else { return SectionKind::ALL.to_vec() };
    let wanted: Vec<SectionKind> = names.iter().filter_map(|n| SectionKind::from_config(n)).collect();
    SectionKind::ALL.into_iter().filter(|k| *k == SectionKind::Search || wanted.contains(k)).collect()
  }

  pub fn api_key(&self) -> Option<&str> {
    self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parse_full_prefs() {
    let c = Config::parse("theme_name = \"matinee\"\napi_key = \"abc123\"\nsections = [\"news\", \"favorites\"]\n");
    assert_eq!(c.theme_name.as_deref(), Some("matinee"));
    assert_eq!(c.api_key(), Some("abc123"));
    assert_eq!(c.enabled_sections(), vec![SectionKind::Search, SectionKind::News, SectionKind::Favorites]);
  }

  #[test]
  fn invalid_prefs_fall_back_to_defaults() {
    assert_eq!(Config::parse("theme_name = [not toml"), Config::default());
  }

  #[test]
  fn all_sections_by_default() {
    assert_eq!(Config::default().enabled_sections(), SectionKind::ALL.to_vec());
  }

  #[test]
  fn blank_api_key_is_none() {
    let c = Config { api_key: Some("  ".into()), ..Config::default() };
    assert_eq!(c.api_key(), None);
  }

  #[test]
  fn round_trips_through_toml() {
    let c = Config { theme_name: Some("nightshift".into()), api_key: None, sections: Some(vec!["latest".into()]) };
    let text = toml::to_string(&c).unwrap();
    assert_eq!(Config::parse(&text), c);
  }
}
