use anyhow::{Context, Result};
use ratatui::crossterm::event::{self, KeyCode, KeyModifiers};
use std::process::{Command, Stdio};

use crate::app::{App, AppMode};

// --- Helpers ---

/// Convert a char index to a byte offset within the string.
pub fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
  s.char_indices().nth(char_idx).map_or(s.len(), |(i, _)| i)
}

/// Open `url` in the default browser without blocking the UI.
fn open_in_browser(url: &str) -> Result<()> {
  #[cfg(target_os = "macos")]
  let cmd = "open";
  #[cfg(not(target_os = "macos"))]
  let cmd = "xdg-open";
  let mut child = Command::new(cmd)
    .arg(url)
    .stdin(Stdio::null())
    .stdout(Stdio::null())
    .stderr(Stdio::null())
    .spawn()
    .with_context(|| format!("Failed to launch {}", cmd))?;
  // Reap the child in a background thread to avoid zombie processes.
  std::thread::spawn(move || {
    let _ = child.wait();
  });
  Ok(())
}

// --- Event Handling ---

pub fn handle_key_event(app: &mut App, key: event::KeyEvent) {
  let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

  if ctrl && key.code == KeyCode::Char('c') {
    app.should_quit = true;
    return;
  }

  if ctrl && key.code == KeyCode::Char('t') {
    app.next_theme();
    return;
  }

  if ctrl && key.code == KeyCode::Char('l') {
    app.clear_search();
    app.mode = AppMode::Input;
    return;
  }

  if app.overlay.is_visible() {
    handle_overlay_key(app, key);
    return;
  }

  match app.mode {
    AppMode::Input => handle_input_key(app, key),
    AppMode::Browse => handle_browse_key(app, key),
  }
}

fn handle_overlay_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Esc | KeyCode::Char('q') => {
      app.close_overlay();
    }
    KeyCode::Char('f') => {
      app.toggle_overlay_favorite();
    }
    KeyCode::Char('o') => {
      if let Some(link) = app.overlay.detail().map(|d| d.external_link())
        && let Err(e) = open_in_browser(&link)
      {
        app.set_error(format!("Failed to open browser: {:#}", e));
      }
    }
    _ => {}
  }
}

fn handle_input_key(app: &mut App, key: event::KeyEvent) {
  app.clear_error();
  match key.code {
    KeyCode::Enter => {
      app.trigger_search();
    }
    KeyCode::Char(c) => {
      let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
      app.input.insert(byte_idx, c);
      app.cursor_position += 1;
    }
    KeyCode::Backspace => {
      if app.cursor_position > 0 {
        app.cursor_position -= 1;
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Delete => {
      if app.cursor_position < app.input.chars().count() {
        let byte_idx = char_to_byte_index(&app.input, app.cursor_position);
        app.input.remove(byte_idx);
      }
    }
    KeyCode::Left => {
      app.cursor_position = app.cursor_position.saturating_sub(1);
    }
    KeyCode::Right => {
      if app.cursor_position < app.input.chars().count() {
        app.cursor_position += 1;
      }
    }
    KeyCode::Home => {
      app.cursor_position = 0;
    }
    KeyCode::End => {
      app.cursor_position = app.input.chars().count();
    }
    KeyCode::Esc => {
      if !app.input.is_empty() {
        app.clear_search();
      } else {
        app.should_quit = true;
      }
    }
    KeyCode::Down | KeyCode::Tab => {
      app.mode = AppMode::Browse;
    }
    _ => {}
  }
}

fn handle_browse_key(app: &mut App, key: event::KeyEvent) {
  match key.code {
    KeyCode::Enter => {
      app.activate_selected();
    }
    KeyCode::Char('f') => {
      app.toggle_selected_favorite();
    }
    KeyCode::Down | KeyCode::Char('j') => {
      app.select_next();
    }
    KeyCode::Up | KeyCode::Char('k') => {
      app.select_prev();
    }
    KeyCode::Right | KeyCode::Tab | KeyCode::Char('l') => {
      app.next_section();
    }
    KeyCode::Left | KeyCode::BackTab | KeyCode::Char('h') => {
      app.prev_section();
    }
    KeyCode::Char('/') | KeyCode::Char('i') | KeyCode::Esc => {
      app.mode = AppMode::Input;
    }
    KeyCode::Char('q') => {
      app.should_quit = true;
    }
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::display::DisplayMode;
  use crate::favorites::FavoritesStore;
  use crate::omdb::OmdbClient;
  use crate::storage::MemoryStorage;
  use ratatui::crossterm::event::KeyEvent;

  fn app() -> App {
    App::new(
      OmdbClient::new("http://127.0.0.1:9/", "test"),
      FavoritesStore::new(Box::new(MemoryStorage::new())),
      Config::default(),
      DisplayMode::Off,
    )
  }

  fn press(app: &mut App, code: KeyCode) {
    handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE));
  }

  // --- char_to_byte_index ---

  #[test]
  fn char_to_byte_ascii() {
    assert_eq!(char_to_byte_index("hello", 0), 0);
    assert_eq!(char_to_byte_index("hello", 3), 3);
    assert_eq!(char_to_byte_index("hello", 5), 5); // past end
  }

  #[test]
  fn char_to_byte_multibyte() {
    let s = "aé日"; // a=1 byte, é=2 bytes, 日=3 bytes
    assert_eq!(char_to_byte_index(s, 1), 1);
    assert_eq!(char_to_byte_index(s, 2), 3);
    assert_eq!(char_to_byte_index(s, 3), 6); // past end
  }

  // --- key handling ---

  #[test]
  fn typing_edits_the_query() {
    let mut app = app();
    for c in "Amélie".chars() {
      press(&mut app, KeyCode::Char(c));
    }
    press(&mut app, KeyCode::Left);
    press(&mut app, KeyCode::Backspace);
    assert_eq!(app.input, "Amélie".replace('i', ""));
    assert_eq!(app.cursor_position, 4);
  }

  #[test]
  fn esc_with_text_clears_then_quits() {
    let mut app = app();
    press(&mut app, KeyCode::Char('x'));
    press(&mut app, KeyCode::Esc);
    assert!(app.input.is_empty());
    assert!(!app.should_quit);
    press(&mut app, KeyCode::Esc);
    assert!(app.should_quit);
  }

  #[test]
  fn ctrl_l_clears_search_from_browse_mode() {
    let mut app = app();
    app.input = "alien".into();
    app.mode = AppMode::Browse;
    handle_key_event(&mut app, KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL));
    assert!(app.input.is_empty());
    assert_eq!(app.mode, AppMode::Input);
  }

  #[test]
  fn overlay_captures_keys_until_closed() {
    let mut app = app();
    app.overlay.open("tt1");
    app.mode = AppMode::Browse;
    press(&mut app, KeyCode::Char('q'));
    assert!(!app.should_quit);
    assert!(!app.overlay.is_visible());
  }

  #[test]
  fn browse_keys_move_between_sections() {
    let mut app = app();
    press(&mut app, KeyCode::Tab);
    assert_eq!(app.mode, AppMode::Browse);
    let start = app.active;
    press(&mut app, KeyCode::Right);
    assert_ne!(app.active, start);
    press(&mut app, KeyCode::Left);
    assert_eq!(app.active, start);
    press(&mut app, KeyCode::Char('/'));
    assert_eq!(app.mode, AppMode::Input);
  }
}
