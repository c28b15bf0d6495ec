mod app;
mod config;
mod constants;
mod display;
mod favorites;
mod graphics;
mod input;
mod logging;
mod movie;
mod omdb;
mod overlay;
mod render;
mod storage;
mod theme;
mod ui;

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use ratatui::{
  DefaultTerminal,
  crossterm::event::{self, Event, KeyEventKind},
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use app::App;
use config::Config;
use constants::constants;
use display::CliDisplayMode;
use favorites::FavoritesStore;
use omdb::OmdbClient;
use storage::FileStorage;

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Poster display mode: 'auto', 'direct', 'ascii', or 'off' (default: auto-detect)
  #[arg(short, long, default_value = "auto")]
  display_mode: CliDisplayMode,

  /// OMDb API key (overrides `api_key` in prefs.toml)
  #[arg(long, env = "OMDB_API_KEY", hide_env_values = true)]
  api_key: Option<String>,

  /// Directory holding the favorites file
  #[arg(long)]
  data_dir: Option<PathBuf>,

  /// Print shell completions and exit
  #[arg(long, value_name = "SHELL")]
  completions: Option<Shell>,
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  if let Some(shell) = args.completions {
    clap_complete::generate(shell, &mut Args::command(), "reel", &mut std::io::stdout());
    return Ok(());
  }

  let _log_guard = match config::log_dir() {
    Some(dir) => Some(logging::init(&dir)?),
    None => None,
  };

  let config = Config::load();
  let api_key = args
    .api_key
    .as_deref()
    .map(str::trim)
    .filter(|k| !k.is_empty())
    .or(config.api_key())
    .map(str::to_string)
    .ok_or_else(|| anyhow!("No OMDb API key: pass --api-key, set OMDB_API_KEY, or add api_key to prefs.toml"))?;

  let data_dir = args
    .data_dir
    .clone()
    .or_else(config::data_dir)
    .context("Could not determine a data directory; pass --data-dir")?;
  let favorites = FavoritesStore::new(Box::new(FileStorage::new(data_dir.clone())));
  let client = OmdbClient::new(&constants().omdb_base_url, &api_key);
  let display_mode = display::resolve_display_mode(args.display_mode);
  info!(data_dir = %data_dir.display(), display = display_mode.label(), "reel starting");

  let default_hook = std::panic::take_hook();
  std::panic::set_hook(Box::new(move |info| {
    ratatui::restore();
    default_hook(info);
  }));

  let mut terminal = ratatui::init();
  let mut app = App::new(client, favorites, config, display_mode);
  let result = run(&mut terminal, &mut app);
  ratatui::restore();
  result
}

fn run(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
  app.start();

  loop {
    app.check_pending();
    app.expire_error();
    app.ensure_poster();

    terminal.draw(|frame| ui::ui(frame, app))?;

    if event::poll(Duration::from_millis(100))? {
      match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
          input::handle_key_event(app, key);
        }
        _ => {}
      }
    }

    if app.should_quit {
      break;
    }
  }

  info!("reel exiting");
  Ok(())
}
