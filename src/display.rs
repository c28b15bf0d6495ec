use clap::ValueEnum;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CliDisplayMode {
  Auto,
  Direct,
  Ascii,
  Off,
}

/// How poster previews are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
  /// Greyscale character ramp.
  Ascii,
  /// True-color half-block cells.
  Direct,
  /// No poster pane; nothing is downloaded.
  Off,
}

impl DisplayMode {
  pub fn label(self) -> &'static str {
    match self {
      DisplayMode::Ascii => "ASCII",
      DisplayMode::Direct => "Half-block",
      DisplayMode::Off => "Off",
    }
  }

  pub fn shows_posters(self) -> bool {
    self != DisplayMode::Off
  }
}

/// Detect the best poster rendering the terminal supports.
///
/// - Direct: `COLORTERM` is `truecolor` or `24bit`
/// - Ascii: fallback
pub fn detect_display_mode() -> DisplayMode {
  let colorterm = std::env::var("COLORTERM").unwrap_or_default();
  detect_from_colorterm(&colorterm)
}

fn detect_from_colorterm(colorterm: &str) -> DisplayMode {
  let colorterm = colorterm.to_lowercase();
  if colorterm == "truecolor" || colorterm == "24bit" { DisplayMode::Direct } else { DisplayMode::Ascii }
}

pub fn resolve_display_mode(cli: CliDisplayMode) -> DisplayMode {
  match cli {
    CliDisplayMode::Auto => detect_display_mode(),
    CliDisplayMode::Direct => DisplayMode::Direct,
    CliDisplayMode::Ascii => DisplayMode::Ascii,
    CliDisplayMode::Off => DisplayMode::Off,
  }
}
