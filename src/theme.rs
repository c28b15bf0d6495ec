use ratatui::style::Color;

pub struct Theme {
  pub name: &'static str,
  pub bg: Color,
  pub fg: Color,
  pub accent: Color,
  pub muted: Color,
  pub border: Color,
  pub highlight_fg: Color,
  pub highlight_bg: Color,
  pub stripe_bg: Color,
  pub status: Color,
  pub error: Color,
  pub key_fg: Color,
  pub key_bg: Color,
  /// Marker color for favorited cards.
  pub favorite: Color,
}

pub static THEMES: [Theme; 3] = [
  Theme {
    name: "marquee",
    bg: Color::Rgb(18, 16, 22),
    fg: Color::Rgb(230, 226, 218),
    accent: Color::Rgb(245, 197, 24),
    muted: Color::Rgb(128, 122, 134),
    border: Color::Rgb(64, 58, 72),
    highlight_fg: Color::Rgb(18, 16, 22),
    highlight_bg: Color::Rgb(245, 197, 24),
    stripe_bg: Color::Rgb(26, 23, 31),
    status: Color::Rgb(96, 165, 250),
    error: Color::Rgb(239, 83, 80),
    key_fg: Color::Rgb(18, 16, 22),
    key_bg: Color::Rgb(160, 154, 166),
    favorite: Color::Rgb(244, 114, 182),
  },
  Theme {
    name: "nightshift",
    bg: Color::Rgb(15, 23, 42),
    fg: Color::Rgb(226, 232, 240),
    accent: Color::Rgb(96, 165, 250),
    muted: Color::Rgb(100, 116, 139),
    border: Color::Rgb(51, 65, 85),
    highlight_fg: Color::Rgb(15, 23, 42),
    highlight_bg: Color::Rgb(96, 165, 250),
    stripe_bg: Color::Rgb(22, 32, 54),
    status: Color::Rgb(52, 211, 153),
    error: Color::Rgb(248, 113, 113),
    key_fg: Color::Rgb(15, 23, 42),
    key_bg: Color::Rgb(148, 163, 184),
    favorite: Color::Rgb(251, 191, 36),
  },
  Theme {
    name: "matinee",
    bg: Color::Rgb(250, 247, 240),
    fg: Color::Rgb(40, 36, 32),
    accent: Color::Rgb(185, 28, 28),
    muted: Color::Rgb(140, 132, 120),
    border: Color::Rgb(214, 206, 192),
    highlight_fg: Color::Rgb(250, 247, 240),
    highlight_bg: Color::Rgb(185, 28, 28),
    stripe_bg: Color::Rgb(242, 237, 226),
    status: Color::Rgb(29, 78, 216),
    error: Color::Rgb(185, 28, 28),
    key_fg: Color::Rgb(250, 247, 240),
    key_bg: Color::Rgb(120, 113, 108),
    favorite: Color::Rgb(219, 39, 119),
  },
];

/// Index of the theme called `name`, or the first theme.
pub fn index_of(name: &str) -> usize {
  THEMES.iter().position(|t| t.name == name).unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn theme_names_are_unique() {
    for (i, t) in THEMES.iter().enumerate() {
      assert_eq!(index_of(t.name), i);
    }
  }

  #[test]
  fn unknown_theme_falls_back_to_first() {
    assert_eq!(index_of("does-not-exist"), 0);
  }
}
