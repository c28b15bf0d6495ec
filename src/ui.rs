use image::imageops::FilterType;
use ratatui::{
  Frame,
  layout::{Alignment, Constraint, Layout, Rect},
  style::{Modifier, Style, Stylize},
  text::{Line, Span},
  widgets::{Block, BorderType, Clear, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::{App, AppMode};
use crate::constants::constants;
use crate::graphics::{PosterWidget, target_size};
use crate::overlay::{OverlayState, REMOVE_LABEL};
use crate::render::SectionKind;
use crate::theme::Theme;

// --- Helpers ---

/// Compute the display width of the first `n` chars (accounting for double-width CJK).
pub fn display_width(s: &str, n: usize) -> usize {
  use unicode_width::UnicodeWidthChar;
  s.chars().take(n).map(|c| c.width().unwrap_or(0)).sum()
}

/// Truncate a string to `max_width` characters, appending "…" if truncated.
fn truncate_str(s: &str, max_width: usize) -> String {
  if s.chars().count() <= max_width {
    s.to_string()
  } else {
    let truncated: String = s.chars().take(max_width.saturating_sub(1)).collect();
    format!("{}…", truncated)
  }
}

/// A rect of `percent_x` × `percent_y` centered in `area`.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
  let [_, middle, _] = Layout::vertical([
    Constraint::Percentage((100 - percent_y) / 2),
    Constraint::Percentage(percent_y),
    Constraint::Percentage((100 - percent_y) / 2),
  ])
  .areas(area);
  let [_, center, _] = Layout::horizontal([
    Constraint::Percentage((100 - percent_x) / 2),
    Constraint::Percentage(percent_x),
    Constraint::Percentage((100 - percent_x) / 2),
  ])
  .areas(middle);
  center
}

fn rounded_block(theme: &Theme) -> Block<'static> {
  Block::bordered().border_type(BorderType::Rounded).border_style(Style::default().fg(theme.border))
}

// --- UI Rendering ---

pub fn ui(frame: &mut Frame, app: &mut App) {
  let theme = app.theme();

  frame.render_widget(Block::default().style(Style::default().bg(theme.bg)), frame.area());

  let [header_area, tabs_area, main_area, status_area, input_area, footer_area] = Layout::vertical([
    Constraint::Length(1),
    Constraint::Length(1),
    Constraint::Min(3),
    Constraint::Length(1),
    Constraint::Length(3),
    Constraint::Length(1),
  ])
  .areas(frame.area());

  render_header(frame, theme, header_area);
  render_tabs(frame, app, tabs_area);
  render_main(frame, app, main_area);
  render_status(frame, app, status_area);
  render_input(frame, app, input_area);
  render_footer(frame, app, footer_area);

  if app.overlay.is_visible() {
    render_overlay(frame, app);
  }
}

fn render_header(frame: &mut Frame, theme: &Theme, area: Rect) {
  let left = Line::from(Span::styled(" 🎬 reel ", Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)));
  frame.render_widget(left, area);

  let version = format!("v{} ", env!("CARGO_PKG_VERSION"));
  let right = Line::from(Span::styled(&version, Style::default().fg(theme.muted)));
  let right_w = (version.len() as u16).min(area.width);
  let right_area = Rect { x: area.x + area.width - right_w, width: right_w, ..area };
  frame.render_widget(right, right_area);
}

fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let mut spans = vec![Span::raw(" ")];
  for kind in app.visible_sections() {
    let count = app.grid(kind).map_or(0, |g| g.cards.len());
    let label = format!(" {} {} ", kind.label(), count);
    let style = if kind == app.active {
      Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD)
    } else {
      Style::default().fg(theme.muted)
    };
    spans.push(Span::styled(label, style));
    spans.push(Span::raw(" "));
  }
  frame.render_widget(Line::from(spans), area);
}

fn render_main(frame: &mut Frame, app: &mut App, area: Rect) {
  if app.display_mode.shows_posters() {
    let poster_w = constants().poster_width + 2;
    let [cards_area, poster_area] = Layout::horizontal([Constraint::Min(20), Constraint::Length(poster_w)]).areas(area);
    render_cards(frame, app, cards_area);
    render_poster(frame, app, poster_area);
  } else {
    render_cards(frame, app, area);
  }
}

fn render_cards(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let active = app.active;
  let title = format!(" {} ", active.label());
  let block = rounded_block(theme)
    .title(title)
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD));

  let Some(grid) = app.grids.iter().find(|g| g.kind == active) else {
    frame.render_widget(block, area);
    return;
  };

  if grid.cards.is_empty() {
    let text = match &grid.message {
      Some(msg) => msg.clone(),
      None if app.sections_loading() && active != SectionKind::Search => "Loading…".to_string(),
      None => "Nothing here yet.".to_string(),
    };
    let paragraph = Paragraph::new(vec![Line::from(""), Line::from(Span::styled(text, Style::default().fg(theme.fg)))])
      .alignment(Alignment::Center)
      .wrap(Wrap { trim: true })
      .block(block);
    frame.render_widget(paragraph, area);
    return;
  }

  // Inner width: area minus 2 borders minus 2 chars for highlight symbol ("▶ ")
  let inner_w = area.width.saturating_sub(4) as usize;
  let selected = app.list_state.selected();

  let items: Vec<ListItem> = grid
    .cards
    .iter()
    .enumerate()
    .map(|(i, card)| {
      let is_selected = Some(i) == selected;
      let fg = if is_selected { theme.highlight_fg } else { theme.fg };
      let bg = if is_selected {
        theme.highlight_bg
      } else if i % 2 == 1 {
        theme.stripe_bg
      } else {
        theme.bg
      };

      let marker = if app.is_favorite(card.imdb_id()) { "♥ " } else { "  " };
      let right_w = card.year.chars().count();
      let title_max = inner_w.saturating_sub(right_w + 2 + marker.chars().count());
      let title = truncate_str(&card.title, title_max);
      let gap = inner_w.saturating_sub(title.chars().count() + right_w + marker.chars().count());

      let line = Line::from(vec![
        Span::styled(marker.to_string(), Style::default().fg(theme.favorite)),
        Span::styled(title, Style::default().fg(fg)),
        Span::raw(" ".repeat(gap)),
        Span::styled(card.year.clone(), Style::default().fg(theme.muted)),
      ]);
      ListItem::new(line).bg(bg)
    })
    .collect();

  let list = List::new(items)
    .block(block)
    .highlight_symbol("▶ ")
    .highlight_style(Style::default().fg(theme.highlight_fg).bg(theme.highlight_bg).add_modifier(Modifier::BOLD));

  frame.render_stateful_widget(list, area, &mut app.list_state);
}

fn render_poster(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let block = rounded_block(theme).title(Span::styled(
    format!(" Poster [{}] ", app.display_mode.label().to_lowercase()),
    Style::default().fg(theme.muted),
  ));
  let inner = block.inner(area);
  frame.render_widget(block, area);

  let Some(url) = app.selected_card().map(|c| c.poster_url.clone()) else { return };

  let needs_resize = match &app.poster.resized {
    Some((u, w, h, _)) => *u != url || *w != inner.width || *h != inner.height,
    None => true,
  };
  if needs_resize && let Some(image) = app.selected_poster() {
    let (target_w, target_h) = target_size(inner, app.display_mode);
    let resized = image.resize(target_w, target_h, FilterType::Triangle);
    app.poster.resized = Some((url.clone(), inner.width, inner.height, resized));
  }

  match &app.poster.resized {
    Some((u, _, _, resized)) if *u == url => {
      frame.render_widget(PosterWidget { image: resized, display_mode: app.display_mode }, inner);
    }
    _ => {
      let text = Paragraph::new(Span::styled("…", Style::default().fg(theme.muted))).alignment(Alignment::Center);
      frame.render_widget(text, inner);
    }
  }
}

fn detail_line<'a>(theme: &Theme, label: &'a str, value: &'a str) -> Line<'a> {
  Line::from(vec![
    Span::styled(label, Style::default().fg(theme.muted).add_modifier(Modifier::BOLD)),
    Span::styled(value, Style::default().fg(theme.fg)),
  ])
}

fn render_overlay(frame: &mut Frame, app: &App) {
  let theme = app.theme();
  let area = centered_rect(70, 80, frame.area());
  frame.render_widget(Clear, area);

  let block = rounded_block(theme)
    .title(" Details ")
    .title_style(Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))
    .title_bottom(Line::from(Span::styled(" Esc close ", Style::default().fg(theme.muted))).right_aligned())
    .style(Style::default().bg(theme.bg))
    .padding(Padding::horizontal(1));

  let lines: Vec<Line> = match app.overlay.state() {
    OverlayState::Hidden => Vec::new(),
    OverlayState::Loading { .. } => {
      vec![Line::from(""), Line::from(Span::styled("Loading...", Style::default().fg(theme.status)))]
    }
    OverlayState::Error(msg) => {
      vec![Line::from(""), Line::from(Span::styled(msg.as_str(), Style::default().fg(theme.error)))]
    }
    OverlayState::Shown(detail) => {
      let mut lines = vec![
        Line::from(Span::styled(detail.heading(), Style::default().fg(theme.accent).add_modifier(Modifier::BOLD))),
        Line::from(""),
        detail_line(theme, "Genre: ", &detail.genre),
        detail_line(theme, "Runtime: ", &detail.runtime),
        detail_line(theme, "Director: ", &detail.director),
        detail_line(theme, "Actors: ", &detail.actors),
        Line::from(""),
        detail_line(theme, "Plot: ", &detail.plot),
        Line::from(""),
        Line::from(Span::styled("Ratings:", Style::default().fg(theme.fg).add_modifier(Modifier::BOLD))),
      ];
      if detail.ratings.is_empty() {
        lines.push(Line::from(Span::styled("  • No ratings available", Style::default().fg(theme.muted))));
      } else {
        for rating in &detail.ratings {
          lines.push(Line::from(vec![
            Span::styled(format!("  • {}: ", rating.source), Style::default().fg(theme.muted)),
            Span::styled(rating.value.as_str(), Style::default().fg(theme.fg)),
          ]));
        }
      }
      lines.push(Line::from(""));
      // One store read per frame; the key style follows from the label.
      if let Some(label) = app.overlay.favorite_label(&app.favorites) {
        let style = if label == REMOVE_LABEL {
          Style::default().fg(theme.highlight_fg).bg(theme.favorite)
        } else {
          Style::default().fg(theme.key_fg).bg(theme.key_bg)
        };
        lines.push(Line::from(vec![
          Span::styled(" f ", style),
          Span::raw(" "),
          Span::styled(label, Style::default().fg(theme.fg)),
        ]));
      }
      lines.push(Line::from(vec![
        Span::styled(" o ", Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::raw(" "),
        Span::styled(detail.external_link(), Style::default().fg(theme.status).add_modifier(Modifier::UNDERLINED)),
      ]));
      lines
    }
  };

  frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let (text, style) = if let Some(msg) = &app.status_message {
    (format!(" ⏳ {}", msg), Style::default().fg(theme.status))
  } else if let Some(err) = &app.last_error {
    (format!(" ⚠  {}", err), Style::default().fg(theme.error))
  } else if let Some(info) = &app.info_message {
    (format!(" ℹ  {}", info), Style::default().fg(theme.muted))
  } else if app.sections_loading() {
    (" ⏳ Loading sections…".to_string(), Style::default().fg(theme.status))
  } else {
    (" Ready".to_string(), Style::default().fg(theme.muted))
  };
  frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_input(frame: &mut Frame, app: &mut App, area: Rect) {
  let theme = app.theme();
  let focused = app.mode == AppMode::Input && !app.overlay.is_visible();
  let border_color = if focused { theme.accent } else { theme.border };
  let input_block = Block::bordered()
    .title(" Search movies ")
    .title_style(Style::default().fg(border_color))
    .border_type(BorderType::Rounded)
    .border_style(Style::default().fg(border_color))
    .padding(Padding::horizontal(1));

  let inner_w = area.width.saturating_sub(4) as usize;
  let cursor_col = display_width(&app.input, app.cursor_position);

  if cursor_col < app.input_scroll {
    app.input_scroll = cursor_col;
  } else if inner_w > 0 && cursor_col >= app.input_scroll + inner_w {
    app.input_scroll = cursor_col.saturating_sub(inner_w) + 1;
  }

  let visible: String = app
    .input
    .chars()
    .scan(0usize, |col, c| {
      let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
      let start = *col;
      *col += w;
      Some((start, *col, c))
    })
    .skip_while(|(_, end, _)| *end <= app.input_scroll)
    .take_while(|(start, _, _)| *start < app.input_scroll + inner_w)
    .map(|(_, _, c)| c)
    .collect();

  let paragraph = Paragraph::new(visible).style(Style::default().fg(theme.fg)).block(input_block);
  frame.render_widget(paragraph, area);

  // No room for a cursor inside a collapsed input box.
  if focused && inner_w > 0 {
    let cursor_x = area.x + 2 + cursor_col.saturating_sub(app.input_scroll) as u16;
    frame.set_cursor_position((cursor_x, area.y + 1));
  }
}

fn footer_keys(app: &App) -> Vec<(&'static str, &'static str)> {
  if app.overlay.is_visible() {
    let mut k = Vec::new();
    if app.overlay.detail().is_some() {
      k.push(("f", "Favorite"));
      k.push(("o", "Open IMDb"));
    }
    k.push(("Esc", "Close"));
    return k;
  }
  match app.mode {
    AppMode::Input => {
      let mut k = vec![("Enter", "Search"), ("Tab", "Browse"), ("^t", "Theme")];
      if app.input.is_empty() {
        k.push(("Esc", "Quit"));
      } else {
        k.push(("Esc", "Clear"));
      }
      k
    }
    AppMode::Browse => vec![
      ("Enter", "Details"),
      ("f", "Favorite"),
      ("j/k", "Navigate"),
      ("←/→", "Section"),
      ("/", "Search"),
      ("^t", "Theme"),
    ],
  }
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
  let theme = app.theme();
  let keys = footer_keys(app);

  let spans: Vec<Span> = keys
    .iter()
    .enumerate()
    .flat_map(|(i, (key, action))| {
      let mut s = vec![
        Span::styled(format!(" {} ", key), Style::default().fg(theme.key_fg).bg(theme.key_bg)),
        Span::styled(format!(" {} ", action), Style::default().fg(theme.muted)),
      ];
      if i < keys.len() - 1 {
        s.push(Span::raw("  "));
      }
      s
    })
    .collect();

  frame.render_widget(Line::from(spans), area);

  let theme_label = format!("{} ", theme.name);
  let right = Line::from(Span::styled(&theme_label, Style::default().fg(theme.muted)));
  let right_w = (theme_label.len() as u16).min(area.width);
  let right_area = Rect { x: area.x + area.width - right_w, width: right_w, ..area };
  frame.render_widget(right, right_area);
}
