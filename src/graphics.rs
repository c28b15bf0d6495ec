use image::DynamicImage;
use ratatui::{
  buffer::Buffer,
  layout::Rect,
  style::{Color, Style},
  widgets::Widget,
};

use crate::display::DisplayMode;

// --- Poster Widget ---

/// Draws an already-resized poster centered in its area.
pub struct PosterWidget<'a> {
  pub image: &'a DynamicImage,
  pub display_mode: DisplayMode,
}

const ASCII_CHARS: [&str; 10] = [" ", ".", ":", "-", "=", "+", "*", "#", "%", "@"];

impl Widget for PosterWidget<'_> {
  fn render(self, area: Rect, buf: &mut Buffer) {
    if area.is_empty() {
      return;
    }
    match self.display_mode {
      DisplayMode::Direct => render_direct(self.image, area, buf),
      DisplayMode::Ascii => render_ascii(self.image, area, buf),
      DisplayMode::Off => {}
    }
  }
}

/// Pixel size to resize a poster to before drawing it into `area`.
/// Half-block cells hold two pixel rows; ASCII cells hold one.
pub fn target_size(area: Rect, display_mode: DisplayMode) -> (u32, u32) {
  let w = area.width as u32;
  let h = match display_mode {
    DisplayMode::Direct => area.height as u32 * 2,
    _ => area.height as u32,
  };
  (w.max(1), h.max(1))
}

fn cell(area: Rect, offset_x: u32, offset_y: u32, x: u32, y: u32) -> (u16, u16) {
  let clamp = |v: u32| v.min(u16::MAX as u32) as u16;
  (
    area.x.saturating_add(clamp(offset_x)).saturating_add(clamp(x)),
    area.y.saturating_add(clamp(offset_y)).saturating_add(clamp(y)),
  )
}

fn render_direct(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  // Image is already resized by the caller; just convert to RGB8.
  let resized = image.to_rgb8();
  let img_w = resized.width().min(area.width as u32);
  let img_h = resized.height();
  let cell_h = img_h.div_ceil(2);
  let offset_x = (area.width as u32).saturating_sub(img_w) / 2;
  let offset_y = (area.height as u32).saturating_sub(cell_h) / 2;

  for y in 0..cell_h.min(area.height as u32) {
    for x in 0..img_w {
      let upper = resized.get_pixel(x, y * 2);
      let lower_y = y * 2 + 1;
      let fg = Color::Rgb(upper[0], upper[1], upper[2]);
      let bg = if lower_y < img_h {
        let lower = resized.get_pixel(x, lower_y);
        Color::Rgb(lower[0], lower[1], lower[2])
      } else {
        Color::Reset
      };
      let (cx, cy) = cell(area, offset_x, offset_y, x, y);
      buf.set_string(cx, cy, "▀", Style::default().fg(fg).bg(bg));
    }
  }
}

fn ascii_char(luma: u8) -> &'static str {
  let idx = ((luma as f32 / 255.0) * (ASCII_CHARS.len() - 1) as f32).round() as usize;
  ASCII_CHARS[idx.min(ASCII_CHARS.len() - 1)]
}

fn render_ascii(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
  // Image is already resized by the caller; just convert to grayscale.
  let resized = image.to_luma8();
  let img_w = resized.width().min(area.width as u32);
  let img_h = resized.height().min(area.height as u32);
  let offset_x = (area.width as u32).saturating_sub(img_w) / 2;
  let offset_y = (area.height as u32).saturating_sub(img_h) / 2;

  for y in 0..img_h {
    for x in 0..img_w {
      let (cx, cy) = cell(area, offset_x, offset_y, x, y);
      buf.set_string(cx, cy, ascii_char(resized.get_pixel(x, y)[0]), Style::default());
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  fn solid(w: u32, h: u32, rgb: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(w, h, Rgb(rgb)))
  }

  #[test]
  fn ascii_ramp_ends() {
    assert_eq!(ascii_char(0), " ");
    assert_eq!(ascii_char(255), "@");
  }

  #[test]
  fn target_size_doubles_rows_for_half_blocks() {
    let area = Rect::new(0, 0, 20, 10);
    assert_eq!(target_size(area, DisplayMode::Direct), (20, 20));
    assert_eq!(target_size(area, DisplayMode::Ascii), (20, 10));
    assert_eq!(target_size(Rect::new(0, 0, 0, 0), DisplayMode::Ascii), (1, 1));
  }

  #[test]
  fn ascii_render_fills_area() {
    let area = Rect::new(0, 0, 4, 2);
    let mut buf = Buffer::empty(area);
    let img = solid(4, 2, [255, 255, 255]);
    PosterWidget { image: &img, display_mode: DisplayMode::Ascii }.render(area, &mut buf);
    assert_eq!(buf[(0, 0)].symbol(), "@");
    assert_eq!(buf[(3, 1)].symbol(), "@");
  }

  #[test]
  fn direct_render_uses_half_blocks() {
    let area = Rect::new(0, 0, 2, 1);
    let mut buf = Buffer::empty(area);
    let img = solid(2, 2, [10, 20, 30]);
    PosterWidget { image: &img, display_mode: DisplayMode::Direct }.render(area, &mut buf);
    assert_eq!(buf[(1, 0)].symbol(), "▀");
    assert_eq!(buf[(1, 0)].fg, Color::Rgb(10, 20, 30));
  }

  #[test]
  fn off_mode_draws_nothing() {
    let area = Rect::new(0, 0, 2, 2);
    let mut buf = Buffer::empty(area);
    let img = solid(2, 2, [255, 255, 255]);
    PosterWidget { image: &img, display_mode: DisplayMode::Off }.render(area, &mut buf);
    assert_eq!(buf[(0, 0)].symbol(), " ");
  }
}
