//! Headlines card from `state/news.json`

use super::{draw_header, draw_offline, CardRenderer, RenderContext, HEADER_H};
use crate::display::canvas::{palette, Canvas, GLYPH};
use image::{Rgb, RgbImage};
use serde::Deserialize;

pub const STATE_FILE: &str = "news.json";

const CELL_H: u32 = 50;
const GAP: u32 = 4;
const MARGIN: u32 = 12;
const LINE_SCALE: u32 = 2;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    /// ISO-8601, compared lexically like the fetchers sort them
    #[serde(default)]
    pub ts: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NewsState {
    #[serde(default)]
    pub items: Vec<NewsItem>,
    pub updated: Option<String>,
}

/// Per-source cell tint
fn source_color(source: &str) -> Rgb<u8> {
    match source.to_lowercase().as_str() {
        "fox" => Rgb([60, 36, 40]),
        "breitbart" => Rgb([52, 44, 28]),
        _ => palette::PANEL,
    }
}

/// Greedy word wrap to at most `max_lines` lines of `max_chars`
pub fn wrap(text: &str, max_chars: usize, max_lines: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut overflow = false;
    for word in text.split_whitespace() {
        let word_chars = word.chars().count();
        let needed = if current.is_empty() {
            word_chars
        } else {
            current.chars().count() + 1 + word_chars
        };
        if needed <= max_chars {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
            continue;
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if lines.len() == max_lines {
            overflow = true;
            break;
        }
        current = word.chars().take(max_chars).collect();
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if overflow {
        if let Some(last) = lines.last_mut() {
            let mut cut: String = last.chars().take(max_chars.saturating_sub(2)).collect();
            cut.push_str("..");
            *last = cut;
        }
    }
    lines
}

pub struct NewsCard;

impl CardRenderer for NewsCard {
    fn name(&self) -> &'static str {
        "news"
    }

    fn render(&self, ctx: &RenderContext) -> RgbImage {
        let mut canvas = ctx.canvas();
        draw_header(&mut canvas, "TOP HEADLINES", &ctx.stamp());

        let state: Option<NewsState> = ctx.load_state(STATE_FILE);
        let mut items = match state {
            Some(s) if !s.items.is_empty() => s.items,
            Some(_) => {
                draw_offline(&mut canvas, "NO NEWS YET");
                return canvas.into_image();
            }
            None => {
                draw_offline(&mut canvas, "NO NEWS DATA");
                return canvas.into_image();
            }
        };
        items.sort_by(|a, b| b.ts.cmp(&a.ts));

        let cell_w = canvas.width() - 2 * MARGIN;
        let max_chars = ((cell_w - 16) / ((GLYPH + 1) * LINE_SCALE)) as usize;
        let mut y = HEADER_H + 6;
        for item in &items {
            if y + CELL_H > canvas.height() - 4 {
                break;
            }
            draw_item(&mut canvas, item, y, cell_w, max_chars);
            y += CELL_H + GAP;
        }
        canvas.into_image()
    }
}

fn draw_item(canvas: &mut Canvas, item: &NewsItem, y: u32, cell_w: u32, max_chars: usize) {
    canvas.fill_rect(MARGIN, y, cell_w, CELL_H, source_color(&item.source));
    canvas.draw_text_right(MARGIN + cell_w - 6, y + 4, &item.source, 1, palette::MUTED);
    for (i, line) in wrap(item.title.trim(), max_chars, 2).iter().enumerate() {
        canvas.draw_text(MARGIN + 8, y + 14 + i as u32 * 18, line, LINE_SCALE, palette::TEXT);
    }
}
