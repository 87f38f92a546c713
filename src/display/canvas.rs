//! Minimal drawing surface for card renderers
//!
//! Rectangles and 8×8 bitmap text on an [`RgbImage`]. Glyphs cover ASCII
//! space through underscore; lowercase letters render as uppercase and
//! anything else as a blank cell.

use image::{Rgb, RgbImage};

/// Glyph cell size before scaling
pub const GLYPH: u32 = 8;

/// 8x8 bitmap font, ASCII 32..=95
const FONT_8X8: [[u8; 8]; 64] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // space
    [0x18, 0x18, 0x18, 0x18, 0x18, 0x00, 0x18, 0x00], // !
    [0x6C, 0x6C, 0x24, 0x00, 0x00, 0x00, 0x00, 0x00], // "
    [0x6C, 0xFE, 0x6C, 0x6C, 0xFE, 0x6C, 0x00, 0x00], // #
    [0x18, 0x7E, 0x58, 0x7C, 0x1A, 0x7E, 0x18, 0x00], // $
    [0x62, 0x64, 0x08, 0x10, 0x26, 0x46, 0x00, 0x00], // %
    [0x38, 0x6C, 0x38, 0x76, 0xDC, 0xCC, 0x76, 0x00], // &
    [0x18, 0x18, 0x30, 0x00, 0x00, 0x00, 0x00, 0x00], // '
    [0x0C, 0x18, 0x30, 0x30, 0x30, 0x18, 0x0C, 0x00], // (
    [0x30, 0x18, 0x0C, 0x0C, 0x0C, 0x18, 0x30, 0x00], // )
    [0x00, 0x66, 0x3C, 0xFF, 0x3C, 0x66, 0x00, 0x00], // *
    [0x00, 0x18, 0x18, 0x7E, 0x18, 0x18, 0x00, 0x00], // +
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x30], // ,
    [0x00, 0x00, 0x00, 0x7E, 0x00, 0x00, 0x00, 0x00], // -
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x00], // .
    [0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x80, 0x00], // /
    [0x7C, 0xC6, 0xCE, 0xD6, 0xE6, 0xC6, 0x7C, 0x00], // 0
    [0x18, 0x38, 0x18, 0x18, 0x18, 0x18, 0x7E, 0x00], // 1
    [0x7C, 0xC6, 0x06, 0x1C, 0x70, 0xC0, 0xFE, 0x00], // 2
    [0x7C, 0xC6, 0x06, 0x3C, 0x06, 0xC6, 0x7C, 0x00], // 3
    [0x1C, 0x3C, 0x6C, 0xCC, 0xFE, 0x0C, 0x1E, 0x00], // 4
    [0xFE, 0xC0, 0xFC, 0x06, 0x06, 0xC6, 0x7C, 0x00], // 5
    [0x38, 0x60, 0xC0, 0xFC, 0xC6, 0xC6, 0x7C, 0x00], // 6
    [0xFE, 0xC6, 0x0C, 0x18, 0x30, 0x30, 0x30, 0x00], // 7
    [0x7C, 0xC6, 0xC6, 0x7C, 0xC6, 0xC6, 0x7C, 0x00], // 8
    [0x7C, 0xC6, 0xC6, 0x7E, 0x06, 0x0C, 0x78, 0x00], // 9
    [0x00, 0x18, 0x18, 0x00, 0x00, 0x18, 0x18, 0x00], // :
    [0x00, 0x18, 0x18, 0x00, 0x00, 0x18, 0x18, 0x30], // ;
    [0x0C, 0x18, 0x30, 0x60, 0x30, 0x18, 0x0C, 0x00], // <
    [0x00, 0x00, 0x7E, 0x00, 0x7E, 0x00, 0x00, 0x00], // =
    [0x30, 0x18, 0x0C, 0x06, 0x0C, 0x18, 0x30, 0x00], // >
    [0x7C, 0xC6, 0x0C, 0x18, 0x18, 0x00, 0x18, 0x00], // ?
    [0x7C, 0xC6, 0xDE, 0xDE, 0xDE, 0xC0, 0x7C, 0x00], // @
    [0x38, 0x6C, 0xC6, 0xC6, 0xFE, 0xC6, 0xC6, 0x00], // A
    [0xFC, 0xC6, 0xC6, 0xFC, 0xC6, 0xC6, 0xFC, 0x00], // B
    [0x7C, 0xC6, 0xC0, 0xC0, 0xC0, 0xC6, 0x7C, 0x00], // C
    [0xF8, 0xCC, 0xC6, 0xC6, 0xC6, 0xCC, 0xF8, 0x00], // D
    [0xFE, 0xC0, 0xC0, 0xF8, 0xC0, 0xC0, 0xFE, 0x00], // E
    [0xFE, 0xC0, 0xC0, 0xF8, 0xC0, 0xC0, 0xC0, 0x00], // F
    [0x7C, 0xC6, 0xC0, 0xCE, 0xC6, 0xC6, 0x7E, 0x00], // G
    [0xC6, 0xC6, 0xC6, 0xFE, 0xC6, 0xC6, 0xC6, 0x00], // H
    [0x7E, 0x18, 0x18, 0x18, 0x18, 0x18, 0x7E, 0x00], // I
    [0x1E, 0x06, 0x06, 0x06, 0xC6, 0xC6, 0x7C, 0x00], // J
    [0xC6, 0xCC, 0xD8, 0xF0, 0xD8, 0xCC, 0xC6, 0x00], // K
    [0xC0, 0xC0, 0xC0, 0xC0, 0xC0, 0xC0, 0xFE, 0x00], // L
    [0xC6, 0xEE, 0xFE, 0xD6, 0xC6, 0xC6, 0xC6, 0x00], // M
    [0xC6, 0xE6, 0xF6, 0xDE, 0xCE, 0xC6, 0xC6, 0x00], // N
    [0x7C, 0xC6, 0xC6, 0xC6, 0xC6, 0xC6, 0x7C, 0x00], // O
    [0xFC, 0xC6, 0xC6, 0xFC, 0xC0, 0xC0, 0xC0, 0x00], // P
    [0x7C, 0xC6, 0xC6, 0xC6, 0xD6, 0xDE, 0x7C, 0x06], // Q
    [0xFC, 0xC6, 0xC6, 0xFC, 0xD8, 0xCC, 0xC6, 0x00], // R
    [0x7C, 0xC6, 0xC0, 0x7C, 0x06, 0xC6, 0x7C, 0x00], // S
    [0xFF, 0x18, 0x18, 0x18, 0x18, 0x18, 0x18, 0x00], // T
    [0xC6, 0xC6, 0xC6, 0xC6, 0xC6, 0xC6, 0x7C, 0x00], // U
    [0xC6, 0xC6, 0xC6, 0xC6, 0x6C, 0x38, 0x10, 0x00], // V
    [0xC6, 0xC6, 0xC6, 0xD6, 0xFE, 0xEE, 0xC6, 0x00], // W
    [0xC6, 0xC6, 0x6C, 0x38, 0x6C, 0xC6, 0xC6, 0x00], // X
    [0xC3, 0xC3, 0x66, 0x3C, 0x18, 0x18, 0x18, 0x00], // Y
    [0xFE, 0x06, 0x0C, 0x18, 0x30, 0x60, 0xFE, 0x00], // Z
    [0x3C, 0x30, 0x30, 0x30, 0x30, 0x30, 0x3C, 0x00], // [
    [0x80, 0x40, 0x20, 0x10, 0x08, 0x04, 0x02, 0x00], // backslash
    [0x3C, 0x0C, 0x0C, 0x0C, 0x0C, 0x0C, 0x3C, 0x00], // ]
    [0x10, 0x38, 0x6C, 0xC6, 0x00, 0x00, 0x00, 0x00], // ^
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF], // _
];

fn glyph(ch: char) -> &'static [u8; 8] {
    let ch = ch.to_ascii_uppercase();
    let idx = match ch {
        ' '..='_' => ch as usize - ' ' as usize,
        _ => 0,
    };
    &FONT_8X8[idx]
}

/// Palette shared by the card renderers
pub mod palette {
    use image::Rgb;

    pub const BACKGROUND: Rgb<u8> = Rgb([10, 12, 20]);
    pub const PANEL: Rgb<u8> = Rgb([28, 32, 48]);
    pub const TEXT: Rgb<u8> = Rgb([235, 235, 235]);
    pub const MUTED: Rgb<u8> = Rgb([140, 145, 160]);
    pub const ACCENT: Rgb<u8> = Rgb([255, 170, 0]);
    pub const UP: Rgb<u8> = Rgb([60, 200, 90]);
    pub const DOWN: Rgb<u8> = Rgb([230, 70, 60]);
    pub const WARN: Rgb<u8> = Rgb([255, 90, 40]);
}

/// Drawing surface backed by an owned RGB image
pub struct Canvas {
    image: RgbImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Rgb<u8>) -> Self {
        Self {
            image: RgbImage::from_pixel(width, height, background),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Filled rectangle, clipped to the image
    pub fn fill_rect(&mut self, x: u32, y: u32, w: u32, h: u32, color: Rgb<u8>) {
        let x_end = x.saturating_add(w).min(self.width());
        let y_end = y.saturating_add(h).min(self.height());
        for py in y..y_end {
            for px in x..x_end {
                self.image.put_pixel(px, py, color);
            }
        }
    }

    /// Width in pixels of `text` at `scale` (one blank column between glyphs)
    pub fn text_width(text: &str, scale: u32) -> u32 {
        let n = text.chars().count() as u32;
        if n == 0 {
            return 0;
        }
        n * (GLYPH + 1) * scale - scale
    }

    pub fn draw_char(&mut self, x: u32, y: u32, ch: char, scale: u32, color: Rgb<u8>) {
        for (row, bits) in glyph(ch).iter().enumerate() {
            for col in 0..GLYPH {
                if (bits >> (7 - col)) & 1 != 0 {
                    self.fill_rect(
                        x + col * scale,
                        y + row as u32 * scale,
                        scale,
                        scale,
                        color,
                    );
                }
            }
        }
    }

    /// Draw `text` left-aligned at `(x, y)`; returns the x after the last glyph
    pub fn draw_text(&mut self, x: u32, y: u32, text: &str, scale: u32, color: Rgb<u8>) -> u32 {
        let advance = (GLYPH + 1) * scale;
        let mut cx = x;
        for ch in text.chars() {
            if cx >= self.width() {
                break;
            }
            self.draw_char(cx, y, ch, scale, color);
            cx += advance;
        }
        cx
    }

    pub fn draw_text_centered(&mut self, y: u32, text: &str, scale: u32, color: Rgb<u8>) {
        let w = Self::text_width(text, scale);
        let x = self.width().saturating_sub(w) / 2;
        self.draw_text(x, y, text, scale, color);
    }

    pub fn draw_text_right(&mut self, right: u32, y: u32, text: &str, scale: u32, color: Rgb<u8>) {
        let x = right.saturating_sub(Self::text_width(text, scale));
        self.draw_text(x, y, text, scale, color);
    }

    /// Truncate `text` with a trailing `..` so it fits `max_width` at `scale`
    pub fn fit(text: &str, max_width: u32, scale: u32) -> String {
        if Self::text_width(text, scale) <= max_width {
            return text.to_string();
        }
        let per = (GLYPH + 1) * scale;
        let keep = ((max_width + scale) / per).saturating_sub(2) as usize;
        let mut out: String = text.chars().take(keep).collect();
        out.push_str("..");
        out
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BG: Rgb<u8> = Rgb([0, 0, 0]);
    const FG: Rgb<u8> = Rgb([255, 255, 255]);

    #[test]
    fn test_fill_rect_clips() {
        let mut canvas = Canvas::new(10, 10, BG);
        canvas.fill_rect(8, 8, 5, 5, FG);
        let image = canvas.into_image();
        assert_eq!(*image.get_pixel(9, 9), FG);
        assert_eq!(*image.get_pixel(7, 7), BG);
    }

    #[test]
    fn test_lowercase_uses_uppercase_glyph() {
        assert_eq!(glyph('a'), glyph('A'));
        assert_eq!(glyph('~'), glyph(' '));
        assert_eq!(glyph('é'), glyph(' '));
    }

    #[test]
    fn test_text_width() {
        assert_eq!(Canvas::text_width("", 2), 0);
        assert_eq!(Canvas::text_width("A", 1), 8);
        assert_eq!(Canvas::text_width("AB", 2), 34);
    }

    #[test]
    fn test_draw_text_sets_pixels() {
        let mut canvas = Canvas::new(40, 10, BG);
        canvas.draw_text(0, 0, "T", 1, FG);
        let image = canvas.into_image();
        // Top row of T is solid
        assert!((0..8).all(|x| *image.get_pixel(x, 0) == FG));
        assert_eq!(*image.get_pixel(0, 1), BG);
    }

    #[test]
    fn test_fit_truncates() {
        assert_eq!(Canvas::fit("HELLO", 100, 1), "HELLO");
        let fitted = Canvas::fit("HELLO WORLD", 45, 1);
        assert!(fitted.ends_with(".."));
        assert!(Canvas::text_width(&fitted, 1) <= 45);
    }

    #[test]
    fn test_text_past_edge_is_clipped() {
        let mut canvas = Canvas::new(12, 8, BG);
        let end = canvas.draw_text(0, 0, "WWWW", 1, FG);
        assert_eq!(end, 18);
    }
}
