//! Bitcoin price card from `state/btc.json`

use super::{draw_footer, draw_header, draw_offline, is_stale, CardRenderer, RenderContext};
use crate::display::canvas::palette;
use chrono::Utc;
use image::RgbImage;
use serde::Deserialize;

pub const STATE_FILE: &str = "btc.json";

#[derive(Debug, Default, Deserialize)]
pub struct BtcState {
    pub price: Option<f64>,
    /// 24h change in percent
    #[serde(alias = "change_24h")]
    pub chg_24h: Option<f64>,
    pub ts: Option<String>,
}

pub struct BtcCard;

/// `$67,123` style, whole dollars
pub fn format_usd(price: f64) -> String {
    let whole = price.round().abs() as u64;
    let digits = whole.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 2);
    if price < 0.0 && whole > 0 {
        out.push('-');
    }
    out.push('$');
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

impl CardRenderer for BtcCard {
    fn name(&self) -> &'static str {
        "btc"
    }

    fn render(&self, ctx: &RenderContext) -> RgbImage {
        let mut canvas = ctx.canvas();
        let stamp = ctx.stamp();
        draw_header(&mut canvas, "BTC-USD", &stamp);

        let state: Option<BtcState> = ctx.load_state(STATE_FILE);
        let (state, price) = match state {
            Some(s) => match s.price {
                Some(p) => (s, p),
                None => {
                    draw_offline(&mut canvas, "NO BTC DATA");
                    return canvas.into_image();
                }
            },
            None => {
                draw_offline(&mut canvas, "NO BTC DATA");
                return canvas.into_image();
            }
        };

        canvas.draw_text(16, 70, &format_usd(price), 6, palette::TEXT);
        if let Some(chg) = state.chg_24h {
            let (arrow, color) = if chg >= 0.0 {
                ("^", palette::UP)
            } else {
                ("v", palette::DOWN)
            };
            canvas.draw_text(18, 150, &format!("{} {:+.2}% (24H)", arrow, chg), 3, color);
        }

        let stale = is_stale(state.ts.as_deref(), Utc::now(), ctx.stale_after);
        draw_footer(&mut canvas, stale, &stamp);
        canvas.into_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::tests::context;
    use crate::config::DisplayConfig;
    use image::Rgb;
    use std::fs;
    use tempfile::tempdir;

    fn has_color(image: &RgbImage, color: Rgb<u8>) -> bool {
        image.pixels().any(|p| *p == color)
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(0.0), "$0");
        assert_eq!(format_usd(999.4), "$999");
        assert_eq!(format_usd(1000.0), "$1,000");
        assert_eq!(format_usd(67123.6), "$67,124");
        assert_eq!(format_usd(1234567.0), "$1,234,567");
    }

    #[test]
    fn test_missing_state_is_offline() {
        let dir = tempdir().unwrap();
        let display = DisplayConfig::default();
        let image = BtcCard.render(&context(dir.path(), &display));
        assert!(has_color(&image, palette::WARN));
    }

    #[test]
    fn test_error_only_state_is_offline() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(STATE_FILE),
            r#"{"error": "timeout", "ts": "2026-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        let display = DisplayConfig::default();
        let image = BtcCard.render(&context(dir.path(), &display));
        assert!(has_color(&image, palette::WARN));
    }

    #[test]
    fn test_fresh_price_has_no_warning() {
        let dir = tempdir().unwrap();
        let ts = Utc::now().to_rfc3339();
        fs::write(
            dir.path().join(STATE_FILE),
            format!(r#"{{"price": 67123.4, "chg_24h": -1.5, "ts": "{}"}}"#, ts),
        )
        .unwrap();
        let display = DisplayConfig::default();
        let image = BtcCard.render(&context(dir.path(), &display));
        assert!(!has_color(&image, palette::WARN));
        assert!(has_color(&image, palette::DOWN));
    }

    #[test]
    fn test_old_price_is_marked_stale() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(STATE_FILE),
            r#"{"price": 50000, "change_24h": 2.0, "ts": "2020-01-01T00:00:00"}"#,
        )
        .unwrap();
        let display = DisplayConfig::default();
        let image = BtcCard.render(&context(dir.path(), &display));
        assert!(has_color(&image, palette::WARN));
        assert!(has_color(&image, palette::UP));
    }
}
