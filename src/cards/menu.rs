//! Menu overlay shown after a two-finger tap

use super::{draw_header, CardRenderer, RenderContext, HEADER_H};
use crate::display::canvas::palette;
use image::RgbImage;

const ROW_H: u32 = 30;

pub struct MenuCard;

impl CardRenderer for MenuCard {
    fn name(&self) -> &'static str {
        "menu"
    }

    fn render(&self, ctx: &RenderContext) -> RgbImage {
        let mut canvas = ctx.canvas();
        draw_header(&mut canvas, "CARDS", &ctx.stamp());

        let (w, h) = (canvas.width(), canvas.height());
        let mut y = HEADER_H + 12;
        for card in &ctx.display.order {
            if y + ROW_H > h - 40 {
                break;
            }
            let enabled = ctx.display.is_enabled(card);
            let (label, color) = if enabled {
                ("ON", palette::UP)
            } else {
                ("OFF", palette::MUTED)
            };
            canvas.draw_text(24, y, card, 2, palette::TEXT);
            canvas.draw_text_right(w - 24, y, label, 2, color);
            let secs = ctx.display.interval_for(card).as_secs();
            canvas.draw_text(24, y + 18, &format!("{}S", secs), 1, palette::MUTED);
            y += ROW_H;
        }

        canvas.draw_text_centered(h - 28, "TAP TO CLOSE", 2, palette::ACCENT);
        canvas.into_image()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::tests::context;
    use crate::config::DisplayConfig;
    use std::path::Path;

    #[test]
    fn test_on_off_follow_config() {
        let mut display = DisplayConfig::default();
        let all_on = MenuCard.render(&context(Path::new("."), &display));
        assert!(all_on.pixels().any(|p| *p == palette::UP));

        for flag in display.enabled.values_mut() {
            *flag = false;
        }
        let all_off = MenuCard.render(&context(Path::new("."), &display));
        assert!(!all_off.pixels().any(|p| *p == palette::UP));
        assert!(all_off.pixels().any(|p| *p == palette::ACCENT));
    }

    #[test]
    fn test_long_order_is_clipped() {
        let mut display = DisplayConfig::default();
        display.order = (0..40).map(|i| format!("card{}", i)).collect();
        let image = MenuCard.render(&context(Path::new("."), &display));
        assert_eq!(image.dimensions(), (480, 320));
    }
}
