//! Clock card: local time and date

use super::{CardRenderer, RenderContext};
use crate::display::canvas::{palette, Canvas};
use image::RgbImage;

pub struct ClockCard;

impl CardRenderer for ClockCard {
    fn name(&self) -> &'static str {
        "clock"
    }

    fn render(&self, ctx: &RenderContext) -> RgbImage {
        let mut canvas = ctx.canvas();
        let time = ctx.now.format("%-I:%M %p").to_string();
        let date = ctx.now.format("%a, %b %d %Y").to_string();

        let h = canvas.height();
        let time_scale = if Canvas::text_width(&time, 6) <= canvas.width() - 20 { 6 } else { 4 };
        canvas.draw_text_centered(h / 2 - 60, &time, time_scale, palette::ACCENT);
        canvas.draw_text_centered(h / 2 + 30, &date, 2, palette::TEXT);
        canvas.into_image()
    }
}
