//! Weather card from `state/weather.json` (Open-Meteo shaped)

use super::{draw_footer, draw_header, draw_offline, is_stale, CardRenderer, RenderContext};
use crate::display::canvas::{palette, Canvas};
use chrono::{NaiveDateTime, Utc};
use image::{Rgb, RgbImage};
use serde::Deserialize;

pub const STATE_FILE: &str = "weather.json";

const SKY: Rgb<u8> = Rgb([180, 220, 255]);
const HOURLY_SLOTS: usize = 6;

#[derive(Debug, Default, Deserialize)]
pub struct Location {
    pub city: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Current {
    pub temp_f: Option<f64>,
    pub windspeed: Option<f64>,
    pub weathercode: Option<i64>,
    pub is_day: Option<i64>,
    pub ts: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Hourly {
    pub time: Option<String>,
    pub temp_f: Option<f64>,
    /// Precipitation probability in percent
    pub pop: Option<f64>,
    pub weathercode: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WeatherState {
    #[serde(default)]
    pub loc: Location,
    pub now: Option<Current>,
    #[serde(default)]
    pub hourly: Vec<Hourly>,
    pub updated: Option<String>,
}

/// Open-Meteo WMO weather code description
pub fn describe(code: i64) -> &'static str {
    match code {
        0 => "Clear",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Fog",
        51 | 53 | 55 => "Drizzle",
        61 | 63 | 65 => "Rain",
        71 | 73 | 75 => "Snow",
        80..=82 => "Showers",
        95 | 96 | 99 => "Thunder",
        _ => "-",
    }
}

/// `2026-10-19T14:00` → `2PM`
fn hour_label(time: &str) -> String {
    NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M")
        .map(|t| t.format("%-I%p").to_string())
        .unwrap_or_else(|_| "--".to_string())
}

pub struct WeatherCard;

impl CardRenderer for WeatherCard {
    fn name(&self) -> &'static str {
        "weather"
    }

    fn render(&self, ctx: &RenderContext) -> RgbImage {
        let mut canvas = ctx.canvas();
        let stamp = ctx.stamp();
        let state: Option<WeatherState> = ctx.load_state(STATE_FILE);

        let title = match state.as_ref().and_then(|s| s.loc.city.as_deref()) {
            Some(city) => format!("WEATHER - {}", city),
            None => "WEATHER".to_string(),
        };
        draw_header(&mut canvas, &title, &stamp);

        let Some(state) = state else {
            draw_offline(&mut canvas, "NO WEATHER DATA");
            return canvas.into_image();
        };
        let Some(now) = state.now.as_ref() else {
            draw_offline(&mut canvas, "NO WEATHER DATA");
            return canvas.into_image();
        };

        let temp = match now.temp_f {
            Some(t) => format!("{}F", t.round() as i64),
            None => "--F".to_string(),
        };
        canvas.draw_text(16, 56, &temp, 6, palette::TEXT);
        let desc = now.weathercode.map(describe).unwrap_or("-");
        canvas.draw_text(16, 116, desc, 3, SKY);
        if let Some(wind) = now.windspeed {
            canvas.draw_text(16, 148, &format!("WIND {} MPH", wind.round() as i64), 2, palette::MUTED);
        }
        if now.is_day == Some(0) {
            canvas.draw_text_right(canvas.width() - 16, 56, "NIGHT", 2, palette::MUTED);
        }

        draw_hourly(&mut canvas, &state.hourly);

        let stale = is_stale(state.updated.as_deref(), Utc::now(), ctx.weather_stale_after);
        draw_footer(&mut canvas, stale, &stamp);
        canvas.into_image()
    }
}

fn draw_hourly(canvas: &mut Canvas, hourly: &[Hourly]) {
    let (top, cell_w, cell_h) = (180, 72, 96);
    let mut x = 16;
    for hour in hourly.iter().take(HOURLY_SLOTS) {
        if x + cell_w > canvas.width() {
            break;
        }
        canvas.fill_rect(x, top, cell_w - 6, cell_h, palette::PANEL);
        let label = hour.time.as_deref().map(hour_label).unwrap_or_default();
        canvas.draw_text(x + 6, top + 8, &label, 1, palette::MUTED);
        let temp = hour
            .temp_f
            .map(|t| format!("{}F", t.round() as i64))
            .unwrap_or_else(|| "--".into());
        canvas.draw_text(x + 6, top + 28, &temp, 2, palette::TEXT);
        if let Some(pop) = hour.pop {
            canvas.draw_text(x + 6, top + 56, &format!("{}%", pop.round() as i64), 1, SKY);
        }
        x += cell_w;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::tests::context;
    use crate::config::DisplayConfig;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_describe() {
        assert_eq!(describe(0), "Clear");
        assert_eq!(describe(48), "Fog");
        assert_eq!(describe(81), "Showers");
        assert_eq!(describe(99), "Thunder");
        assert_eq!(describe(42), "-");
    }

    #[test]
    fn test_hour_label() {
        assert_eq!(hour_label("2026-10-19T14:00"), "2PM");
        assert_eq!(hour_label("2026-10-19T00:00"), "12AM");
        assert_eq!(hour_label("soon"), "--");
    }

    #[test]
    fn test_parses_fetcher_output() {
        let json = r#"{
            "loc": {"city": "Austin"},
            "now": {"temp_f": 71.6, "windspeed": 5.2, "weathercode": 2, "ts": "2026-10-19T14:00", "is_day": 1},
            "hourly": [
                {"time": "2026-10-19T15:00", "temp_f": 73.0, "pop": 10, "weathercode": 1},
                {"time": "2026-10-19T16:00", "temp_f": null, "pop": null, "weathercode": null}
            ],
            "updated": "2026-10-19T19:00:00.123456Z"
        }"#;
        let state: WeatherState = serde_json::from_str(json).unwrap();
        assert_eq!(state.loc.city.as_deref(), Some("Austin"));
        assert_eq!(state.hourly.len(), 2);
        assert_eq!(state.now.unwrap().weathercode, Some(2));
    }

    #[test]
    fn test_error_state_renders_offline() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(STATE_FILE),
            r#"{"error": "dns", "updated": "2026-10-19T19:00:00Z"}"#,
        )
        .unwrap();
        let display = DisplayConfig::default();
        let image = WeatherCard.render(&context(dir.path(), &display));
        assert!(image.pixels().any(|p| *p == palette::WARN));
    }

    #[test]
    fn test_fresh_state_renders_without_warning() {
        let dir = tempdir().unwrap();
        let json = format!(
            r#"{{"now": {{"temp_f": 50, "weathercode": 61}}, "hourly": [], "updated": "{}"}}"#,
            Utc::now().to_rfc3339()
        );
        fs::write(dir.path().join(STATE_FILE), json).unwrap();
        let display = DisplayConfig::default();
        let image = WeatherCard.render(&context(dir.path(), &display));
        assert!(!image.pixels().any(|p| *p == palette::WARN));
        assert!(image.pixels().any(|p| *p == SKY));
    }
}
