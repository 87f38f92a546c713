//! Card renderers
//!
//! Each card draws one full-panel image from the clock or a JSON state file
//! written by an external fetcher. Missing or unreadable state never fails
//! a render: the card shows an offline notice instead. The [`CardDeck`]
//! owns the renderers and persists their output through the
//! [`AssetStore`].

pub mod btc;
pub mod clock;
pub mod menu;
pub mod news;
pub mod weather;

use crate::config::{DisplayConfig, MENU_CARD};
use crate::display::canvas::{palette, Canvas};
use crate::display::{AssetStore, Panel};
use crate::error::{Error, Result};
use crate::slideshow::AssetRenderer;
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use image::RgbImage;
use log::{debug, error, info};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Height of the title bar drawn by [`draw_header`]
pub const HEADER_H: u32 = 38;

/// Inputs shared by every renderer
pub struct RenderContext<'a> {
    pub panel: Panel,
    pub state_dir: &'a Path,
    pub now: DateTime<Local>,
    /// Age after which price data is flagged stale
    pub stale_after: Duration,
    pub weather_stale_after: Duration,
    pub display: &'a DisplayConfig,
}

impl RenderContext<'_> {
    pub fn canvas(&self) -> Canvas {
        Canvas::new(self.panel.width, self.panel.height, palette::BACKGROUND)
    }

    /// Deserialize `state/<file>`; `None` when missing or malformed
    pub fn load_state<T: DeserializeOwned>(&self, file: &str) -> Option<T> {
        let path = self.state_dir.join(file);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                debug!("No state at {}: {}", path.display(), e);
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("Unreadable state {}: {}", path.display(), e);
                None
            }
        }
    }

    /// Footer-style timestamp of the render
    pub fn stamp(&self) -> String {
        self.now.format("%b %d %I:%M %p").to_string()
    }
}

/// Something that can draw one card
pub trait CardRenderer: Send {
    fn name(&self) -> &'static str;
    fn render(&self, ctx: &RenderContext) -> RgbImage;
}

/// Whether an ISO-8601 timestamp is older than `max_age`.
///
/// Accepts `Z` or an explicit offset; a timestamp without one is taken as
/// UTC. Anything unparseable counts as stale.
pub fn is_stale(ts: Option<&str>, now: DateTime<Utc>, max_age: Duration) -> bool {
    let Some(parsed) = ts.and_then(parse_timestamp) else {
        return true;
    };
    match (now - parsed).to_std() {
        Ok(age) => age > max_age,
        // From the future
        Err(_) => false,
    }
}

fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(ts) {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(ts, fmt).ok())
        .map(|naive| naive.and_utc())
}

/// Title bar with the render time on the right
pub fn draw_header(canvas: &mut Canvas, title: &str, stamp: &str) {
    let width = canvas.width();
    canvas.fill_rect(0, 0, width, HEADER_H, palette::PANEL);
    canvas.draw_text_right(width - 12, 15, stamp, 1, palette::MUTED);
    let room = width.saturating_sub(Canvas::text_width(stamp, 1) + 36);
    let title = Canvas::fit(title, room, 2);
    canvas.draw_text(12, 11, &title, 2, palette::TEXT);
}

/// Full-card notice for missing state
pub fn draw_offline(canvas: &mut Canvas, message: &str) {
    let h = canvas.height();
    canvas.draw_text(16, 70, message, 3, palette::WARN);
    canvas.draw_text(16, h - 26, "OFFLINE", 2, palette::WARN);
}

/// Footer showing either the render time or a stale marker
pub fn draw_footer(canvas: &mut Canvas, stale: bool, stamp: &str) {
    let h = canvas.height();
    if stale {
        let w = Canvas::text_width("STALE", 2) + 12;
        canvas.fill_rect(10, h - 32, w, 24, palette::WARN);
        canvas.draw_text(16, h - 28, "STALE", 2, palette::BACKGROUND);
    } else {
        canvas.draw_text(16, h - 24, &format!("UPDATED {}", stamp), 1, palette::MUTED);
    }
}

/// The card renderers plus the store their output goes to
pub struct CardDeck {
    store: AssetStore,
    state_dir: PathBuf,
    stale_after: Duration,
    weather_stale_after: Duration,
    renderers: Vec<Box<dyn CardRenderer>>,
}

impl CardDeck {
    pub fn new(
        store: AssetStore,
        state_dir: impl Into<PathBuf>,
        stale_after: Duration,
        weather_stale_after: Duration,
    ) -> Self {
        Self {
            store,
            state_dir: state_dir.into(),
            stale_after,
            weather_stale_after,
            renderers: Vec::new(),
        }
    }

    /// Deck with every built-in card and the menu
    pub fn standard(
        store: AssetStore,
        state_dir: impl Into<PathBuf>,
        stale_after: Duration,
        weather_stale_after: Duration,
    ) -> Self {
        Self::new(store, state_dir, stale_after, weather_stale_after)
            .with(clock::ClockCard)
            .with(weather::WeatherCard)
            .with(btc::BtcCard)
            .with(news::NewsCard)
            .with(menu::MenuCard)
    }

    pub fn with(mut self, renderer: impl CardRenderer + 'static) -> Self {
        self.renderers.push(Box::new(renderer));
        self
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.renderers.iter().map(|r| r.name()).collect()
    }

    pub fn store(&self) -> &AssetStore {
        &self.store
    }

    /// Render and persist one card, returning its PNG path
    pub fn render_card(&self, name: &str, display: &DisplayConfig) -> Result<PathBuf> {
        let renderer = self
            .renderers
            .iter()
            .find(|r| r.name() == name)
            .ok_or_else(|| Error::Render {
                card: name.to_string(),
                message: "no renderer with that name".into(),
            })?;
        let ctx = RenderContext {
            panel: self.store.panel(),
            state_dir: &self.state_dir,
            now: Local::now(),
            stale_after: self.stale_after,
            weather_stale_after: self.weather_stale_after,
            display,
        };
        let image = renderer.render(&ctx);
        let path = self.store.save(&image, name)?;
        info!("Rendered {}", name);
        Ok(path)
    }
}

impl AssetRenderer for CardDeck {
    /// Render every enabled card that has a renderer, plus the menu.
    ///
    /// Keeps going after a failure and reports the first one.
    fn render_all(&mut self, config: &DisplayConfig) -> Result<()> {
        let names = self.names();
        let mut first_err = None;
        for card in config
            .enabled_cards()
            .filter(|c| names.iter().any(|n| n == c))
            .chain(names.contains(&MENU_CARD).then_some(MENU_CARD))
        {
            if let Err(e) = self.render_card(card, config) {
                error!("Render {} failed: {}", card, e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
