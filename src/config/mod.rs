//! Application configuration
//!
//! One TOML file, every field defaulted. The `[slideshow]` section is the
//! live-reloadable [`DisplayConfig`]; everything else is read once at
//! startup.

pub mod calibration;
pub mod watcher;

pub use calibration::CalibrationProfile;
pub use watcher::ConfigWatcher;

use crate::display::Panel;
use crate::error::ConfigError;
use crate::input::GestureThresholds;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "pidisplay.toml";

/// Cards shipped with the project, in default display order
pub const DEFAULT_CARDS: [&str; 4] = ["clock", "weather", "btc", "news"];

/// Asset name of the menu overlay
pub const MENU_CARD: &str = "menu";

/// Longest dwell or retry interval accepted, in seconds
pub const MAX_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Smallest panel the card layouts fit on
pub const MIN_PANEL: (u32, u32) = (160, 120);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub width: u32,
    pub height: u32,
    /// Framebuffer device node
    pub framebuffer: PathBuf,
    /// Ordered dithering when encoding raw frames
    pub dither: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            width: Panel::DEFAULT.width,
            height: Panel::DEFAULT.height,
            framebuffer: PathBuf::from("/dev/fb1"),
            dither: false,
        }
    }
}

impl PanelConfig {
    pub fn panel(&self) -> Panel {
        Panel::new(self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Rendered `<card>.png` / `<card>.raw` pairs
    pub images: PathBuf,
    /// JSON state files written by the fetchers
    pub state: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            images: PathBuf::from("images"),
            state: PathBuf::from("state"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    pub min_tap_ms: u64,
    pub long_press_ms: u64,
    pub two_finger_ms: u64,
    pub swipe_px: i32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        let t = GestureThresholds::default();
        Self {
            min_tap_ms: t.min_tap.as_millis() as u64,
            long_press_ms: t.long_press.as_millis() as u64,
            two_finger_ms: t.two_finger.as_millis() as u64,
            swipe_px: t.swipe_px,
        }
    }
}

impl GestureConfig {
    pub fn thresholds(&self) -> GestureThresholds {
        GestureThresholds {
            min_tap: Duration::from_millis(self.min_tap_ms),
            long_press: Duration::from_millis(self.long_press_ms),
            two_finger: Duration::from_millis(self.two_finger_ms),
            swipe_px: self.swipe_px,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TouchConfig {
    /// evdev input node
    pub device: PathBuf,
    /// Built-in calibration profile name
    pub profile: String,
    /// Inline profile, takes precedence over `profile`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calibration: Option<CalibrationProfile>,
    pub gestures: GestureConfig,
}

impl Default for TouchConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from("/dev/input/event0"),
            profile: "xpt2046-rot90".to_string(),
            calibration: None,
            gestures: GestureConfig::default(),
        }
    }
}

impl TouchConfig {
    /// Resolve the effective calibration profile
    pub fn calibration(&self) -> Result<CalibrationProfile, ConfigError> {
        match self.calibration {
            Some(profile) => Ok(profile),
            None => calibration::get_profile(&self.profile)
                .copied()
                .ok_or_else(|| ConfigError::UnknownProfile(self.profile.clone())),
        }
    }
}

/// The reloadable slideshow section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Card display order
    pub order: Vec<String>,
    /// Fallback dwell in seconds
    pub default_interval: u64,
    /// Cards missing from this map are disabled
    pub enabled: BTreeMap<String, bool>,
    /// Per-card dwell in seconds
    pub intervals: BTreeMap<String, u64>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        let intervals = [("clock", 15), ("weather", 300), ("btc", 60), ("news", 300)];
        Self {
            order: DEFAULT_CARDS.iter().map(|c| c.to_string()).collect(),
            default_interval: 10,
            enabled: DEFAULT_CARDS.iter().map(|c| (c.to_string(), true)).collect(),
            intervals: intervals
                .iter()
                .map(|(c, s)| (c.to_string(), *s))
                .collect(),
        }
    }
}

impl DisplayConfig {
    pub fn is_enabled(&self, card: &str) -> bool {
        self.enabled.get(card).copied().unwrap_or(false)
    }

    /// Enabled cards in display order
    pub fn enabled_cards(&self) -> impl Iterator<Item = &str> {
        self.order
            .iter()
            .map(String::as_str)
            .filter(move |c| self.is_enabled(c))
    }

    pub fn default_interval(&self) -> Duration {
        Duration::from_secs(self.default_interval)
    }

    /// Dwell time for `card`, falling back to the default interval
    pub fn interval_for(&self, card: &str) -> Duration {
        self.intervals
            .get(card)
            .map(|s| Duration::from_secs(*s))
            .unwrap_or_else(|| self.default_interval())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_INTERVAL_SECS).contains(&self.default_interval) {
            return Err(ConfigError::Invalid(format!(
                "slideshow.default_interval must be 1..={} seconds",
                MAX_INTERVAL_SECS
            )));
        }
        for card in &self.order {
            if !is_card_name(card) {
                return Err(ConfigError::Invalid(format!(
                    "slideshow.order: invalid card name {:?}",
                    card
                )));
            }
        }
        if let Some((card, _)) = self
            .intervals
            .iter()
            .find(|(_, s)| !(1..=MAX_INTERVAL_SECS).contains(*s))
        {
            return Err(ConfigError::Invalid(format!(
                "slideshow.intervals.{} must be 1..={} seconds",
                card, MAX_INTERVAL_SECS
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardsConfig {
    /// Price data older than this is drawn as stale
    pub stale_after_secs: u64,
    /// Weather refreshes slowly, so it gets its own threshold
    pub weather_stale_after_secs: u64,
}

impl Default for CardsConfig {
    fn default() -> Self {
        Self {
            stale_after_secs: 180,
            weather_stale_after_secs: 1800,
        }
    }
}

impl CardsConfig {
    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn weather_stale_after(&self) -> Duration {
        Duration::from_secs(self.weather_stale_after_secs)
    }
}

/// Complete configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub panel: PanelConfig,
    pub paths: PathsConfig,
    pub touch: TouchConfig,
    pub slideshow: DisplayConfig,
    pub cards: CardsConfig,
}

impl AppConfig {
    /// Parse and validate a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    /// Load `path`, or the defaults when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            info!("{} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::new(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Write the default configuration to `path`
    pub fn save_default(path: &Path) -> Result<(), ConfigError> {
        let text = Self::default().to_toml()?;
        fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (w, h) = MIN_PANEL;
        if self.panel.width < w || self.panel.height < h {
            return Err(ConfigError::Invalid(format!(
                "panel size {}x{} is below the {}x{} card layout minimum",
                self.panel.width, self.panel.height, w, h
            )));
        }
        let g = &self.touch.gestures;
        if g.min_tap_ms == 0 || g.long_press_ms == 0 || g.two_finger_ms == 0 || g.swipe_px <= 0 {
            return Err(ConfigError::Invalid(
                "touch.gestures thresholds must be positive".into(),
            ));
        }
        self.touch.calibration()?.validate()?;
        self.slideshow.validate()
    }
}

/// Card names double as file stems
fn is_card_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

struct Shared {
    snapshot: RwLock<Arc<DisplayConfig>>,
    reload: AtomicBool,
}

/// Current [`DisplayConfig`] snapshot plus the reload flag.
///
/// Writers replace the whole snapshot; readers clone the `Arc` and never
/// observe a partially updated config.
#[derive(Clone)]
pub struct SharedConfig {
    inner: Arc<Shared>,
}

impl SharedConfig {
    pub fn new(config: DisplayConfig) -> Self {
        Self {
            inner: Arc::new(Shared {
                snapshot: RwLock::new(Arc::new(config)),
                reload: AtomicBool::new(false),
            }),
        }
    }

    pub fn snapshot(&self) -> Arc<DisplayConfig> {
        let guard = self
            .inner
            .snapshot
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Arc::clone(&guard)
    }

    /// Swap in a new snapshot and flag a reload
    pub fn replace(&self, config: DisplayConfig) {
        {
            let mut guard = self
                .inner
                .snapshot
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            *guard = Arc::new(config);
        }
        self.request_reload();
    }

    pub fn request_reload(&self) {
        self.inner.reload.store(true, Ordering::SeqCst);
    }

    /// Consume the reload flag
    pub fn take_reload(&self) -> bool {
        self.inner.reload.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.panel.panel(), Panel::DEFAULT);
        let cards: Vec<_> = config.slideshow.enabled_cards().collect();
        assert_eq!(cards, vec!["clock", "weather", "btc", "news"]);
        assert_eq!(config.slideshow.interval_for("btc"), Duration::from_secs(60));
        assert_eq!(config.slideshow.interval_for("other"), Duration::from_secs(10));
        assert_eq!(config.cards.stale_after(), Duration::from_secs(180));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [slideshow]
            order = ["news", "clock"]

            [slideshow.enabled]
            clock = true
            news = false
            "#,
        )
        .unwrap();
        let cards: Vec<_> = config.slideshow.enabled_cards().collect();
        assert_eq!(cards, vec!["clock"]);
        assert_eq!(config.slideshow.interval_for("clock"), Duration::from_secs(15));
        assert_eq!(config.touch.profile, "xpt2046-rot90");
        assert_eq!(config.panel.framebuffer, PathBuf::from("/dev/fb1"));
    }

    #[test]
    fn test_default_file_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        AppConfig::save_default(&path).unwrap();
        assert_eq!(AppConfig::load(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn test_inline_calibration() {
        let config = AppConfig::from_toml(
            r#"
            [touch.calibration]
            raw_max = 1023
            x = { min = 10, max = 1000 }
            y = { min = 20, max = 990 }
            "#,
        )
        .unwrap();
        let cal = config.touch.calibration().unwrap();
        assert_eq!(cal.raw_max, 1023);
        assert!(!cal.swap_axes);
    }

    #[test]
    fn test_validation_errors() {
        let bad = [
            "[slideshow]\ndefault_interval = 0",
            "[slideshow]\norder = [\"../etc\"]",
            "[slideshow.intervals]\nclock = 0",
            "[slideshow]\ndefault_interval = 9223372036854775807",
            "[slideshow]\ndefault_interval = 86401",
            "[slideshow.intervals]\nnews = 100000",
            "[panel]\nwidth = 0",
            "[touch.gestures]\nswipe_px = 0",
        ];
        for text in bad {
            assert!(
                matches!(AppConfig::from_toml(text), Err(ConfigError::Invalid(_))),
                "{}",
                text
            );
        }
        assert!(matches!(
            AppConfig::from_toml("[touch]\nprofile = \"ads7846\""),
            Err(ConfigError::UnknownProfile(_))
        ));
        assert!(matches!(
            AppConfig::from_toml("[panel\n"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_interval_cap_is_inclusive() {
        let config = AppConfig::from_toml("[slideshow]\ndefault_interval = 86400").unwrap();
        let deadline = std::time::Instant::now().checked_add(config.slideshow.default_interval());
        assert!(deadline.is_some());
    }

    #[test]
    fn test_load_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "slideshow = 3").unwrap();
        match AppConfig::load(&path) {
            Err(ConfigError::Parse { path: p, .. }) => assert_eq!(p, path),
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(
            AppConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigError::Read { .. })
        ));
        assert!(AppConfig::load_or_default(&dir.path().join("missing.toml")).is_ok());
    }

    #[test]
    fn test_shared_snapshot_swap() {
        let shared = SharedConfig::new(DisplayConfig::default());
        let before = shared.snapshot();
        assert!(!shared.take_reload());

        let mut next = DisplayConfig::default();
        next.order = vec!["btc".into()];
        shared.replace(next.clone());

        assert_eq!(*shared.snapshot(), next);
        assert_eq!(before.order.len(), 4);
        assert!(shared.take_reload());
        assert!(!shared.take_reload());
    }
}
