//! Touch calibration profiles
//!
//! A profile maps raw controller coordinates onto panel pixels: optional
//! axis swap and inversion for the mounted orientation, then a linear scale
//! of the active window onto the panel, clamped to its edges.

use crate::display::Panel;
use crate::error::ConfigError;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Active window of one axis in raw controller units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisWindow {
    pub min: i32,
    pub max: i32,
}

impl AxisWindow {
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    fn span(&self) -> i64 {
        (self.max - self.min) as i64
    }

    /// Scale a raw position onto `0..=extent`
    fn map(&self, raw: i32, extent: u32) -> u32 {
        let scaled = (raw - self.min) as i64 * extent as i64 / self.span();
        scaled.clamp(0, extent as i64) as u32
    }

    /// Scale a raw displacement onto screen pixels
    fn scale(&self, delta: i32, extent: u32) -> i32 {
        (delta as i64 * extent as i64 / self.span()) as i32
    }
}

/// Raw-to-screen mapping for one controller/mounting combination.
///
/// `x` and `y` windows refer to the axes after swapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibrationProfile {
    /// Largest raw value the controller reports, used for inversion
    pub raw_max: i32,
    #[serde(default)]
    pub swap_axes: bool,
    #[serde(default)]
    pub invert_x: bool,
    #[serde(default)]
    pub invert_y: bool,
    pub x: AxisWindow,
    pub y: AxisWindow,
}

/// XPT2046 resistive controller on a panel mounted 90° from its native
/// orientation
pub static XPT2046_ROT90: CalibrationProfile = CalibrationProfile {
    raw_max: 4095,
    swap_axes: true,
    invert_x: true,
    invert_y: false,
    x: AxisWindow::new(50, 4000),
    y: AxisWindow::new(50, 4000),
};

/// Controllers that already report screen-aligned 12-bit coordinates
pub static IDENTITY: CalibrationProfile = CalibrationProfile {
    raw_max: 4095,
    swap_axes: false,
    invert_x: false,
    invert_y: false,
    x: AxisWindow::new(0, 4095),
    y: AxisWindow::new(0, 4095),
};

/// Registry of built-in calibration profiles
pub static CALIBRATION_PROFILES: Lazy<HashMap<&'static str, &'static CalibrationProfile>> =
    Lazy::new(|| {
        let mut m = HashMap::new();
        m.insert("xpt2046-rot90", &XPT2046_ROT90);
        m.insert("xpt2046", &XPT2046_ROT90);
        m.insert("identity", &IDENTITY);
        m
    });

/// Get a calibration profile by name
pub fn get_profile(name: &str) -> Option<&'static CalibrationProfile> {
    CALIBRATION_PROFILES
        .get(name.to_lowercase().as_str())
        .copied()
}

/// Profile names, sorted
pub fn profile_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = CALIBRATION_PROFILES.keys().copied().collect();
    names.sort_unstable();
    names
}

impl CalibrationProfile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (axis, w) in [("x", &self.x), ("y", &self.y)] {
            if w.min >= w.max {
                return Err(ConfigError::Invalid(format!(
                    "calibration {} window {}..{} is empty",
                    axis, w.min, w.max
                )));
            }
        }
        if self.raw_max <= 0 {
            return Err(ConfigError::Invalid("calibration raw_max must be positive".into()));
        }
        Ok(())
    }

    fn orient(&self, x: i32, y: i32) -> (i32, i32) {
        let (mut x, mut y) = if self.swap_axes { (y, x) } else { (x, y) };
        if self.invert_x {
            x = self.raw_max - x;
        }
        if self.invert_y {
            y = self.raw_max - y;
        }
        (x, y)
    }

    /// Map a raw position to panel pixels, clamped to `0..=width`/`0..=height`
    pub fn map_point(&self, raw_x: i32, raw_y: i32, panel: Panel) -> (u32, u32) {
        let (x, y) = self.orient(raw_x, raw_y);
        (self.x.map(x, panel.width), self.y.map(y, panel.height))
    }

    /// Map a raw displacement to panel pixels (rotation applied, no offset)
    pub fn map_delta(&self, dx: i32, dy: i32, panel: Panel) -> (i32, i32) {
        let (mut dx, mut dy) = if self.swap_axes { (dy, dx) } else { (dx, dy) };
        if self.invert_x {
            dx = -dx;
        }
        if self.invert_y {
            dy = -dy;
        }
        (self.x.scale(dx, panel.width), self.y.scale(dy, panel.height))
    }
}
