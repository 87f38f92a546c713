//! Gesture classification
//!
//! Pure functions from a finished contact to a [`GestureKind`] and screen
//! zones. No device or clock access, so every rule is testable in isolation.

use std::fmt;
use std::time::Duration;

/// What a completed contact meant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Tap,
    LongPress,
    TwoFingerTap,
    SwipeLeft,
    SwipeRight,
    SwipeUp,
    SwipeDown,
}

impl GestureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GestureKind::Tap => "tap",
            GestureKind::LongPress => "long_press",
            GestureKind::TwoFingerTap => "two_finger_tap",
            GestureKind::SwipeLeft => "swipe_left",
            GestureKind::SwipeRight => "swipe_right",
            GestureKind::SwipeUp => "swipe_up",
            GestureKind::SwipeDown => "swipe_down",
        }
    }
}

impl fmt::Display for GestureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Horizontal thirds of the panel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Zone {
    Left,
    Center,
    Right,
}

impl Zone {
    pub fn classify(x: u32, width: u32) -> Self {
        if x < width / 3 {
            Zone::Left
        } else if x < 2 * width / 3 {
            Zone::Center
        } else {
            Zone::Right
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Zone::Left => "left",
            Zone::Center => "center",
            Zone::Right => "right",
        })
    }
}

/// Top or bottom half of the panel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerticalZone {
    Top,
    Bottom,
}

impl VerticalZone {
    pub fn classify(y: u32, height: u32) -> Self {
        if y < height / 2 {
            VerticalZone::Top
        } else {
            VerticalZone::Bottom
        }
    }
}

impl fmt::Display for VerticalZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VerticalZone::Top => "top",
            VerticalZone::Bottom => "bottom",
        })
    }
}

/// Timing and distance thresholds
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GestureThresholds {
    /// Contacts shorter than this are noise
    pub min_tap: Duration,
    pub long_press: Duration,
    /// Maximum gap between releases for two contacts to pair
    pub two_finger: Duration,
    /// Swipe distance in screen pixels
    pub swipe_px: i32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            min_tap: Duration::from_millis(50),
            long_press: Duration::from_millis(1000),
            two_finger: Duration::from_millis(300),
            swipe_px: 200,
        }
    }
}

/// Everything the classifier needs to know about a contact
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContactSummary {
    pub duration: Duration,
    /// Contacts in the current multi-touch chain, this one included
    pub touch_count: u32,
    /// Time since the previous release, if any
    pub since_last_release: Option<Duration>,
    /// Screen-space displacement, first sample to last
    pub delta_x: i32,
    pub delta_y: i32,
}

/// Classify by priority: long press, two-finger tap, horizontal swipe,
/// vertical swipe, tap
pub fn classify(c: &ContactSummary, t: &GestureThresholds) -> GestureKind {
    let (adx, ady) = (c.delta_x.abs(), c.delta_y.abs());
    let half = t.swipe_px / 2;
    let paired = c
        .since_last_release
        .map(|gap| gap < t.two_finger)
        .unwrap_or(false);

    if c.duration > t.long_press {
        GestureKind::LongPress
    } else if c.touch_count >= 2 && paired {
        GestureKind::TwoFingerTap
    } else if adx > t.swipe_px && ady < half {
        if c.delta_x < 0 {
            GestureKind::SwipeLeft
        } else {
            GestureKind::SwipeRight
        }
    } else if ady > t.swipe_px && adx < half {
        if c.delta_y < 0 {
            GestureKind::SwipeUp
        } else {
            GestureKind::SwipeDown
        }
    } else {
        GestureKind::Tap
    }
}

/// One completed, classified contact
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassifiedEvent {
    pub kind: GestureKind,
    pub zone: Zone,
    pub vertical_zone: VerticalZone,
    pub duration: Duration,
    pub screen_x: u32,
    pub screen_y: u32,
    pub delta_x: i32,
    pub delta_y: i32,
    pub touch_count: u32,
}

impl fmt::Display for ClassifiedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} zone={}/{} at ({}, {}) delta=({}, {}) {}ms count={}",
            self.kind,
            self.zone,
            self.vertical_zone,
            self.screen_x,
            self.screen_y,
            self.delta_x,
            self.delta_y,
            self.duration.as_millis(),
            self.touch_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(ms: u64, dx: i32, dy: i32) -> ContactSummary {
        ContactSummary {
            duration: Duration::from_millis(ms),
            touch_count: 1,
            since_last_release: None,
            delta_x: dx,
            delta_y: dy,
        }
    }

    #[test]
    fn test_basic_kinds() {
        let t = GestureThresholds::default();
        assert_eq!(classify(&contact(120, 0, 0), &t), GestureKind::Tap);
        assert_eq!(classify(&contact(1200, 5, -3), &t), GestureKind::LongPress);
        assert_eq!(classify(&contact(300, -250, 10), &t), GestureKind::SwipeLeft);
        assert_eq!(classify(&contact(300, 250, 10), &t), GestureKind::SwipeRight);
        assert_eq!(classify(&contact(300, 20, -230), &t), GestureKind::SwipeUp);
        assert_eq!(classify(&contact(300, 20, 230), &t), GestureKind::SwipeDown);
    }

    #[test]
    fn test_diagonal_is_tap() {
        let t = GestureThresholds::default();
        assert_eq!(classify(&contact(300, 250, 150), &t), GestureKind::Tap);
    }

    #[test]
    fn test_long_press_beats_swipe() {
        let t = GestureThresholds::default();
        assert_eq!(classify(&contact(1500, -300, 0), &t), GestureKind::LongPress);
    }

    #[test]
    fn test_two_finger_needs_recent_release() {
        let t = GestureThresholds::default();
        let mut c = contact(100, 0, 0);
        c.touch_count = 2;
        c.since_last_release = Some(Duration::from_millis(200));
        assert_eq!(classify(&c, &t), GestureKind::TwoFingerTap);

        c.since_last_release = Some(Duration::from_millis(400));
        assert_eq!(classify(&c, &t), GestureKind::Tap);

        c.touch_count = 1;
        c.since_last_release = Some(Duration::from_millis(100));
        assert_eq!(classify(&c, &t), GestureKind::Tap);
    }

    #[test]
    fn test_zones() {
        assert_eq!(Zone::classify(0, 480), Zone::Left);
        assert_eq!(Zone::classify(159, 480), Zone::Left);
        assert_eq!(Zone::classify(160, 480), Zone::Center);
        assert_eq!(Zone::classify(320, 480), Zone::Right);
        assert_eq!(Zone::classify(480, 480), Zone::Right);
        assert_eq!(VerticalZone::classify(159, 320), VerticalZone::Top);
        assert_eq!(VerticalZone::classify(160, 320), VerticalZone::Bottom);
    }
}
