//! Touch decoder: raw evdev records in, classified gestures out
//!
//! Per contact the decoder is either idle or tracking. Axis samples are
//! accumulated while tracking; the release classifies the contact and
//! returns to idle.

use super::evdev::{RawEvent, TouchSignal};
use super::gesture::{
    classify, ClassifiedEvent, ContactSummary, GestureKind, GestureThresholds, VerticalZone, Zone,
};
use crate::config::calibration::CalibrationProfile;
use crate::display::Panel;
use log::trace;
use std::time::Duration;

/// Running statistics for one axis during a contact
#[derive(Debug, Clone, Copy, Default)]
struct AxisTrack {
    first: Option<i32>,
    last: Option<i32>,
    sum: i64,
    samples: u32,
}

impl AxisTrack {
    /// Start a contact, carrying the last known value as its first sample
    fn carried(last: Option<i32>) -> Self {
        let mut track = Self::default();
        if let Some(v) = last {
            track.push(v);
        }
        track
    }

    fn push(&mut self, v: i32) {
        self.first.get_or_insert(v);
        self.last = Some(v);
        self.sum += v as i64;
        self.samples += 1;
    }

    fn average(&self) -> i32 {
        if self.samples == 0 {
            0
        } else {
            (self.sum / self.samples as i64) as i32
        }
    }

    fn delta(&self) -> i32 {
        match (self.first, self.last) {
            (Some(a), Some(b)) => b - a,
            _ => 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ContactState {
    Idle,
    Tracking {
        pressed_at: Duration,
        x: AxisTrack,
        y: AxisTrack,
    },
}

/// Stateful reducer over evdev records
#[derive(Debug, Clone)]
pub struct TouchDecoder {
    calibration: CalibrationProfile,
    panel: Panel,
    thresholds: GestureThresholds,
    state: ContactState,
    last_x: Option<i32>,
    last_y: Option<i32>,
    last_release: Option<Duration>,
    touch_count: u32,
}

impl TouchDecoder {
    pub fn new(calibration: CalibrationProfile, panel: Panel, thresholds: GestureThresholds) -> Self {
        Self {
            calibration,
            panel,
            thresholds,
            state: ContactState::Idle,
            last_x: None,
            last_y: None,
            last_release: None,
            touch_count: 0,
        }
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, ContactState::Tracking { .. })
    }

    /// Feed one record; returns a gesture when it completes a contact
    pub fn feed(&mut self, ev: &RawEvent) -> Option<ClassifiedEvent> {
        match ev.signal()? {
            TouchSignal::AbsX(v) => {
                self.last_x = Some(v);
                if let ContactState::Tracking { x, .. } = &mut self.state {
                    x.push(v);
                }
                None
            }
            TouchSignal::AbsY(v) => {
                self.last_y = Some(v);
                if let ContactState::Tracking { y, .. } = &mut self.state {
                    y.push(v);
                }
                None
            }
            TouchSignal::Press => {
                if let ContactState::Idle = self.state {
                    self.state = ContactState::Tracking {
                        pressed_at: ev.time,
                        x: AxisTrack::carried(self.last_x),
                        y: AxisTrack::carried(self.last_y),
                    };
                }
                None
            }
            TouchSignal::Release => {
                let state = std::mem::replace(&mut self.state, ContactState::Idle);
                match state {
                    ContactState::Idle => None,
                    ContactState::Tracking { pressed_at, x, y } => {
                        self.finish(pressed_at, ev.time, &x, &y)
                    }
                }
            }
        }
    }

    /// Feed a batch of records, collecting any gestures in order
    pub fn feed_all<'a>(
        &mut self,
        events: impl IntoIterator<Item = &'a RawEvent>,
    ) -> Vec<ClassifiedEvent> {
        events.into_iter().filter_map(|ev| self.feed(ev)).collect()
    }

    fn finish(
        &mut self,
        pressed_at: Duration,
        released_at: Duration,
        x: &AxisTrack,
        y: &AxisTrack,
    ) -> Option<ClassifiedEvent> {
        let duration = released_at.saturating_sub(pressed_at);
        if duration < self.thresholds.min_tap {
            trace!("Debounced {}ms contact", duration.as_millis());
            return None;
        }

        let (screen_x, screen_y) =
            self.calibration
                .map_point(x.average(), y.average(), self.panel);
        let (delta_x, delta_y) = self
            .calibration
            .map_delta(x.delta(), y.delta(), self.panel);

        let since_last_release = self
            .last_release
            .map(|prev| released_at.saturating_sub(prev));
        let chained = since_last_release
            .map(|gap| gap < self.thresholds.two_finger)
            .unwrap_or(false);
        let touch_count = if chained { self.touch_count + 1 } else { 1 };

        let summary = ContactSummary {
            duration,
            touch_count,
            since_last_release,
            delta_x,
            delta_y,
        };
        let kind = classify(&summary, &self.thresholds);

        self.last_release = Some(released_at);
        // Only a plain tap can start a two-finger pair
        self.touch_count = match kind {
            GestureKind::Tap => touch_count,
            _ => 0,
        };

        Some(ClassifiedEvent {
            kind,
            zone: Zone::classify(screen_x, self.panel.width),
            vertical_zone: VerticalZone::classify(screen_y, self.panel.height),
            duration,
            screen_x,
            screen_y,
            delta_x,
            delta_y,
            touch_count,
        })
    }
}
