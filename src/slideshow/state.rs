//! Slideshow state machine
//!
//! Pure state: which card is current, whether rotation is paused and
//! whether the menu overlay is up. The asset list length is passed in on
//! every call because it can change between config reloads; the index is
//! always reduced modulo that length before use.

use crate::input::{ClassifiedEvent, GestureKind, Zone};

/// Externally visible state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No enabled assets to show
    Idle,
    ShowingCard,
    MenuOpen,
    Paused,
}

/// What the controller must do after applying an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    None,
    /// Current card changed; show it now
    Navigate,
    OpenMenu,
    /// Menu dismissed; restore the current card
    CloseMenu,
    /// Pause toggled; the flag is the new paused state
    Pause(bool),
}

impl Transition {
    /// Whether the transition interrupts the current dwell
    pub fn interrupts(&self) -> bool {
        !matches!(self, Transition::None)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlideshowState {
    current_index: usize,
    paused: bool,
    menu_active: bool,
}

impl SlideshowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_menu_active(&self) -> bool {
        self.menu_active
    }

    /// Current index reduced to `0..len`, `None` for an empty list
    pub fn current(&self, len: usize) -> Option<usize> {
        (len > 0).then(|| self.current_index % len)
    }

    pub fn phase(&self, len: usize) -> Phase {
        if self.menu_active {
            Phase::MenuOpen
        } else if len == 0 {
            Phase::Idle
        } else if self.paused {
            Phase::Paused
        } else {
            Phase::ShowingCard
        }
    }

    pub fn next(&mut self, len: usize) {
        if let Some(i) = self.current(len) {
            self.current_index = (i + 1) % len;
        }
    }

    pub fn prev(&mut self, len: usize) {
        if let Some(i) = self.current(len) {
            self.current_index = (i + len - 1) % len;
        }
    }

    /// Move on after a completed dwell
    pub fn advance(&mut self, len: usize) {
        self.next(len);
    }

    /// Apply one gesture
    pub fn apply(&mut self, event: &ClassifiedEvent, len: usize) -> Transition {
        if self.menu_active {
            return if event.kind == GestureKind::Tap {
                self.menu_active = false;
                Transition::CloseMenu
            } else {
                Transition::None
            };
        }

        match (event.kind, event.zone) {
            (GestureKind::TwoFingerTap, _) => {
                self.menu_active = true;
                Transition::OpenMenu
            }
            (GestureKind::LongPress, Zone::Center) => {
                self.paused = !self.paused;
                Transition::Pause(self.paused)
            }
            _ if len == 0 => Transition::None,
            // Swipes ignore the zone: a full-width swipe averages to the
            // center third, so zone-gating would make them dead
            (GestureKind::Tap, Zone::Left) | (GestureKind::SwipeRight, _) => {
                self.prev(len);
                Transition::Navigate
            }
            (GestureKind::Tap, Zone::Right) | (GestureKind::SwipeLeft, _) => {
                self.next(len);
                Transition::Navigate
            }
            _ => Transition::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::VerticalZone;
    use std::time::Duration;

    fn gesture(kind: GestureKind, zone: Zone) -> ClassifiedEvent {
        ClassifiedEvent {
            kind,
            zone,
            vertical_zone: VerticalZone::Top,
            duration: Duration::from_millis(100),
            screen_x: 0,
            screen_y: 0,
            delta_x: 0,
            delta_y: 0,
            touch_count: 1,
        }
    }

    #[test]
    fn test_index_wraps_both_ways() {
        for len in 1..7 {
            let mut state = SlideshowState::new();
            for step in 0..20 {
                if step % 3 == 0 {
                    state.prev(len);
                } else {
                    state.next(len);
                }
                let i = state.current(len).unwrap();
                assert!(i < len);
            }
        }
    }

    #[test]
    fn test_prev_from_zero_wraps_to_last() {
        let mut state = SlideshowState::new();
        state.prev(4);
        assert_eq!(state.current(4), Some(3));
    }

    #[test]
    fn test_shrinking_list_keeps_index_in_range() {
        let mut state = SlideshowState::new();
        for _ in 0..3 {
            state.next(4);
        }
        assert_eq!(state.current(4), Some(3));
        assert_eq!(state.current(2), Some(1));
        state.next(2);
        assert_eq!(state.current(2), Some(0));
        assert_eq!(state.current(0), None);
    }

    #[test]
    fn test_tap_zones_navigate() {
        let mut state = SlideshowState::new();
        assert_eq!(
            state.apply(&gesture(GestureKind::Tap, Zone::Right), 3),
            Transition::Navigate
        );
        assert_eq!(state.current(3), Some(1));
        state.apply(&gesture(GestureKind::Tap, Zone::Left), 3);
        state.apply(&gesture(GestureKind::Tap, Zone::Left), 3);
        assert_eq!(state.current(3), Some(2));
        assert_eq!(
            state.apply(&gesture(GestureKind::Tap, Zone::Center), 3),
            Transition::None
        );
    }

    #[test]
    fn test_swipes_navigate_from_any_zone() {
        let mut state = SlideshowState::new();
        state.apply(&gesture(GestureKind::SwipeLeft, Zone::Center), 3);
        assert_eq!(state.current(3), Some(1));
        state.apply(&gesture(GestureKind::SwipeRight, Zone::Left), 3);
        assert_eq!(state.current(3), Some(0));
        assert_eq!(
            state.apply(&gesture(GestureKind::SwipeUp, Zone::Center), 3),
            Transition::None
        );
    }

    #[test]
    fn test_long_press_center_toggles_pause() {
        let mut state = SlideshowState::new();
        assert_eq!(
            state.apply(&gesture(GestureKind::LongPress, Zone::Center), 2),
            Transition::Pause(true)
        );
        assert_eq!(state.phase(2), Phase::Paused);
        assert_eq!(
            state.apply(&gesture(GestureKind::LongPress, Zone::Left), 2),
            Transition::None
        );
        state.apply(&gesture(GestureKind::LongPress, Zone::Center), 2);
        assert_eq!(state.phase(2), Phase::ShowingCard);
    }

    #[test]
    fn test_menu_swallows_until_tap() {
        let mut state = SlideshowState::new();
        assert_eq!(
            state.apply(&gesture(GestureKind::TwoFingerTap, Zone::Center), 3),
            Transition::OpenMenu
        );
        assert_eq!(state.phase(3), Phase::MenuOpen);
        for kind in [
            GestureKind::SwipeLeft,
            GestureKind::LongPress,
            GestureKind::TwoFingerTap,
        ] {
            assert_eq!(state.apply(&gesture(kind, Zone::Center), 3), Transition::None);
        }
        assert_eq!(state.current(3), Some(0));
        assert_eq!(
            state.apply(&gesture(GestureKind::Tap, Zone::Right), 3),
            Transition::CloseMenu
        );
        assert_eq!(state.current(3), Some(0));
        assert_eq!(state.phase(3), Phase::ShowingCard);
    }

    #[test]
    fn test_empty_list_is_idle() {
        let mut state = SlideshowState::new();
        assert_eq!(state.phase(0), Phase::Idle);
        assert_eq!(
            state.apply(&gesture(GestureKind::Tap, Zone::Right), 0),
            Transition::None
        );
    }
}
