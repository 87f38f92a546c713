//! Touch input: evdev records → classified gestures
//!
//! [`evdev`] parses the kernel's fixed-size records, [`decoder`] reduces
//! them per contact, [`gesture`] classifies the result and [`reader`] runs
//! the whole thing on its own thread.

pub mod decoder;
pub mod evdev;
pub mod gesture;
pub mod reader;

pub use decoder::TouchDecoder;
pub use evdev::RawEvent;
pub use gesture::{ClassifiedEvent, GestureKind, GestureThresholds, VerticalZone, Zone};
pub use reader::{open_device, TouchReader};
