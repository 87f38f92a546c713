//! pidisplay
//!
//! Card slideshow for small SPI framebuffer LCDs with a resistive touch
//! panel. Cards are rendered to PNG and to the panel's native RGB565 frame
//! format, rotated on the framebuffer device, and navigated with taps,
//! swipes and a two-finger menu gesture read from evdev.
//!
//! # Threads
//!
//! - **touch**: polls the evdev device and queues [`input::ClassifiedEvent`]s
//! - **config**: watches the TOML file and swaps in new slideshow settings
//! - **slideshow**: owns the display, consumes events, dwells and blits
//!
//! All three stop when the shared running flag clears (see [`shutdown`]).

pub mod cards;
pub mod config;
pub mod display;
pub mod error;
pub mod input;
pub mod shutdown;
pub mod slideshow;

pub use error::{Error, Result};
