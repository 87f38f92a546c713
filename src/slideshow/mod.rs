//! Card rotation driven by timers and touch gestures

pub mod controller;
pub mod state;

pub use controller::{enabled_assets, AssetRenderer, SlideAsset, SlideshowController};
pub use state::{Phase, SlideshowState, Transition};
