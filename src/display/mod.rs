//! Pixel pipeline: codec, asset persistence, framebuffer blits
//!
//! Rendered cards flow `RgbImage` → [`AssetStore`] (PNG + raw RGB565 pair)
//! → [`FramebufferWriter`] → panel.

pub mod asset;
pub mod canvas;
pub mod codec;
pub mod framebuffer;

pub use asset::AssetStore;
pub use canvas::Canvas;
pub use codec::Rgb565;
pub use framebuffer::{Blitter, FramebufferWriter};

use serde::{Deserialize, Serialize};

/// Fixed panel geometry (16 bits per pixel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Panel {
    pub width: u32,
    pub height: u32,
}

impl Panel {
    /// The 3.5" SPI LCD this project targets
    pub const DEFAULT: Self = Self {
        width: 480,
        height: 320,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Exact byte length of a raw frame
    pub const fn frame_len(&self) -> u64 {
        self.width as u64 * self.height as u64 * codec::BYTES_PER_PIXEL as u64
    }
}

impl Default for Panel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_frame_len() {
        assert_eq!(Panel::DEFAULT.frame_len(), 307_200);
    }
}
