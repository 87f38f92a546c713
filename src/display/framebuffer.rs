//! Framebuffer device writer
//!
//! A blit copies one raw RGB565 frame to the panel device: size check
//! first, then open unbuffered, seek to 0 and write the whole frame.

use super::Panel;
use crate::error::BlitError;
use log::debug;
use std::fs::{self, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Anything that can show a raw frame file.
///
/// The slideshow controller is the only caller; keep it that way so the
/// device has a single writer.
pub trait Blitter {
    fn blit(&mut self, raw_path: &Path) -> Result<(), BlitError>;
}

/// Writes raw frames to a Linux framebuffer node such as `/dev/fb1`
#[derive(Debug, Clone)]
pub struct FramebufferWriter {
    device: PathBuf,
    panel: Panel,
}

impl FramebufferWriter {
    pub fn new(device: impl Into<PathBuf>, panel: Panel) -> Self {
        Self {
            device: device.into(),
            panel,
        }
    }

    /// Check the device can be opened for writing.
    ///
    /// Used at startup so a missing or unwritable device is fatal rather
    /// than a stream of per-blit failures.
    pub fn probe(&self) -> Result<(), BlitError> {
        self.open().map(|_| ())
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    /// Validate a raw file against the panel size without touching the device
    pub fn check(&self, raw_path: &Path) -> Result<u64, BlitError> {
        let actual = fs::metadata(raw_path)
            .map_err(|source| BlitError::Source {
                path: raw_path.to_path_buf(),
                source,
            })?
            .len();
        self.check_len(raw_path, actual)?;
        Ok(actual)
    }

    /// Write an in-memory frame (used by `fill` and `show`)
    pub fn write_frame(&self, frame: &[u8]) -> Result<(), BlitError> {
        self.check_len(&self.device, frame.len() as u64)?;
        let device_err = |source| BlitError::Device {
            path: self.device.clone(),
            source,
        };
        let mut dev = self.open()?;
        dev.seek(SeekFrom::Start(0)).map_err(device_err)?;
        dev.write_all(frame).map_err(device_err)?;
        Ok(())
    }

    fn check_len(&self, path: &Path, actual: u64) -> Result<(), BlitError> {
        let expected = self.panel.frame_len();
        if actual == expected {
            Ok(())
        } else {
            Err(BlitError::SizeMismatch {
                path: path.to_path_buf(),
                expected,
                actual,
            })
        }
    }

    fn open(&self) -> Result<fs::File, BlitError> {
        // std::fs::File does no userspace buffering
        OpenOptions::new()
            .read(true)
            .write(true)
            .open(&self.device)
            .map_err(|source| BlitError::Device {
                path: self.device.clone(),
                source,
            })
    }
}

impl Blitter for FramebufferWriter {
    fn blit(&mut self, raw_path: &Path) -> Result<(), BlitError> {
        self.check(raw_path)?;
        let frame = fs::read(raw_path).map_err(|source| BlitError::Source {
            path: raw_path.to_path_buf(),
            source,
        })?;
        // The file may have been replaced between stat and read
        self.check_len(raw_path, frame.len() as u64)?;
        self.write_frame(&frame)?;
        debug!("Blitted {}", raw_path.display());
        Ok(())
    }
}
