//! Error types for the display pipeline
//!
//! Each layer has its own error enum; [`Error`] wraps them for callers that
//! cross layers (the card deck, the CLI).

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while persisting a rendered card
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("image is {actual_w}x{actual_h}, panel is {expected_w}x{expected_h}")]
    Dimensions {
        expected_w: u32,
        expected_h: u32,
        actual_w: u32,
        actual_h: u32,
    },

    #[error("PNG encode failed for {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("invalid asset name {0:?}")]
    Name(String),
}

/// Failures while writing a frame to the panel
#[derive(Debug, Error)]
pub enum BlitError {
    #[error("{path} is {actual} bytes, expected {expected}")]
    SizeMismatch {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },

    #[error("cannot read {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("framebuffer {path}: {source}")]
    Device {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failures while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("unknown calibration profile {0:?}")]
    UnknownProfile(String),
}

/// Failures on the touch input device
#[derive(Debug, Error)]
pub enum InputError {
    #[error("cannot open input device {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("input device {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Crate-level error
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Blit(#[from] BlitError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("renderer {card}: {message}")]
    Render { card: String, message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
