//! Atomic persistence of rendered cards
//!
//! Every card is stored twice: `<name>.png` for people and `<name>.raw` for
//! the panel. Each file is written to `<file>.tmp` in the same directory and
//! renamed over the final path, so a reader sees either the old or the new
//! complete file. The raw file is additionally fsynced before the rename.

use super::{codec, Panel};
use crate::error::AssetError;
use image::{ImageFormat, RgbImage};
use log::{debug, warn};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const TMP_SUFFIX: &str = "tmp";

/// Directory of paired PNG/raw card assets
#[derive(Debug, Clone)]
pub struct AssetStore {
    dir: PathBuf,
    panel: Panel,
    dither: bool,
}

impl AssetStore {
    pub fn new(dir: impl Into<PathBuf>, panel: Panel, dither: bool) -> Self {
        Self {
            dir: dir.into(),
            panel,
            dither,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn panel(&self) -> Panel {
        self.panel
    }

    pub fn png_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.png", name))
    }

    pub fn raw_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.raw", name))
    }

    /// Save `image` as `name`, returning the PNG path.
    ///
    /// The image must match the panel geometry. Both files are replaced
    /// atomically and independently; a failure leaves the previous final
    /// files untouched.
    pub fn save(&self, image: &RgbImage, name: &str) -> Result<PathBuf, AssetError> {
        validate_name(name)?;
        let (w, h) = image.dimensions();
        if (w, h) != (self.panel.width, self.panel.height) {
            return Err(AssetError::Dimensions {
                expected_w: self.panel.width,
                expected_h: self.panel.height,
                actual_w: w,
                actual_h: h,
            });
        }

        fs::create_dir_all(&self.dir).map_err(|source| AssetError::Io {
            op: "create",
            path: self.dir.clone(),
            source,
        })?;

        let png_path = self.png_path(name);
        let tmp_png = tmp_path(&png_path);
        with_cleanup(&tmp_png, || write_png(image, &tmp_png))?;
        with_cleanup(&tmp_png, || rename(&tmp_png, &png_path))?;

        let raw_path = self.raw_path(name);
        let tmp_raw = tmp_path(&raw_path);
        let frame = codec::encode(image, self.dither);
        with_cleanup(&tmp_raw, || write_durable(&tmp_raw, &frame))?;
        with_cleanup(&tmp_raw, || rename(&tmp_raw, &raw_path))?;

        debug!("Saved {} ({} raw bytes)", png_path.display(), frame.len());
        Ok(png_path)
    }

    /// Remove `*.tmp` files orphaned by a crash mid-write.
    ///
    /// Best effort; returns how many files were removed.
    pub fn cleanup_orphans(&self) -> usize {
        let mut removed = 0;
        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(TMP_SUFFIX)
            {
                continue;
            }
            match fs::remove_file(path) {
                Ok(()) => {
                    debug!("Removed orphaned {}", path.display());
                    removed += 1;
                }
                Err(e) => warn!("Cannot remove orphaned {}: {}", path.display(), e),
            }
        }
        removed
    }
}

fn validate_name(name: &str) -> Result<(), AssetError> {
    let ok = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if ok {
        Ok(())
    } else {
        Err(AssetError::Name(name.to_string()))
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(TMP_SUFFIX);
    PathBuf::from(name)
}

/// Run `op`; on failure remove the temporary file before returning the error
fn with_cleanup<T>(
    tmp: &Path,
    op: impl FnOnce() -> Result<T, AssetError>,
) -> Result<T, AssetError> {
    op().map_err(|e| {
        let _ = fs::remove_file(tmp);
        e
    })
}

fn write_png(image: &RgbImage, path: &Path) -> Result<(), AssetError> {
    let file = File::create(path).map_err(|source| AssetError::Io {
        op: "create",
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);
    image
        .write_to(&mut writer, ImageFormat::Png)
        .map_err(|source| AssetError::Encode {
            path: path.to_path_buf(),
            source,
        })?;
    writer.flush().map_err(|source| AssetError::Io {
        op: "write",
        path: path.to_path_buf(),
        source,
    })
}

fn write_durable(path: &Path, bytes: &[u8]) -> Result<(), AssetError> {
    let io_err = |op| {
        let path = path.to_path_buf();
        move |source| AssetError::Io { op, path, source }
    };
    let mut file = File::create(path).map_err(io_err("create"))?;
    file.write_all(bytes).map_err(io_err("write"))?;
    file.sync_all().map_err(io_err("fsync"))
}

fn rename(from: &Path, to: &Path) -> Result<(), AssetError> {
    fs::rename(from, to).map_err(|source| AssetError::Io {
        op: "rename",
        path: to.to_path_buf(),
        source,
    })
}
