//! Configuration file watcher
//!
//! Polls the file's modification time on its own thread. A changed file is
//! parsed and validated as a whole; on success the slideshow section
//! replaces the shared snapshot and a reload is flagged, on failure the
//! previous snapshot stays in effect.

use super::{AppConfig, SharedConfig};
use log::{debug, info, warn};
use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant, SystemTime};

/// Granularity of the running-flag check while waiting between polls
const TICK: Duration = Duration::from_millis(100);

/// Outcome of one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Check {
    Unchanged,
    Reloaded,
    Rejected,
}

pub struct ConfigWatcher {
    path: PathBuf,
    shared: SharedConfig,
    running: Arc<AtomicBool>,
    interval: Duration,
    last_seen: Option<SystemTime>,
}

impl ConfigWatcher {
    pub fn new(path: impl Into<PathBuf>, shared: SharedConfig, running: Arc<AtomicBool>) -> Self {
        let path = path.into();
        let last_seen = modified(&path).ok();
        Self {
            path,
            shared,
            running,
            interval: Duration::from_secs(1),
            last_seen,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Compare the file's mtime with the last one seen and reload on change
    pub fn check(&mut self) -> Check {
        let mtime = match modified(&self.path) {
            Ok(t) => t,
            Err(e) => {
                debug!("Cannot stat {}: {}", self.path.display(), e);
                return Check::Unchanged;
            }
        };
        if self.last_seen == Some(mtime) {
            return Check::Unchanged;
        }
        self.last_seen = Some(mtime);

        match AppConfig::load(&self.path) {
            Ok(config) => {
                self.shared.replace(config.slideshow);
                info!("Config reloaded from {}", self.path.display());
                Check::Reloaded
            }
            Err(e) => {
                warn!("Keeping previous config: {}", e);
                Check::Rejected
            }
        }
    }

    pub fn spawn(mut self) -> io::Result<JoinHandle<()>> {
        thread::Builder::new().name("config".into()).spawn(move || {
            info!("Watching {}", self.path.display());
            while self.running.load(Ordering::SeqCst) {
                self.check();
                let deadline = Instant::now() + self.interval;
                while self.running.load(Ordering::SeqCst) && Instant::now() < deadline {
                    thread::sleep(TICK.min(self.interval));
                }
            }
            info!("Config watcher stopped");
        })
    }
}

fn modified(path: &std::path::Path) -> io::Result<SystemTime> {
    fs::metadata(path)?.modified()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DisplayConfig;
    use std::time::UNIX_EPOCH;
    use tempfile::tempdir;

    /// Rewrite the file and force a distinct mtime
    fn rewrite(path: &std::path::Path, text: &str, secs: u64) {
        fs::write(path, text).unwrap();
        let file = fs::File::options().write(true).open(path).unwrap();
        file.set_modified(UNIX_EPOCH + Duration::from_secs(secs))
            .unwrap();
    }

    #[test]
    fn test_reload_replaces_snapshot() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pidisplay.toml");
        rewrite(&path, "", 1_000);

        let shared = SharedConfig::new(DisplayConfig::default());
        let running = Arc::new(AtomicBool::new(true));
        let mut watcher = ConfigWatcher::new(&path, shared.clone(), running);
        assert_eq!(watcher.check(), Check::Unchanged);

        rewrite(&path, "[slideshow]\norder = [\"btc\"]\n", 2_000);
        assert_eq!(watcher.check(), Check::Reloaded);
        assert_eq!(shared.snapshot().order, vec!["btc".to_string()]);
        assert!(shared.take_reload());
        assert_eq!(watcher.check(), Check::Unchanged);
    }

    #[test]
    fn test_invalid_file_keeps_prior_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pidisplay.toml");
        rewrite(&path, "", 1_000);

        let shared = SharedConfig::new(DisplayConfig::default());
        let running = Arc::new(AtomicBool::new(true));
        let mut watcher = ConfigWatcher::new(&path, shared.clone(), running);

        rewrite(&path, "[slideshow]\ndefault_interval = 0\n", 2_000);
        assert_eq!(watcher.check(), Check::Rejected);
        assert_eq!(*shared.snapshot(), DisplayConfig::default());
        assert!(!shared.take_reload());

        rewrite(&path, "[slideshow\n", 3_000);
        assert_eq!(watcher.check(), Check::Rejected);
    }

    #[test]
    fn test_missing_file_is_unchanged() {
        let dir = tempdir().unwrap();
        let shared = SharedConfig::new(DisplayConfig::default());
        let running = Arc::new(AtomicBool::new(true));
        let mut watcher = ConfigWatcher::new(dir.path().join("absent.toml"), shared, running);
        assert_eq!(watcher.check(), Check::Unchanged);
    }

    #[test]
    fn test_thread_exits_on_flag() {
        let dir = tempdir().unwrap();
        let shared = SharedConfig::new(DisplayConfig::default());
        let running = Arc::new(AtomicBool::new(true));
        let handle = ConfigWatcher::new(dir.path().join("absent.toml"), shared, running.clone())
            .with_interval(Duration::from_secs(30))
            .spawn()
            .unwrap();
        thread::sleep(Duration::from_millis(50));
        running.store(false, Ordering::SeqCst);
        handle.join().unwrap();
    }
}
