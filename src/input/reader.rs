//! Touch device polling thread
//!
//! Opens the input node non-blocking, waits on `poll(2)` with a short
//! timeout so the running flag is checked regularly, and pushes every
//! classified gesture into an mpsc channel for the slideshow.

use super::decoder::TouchDecoder;
use super::evdev::{parse_records, RECORD_LEN};
use super::gesture::ClassifiedEvent;
use crate::error::InputError;
use log::{debug, error, info, warn};
use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Poll timeout; bounds how long shutdown can take
pub const POLL_TIMEOUT_MS: libc::c_int = 100;

/// Records read per syscall
const BATCH: usize = 10;

/// Open an input device for non-blocking reads
pub fn open_device(path: &Path) -> Result<File, InputError> {
    OpenOptions::new()
        .read(true)
        .custom_flags(libc::O_NONBLOCK)
        .open(path)
        .map_err(|source| InputError::Open {
            path: path.to_path_buf(),
            source,
        })
}

enum Wait {
    Ready,
    Timeout,
}

fn wait_readable(file: &File) -> io::Result<Wait> {
    let mut pfd = libc::pollfd {
        fd: file.as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    // SAFETY: pfd is a valid pollfd for the duration of the call
    let rc = unsafe { libc::poll(&mut pfd, 1, POLL_TIMEOUT_MS) };
    match rc {
        0 => Ok(Wait::Timeout),
        n if n > 0 => Ok(Wait::Ready),
        _ => {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                Ok(Wait::Timeout)
            } else {
                Err(err)
            }
        }
    }
}

/// Owns the device and decoder for the lifetime of the polling thread
pub struct TouchReader {
    device: File,
    path: PathBuf,
    decoder: TouchDecoder,
    running: Arc<AtomicBool>,
    raw_dump: bool,
}

impl TouchReader {
    pub fn new(
        device: File,
        path: impl Into<PathBuf>,
        decoder: TouchDecoder,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            device,
            path: path.into(),
            decoder,
            running,
            raw_dump: false,
        }
    }

    /// Hexdump every chunk read from the device to stdout
    pub fn with_raw_dump(mut self, enabled: bool) -> Self {
        self.raw_dump = enabled;
        self
    }

    pub fn spawn(self, tx: Sender<ClassifiedEvent>) -> io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("touch".into())
            .spawn(move || {
                let path = self.path.clone();
                match self.run(&tx) {
                    Ok(()) => info!("Input thread stopped"),
                    Err(e) => error!("Input thread for {} failed: {}", path.display(), e),
                }
            })
    }

    /// Poll until the running flag clears, the consumer hangs up, or the
    /// device reports end of file
    pub fn run(mut self, tx: &Sender<ClassifiedEvent>) -> Result<(), InputError> {
        info!("Input thread reading {}", self.path.display());
        let mut buf = [0u8; RECORD_LEN * BATCH];
        let mut pending: Vec<u8> = Vec::with_capacity(buf.len() * 2);

        while self.running.load(Ordering::SeqCst) {
            match wait_readable(&self.device).map_err(|e| self.read_err(e))? {
                Wait::Timeout => continue,
                Wait::Ready => {}
            }

            let n = match self.device.read(&mut buf) {
                Ok(0) => {
                    debug!("End of input on {}", self.path.display());
                    return Ok(());
                }
                Ok(n) => n,
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::Interrupted =>
                {
                    continue
                }
                Err(e) => return Err(self.read_err(e)),
            };

            if self.raw_dump {
                hexdump::hexdump(&buf[..n]);
            }

            pending.extend_from_slice(&buf[..n]);
            let (events, rest) = parse_records(&pending);
            pending.drain(..pending.len() - rest);

            for gesture in self.decoder.feed_all(&events) {
                info!("Queued input event: {}", gesture);
                if tx.send(gesture).is_err() {
                    warn!("Gesture consumer went away, stopping input thread");
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    fn read_err(&self, source: io::Error) -> InputError {
        InputError::Read {
            path: self.path.clone(),
            source,
        }
    }
}
