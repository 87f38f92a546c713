//! SIGINT/SIGTERM handling
//!
//! The handler only clears the shared running flag; every worker thread
//! polls that flag and winds down on its own.

use once_cell::sync::OnceCell;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

static RUNNING: OnceCell<Arc<AtomicBool>> = OnceCell::new();

extern "C" fn handle_signal(_: libc::c_int) {
    if let Some(running) = RUNNING.get() {
        running.store(false, Ordering::SeqCst);
    }
}

/// Route SIGINT and SIGTERM to `running`.
///
/// Only the first flag installed in a process is used.
pub fn install(running: Arc<AtomicBool>) -> io::Result<()> {
    let _ = RUNNING.set(running);
    for signal in [libc::SIGINT, libc::SIGTERM] {
        let previous = unsafe { libc::signal(signal, handle_signal as libc::sighandler_t) };
        if previous == libc::SIG_ERR {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(())
}
