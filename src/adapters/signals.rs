//! Process signal handling.
//!
//! SIGINT and SIGTERM set a process-wide stop flag that the control loop
//! checks between iterations.  SIGPIPE is ignored so a client that hangs
//! up mid-write surfaces as `EPIPE` on that connection instead of killing
//! the daemon.

use core::sync::atomic::{AtomicBool, Ordering};

use log::info;
use nix::libc;
use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction, signal};

use crate::error::{Error, Result};

static STOP: AtomicBool = AtomicBool::new(false);

extern "C" fn on_terminate(_signo: libc::c_int) {
    STOP.store(true, Ordering::SeqCst);
}

/// Install the termination handlers and ignore SIGPIPE.
pub fn install() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_terminate),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for sig in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler only stores to an atomic, which is async-signal-safe.
        unsafe { sigaction(sig, &action) }.map_err(|errno| Error::Os {
            op: "sigaction",
            errno,
        })?;
    }
    // SAFETY: ignoring a signal installs no code.
    unsafe { signal(Signal::SIGPIPE, SigHandler::SigIgn) }.map_err(|errno| Error::Os {
        op: "signal(SIGPIPE)",
        errno,
    })?;
    info!("signals: SIGINT/SIGTERM handlers installed, SIGPIPE ignored");
    Ok(())
}

/// `true` once a termination signal arrived (or [`request_stop`] was called).
pub fn stop_requested() -> bool {
    STOP.load(Ordering::SeqCst)
}

/// Ask the loop to stop, as a signal would.
pub fn request_stop() {
    STOP.store(true, Ordering::SeqCst);
}
