//! Real-time scheduling for the loop thread.
//!
//! The daemon asks for `SCHED_FIFO` so the frame wait and pulse sleeps are
//! not delayed by ordinary tasks.  Failure (no `CAP_SYS_NICE`) is a warning,
//! never fatal; the previous policy is restored when the guard drops.

use log::{info, warn};
use nix::errno::Errno;
use nix::libc;

/// Restores the original scheduling policy on drop.
#[derive(Debug)]
pub struct RealtimeGuard {
    previous: Option<(libc::c_int, libc::c_int)>,
}

fn sched_param(priority: libc::c_int) -> libc::sched_param {
    // SAFETY: `sched_param` is plain old data; all-zero is a valid value.
    let mut param: libc::sched_param = unsafe { core::mem::zeroed() };
    param.sched_priority = priority;
    param
}

impl RealtimeGuard {
    /// Switch the calling process to `SCHED_FIFO` at `priority`.
    ///
    /// `priority == 0` leaves the policy untouched.
    pub fn acquire(priority: u8) -> Self {
        if priority == 0 {
            info!("realtime: disabled by configuration");
            return Self { previous: None };
        }

        // SAFETY: pid 0 means the calling process; no pointers involved.
        let policy = unsafe { libc::sched_getscheduler(0) };
        let mut old = sched_param(0);
        // SAFETY: pid 0 as above; `old` is a live, initialised `sched_param`.
        let got = unsafe { libc::sched_getparam(0, &mut old) };

        let param = sched_param(libc::c_int::from(priority));
        // SAFETY: pid 0 as above; `param` outlives the call.
        if unsafe { libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) } != 0 {
            warn!(
                "realtime: could not set SCHED_FIFO {}: {} (run as root or via 'chrt -f {}')",
                priority,
                Errno::last(),
                priority
            );
            return Self { previous: None };
        }

        info!("realtime: SCHED_FIFO priority {}", priority);
        let previous = if policy >= 0 && got == 0 {
            (policy, old.sched_priority)
        } else {
            (libc::SCHED_OTHER, 0)
        };
        Self {
            previous: Some(previous),
        }
    }

    /// Whether the policy was changed.
    pub fn is_active(&self) -> bool {
        self.previous.is_some()
    }
}

impl Drop for RealtimeGuard {
    fn drop(&mut self) {
        let Some((policy, priority)) = self.previous.take() else {
            return;
        };
        let param = sched_param(priority);
        // SAFETY: pid 0 is the calling process; `param` is initialised.
        if unsafe { libc::sched_setscheduler(0, policy, &param) } != 0 {
            warn!("realtime: could not restore scheduling policy: {}", Errno::last());
        } else {
            info!("realtime: scheduling policy restored");
        }
    }
}
