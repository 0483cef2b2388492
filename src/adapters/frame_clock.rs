//! Frame clock — Linux timerfd plus absolute monotonic sleeps.
//!
//! The timerfd fires once per frame period; reading it yields the number
//! of expirations since the last read, which is how overruns are detected.
//! Intra-frame delays sleep to an absolute `CLOCK_MONOTONIC` deadline, so a
//! signal that interrupts the sleep simply re-arms the same deadline.

use std::os::fd::{AsFd, AsRawFd};

use log::info;
use nix::errno::Errno;
use nix::sys::time::{TimeSpec, TimeValLike};
use nix::sys::timerfd::{self, Expiration, TimerFd, TimerFlags, TimerSetTimeFlags};
use nix::time::{ClockId, ClockNanosleepFlags, clock_gettime, clock_nanosleep};
use nix::unistd;

use crate::app::ports::FrameTimer;
use crate::error::{Error, Result};

/// `now + micros`, normalised.
fn deadline_after(now: TimeSpec, micros: u32) -> TimeSpec {
    now + TimeSpec::microseconds(i64::from(micros))
}

/// Periodic frame boundary source.
pub struct FrameClock {
    timer: TimerFd,
    period_us: u32,
}

impl FrameClock {
    /// Create and arm a periodic timer.  Fatal at startup on failure.
    pub fn new(period_us: u32) -> Result<Self> {
        let timer = TimerFd::new(timerfd::ClockId::CLOCK_MONOTONIC, TimerFlags::TFD_CLOEXEC)
            .map_err(|errno| Error::Os {
                op: "timerfd_create",
                errno,
            })?;

        let interval = TimeSpec::microseconds(i64::from(period_us));
        timer
            .set(Expiration::Interval(interval), TimerSetTimeFlags::empty())
            .map_err(|errno| Error::Os {
                op: "timerfd_settime",
                errno,
            })?;

        info!("frame_clock: {} µs period armed", period_us);
        Ok(Self { timer, period_us })
    }

    pub fn period_us(&self) -> u32 {
        self.period_us
    }

    fn now() -> TimeSpec {
        // CLOCK_MONOTONIC always exists on Linux.
        clock_gettime(ClockId::CLOCK_MONOTONIC).unwrap_or_else(|_| TimeSpec::new(0, 0))
    }
}

impl FrameTimer for FrameClock {
    fn wait_frame(&mut self) -> Result<u64> {
        let mut buf = [0_u8; 8];
        loop {
            match unistd::read(self.timer.as_fd().as_raw_fd(), &mut buf) {
                Ok(8) => return Ok(u64::from_ne_bytes(buf)),
                Ok(_) => {
                    return Err(Error::Os {
                        op: "timerfd read",
                        errno: Errno::EIO,
                    });
                }
                Err(Errno::EINTR) => {}
                Err(errno) => {
                    return Err(Error::Os {
                        op: "timerfd read",
                        errno,
                    });
                }
            }
        }
    }

    fn sleep_us(&mut self, micros: u32) {
        let deadline = deadline_after(Self::now(), micros);
        while let Err(Errno::EINTR) = clock_nanosleep(
            ClockId::CLOCK_MONOTONIC,
            ClockNanosleepFlags::TIMER_ABSTIME,
            &deadline,
        ) {}
    }
}
