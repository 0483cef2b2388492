//! Pulse safety envelope.
//!
//! Every mutation of a channel's range or pulse passes through these two
//! clamp layers:
//!
//! 1. the **user range** `[min_us, max_us]` configured over the socket,
//! 2. the **absolute bounds** `[ABSOLUTE_MIN_US, ABSOLUTE_MAX_US]`.
//!
//! The absolute clamp is reapplied after every mutation, whatever range is
//! currently stored, so no client input can push a pulse outside
//! 500..=2500 µs.

use crate::error::CommandError;

/// Hardware-safe lower bound for any pulse or range edge (µs).
pub const ABSOLUTE_MIN_US: i16 = 500;
/// Hardware-safe upper bound for any pulse or range edge (µs).
pub const ABSOLUTE_MAX_US: i16 = 2500;

/// Whether a request was stored exactly as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Stored value equals the request.
    Exact,
    /// The request was adjusted into the safety envelope.
    Clamped,
}

impl Applied {
    pub fn is_exact(self) -> bool {
        matches!(self, Self::Exact)
    }

    fn from_exact(exact: bool) -> Self {
        if exact { Self::Exact } else { Self::Clamped }
    }
}

/// Validate and clamp a requested user range.
///
/// Rejects `min >= max` as given, then clamps each edge into the absolute
/// bounds.  If the clamped pair is no longer strictly ordered (both edges
/// were outside on the same side) the request is rejected too.
pub fn clamp_range(min: i32, max: i32) -> Result<(i16, i16, Applied), CommandError> {
    if min >= max {
        return Err(CommandError::InvalidRange);
    }

    let lo = min.max(i32::from(ABSOLUTE_MIN_US));
    let hi = max.min(i32::from(ABSOLUTE_MAX_US));
    if lo >= hi {
        return Err(CommandError::InvalidRange);
    }

    // Both edges now lie inside 500..=2500, which fits i16.
    Ok((lo as i16, hi as i16, Applied::from_exact(lo == min && hi == max)))
}

/// Clamp a requested pulse into the user range, then into absolute bounds.
pub fn clamp_pulse(value: i32, min_us: i16, max_us: i16) -> (i16, Applied) {
    let user = value.max(i32::from(min_us)).min(i32::from(max_us));
    let safe = user
        .max(i32::from(ABSOLUTE_MIN_US))
        .min(i32::from(ABSOLUTE_MAX_US));
    (safe as i16, Applied::from_exact(safe == value))
}
