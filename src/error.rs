//! Unified error types for the servo daemon.
//!
//! `Error` carries failed system calls out of the hardware adapters;
//! `CommandError` is the per-command rejection a client sees on the wire.
//! Both are `Copy` so they pass through the service and scheduler without
//! allocation.

use core::fmt;

use nix::errno::Errno;

// ---------------------------------------------------------------------------
// Top-level daemon error
// ---------------------------------------------------------------------------

/// A failed system call in one of the hardware adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A system call failed.
    Os { op: &'static str, errno: Errno },
}

impl Error {
    /// Capture `errno` for a failed system call.
    pub fn last_os(op: &'static str) -> Self {
        Self::Os {
            op,
            errno: Errno::last(),
        }
    }

    /// Wrap a `std::io::Error` from a failed system call.
    pub fn from_io(op: &'static str, e: &std::io::Error) -> Self {
        Self::Os {
            op,
            errno: e.raw_os_error().map_or(Errno::EIO, Errno::from_raw),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Os { op, errno } => write!(f, "{op}: {}", errno.desc()),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Protocol-level errors
// ---------------------------------------------------------------------------

/// Recoverable errors reported to the issuing client as `ERROR <message>`.
///
/// The `Display` text is the exact wire message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Missing tokens, bad sub-keyword or unparsable number.
    InvalidCommand,
    /// First keyword not recognised.
    UnknownCommand,
    /// Channel id outside `[0, 8)`.
    InvalidChannel,
    /// Pin index outside the addressable range.
    InvalidPin,
    /// Operation needs a channel with an assigned pin.
    ChannelNotConfigured,
    /// `min >= max`, before or after clamping to absolute bounds.
    InvalidRange,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCommand => write!(f, "Invalid command"),
            Self::UnknownCommand => write!(f, "Unknown command"),
            Self::InvalidChannel => write!(f, "Invalid channel"),
            Self::InvalidPin => write!(f, "Invalid GPIO pin"),
            Self::ChannelNotConfigured => write!(f, "Channel not configured"),
            Self::InvalidRange => write!(f, "Invalid range: min must be less than max"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Library-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
