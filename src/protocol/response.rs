//! Reply lines sent back to a control client.

use core::fmt::{self, Write as _};

use crate::app::ports::GpioPin;
use crate::error::CommandError;

/// Longest rendered reply, newline included, fits comfortably.
pub const MAX_RESPONSE_LEN: usize = 64;

/// One reply; `Display` renders the exact wire text including `\n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Ok,
    Error(CommandError),
    Range { min_us: i16, max_us: i16 },
    Pulse(i16),
    /// `GPIO <pin> ENABLE <0|1>`; an unassigned pin prints as `-1`.
    State { pin: Option<GpioPin>, enabled: bool },
}

impl Response {
    /// Render into a fixed-capacity buffer.
    pub fn render(&self) -> heapless::String<MAX_RESPONSE_LEN> {
        let mut out = heapless::String::new();
        // Every variant is well under the capacity.
        let _ = write!(out, "{self}");
        out
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<CommandError> for Response {
    fn from(e: CommandError) -> Self {
        Self::Error(e)
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => writeln!(f, "OK"),
            Self::Error(e) => writeln!(f, "ERROR {e}"),
            Self::Range { min_us, max_us } => writeln!(f, "RANGE {min_us} {max_us}"),
            Self::Pulse(us) => writeln!(f, "PULSE {us}"),
            Self::State { pin, enabled } => {
                let pin = pin.map_or(-1, |p| i32::from(p.index()));
                writeln!(f, "GPIO {pin} ENABLE {}", u8::from(*enabled))
            }
        }
    }
}
