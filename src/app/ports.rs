//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ServoService / FrameScheduler (domain)
//! ```
//!
//! Driven adapters (register block, frame clock, event sinks) implement these
//! traits.  The service and scheduler consume them via generics, so the
//! domain core never touches `/dev/gpiomem` or a timerfd directly.

use core::fmt;

use crate::error::Result;

/// Highest addressable pin on the BCM2835 header bank.
pub const MAX_GPIO_PIN: u8 = 27;

// ───────────────────────────────────────────────────────────────
// Pin identity
// ───────────────────────────────────────────────────────────────

/// A validated GPIO pin index in `0..=MAX_GPIO_PIN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GpioPin(u8);

impl GpioPin {
    /// Returns `None` if `index` is beyond the addressable pin count.
    pub const fn new(index: u8) -> Option<Self> {
        if index <= MAX_GPIO_PIN {
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn index(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for GpioPin {
    type Error = ();

    fn try_from(value: i64) -> core::result::Result<Self, ()> {
        u8::try_from(value).ok().and_then(Self::new).ok_or(())
    }
}

impl fmt::Display for GpioPin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// BCM2835 function-select codes (3 bits per pin in GPFSELn).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PinMode {
    Input = 0b000,
    Output = 0b001,
    Alt0 = 0b100,
    Alt1 = 0b101,
    Alt2 = 0b110,
    Alt3 = 0b111,
    Alt4 = 0b011,
    Alt5 = 0b010,
}

impl PinMode {
    pub const fn bits(self) -> u32 {
        self as u32
    }

    /// Decode a 3-bit function-select field.
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0b111 {
            0b000 => Self::Input,
            0b001 => Self::Output,
            0b100 => Self::Alt0,
            0b101 => Self::Alt1,
            0b110 => Self::Alt2,
            0b111 => Self::Alt3,
            0b011 => Self::Alt4,
            _ => Self::Alt5,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Register interface (driven adapter: domain → pins)
// ───────────────────────────────────────────────────────────────

/// Pin-level capability over the GPIO register block.
///
/// Once the block is mapped, per-pin operations are side effects that
/// cannot fail, so none of these return a `Result`.
pub trait GpioPort {
    /// Select the pin function (input / output / alternate).
    fn set_mode(&mut self, pin: GpioPin, mode: PinMode);

    /// Drive the pin high.
    fn set_high(&mut self, pin: GpioPin);

    /// Drive the pin low.
    fn set_low(&mut self, pin: GpioPin);

    /// Read the current pin level (`true` = high).
    fn read_level(&self, pin: GpioPin) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Frame timer (driven adapter: domain → monotonic clock)
// ───────────────────────────────────────────────────────────────

/// Periodic frame boundary plus fine-grained pulse delays.
pub trait FrameTimer {
    /// Block until the next frame boundary.
    ///
    /// Returns the number of periods that elapsed since the previous wait;
    /// anything above 1 means frames were missed.
    fn wait_frame(&mut self) -> Result<u64>;

    /// Sleep for `micros` on a monotonic clock.  An interrupted sleep must
    /// resume for the remaining time, never return early.
    fn sleep_us(&mut self, micros: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
