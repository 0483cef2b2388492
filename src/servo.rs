//! Servo channel model.
//!
//! Pure data plus validation.  The only side effects are the pin writes a
//! channel performs through the [`GpioPort`] it is handed: driving the pin
//! low on setup/disable and releasing it to input on shutdown.
//!
//! Invariants after any mutation (enforced via [`crate::safety`]):
//!
//! - `ABSOLUTE_MIN_US <= min_us < max_us <= ABSOLUTE_MAX_US`
//! - `min_us <= pulse_us <= max_us`
//! - `enabled` implies a pin is assigned

use core::fmt;

use crate::app::ports::{GpioPin, GpioPort, PinMode};
use crate::error::CommandError;
use crate::safety::{self, Applied};

/// Number of servo slots.
pub const MAX_CHANNELS: usize = 8;

/// Default user range after setup (µs).
pub const DEFAULT_MIN_US: i16 = 1000;
pub const DEFAULT_MAX_US: i16 = 2000;
/// Mid-range pulse after setup (µs).
pub const NEUTRAL_US: i16 = 1500;

// ═══════════════════════════════════════════════════════════════
//  Channel id
// ═══════════════════════════════════════════════════════════════

/// Index of a servo slot, `0..MAX_CHANNELS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(usize);

impl ChannelId {
    pub const fn new(index: usize) -> Option<Self> {
        if index < MAX_CHANNELS {
            Some(Self(index))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0
    }

    pub fn all() -> impl Iterator<Item = ChannelId> {
        (0..MAX_CHANNELS).map(Self)
    }
}

impl TryFrom<i64> for ChannelId {
    type Error = CommandError;

    fn try_from(value: i64) -> Result<Self, CommandError> {
        usize::try_from(value)
            .ok()
            .and_then(Self::new)
            .ok_or(CommandError::InvalidChannel)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Channel
// ═══════════════════════════════════════════════════════════════

/// One logical servo output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServoChannel {
    pin: Option<GpioPin>,
    enabled: bool,
    min_us: i16,
    max_us: i16,
    pulse_us: i16,
}

impl Default for ServoChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl ServoChannel {
    /// An unconfigured, disabled channel at neutral.
    pub const fn new() -> Self {
        Self {
            pin: None,
            enabled: false,
            min_us: DEFAULT_MIN_US,
            max_us: DEFAULT_MAX_US,
            pulse_us: NEUTRAL_US,
        }
    }

    /// Assign `pin`, reset to defaults and drive the pin output-low.
    ///
    /// Returns the previously assigned pin, if any.  The old pin is left
    /// as it was; [`ServoController::configure`] decides whether to release it.
    pub fn configure(&mut self, pin: GpioPin, gpio: &mut impl GpioPort) -> Option<GpioPin> {
        let previous = self.pin;
        *self = Self {
            pin: Some(pin),
            ..Self::new()
        };

        // Latch low before switching to output so the pin never glitches high.
        gpio.set_low(pin);
        gpio.set_mode(pin, PinMode::Output);
        previous
    }

    /// Mark the channel as emitting pulses.
    ///
    /// Callers must check [`is_configured`](Self::is_configured) first; an
    /// unconfigured channel stays disabled.
    pub fn enable(&mut self) {
        self.enabled = self.pin.is_some();
    }

    /// Stop emitting and force the pin low, ending any in-flight pulse.
    pub fn disable(&mut self, gpio: &mut impl GpioPort) {
        self.enabled = false;
        if let Some(pin) = self.pin {
            gpio.set_low(pin);
        }
    }

    /// Replace the user range; see [`safety::clamp_range`].
    ///
    /// The current pulse is re-clamped into the new range; moving it counts
    /// as clamping.
    pub fn set_range(&mut self, min: i32, max: i32) -> Result<Applied, CommandError> {
        let (min_us, max_us, range_applied) = safety::clamp_range(min, max)?;
        self.min_us = min_us;
        self.max_us = max_us;

        let (pulse_us, pulse_applied) =
            safety::clamp_pulse(i32::from(self.pulse_us), min_us, max_us);
        self.pulse_us = pulse_us;

        if range_applied.is_exact() && pulse_applied.is_exact() {
            Ok(Applied::Exact)
        } else {
            Ok(Applied::Clamped)
        }
    }

    /// Set the commanded pulse width; always succeeds.
    pub fn set_pulse(&mut self, value: i32) -> Applied {
        let (pulse_us, applied) = safety::clamp_pulse(value, self.min_us, self.max_us);
        self.pulse_us = pulse_us;
        applied
    }

    /// Disable and return the pin to input (non-driving) mode.
    pub fn release(&mut self, gpio: &mut impl GpioPort) {
        self.disable(gpio);
        if let Some(pin) = self.pin {
            gpio.set_mode(pin, PinMode::Input);
        }
    }

    pub fn pin(&self) -> Option<GpioPin> {
        self.pin
    }

    pub fn is_configured(&self) -> bool {
        self.pin.is_some()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn range(&self) -> (i16, i16) {
        (self.min_us, self.max_us)
    }

    pub fn pulse_us(&self) -> i16 {
        self.pulse_us
    }
}

// ═══════════════════════════════════════════════════════════════
//  Controller
// ═══════════════════════════════════════════════════════════════

/// The fixed table of servo slots.
#[derive(Debug, Clone, Default)]
pub struct ServoController {
    channels: [ServoChannel; MAX_CHANNELS],
}

impl ServoController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(&self, id: ChannelId) -> &ServoChannel {
        &self.channels[id.index()]
    }

    pub fn channel_mut(&mut self, id: ChannelId) -> &mut ServoChannel {
        &mut self.channels[id.index()]
    }

    pub fn channels(&self) -> &[ServoChannel; MAX_CHANNELS] {
        &self.channels
    }

    /// Assign `pin` to channel `id`.
    ///
    /// A different pin the channel held before is driven low and released to
    /// input, unless another channel still uses it.  Returns the released pin.
    pub fn configure(
        &mut self,
        id: ChannelId,
        pin: GpioPin,
        gpio: &mut impl GpioPort,
    ) -> Option<GpioPin> {
        let old = self
            .channel_mut(id)
            .configure(pin, gpio)
            .filter(|&old| old != pin)?;
        if self.pin_users(old, id).next().is_some() {
            return None;
        }
        gpio.set_low(old);
        gpio.set_mode(old, PinMode::Input);
        Some(old)
    }

    /// Other channels currently assigned `pin`.
    pub fn pin_users(&self, pin: GpioPin, except: ChannelId) -> impl Iterator<Item = ChannelId> + '_ {
        ChannelId::all().filter(move |&id| id != except && self.channel(id).pin() == Some(pin))
    }

    /// Disable every channel and release its pin (shutdown path).
    pub fn release_all(&mut self, gpio: &mut impl GpioPort) {
        for channel in &mut self.channels {
            channel.release(gpio);
        }
    }
}
