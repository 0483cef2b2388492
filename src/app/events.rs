//! Outbound application events.
//!
//! The [`ServoService`](super::service::ServoService) and the control loop
//! emit these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them.

use crate::app::ports::GpioPin;
use crate::scheduler::FrameStats;
use crate::servo::ChannelId;

/// Structured events emitted by the daemon core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The control loop is about to run its first frame.
    Started { frame_period_us: u32 },

    /// A channel was assigned a pin (and reset to defaults).
    ChannelConfigured {
        channel: ChannelId,
        pin: GpioPin,
        /// Pin the channel held before, if it differed.
        released: Option<GpioPin>,
    },

    /// Another channel already drives the same pin.
    PinShared { channel: ChannelId, pin: GpioPin, with: ChannelId },

    ChannelEnabled(ChannelId),
    ChannelDisabled(ChannelId),

    /// A range request was stored with adjustment.
    RangeClamped { channel: ChannelId, min_us: i16, max_us: i16 },

    /// A pulse request was stored with adjustment.
    PulseClamped { channel: ChannelId, requested: i64, applied: i16 },

    /// Periodic scheduler counters.
    FrameStats(FrameStats),

    /// Orderly shutdown finished; all pins released.
    Stopped(FrameStats),
}
