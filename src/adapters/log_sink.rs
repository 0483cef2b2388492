//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (stderr via `env_logger` in the daemon binary).  Each
//! event becomes one tagged line so the output greps cleanly.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { frame_period_us } => {
                info!("START | frame_period={}us", frame_period_us);
            }
            AppEvent::ChannelConfigured {
                channel,
                pin,
                released,
            } => match released {
                Some(old) => info!("CHAN  | ch{} -> gpio{} (released gpio{})", channel, pin, old),
                None => info!("CHAN  | ch{} -> gpio{}", channel, pin),
            },
            AppEvent::PinShared { channel, pin, with } => {
                warn!("CHAN  | ch{} shares gpio{} with ch{}", channel, pin, with);
            }
            AppEvent::ChannelEnabled(channel) => {
                info!("CHAN  | ch{} enabled", channel);
            }
            AppEvent::ChannelDisabled(channel) => {
                info!("CHAN  | ch{} disabled", channel);
            }
            AppEvent::RangeClamped {
                channel,
                min_us,
                max_us,
            } => {
                warn!("CHAN  | ch{} range clamped to {}..{}us", channel, min_us, max_us);
            }
            AppEvent::PulseClamped {
                channel,
                requested,
                applied,
            } => {
                warn!("CHAN  | ch{} pulse {}us clamped to {}us", channel, requested, applied);
            }
            AppEvent::FrameStats(s) => {
                info!(
                    "FRAME | frames={} overruns={} missed={} failed_waits={}",
                    s.frames, s.overruns, s.missed_frames, s.failed_waits
                );
            }
            AppEvent::Stopped(s) => {
                info!(
                    "STOP  | frames={} overruns={} missed={}",
                    s.frames, s.overruns, s.missed_frames
                );
            }
        }
    }
}
