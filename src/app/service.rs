//! Application service — the hexagonal core of the control plane.
//!
//! [`ServoService`] owns the channel table and applies parsed commands to
//! it.  Pin writes flow through the [`GpioPort`] injected at each call and
//! notable changes are reported through the [`EventSink`], so the service
//! is fully testable with mock adapters.
//!
//! ```text
//!  Command ──▶ ┌──────────────────────┐ ──▶ EventSink
//!              │     ServoService     │
//!  GpioPort ◀──│  ServoController     │ ──▶ Response
//!              └──────────────────────┘
//! ```
//!
//! Validation order for every command: channel id, then pin, then
//! configured-state, then value checks.

use log::{debug, info};

use crate::error::CommandError;
use crate::protocol::response::Response;
use crate::servo::{ChannelId, ServoChannel, ServoController};

use super::commands::{Action, Command};
use super::events::AppEvent;
use super::ports::{EventSink, GpioPin, GpioPort};

/// Applies control commands to the servo channel table.
#[derive(Debug, Default)]
pub struct ServoService {
    controller: ServoController,
}

impl ServoService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view for the frame scheduler.
    pub fn controller(&self) -> &ServoController {
        &self.controller
    }

    /// Apply one command and produce its reply.
    pub fn handle(
        &mut self,
        command: Command,
        gpio: &mut impl GpioPort,
        sink: &mut impl EventSink,
    ) -> Response {
        match self.apply(command, gpio, sink) {
            Ok(response) => response,
            Err(e) => {
                debug!("service: {:?} rejected: {}", command, e);
                e.into()
            }
        }
    }

    fn apply(
        &mut self,
        command: Command,
        gpio: &mut impl GpioPort,
        sink: &mut impl EventSink,
    ) -> Result<Response, CommandError> {
        let id = ChannelId::try_from(command.channel)?;

        match command.action {
            Action::Setup { pin } => {
                let pin = GpioPin::try_from(pin).map_err(|()| CommandError::InvalidPin)?;
                let released = self.controller.configure(id, pin, gpio);
                sink.emit(&AppEvent::ChannelConfigured {
                    channel: id,
                    pin,
                    released,
                });
                if let Some(with) = self.controller.pin_users(pin, id).next() {
                    sink.emit(&AppEvent::PinShared {
                        channel: id,
                        pin,
                        with,
                    });
                }
            }

            Action::Enable => {
                let channel = self.configured_mut(id)?;
                channel.enable();
                sink.emit(&AppEvent::ChannelEnabled(id));
            }

            Action::Disable => {
                self.controller.channel_mut(id).disable(gpio);
                sink.emit(&AppEvent::ChannelDisabled(id));
            }

            Action::SetRange { min, max } => {
                let channel = self.controller.channel_mut(id);
                let applied = channel.set_range(saturate(min), saturate(max))?;
                if !applied.is_exact() {
                    let (min_us, max_us) = channel.range();
                    sink.emit(&AppEvent::RangeClamped {
                        channel: id,
                        min_us,
                        max_us,
                    });
                }
            }

            Action::SetPulse { value } => {
                let channel = self.configured_mut(id)?;
                if !channel.set_pulse(saturate(value)).is_exact() {
                    sink.emit(&AppEvent::PulseClamped {
                        channel: id,
                        requested: value,
                        applied: channel.pulse_us(),
                    });
                }
            }

            Action::GetRange => {
                let (min_us, max_us) = self.controller.channel(id).range();
                return Ok(Response::Range { min_us, max_us });
            }

            Action::GetPulse => {
                return Ok(Response::Pulse(self.controller.channel(id).pulse_us()));
            }

            Action::GetState => {
                let channel = self.controller.channel(id);
                return Ok(Response::State {
                    pin: channel.pin(),
                    enabled: channel.is_enabled(),
                });
            }
        }

        Ok(Response::Ok)
    }

    fn configured_mut(
        &mut self,
        id: ChannelId,
    ) -> Result<&mut ServoChannel, CommandError> {
        let channel = self.controller.channel_mut(id);
        if channel.is_configured() {
            Ok(channel)
        } else {
            Err(CommandError::ChannelNotConfigured)
        }
    }

    /// Disable every channel and return all pins to input.
    pub fn shutdown(&mut self, gpio: &mut impl GpioPort) {
        self.controller.release_all(gpio);
        info!("service: all channels released");
    }
}

/// Narrow a parsed protocol integer; out-of-range values saturate and are
/// then handled by the normal clamp/reject rules.
fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}
