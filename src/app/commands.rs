//! Inbound commands to the application service.
//!
//! Produced by the [protocol parser](crate::protocol::parser) from one
//! control-socket line.  Values are carried as parsed, unvalidated
//! integers; range checks belong to the [`ServoService`](super::service::ServoService)
//! so that errors are reported in a fixed order (channel first).

/// A parsed control command: target channel plus action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    pub channel: i64,
    pub action: Action,
}

/// What to do with the addressed channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// `SETUP <ch> GPIO <pin>`
    Setup { pin: i64 },
    /// `ENABLE <ch>`
    Enable,
    /// `DISABLE <ch>`
    Disable,
    /// `SET <ch> RANGE <min> <max>`
    SetRange { min: i64, max: i64 },
    /// `SET <ch> PULSE <value>`
    SetPulse { value: i64 },
    /// `GET <ch> RANGE`
    GetRange,
    /// `GET <ch> PULSE`
    GetPulse,
    /// `GET <ch> STATE`
    GetState,
}

impl Command {
    pub const fn new(channel: i64, action: Action) -> Self {
        Self { channel, action }
    }
}
