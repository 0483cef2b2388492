//! Line-oriented control protocol.
//!
//! ```text
//! ┌───────────┐   ┌──────────┐   ┌──────────┐   ┌──────────────┐
//! │ Transport │──▶│  Codec   │──▶│  Parser  │──▶│ ServoService │
//! │ (trait)   │   │ (lines)  │   │ (grammar)│   │              │
//! └───────────┘   └──────────┘   └──────────┘   └──────────────┘
//!       ▲                                              │
//!       └──────────────── Response ◀──────────────────┘
//! ```

pub mod codec;
pub mod parser;
pub mod response;
pub mod transport;

use log::debug;

use crate::app::ports::{EventSink, GpioPort};
use crate::app::service::ServoService;
use crate::error::CommandError;

use codec::Line;
use response::Response;

/// Decode, parse and apply one input line.  Always yields exactly one response.
pub fn dispatch_line(
    line: Line<'_>,
    service: &mut ServoService,
    gpio: &mut impl GpioPort,
    sink: &mut impl EventSink,
) -> Response {
    let text = match line {
        Line::Text(text) => text,
        Line::Overflow => {
            debug!("protocol: over-long line discarded");
            return CommandError::InvalidCommand.into();
        }
        Line::Invalid => {
            debug!("protocol: non-UTF-8 line discarded");
            return CommandError::InvalidCommand.into();
        }
    };

    match parser::parse(text) {
        Ok(command) => service.handle(command, gpio, sink),
        Err(e) => {
            debug!("protocol: {:?} -> {}", text, e);
            e.into()
        }
    }
}
