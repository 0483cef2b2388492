//! Command grammar.
//!
//! ```text
//! SETUP <ch> GPIO <pin>
//! ENABLE <ch>
//! DISABLE <ch>
//! SET <ch> RANGE <min> <max>
//! SET <ch> PULSE <value>
//! GET <ch> RANGE | PULSE | STATE
//! ```
//!
//! Keywords are case-insensitive; tokens are separated by ASCII whitespace.
//! Numbers are parsed as signed decimal `i64`.  The parser only checks
//! shape; value ranges are the service's job.

use crate::app::commands::{Action, Command};
use crate::error::CommandError;

/// Parse one line (without terminator) into a [`Command`].
///
/// An unrecognised first keyword is [`CommandError::UnknownCommand`]; every
/// other shape problem, including an empty line or trailing tokens, is
/// [`CommandError::InvalidCommand`].
pub fn parse(line: &str) -> Result<Command, CommandError> {
    let mut tokens = line.split_ascii_whitespace();
    let verb = tokens.next().ok_or(CommandError::InvalidCommand)?;

    let command = if verb.eq_ignore_ascii_case("SETUP") {
        let channel = number(tokens.next())?;
        keyword(tokens.next(), "GPIO")?;
        let pin = number(tokens.next())?;
        Command::new(channel, Action::Setup { pin })
    } else if verb.eq_ignore_ascii_case("ENABLE") {
        Command::new(number(tokens.next())?, Action::Enable)
    } else if verb.eq_ignore_ascii_case("DISABLE") {
        Command::new(number(tokens.next())?, Action::Disable)
    } else if verb.eq_ignore_ascii_case("SET") {
        let channel = number(tokens.next())?;
        let sub = tokens.next().ok_or(CommandError::InvalidCommand)?;
        let action = if sub.eq_ignore_ascii_case("RANGE") {
            let min = number(tokens.next())?;
            let max = number(tokens.next())?;
            Action::SetRange { min, max }
        } else if sub.eq_ignore_ascii_case("PULSE") {
            Action::SetPulse {
                value: number(tokens.next())?,
            }
        } else {
            return Err(CommandError::InvalidCommand);
        };
        Command::new(channel, action)
    } else if verb.eq_ignore_ascii_case("GET") {
        let channel = number(tokens.next())?;
        let sub = tokens.next().ok_or(CommandError::InvalidCommand)?;
        let action = if sub.eq_ignore_ascii_case("RANGE") {
            Action::GetRange
        } else if sub.eq_ignore_ascii_case("PULSE") {
            Action::GetPulse
        } else if sub.eq_ignore_ascii_case("STATE") {
            Action::GetState
        } else {
            return Err(CommandError::InvalidCommand);
        };
        Command::new(channel, action)
    } else {
        return Err(CommandError::UnknownCommand);
    };

    if tokens.next().is_some() {
        return Err(CommandError::InvalidCommand);
    }
    Ok(command)
}

fn number(token: Option<&str>) -> Result<i64, CommandError> {
    token
        .and_then(|t| t.parse().ok())
        .ok_or(CommandError::InvalidCommand)
}

fn keyword(token: Option<&str>, expected: &str) -> Result<(), CommandError> {
    match token {
        Some(t) if t.eq_ignore_ascii_case(expected) => Ok(()),
        _ => Err(CommandError::InvalidCommand),
    }
}
