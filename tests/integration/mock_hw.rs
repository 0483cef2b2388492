//! Mock adapters for integration tests.
//!
//! `MockHardware` records every pin write and sleep against a virtual
//! clock, so tests can assert on exact edge timing without real GPIO
//! registers.  `ScriptedTransport` feeds canned client bytes into the
//! control loop one batch per poll and collects the replies.

use std::collections::{BTreeMap, VecDeque};

use piservo::app::events::AppEvent;
use piservo::app::ports::{EventSink, FrameTimer, GpioPin, GpioPort, MAX_GPIO_PIN, PinMode};
use piservo::error::Result;
use piservo::protocol::codec::{Line, LineDecoder};
use piservo::protocol::response::Response;
use piservo::protocol::transport::{ClientId, ControlTransport};

const PINS: usize = MAX_GPIO_PIN as usize + 1;

// ── Hardware call record ──────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwCall {
    Mode(u8, PinMode),
    High { pin: u8, at_us: u64 },
    Low { pin: u8, at_us: u64 },
    Sleep(u32),
    Wait,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<HwCall>,
    pub modes: [PinMode; PINS],
    pub levels: [bool; PINS],
    /// Results returned by successive `wait_frame` calls; `Ok(1)` once empty.
    pub waits: VecDeque<Result<u64>>,
    /// Microseconds since the current frame boundary.
    frame_us: u64,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            modes: [PinMode::Input; PINS],
            levels: [false; PINS],
            waits: VecDeque::new(),
            frame_us: 0,
        }
    }

    /// Calls recorded during frame `n` (0-based), excluding the wait itself.
    pub fn frame(&self, n: usize) -> Vec<HwCall> {
        self.calls
            .split(|c| *c == HwCall::Wait)
            .nth(n + 1)
            .map(<[HwCall]>::to_vec)
            .unwrap_or_default()
    }

    /// `(pin, high?, at_us)` edges of frame `n`.
    pub fn edges(&self, n: usize) -> Vec<(u8, bool, u64)> {
        self.frame(n)
            .into_iter()
            .filter_map(|c| match c {
                HwCall::High { pin, at_us } => Some((pin, true, at_us)),
                HwCall::Low { pin, at_us } => Some((pin, false, at_us)),
                _ => None,
            })
            .collect()
    }

    pub fn frames_waited(&self) -> usize {
        self.calls.iter().filter(|c| **c == HwCall::Wait).count()
    }

    pub fn mode(&self, pin: u8) -> PinMode {
        self.modes[usize::from(pin)]
    }

    pub fn level(&self, pin: u8) -> bool {
        self.levels[usize::from(pin)]
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioPort for MockHardware {
    fn set_mode(&mut self, pin: GpioPin, mode: PinMode) {
        self.modes[usize::from(pin.index())] = mode;
        self.calls.push(HwCall::Mode(pin.index(), mode));
    }

    fn set_high(&mut self, pin: GpioPin) {
        self.levels[usize::from(pin.index())] = true;
        self.calls.push(HwCall::High {
            pin: pin.index(),
            at_us: self.frame_us,
        });
    }

    fn set_low(&mut self, pin: GpioPin) {
        self.levels[usize::from(pin.index())] = false;
        self.calls.push(HwCall::Low {
            pin: pin.index(),
            at_us: self.frame_us,
        });
    }

    fn read_level(&self, pin: GpioPin) -> bool {
        self.levels[usize::from(pin.index())]
    }
}

impl FrameTimer for MockHardware {
    fn wait_frame(&mut self) -> Result<u64> {
        self.calls.push(HwCall::Wait);
        self.frame_us = 0;
        self.waits.pop_front().unwrap_or(Ok(1))
    }

    fn sleep_us(&mut self, micros: u32) {
        self.frame_us += u64::from(micros);
        self.calls.push(HwCall::Sleep(micros));
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── ScriptedTransport ─────────────────────────────────────────

/// One batch of client input is delivered per `poll`.
#[derive(Default)]
pub struct ScriptedTransport {
    pub batches: VecDeque<Vec<(ClientId, Vec<u8>)>>,
    pub replies: BTreeMap<ClientId, String>,
    pub polls: usize,
    pub closed: bool,
    decoders: BTreeMap<ClientId, LineDecoder>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a batch for a future poll.
    pub fn then(mut self, batch: &[(ClientId, &str)]) -> Self {
        self.push(batch);
        self
    }

    pub fn push(&mut self, batch: &[(ClientId, &str)]) {
        self.batches.push_back(
            batch
                .iter()
                .map(|(id, text)| (*id, text.as_bytes().to_vec()))
                .collect(),
        );
    }

    /// Queue an empty poll.
    pub fn idle(mut self) -> Self {
        self.batches.push_back(Vec::new());
        self
    }

    pub fn replies_for(&self, client: ClientId) -> &str {
        self.replies.get(&client).map_or("", String::as_str)
    }
}

impl ControlTransport for ScriptedTransport {
    fn poll<F>(&mut self, mut handler: F)
    where
        F: FnMut(ClientId, Line<'_>) -> Response,
    {
        self.polls += 1;
        let Some(batch) = self.batches.pop_front() else {
            return;
        };
        for (client, bytes) in batch {
            let out = self.replies.entry(client).or_default();
            self.decoders.entry(client).or_default().feed(&bytes, |line| {
                out.push_str(&handler(client, line).to_string());
            });
        }
    }

    fn connected(&self) -> usize {
        if self.closed { 0 } else { self.decoders.len() }
    }

    fn close_all(&mut self) {
        self.closed = true;
        self.decoders.clear();
    }
}
