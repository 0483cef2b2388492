//! Fuzz target: parser + `ServoService` via `dispatch_line`
//!
//! Every input line must produce exactly one well-formed reply, and no
//! sequence of commands may push a channel outside the safety envelope.
//!
//! cargo fuzz run fuzz_command_dispatch

#![no_main]

use libfuzzer_sys::fuzz_target;
use piservo::adapters::sim_gpio::SimGpio;
use piservo::app::events::AppEvent;
use piservo::app::ports::EventSink;
use piservo::app::service::ServoService;
use piservo::protocol::codec::LineDecoder;
use piservo::protocol::dispatch_line;
use piservo::safety::{ABSOLUTE_MAX_US, ABSOLUTE_MIN_US};

struct Discard;

impl EventSink for Discard {
    fn emit(&mut self, _event: &AppEvent) {}
}

fuzz_target!(|data: &[u8]| {
    let mut service = ServoService::new();
    let mut gpio = SimGpio::new();
    let mut decoder = LineDecoder::new();

    decoder.feed(data, |line| {
        let reply = dispatch_line(line, &mut service, &mut gpio, &mut Discard).render();
        assert!(reply.ends_with('\n'));
        assert_eq!(reply.matches('\n').count(), 1);
    });

    for ch in service.controller().channels() {
        let (lo, hi) = ch.range();
        assert!(ABSOLUTE_MIN_US <= lo && lo < hi && hi <= ABSOLUTE_MAX_US);
        assert!(lo <= ch.pulse_us() && ch.pulse_us() <= hi);
        assert!(!ch.is_enabled() || ch.is_configured());
    }
});
