//! Integration tests for the line → parser → ServoService pipeline.
//!
//! Drive raw protocol text through `dispatch_line` and check the exact
//! reply bytes plus the pin side effects on the mock register bank.

use crate::mock_hw::{HwCall, MockHardware, RecordingSink};

use piservo::app::events::AppEvent;
use piservo::app::ports::PinMode;
use piservo::app::service::ServoService;
use piservo::protocol::codec::LineDecoder;
use piservo::protocol::dispatch_line;

struct Session {
    service: ServoService,
    hw: MockHardware,
    sink: RecordingSink,
    decoder: LineDecoder,
}

impl Session {
    fn new() -> Self {
        Self {
            service: ServoService::new(),
            hw: MockHardware::new(),
            sink: RecordingSink::default(),
            decoder: LineDecoder::new(),
        }
    }

    /// Feed raw client bytes; return the concatenated replies.
    fn send(&mut self, text: &str) -> String {
        let Self {
            service,
            hw,
            sink,
            decoder,
        } = self;
        let mut out = String::new();
        decoder.feed(text.as_bytes(), |line| {
            out.push_str(&dispatch_line(line, &mut *service, &mut *hw, &mut *sink).to_string());
        });
        out
    }
}

#[test]
fn setup_enable_pulse_scenario() {
    let mut s = Session::new();
    assert_eq!(s.send("SETUP 0 GPIO 17\n"), "OK\n");
    assert_eq!(s.send("GET 0 STATE\n"), "GPIO 17 ENABLE 0\n");
    assert_eq!(s.send("ENABLE 0\n"), "OK\n");
    assert_eq!(s.send("SET 0 PULSE 1200\n"), "OK\n");
    assert_eq!(s.send("GET 0 PULSE\n"), "PULSE 1200\n");
    assert_eq!(s.send("GET 0 STATE\n"), "GPIO 17 ENABLE 1\n");
}

#[test]
fn inverted_range_rejected() {
    let mut s = Session::new();
    assert_eq!(
        s.send("SET 0 RANGE 2000 1000\n"),
        "ERROR Invalid range: min must be less than max\n"
    );
    assert_eq!(s.send("GET 0 RANGE\n"), "RANGE 1000 2000\n");
}

#[test]
fn unconfigured_channel_rejects_pulse() {
    let mut s = Session::new();
    assert_eq!(s.send("SET 1 PULSE 1500\n"), "ERROR Channel not configured\n");
    assert_eq!(s.send("ENABLE 1\n"), "ERROR Channel not configured\n");
    assert_eq!(s.send("GET 1 STATE\n"), "GPIO -1 ENABLE 0\n");
}

#[test]
fn error_messages_are_exact() {
    let mut s = Session::new();
    assert_eq!(s.send("ENABLE 8\n"), "ERROR Invalid channel\n");
    assert_eq!(s.send("SETUP 0 GPIO 28\n"), "ERROR Invalid GPIO pin\n");
    assert_eq!(s.send("JUMP 0\n"), "ERROR Unknown command\n");
    assert_eq!(s.send("SET 0 PULSE\n"), "ERROR Invalid command\n");
    assert_eq!(s.send("GET 0 WIDTH\n"), "ERROR Invalid command\n");
    assert_eq!(s.send("\n"), "ERROR Invalid command\n");
}

#[test]
fn pipelined_commands_answered_in_order() {
    let mut s = Session::new();
    let replies = s.send("SETUP 2 GPIO 22\nENABLE 2\nSET 2 PULSE 1700\nGET 2 PULSE\nBOGUS\n");
    assert_eq!(replies, "OK\nOK\nOK\nPULSE 1700\nERROR Unknown command\n");
}

#[test]
fn partial_lines_survive_between_reads() {
    let mut s = Session::new();
    assert_eq!(s.send("SETUP 0 GP"), "");
    assert_eq!(s.send("IO 4\nGET 0 ST"), "OK\n");
    assert_eq!(s.send("ATE\r\n"), "GPIO 4 ENABLE 0\n");
}

#[test]
fn over_long_line_gets_one_error() {
    let mut s = Session::new();
    let long = format!("SET 0 PULSE {}\nGET 0 RANGE\n", "9".repeat(400));
    assert_eq!(s.send(&long), "ERROR Invalid command\nRANGE 1000 2000\n");
}

#[test]
fn keywords_case_insensitive() {
    let mut s = Session::new();
    assert_eq!(s.send("setup 3 gpio 5\nEnAbLe 3\nget 3 state\n"), "OK\nOK\nGPIO 5 ENABLE 1\n");
}

#[test]
fn pulse_clamped_silently_to_range() {
    let mut s = Session::new();
    s.send("SETUP 0 GPIO 17\nSET 0 RANGE 600 2400\n");
    assert_eq!(s.send("SET 0 PULSE 100\n"), "OK\n");
    assert_eq!(s.send("GET 0 PULSE\n"), "PULSE 600\n");
    assert_eq!(s.send("SET 0 PULSE 9000\n"), "OK\n");
    assert_eq!(s.send("GET 0 PULSE\n"), "PULSE 2400\n");
    assert!(
        s.sink
            .events
            .iter()
            .any(|e| matches!(e, AppEvent::PulseClamped { requested: 9000, applied: 2400, .. }))
    );
}

#[test]
fn range_clamped_to_absolute_bounds() {
    let mut s = Session::new();
    assert_eq!(s.send("SET 4 RANGE 100 3000\n"), "OK\n");
    assert_eq!(s.send("GET 4 RANGE\n"), "RANGE 500 2500\n");
    assert_eq!(
        s.send("SET 4 RANGE 100 300\n"),
        "ERROR Invalid range: min must be less than max\n"
    );
    assert_eq!(s.send("GET 4 RANGE\n"), "RANGE 500 2500\n");
}

#[test]
fn disable_twice_ok_and_pin_low() {
    let mut s = Session::new();
    s.send("SETUP 0 GPIO 17\nENABLE 0\n");
    assert_eq!(s.send("DISABLE 0\nDISABLE 0\n"), "OK\nOK\n");
    assert!(!s.hw.level(17));
    assert_eq!(s.send("GET 0 STATE\n"), "GPIO 17 ENABLE 0\n");
}

#[test]
fn setup_drives_low_before_output() {
    let mut s = Session::new();
    s.send("SETUP 0 GPIO 17\n");
    let writes: Vec<_> = s
        .hw
        .calls
        .iter()
        .filter(|c| !matches!(c, HwCall::Wait))
        .copied()
        .collect();
    assert!(matches!(writes[0], HwCall::Low { pin: 17, .. }));
    assert_eq!(writes[1], HwCall::Mode(17, PinMode::Output));
}

#[test]
fn moving_a_channel_releases_its_old_pin() {
    let mut s = Session::new();
    s.send("SETUP 0 GPIO 17\nSETUP 0 GPIO 27\n");
    assert_eq!(s.hw.mode(17), PinMode::Input);
    assert_eq!(s.hw.mode(27), PinMode::Output);
}

#[test]
fn errors_leave_other_channels_untouched() {
    let mut s = Session::new();
    s.send("SETUP 0 GPIO 17\nENABLE 0\nSET 0 PULSE 1300\n");
    s.send("SET 9 PULSE 2000\nSET 1 PULSE 2000\nSET 0 RANGE 5 1\nXYZ\n");
    assert_eq!(s.send("GET 0 PULSE\nGET 0 STATE\n"), "PULSE 1300\nGPIO 17 ENABLE 1\n");
}
