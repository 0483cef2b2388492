//! End-to-end control loop: scripted clients, virtual-time hardware.

use std::cell::Cell;

use crate::mock_hw::{HwCall, MockHardware, RecordingSink, ScriptedTransport};

use piservo::app::events::AppEvent;
use piservo::app::ports::PinMode;
use piservo::config::DaemonConfig;
use piservo::daemon::ControlLoop;
use piservo::error::Error;
use piservo::protocol::transport::{ControlTransport, NullTransport};
use piservo::scheduler::FrameOutcome;

use nix::errno::Errno;

type Loop = ControlLoop<MockHardware, ScriptedTransport, RecordingSink>;

fn control_loop(transport: ScriptedTransport) -> Loop {
    ControlLoop::new(
        MockHardware::new(),
        transport,
        RecordingSink::default(),
        &DaemonConfig::default(),
    )
}

#[test]
fn command_takes_effect_from_next_frame() {
    let transport = ScriptedTransport::new()
        .then(&[(0, "SETUP 0 GPIO 17\nENABLE 0\n")])
        .idle();
    let mut daemon = control_loop(transport);

    daemon.run_iteration();
    daemon.run_iteration();

    // Frame 0 ran before the commands arrived.
    assert!(daemon.hw().edges(0).is_empty());
    assert_eq!(daemon.hw().edges(1), vec![(17, true, 0), (17, false, 1500)]);
}

#[test]
fn pulse_change_never_splits_a_frame() {
    let transport = ScriptedTransport::new()
        .then(&[(0, "SETUP 0 GPIO 17\nENABLE 0\nSET 0 PULSE 1000\n")])
        .then(&[(0, "SET 0 PULSE 2000\n")])
        .idle();
    let mut daemon = control_loop(transport);
    for _ in 0..3 {
        daemon.run_iteration();
    }

    assert_eq!(daemon.hw().edges(1), vec![(17, true, 0), (17, false, 1000)]);
    assert_eq!(daemon.hw().edges(2), vec![(17, true, 0), (17, false, 2000)]);
}

#[test]
fn replies_go_to_the_right_client() {
    let transport = ScriptedTransport::new()
        .then(&[(0, "SETUP 1 GPIO 5\n"), (1, "GET 1 STATE\n")])
        .then(&[(1, "GET 2 STATE\nBAD\n")]);
    let mut daemon = control_loop(transport);
    daemon.run_iteration();
    daemon.run_iteration();

    let t = daemon.transport_mut();
    assert_eq!(t.replies_for(0), "OK\n");
    assert_eq!(
        t.replies_for(1),
        "GPIO 5 ENABLE 0\nGPIO -1 ENABLE 0\nERROR Unknown command\n"
    );
}

#[test]
fn partial_line_completed_in_a_later_poll() {
    let transport = ScriptedTransport::new()
        .then(&[(4, "SETUP 0 GP")])
        .then(&[(4, "IO 9\nGET 0 STATE\n")]);
    let mut daemon = control_loop(transport);
    daemon.run_iteration();
    assert_eq!(daemon.transport_mut().replies_for(4), "");
    daemon.run_iteration();
    assert_eq!(daemon.transport_mut().replies_for(4), "OK\nGPIO 9 ENABLE 0\n");
}

#[test]
fn overrun_keeps_the_loop_running() {
    let transport = ScriptedTransport::new()
        .then(&[(0, "SETUP 0 GPIO 17\nENABLE 0\n")])
        .then(&[(0, "GET 0 PULSE\n")]);
    let mut daemon = control_loop(transport);
    daemon.run_iteration();
    daemon.hw_mut().waits.push_back(Ok(5));

    assert_eq!(daemon.run_iteration(), FrameOutcome::Overrun { missed: 4 });
    assert_eq!(daemon.hw().edges(1).len(), 2);
    assert_eq!(daemon.transport_mut().replies_for(0), "OK\nOK\nPULSE 1500\n");
    assert_eq!(daemon.stats().missed_frames, 4);
}

#[test]
fn broken_timer_sleeps_a_period_per_skipped_frame() {
    let transport = ScriptedTransport::new().then(&[(0, "SETUP 0 GPIO 17\nENABLE 0\n")]);
    let config = DaemonConfig {
        frame_period_us: 10_000,
        ..DaemonConfig::default()
    };
    let mut daemon = ControlLoop::new(MockHardware::new(), transport, RecordingSink::default(), &config);
    daemon.run_iteration();
    for _ in 0..3 {
        daemon.hw_mut().waits.push_back(Err(Error::Os {
            op: "timerfd read",
            errno: Errno::EBADF,
        }));
    }

    for _ in 0..3 {
        assert_eq!(daemon.run_iteration(), FrameOutcome::Skipped);
    }
    for n in 1..=3 {
        assert_eq!(daemon.hw().frame(n), vec![HwCall::Sleep(10_000)]);
    }
    assert_eq!(daemon.stats().failed_waits, 3);

    // The timer recovers and framing resumes.
    assert_eq!(daemon.run_iteration(), FrameOutcome::OnTime);
    assert_eq!(daemon.hw().edges(4), vec![(17, true, 0), (17, false, 1500)]);
}

#[test]
fn stats_event_on_interval() {
    let config = DaemonConfig {
        stats_interval_frames: 3,
        ..DaemonConfig::default()
    };
    let mut daemon = ControlLoop::new(
        MockHardware::new(),
        ScriptedTransport::new(),
        RecordingSink::default(),
        &config,
    );
    for _ in 0..7 {
        daemon.run_iteration();
    }

    let frames: Vec<u64> = daemon
        .sink()
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::FrameStats(s) => Some(s.frames),
            _ => None,
        })
        .collect();
    assert_eq!(frames, vec![3, 6]);
}

#[test]
fn stats_disabled_with_zero_interval() {
    let config = DaemonConfig {
        stats_interval_frames: 0,
        ..DaemonConfig::default()
    };
    let mut daemon = ControlLoop::new(
        MockHardware::new(),
        ScriptedTransport::new(),
        RecordingSink::default(),
        &config,
    );
    for _ in 0..5 {
        daemon.run_iteration();
    }
    assert!(daemon.sink().events.is_empty());
}

#[test]
fn run_stops_when_asked() {
    let mut daemon = control_loop(ScriptedTransport::new());
    let iterations = Cell::new(0);
    daemon.run(|| {
        iterations.set(iterations.get() + 1);
        iterations.get() > 4
    });

    // The stop check runs once before every iteration.
    assert_eq!(daemon.hw().frames_waited(), 4);
    assert!(matches!(
        daemon.sink().events.first(),
        Some(AppEvent::Started { frame_period_us: 20_000 })
    ));
}

#[test]
fn shutdown_releases_pins_and_closes_clients() {
    let transport = ScriptedTransport::new().then(&[(
        0,
        "SETUP 0 GPIO 17\nENABLE 0\nSETUP 1 GPIO 18\nENABLE 1\n",
    )]);
    let mut daemon = control_loop(transport);
    daemon.run_iteration();
    daemon.run_iteration();
    assert_eq!(daemon.hw().mode(17), PinMode::Output);
    assert_eq!(daemon.transport().connected(), 1);

    daemon.shutdown();

    for pin in [17, 18] {
        assert_eq!(daemon.hw().mode(pin), PinMode::Input);
        assert!(!daemon.hw().level(pin));
    }
    assert!(daemon.transport().closed);
    assert_eq!(daemon.transport().connected(), 0);
    assert!(!daemon.service().controller().channels().iter().any(|c| c.is_enabled()));
}

#[test]
fn shutdown_reports_final_stats() {
    let mut daemon = control_loop(ScriptedTransport::new());
    for _ in 0..3 {
        daemon.run_iteration();
    }
    daemon.shutdown();

    match daemon.sink().events.last() {
        Some(AppEvent::Stopped(stats)) => assert_eq!(stats.frames, 3),
        other => panic!("expected Stopped, got {other:?}"),
    }
}

#[test]
fn headless_loop_keeps_framing() {
    let mut daemon = ControlLoop::new(
        MockHardware::new(),
        NullTransport,
        RecordingSink::default(),
        &DaemonConfig::default(),
    );
    for _ in 0..3 {
        assert_eq!(daemon.run_iteration(), FrameOutcome::OnTime);
    }
    assert_eq!(daemon.transport().connected(), 0);
    assert_eq!(daemon.stats().frames, 3);
}
