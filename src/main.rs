//! piservod — software PWM servo daemon, main entry point.
//!
//! Hexagonal architecture with a single cooperative loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  GpioMem / SimGpio   FrameClock    UnixSocketServer            │
//! │  (GpioPort)          (FrameTimer)  (ControlTransport)          │
//! │  LogEventSink        RealtimeGuard signals                     │
//! │  (EventSink)                                                   │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  ControlLoop: FrameScheduler · ServoService            │    │
//! │  │               ServoController (safety clamps)          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use piservo::adapters::frame_clock::FrameClock;
use piservo::adapters::gpiomem::GpioMem;
use piservo::adapters::hardware::HardwareAdapter;
use piservo::adapters::log_sink::LogEventSink;
use piservo::adapters::realtime::RealtimeGuard;
use piservo::adapters::signals;
use piservo::adapters::sim_gpio::SimGpio;
use piservo::adapters::unix_socket::UnixSocketServer;
use piservo::app::ports::GpioPort;
use piservo::config::{DaemonConfig, GpioBackend};
use piservo::daemon::ControlLoop;

/// Software PWM servo daemon for Raspberry Pi GPIO.
#[derive(Debug, Parser)]
#[command(name = "piservod", version, about)]
struct Args {
    /// JSON configuration file (defaults apply to missing fields)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Control socket path (overrides the config file)
    #[arg(short, long, value_name = "PATH")]
    socket: Option<PathBuf>,

    /// Drive an in-memory pin bank instead of /dev/gpiomem
    #[arg(long)]
    simulate: bool,
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  piservod v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Configuration: defaults ← file ← flags ─────────────
    let args = Args::parse();
    let mut config = DaemonConfig::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(socket) = args.socket {
        config.socket_path = socket;
    }
    if args.simulate {
        config.gpio_backend = GpioBackend::Simulated;
    }
    config.validate().context("validating configuration")?;

    // ── 3. Register backend ───────────────────────────────────
    match config.gpio_backend {
        GpioBackend::Mmap => {
            let gpio = GpioMem::open(&config.gpio_device)
                .with_context(|| format!("mapping {}", config.gpio_device.display()))?;
            run(gpio, &config)
        }
        GpioBackend::Simulated => run(SimGpio::new(), &config),
    }
}

/// Acquire the remaining resources, run until signalled, then tear down.
///
/// Resources already acquired are released by `Drop` if a later step fails.
fn run<G: GpioPort>(gpio: G, config: &DaemonConfig) -> Result<()> {
    // ── 4. Frame timer + real-time priority ───────────────────
    let clock = FrameClock::new(config.frame_period_us).context("creating frame timer")?;
    let _realtime = RealtimeGuard::acquire(config.realtime_priority);

    // ── 5. Signals ────────────────────────────────────────────
    signals::install().context("installing signal handlers")?;

    // ── 6. Control socket ─────────────────────────────────────
    let server = UnixSocketServer::bind(&config.socket_path, config.socket_mode, config.max_clients)
        .with_context(|| format!("binding {}", config.socket_path.display()))?;

    // ── 7. Loop ───────────────────────────────────────────────
    let mut daemon = ControlLoop::new(
        HardwareAdapter::new(gpio, clock),
        server,
        LogEventSink::new(),
        config,
    );
    info!("Servo daemon running. Entering control loop.");
    daemon.run(signals::stop_requested);

    // ── 8. Shutdown ───────────────────────────────────────────
    info!("Shutting down...");
    daemon.shutdown();
    info!("Shutdown complete");
    Ok(())
}
