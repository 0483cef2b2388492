//! The cooperative control loop.
//!
//! One thread, no locks.  Each iteration:
//!
//! ```text
//!  ┌──────────────┐   ┌──────────────────┐   ┌─────────────────────┐
//!  │ (a) frame    │──▶│ (b) poll         │──▶│ (c) apply lines     │──┐
//!  │  wait + edges│   │  accept ≤ 1,     │   │  service.handle()   │  │
//!  └──────────────┘   │  drain readable  │   │  queue responses    │  │
//!         ▲           └──────────────────┘   └─────────────────────┘  │
//!         └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The scheduler reads the channel table only while the control plane is
//! idle, so a command applied in iteration N is fully visible from frame
//! N+1 and never half-applied within a frame.

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, FrameTimer, GpioPort};
use crate::app::service::ServoService;
use crate::config::DaemonConfig;
use crate::protocol::{self, transport::ControlTransport};
use crate::scheduler::{FrameOutcome, FrameScheduler, FrameStats};

/// Owns every moving part of the daemon and drives them in lockstep.
pub struct ControlLoop<H, T, E> {
    hw: H,
    transport: T,
    sink: E,
    service: ServoService,
    scheduler: FrameScheduler,
    frame_period_us: u32,
    stats_interval_frames: u64,
}

impl<H, T, E> ControlLoop<H, T, E>
where
    H: GpioPort + FrameTimer,
    T: ControlTransport,
    E: EventSink,
{
    pub fn new(hw: H, transport: T, sink: E, config: &DaemonConfig) -> Self {
        Self {
            hw,
            transport,
            sink,
            service: ServoService::new(),
            scheduler: FrameScheduler::with_period(config.frame_period_us),
            frame_period_us: config.frame_period_us,
            stats_interval_frames: config.stats_interval_frames,
        }
    }

    /// Run one frame, then one non-blocking pass over the control plane.
    pub fn run_iteration(&mut self) -> FrameOutcome {
        let Self {
            hw,
            transport,
            sink,
            service,
            scheduler,
            stats_interval_frames,
            ..
        } = self;

        let outcome = scheduler.run_frame(service.controller(), &mut *hw);

        transport.poll(|_client, line| {
            protocol::dispatch_line(line, &mut *service, &mut *hw, &mut *sink)
        });

        let stats = scheduler.stats();
        if outcome != FrameOutcome::Skipped
            && *stats_interval_frames > 0
            && stats.frames % *stats_interval_frames == 0
        {
            sink.emit(&AppEvent::FrameStats(stats));
        }

        outcome
    }

    /// Loop until `stop` returns `true`.  Checked between iterations only.
    pub fn run(&mut self, stop: impl Fn() -> bool) {
        self.sink.emit(&AppEvent::Started {
            frame_period_us: self.frame_period_us,
        });
        while !stop() {
            self.run_iteration();
        }
        info!("control loop: stop requested");
    }

    /// Release every channel and close the control plane.
    ///
    /// The loop must not be run again afterwards.
    pub fn shutdown(&mut self) {
        self.service.shutdown(&mut self.hw);
        self.transport.close_all();
        self.sink.emit(&AppEvent::Stopped(self.scheduler.stats()));
    }

    pub fn service(&self) -> &ServoService {
        &self.service
    }

    pub fn stats(&self) -> FrameStats {
        self.scheduler.stats()
    }

    pub fn hw(&self) -> &H {
        &self.hw
    }

    pub fn hw_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }
}
