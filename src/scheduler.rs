//! PWM frame scheduler.
//!
//! Once per frame period every enabled channel emits one high-then-low
//! pulse.  All pins rise together; they fall in ascending pulse order, so a
//! frame costs one sleep per enabled channel instead of one wake-up per
//! microsecond.
//!
//! ```text
//!  boundary                                              next boundary
//!     │◀──────────────────── 20 000 µs ────────────────────▶│
//!     ▼                                                     ▼
//! ch0 ▔▔▔▔▔▔▔▔▔▔╲______________________________________________▁
//! ch1 ▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔▔╲________________________________________▁
//!     │─ 1000 µs ─│─800─│────────── idle (wait absorbs) ────────│
//! ```
//!
//! The channel table is read once per frame into a [`FramePlan`], so a
//! command applied between frames is seen whole by the next frame.

use log::{error, warn};

use crate::app::ports::{FrameTimer, GpioPin, GpioPort};
use crate::servo::{ChannelId, MAX_CHANNELS, ServoController};

/// Frame period for 50 Hz servo signals (µs).
pub const FRAME_PERIOD_US: u32 = 20_000;

// ═══════════════════════════════════════════════════════════════
//  Frame plan
// ═══════════════════════════════════════════════════════════════

/// One falling edge: sleep `delay_us` after the previous edge, then drive `pin` low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallingEdge {
    pub channel: ChannelId,
    pub pin: GpioPin,
    pub delay_us: u32,
}

/// Snapshot of one frame's edges, taken from the channel table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FramePlan {
    rising: heapless::Vec<GpioPin, MAX_CHANNELS>,
    falling: heapless::Vec<FallingEdge, MAX_CHANNELS>,
}

impl FramePlan {
    /// Build the plan for the current channel table.
    pub fn build(controller: &ServoController) -> Self {
        let mut plan = Self::default();

        for ch in controller.channels().iter().filter(|c| c.is_enabled()) {
            if let Some(pin) = ch.pin() {
                // Capacity equals the channel count, so this cannot overflow.
                let _ = plan.rising.push(pin);
            }
        }

        // Stable sort: equal widths keep channel-id order.
        let mut order: heapless::Vec<ChannelId, MAX_CHANNELS> = ChannelId::all().collect();
        order.sort_by_key(|&id| controller.channel(id).pulse_us());

        let mut baseline: i16 = 0;
        for id in order {
            let ch = controller.channel(id);
            let (true, Some(pin)) = (ch.is_enabled(), ch.pin()) else {
                continue;
            };
            let pulse = ch.pulse_us();
            let _ = plan.falling.push(FallingEdge {
                channel: id,
                pin,
                delay_us: u32::from(pulse.abs_diff(baseline)),
            });
            baseline = pulse;
        }

        plan
    }

    /// Pins driven high at the frame boundary, in channel-id order.
    pub fn rising(&self) -> &[GpioPin] {
        &self.rising
    }

    /// Falling edges in emission order.
    pub fn falling(&self) -> &[FallingEdge] {
        &self.falling
    }

    pub fn is_idle(&self) -> bool {
        self.rising.is_empty()
    }

    /// Time from the rising edge to the last falling edge (µs).
    pub fn active_us(&self) -> u32 {
        self.falling.iter().map(|e| e.delay_us).sum()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Statistics
// ═══════════════════════════════════════════════════════════════

/// Running counters kept by the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames whose edges were emitted.
    pub frames: u64,
    /// Waits that reported more than one expiration.
    pub overruns: u64,
    /// Total frames skipped across all overruns.
    pub missed_frames: u64,
    /// Waits that failed outright (frame skipped).
    pub failed_waits: u64,
}

/// What happened in one call to [`FrameScheduler::run_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Edges emitted on time.
    OnTime,
    /// Edges emitted after `missed` frames were skipped.
    Overrun { missed: u64 },
    /// The wait failed; nothing was emitted and the thread slept one
    /// frame period instead.
    Skipped,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

/// Emits one PWM frame per call.
#[derive(Debug)]
pub struct FrameScheduler {
    stats: FrameStats,
    /// Back-off after a failed wait, so a broken timer cannot spin the loop.
    retry_us: u32,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::with_period(FRAME_PERIOD_US)
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_period(period_us: u32) -> Self {
        Self {
            stats: FrameStats::default(),
            retry_us: period_us,
        }
    }

    /// Wait for the next frame boundary and emit this frame's pulses.
    ///
    /// Missed frames are counted, never replayed.
    pub fn run_frame(
        &mut self,
        controller: &ServoController,
        hw: &mut (impl GpioPort + FrameTimer),
    ) -> FrameOutcome {
        let outcome = match hw.wait_frame() {
            Ok(expirations) if expirations > 1 => {
                let missed = expirations - 1;
                self.stats.overruns += 1;
                self.stats.missed_frames += missed;
                warn!("scheduler: missed {} PWM frame(s)", missed);
                FrameOutcome::Overrun { missed }
            }
            Ok(_) => FrameOutcome::OnTime,
            Err(e) => {
                self.stats.failed_waits += 1;
                error!("scheduler: frame wait failed: {e}");
                hw.sleep_us(self.retry_us);
                return FrameOutcome::Skipped;
            }
        };

        let plan = FramePlan::build(controller);
        Self::emit(&plan, hw);
        self.stats.frames += 1;
        outcome
    }

    /// Drive one planned frame onto the pins.
    pub fn emit(plan: &FramePlan, hw: &mut (impl GpioPort + FrameTimer)) {
        for &pin in plan.rising() {
            hw.set_high(pin);
        }
        for edge in plan.falling() {
            if edge.delay_us > 0 {
                hw.sleep_us(edge.delay_us);
            }
            hw.set_low(edge.pin);
        }
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }
}
