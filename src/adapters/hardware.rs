//! Hardware adapter — bridges the register bank and the frame clock to the
//! domain port traits.
//!
//! The scheduler needs pin writes and timing from one `&mut` handle
//! (`impl GpioPort + FrameTimer`); this adapter owns both halves and
//! forwards each trait to its half.  The GPIO half is generic so the
//! simulated bank and the mapped register block share the same loop.

use crate::app::ports::{FrameTimer, GpioPin, GpioPort, PinMode};
use crate::error::Result;

/// Concrete adapter that combines pins and clock behind the port traits.
pub struct HardwareAdapter<G, C> {
    gpio: G,
    clock: C,
}

impl<G, C> HardwareAdapter<G, C> {
    pub fn new(gpio: G, clock: C) -> Self {
        Self { gpio, clock }
    }

    pub fn gpio(&self) -> &G {
        &self.gpio
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

// ── GpioPort implementation ───────────────────────────────────

impl<G: GpioPort, C> GpioPort for HardwareAdapter<G, C> {
    fn set_mode(&mut self, pin: GpioPin, mode: PinMode) {
        self.gpio.set_mode(pin, mode);
    }

    fn set_high(&mut self, pin: GpioPin) {
        self.gpio.set_high(pin);
    }

    fn set_low(&mut self, pin: GpioPin) {
        self.gpio.set_low(pin);
    }

    fn read_level(&self, pin: GpioPin) -> bool {
        self.gpio.read_level(pin)
    }
}

// ── FrameTimer implementation ─────────────────────────────────

impl<G, C: FrameTimer> FrameTimer for HardwareAdapter<G, C> {
    fn wait_frame(&mut self) -> Result<u64> {
        self.clock.wait_frame()
    }

    fn sleep_us(&mut self, micros: u32) {
        self.clock.sleep_us(micros);
    }
}
