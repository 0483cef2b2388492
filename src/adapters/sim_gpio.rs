//! In-memory GPIO bank for dry runs off the Pi.
//!
//! Tracks pin functions and output levels so the daemon behaves the same
//! with `--simulate`; edge counts are exposed for diagnostics.

use log::{info, trace};

use crate::app::ports::{GpioPin, GpioPort, MAX_GPIO_PIN, PinMode};

const PIN_COUNT: usize = MAX_GPIO_PIN as usize + 1;

/// Simulated register bank.
#[derive(Debug, Clone)]
pub struct SimGpio {
    modes: [PinMode; PIN_COUNT],
    levels: u32,
    rising_edges: [u64; PIN_COUNT],
}

impl Default for SimGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimGpio {
    pub fn new() -> Self {
        info!("sim_gpio: using simulated register bank");
        Self {
            modes: [PinMode::Input; PIN_COUNT],
            levels: 0,
            rising_edges: [0; PIN_COUNT],
        }
    }

    pub fn mode(&self, pin: GpioPin) -> PinMode {
        self.modes[usize::from(pin.index())]
    }

    /// Low-to-high transitions seen on `pin` so far.
    pub fn rising_edges(&self, pin: GpioPin) -> u64 {
        self.rising_edges[usize::from(pin.index())]
    }
}

impl GpioPort for SimGpio {
    fn set_mode(&mut self, pin: GpioPin, mode: PinMode) {
        trace!("sim_gpio: pin {} -> {:?}", pin, mode);
        self.modes[usize::from(pin.index())] = mode;
    }

    fn set_high(&mut self, pin: GpioPin) {
        let bit = 1 << pin.index();
        if self.levels & bit == 0 {
            self.rising_edges[usize::from(pin.index())] += 1;
        }
        self.levels |= bit;
    }

    fn set_low(&mut self, pin: GpioPin) {
        self.levels &= !(1 << pin.index());
    }

    fn read_level(&self, pin: GpioPin) -> bool {
        self.levels & (1 << pin.index()) != 0
    }
}
