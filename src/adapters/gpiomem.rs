//! Memory-mapped BCM2835 GPIO register block.
//!
//! `/dev/gpiomem` exposes the GPIO peripheral pre-offset, so the mapping
//! starts at GPFSEL0.  Only the bank-0 registers are used (pins 0..=27).
//!
//! ```text
//!  word  0..5   GPFSEL0..5   3 bits per pin, 10 pins per word
//!  word  7      GPSET0       write 1 → drive high
//!  word 10      GPCLR0       write 1 → drive low
//!  word 13      GPLEV0       read pin levels
//! ```

use std::fs::OpenOptions;
use std::num::NonZeroUsize;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::ptr::NonNull;

use log::{debug, info, warn};
use nix::libc;
use nix::sys::mman::{MapFlags, ProtFlags, mmap, munmap};

use crate::app::ports::{GpioPin, GpioPort, PinMode};
use crate::error::{Error, Result};

/// Size of the mapped register window (bytes).
pub const BLOCK_SIZE: usize = 4 * 1024;
/// Size of the mapped register window (32-bit words).
pub const BLOCK_WORDS: usize = BLOCK_SIZE / 4;

const MAP_LEN: NonZeroUsize = match NonZeroUsize::new(BLOCK_SIZE) {
    Some(len) => len,
    None => panic!("BLOCK_SIZE must be non-zero"),
};

pub const GPFSEL0: usize = 0;
pub const GPSET0: usize = 7;
pub const GPCLR0: usize = 10;
pub const GPLEV0: usize = 13;

/// Function-select word and bit shift for `pin`.
pub const fn fsel_location(pin: GpioPin) -> (usize, u32) {
    let index = pin.index();
    (GPFSEL0 + (index / 10) as usize, (index % 10) as u32 * 3)
}

/// Single-bit mask for `pin` in the bank-0 set/clear/level registers.
pub const fn bank_bit(pin: GpioPin) -> u32 {
    1 << pin.index()
}

/// Owner of the register mapping.
pub struct GpioMem {
    base: NonNull<u32>,
    /// `true` when `base` came from `mmap` and must be unmapped on drop.
    mapped: bool,
}

impl GpioMem {
    /// Open `device` and map the register block.  Fatal at startup on failure.
    pub fn open(device: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_SYNC)
            .open(device)
            .map_err(|e| Error::from_io("open gpio device", &e))?;

        // SAFETY: a fresh shared mapping of a device file; nothing else in
        // this process aliases it.  The fd may close once the mapping exists.
        let ptr = unsafe {
            mmap(
                None,
                MAP_LEN,
                ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                MapFlags::MAP_SHARED,
                &file,
                0,
            )
        }
        .map_err(|errno| Error::Os {
            op: "mmap gpio block",
            errno,
        })?;

        info!("gpiomem: mapped {} ({} bytes)", device.display(), BLOCK_SIZE);
        Ok(Self {
            base: ptr.cast(),
            mapped: true,
        })
    }

    /// Wrap an existing register window without taking ownership.
    ///
    /// # Safety
    ///
    /// `base` must point to at least [`BLOCK_WORDS`] readable and writable
    /// `u32`s that stay valid, and are not accessed elsewhere, for the
    /// lifetime of the returned value.
    pub unsafe fn from_raw(base: NonNull<u32>) -> Self {
        Self {
            base,
            mapped: false,
        }
    }

    fn read(&self, word: usize) -> u32 {
        debug_assert!(word < BLOCK_WORDS);
        // SAFETY: `word` is a fixed register offset inside the block.
        unsafe { self.base.as_ptr().add(word).read_volatile() }
    }

    fn write(&mut self, word: usize, value: u32) {
        debug_assert!(word < BLOCK_WORDS);
        // SAFETY: as in `read`.
        unsafe { self.base.as_ptr().add(word).write_volatile(value) }
    }

    /// Current function-select setting of `pin`.
    pub fn mode(&self, pin: GpioPin) -> PinMode {
        let (word, shift) = fsel_location(pin);
        PinMode::from_bits(self.read(word) >> shift)
    }
}

impl GpioPort for GpioMem {
    fn set_mode(&mut self, pin: GpioPin, mode: PinMode) {
        let (word, shift) = fsel_location(pin);
        let value = (self.read(word) & !(0b111 << shift)) | (mode.bits() << shift);
        self.write(word, value);
    }

    fn set_high(&mut self, pin: GpioPin) {
        self.write(GPSET0, bank_bit(pin));
    }

    fn set_low(&mut self, pin: GpioPin) {
        self.write(GPCLR0, bank_bit(pin));
    }

    fn read_level(&self, pin: GpioPin) -> bool {
        self.read(GPLEV0) & bank_bit(pin) != 0
    }
}

impl Drop for GpioMem {
    fn drop(&mut self) {
        if !self.mapped {
            return;
        }
        // SAFETY: `base` came from `mmap` with this length and is not used
        // after drop.
        if let Err(errno) = unsafe { munmap(self.base.cast(), BLOCK_SIZE) } {
            warn!("gpiomem: munmap failed: {}", errno);
        } else {
            debug!("gpiomem: register block unmapped");
        }
    }
}
