//! Adapters from `embedded-hal` 1.0 blocking traits
//!
//! Lets a chip HAL that already implements [`embedded_hal::spi::SpiBus`] and
//! [`embedded_hal::digital::OutputPin`] drive a Master bridge without
//! writing a dedicated peripheral driver.
//!
//! A blocking `SpiBus` runs every transaction to completion, so
//! [`EhSpiMaster`] cannot honour a transfer deadline. A Master built on it
//! never reports a timeout; it refuses a zero timeout with
//! [`BusError::Unsupported`] rather than block past it.

use embassy_time::Duration;
use embedded_hal::digital::OutputPin as EhOutputPinTrait;
use embedded_hal::spi::{Error as _, ErrorKind, SpiBus};

use crate::gpio::OutputPin;
use crate::spi::{BusError, SpiMaster, SpiPeripheral, SpiSettings};

fn bus_error<E: embedded_hal::spi::Error>(err: E) -> BusError {
    match err.kind() {
        ErrorKind::Overrun => BusError::Overrun,
        ErrorKind::ModeFault => BusError::ModeFault,
        _ => BusError::Other,
    }
}

/// [`SpiMaster`] over a blocking `embedded-hal` bus
///
/// Transfer buffers are plain `[u8; N]` arrays owned by the bridge. A
/// blocking `SpiBus` cannot abandon a transaction, so a non-zero timeout is
/// not enforced and a zero timeout is refused. Clock settings are applied
/// by whoever constructed `bus`.
pub struct EhSpiMaster<B, const N: usize> {
    bus: B,
    settings: Option<SpiSettings>,
}

impl<B: SpiBus, const N: usize> EhSpiMaster<B, N> {
    /// Wrap a configured `embedded-hal` SPI bus
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            settings: None,
        }
    }

    /// Settings recorded by the last `configure` call
    pub fn settings(&self) -> Option<&SpiSettings> {
        self.settings.as_ref()
    }

    /// Release the wrapped bus
    pub fn into_inner(self) -> B {
        self.bus
    }
}

impl<B: SpiBus, const N: usize> SpiPeripheral for EhSpiMaster<B, N> {
    type Buffer = [u8; N];

    fn allocate_buffer(&mut self, len: usize) -> Result<Self::Buffer, BusError> {
        if len > N {
            return Err(BusError::BufferAllocation);
        }
        Ok([0u8; N])
    }

    fn configure(&mut self, settings: &SpiSettings) -> Result<(), BusError> {
        if settings.max_transfer_size == 0 {
            return Err(BusError::Unsupported);
        }
        self.settings = Some(*settings);
        Ok(())
    }

    fn begin(&mut self) -> Result<(), BusError> {
        Ok(())
    }
}

impl<B: SpiBus, const N: usize> SpiMaster for EhSpiMaster<B, N> {
    fn transfer(
        &mut self,
        read: &mut [u8],
        write: &[u8],
        timeout: Duration,
    ) -> Result<(), BusError> {
        if timeout.as_ticks() == 0 {
            return Err(BusError::Unsupported);
        }
        self.bus.transfer(read, write).map_err(bus_error)?;
        self.bus.flush().map_err(bus_error)
    }
}

/// [`OutputPin`] over an `embedded-hal` digital output
///
/// Tracks the last level that was successfully driven.
pub struct EhOutputPin<P> {
    pin: P,
    high: bool,
}

impl<P: EhOutputPinTrait> EhOutputPin<P> {
    /// Wrap an output pin whose current level is unknown (treated as low)
    pub fn new(pin: P) -> Self {
        Self { pin, high: false }
    }
}

impl<P: EhOutputPinTrait> OutputPin for EhOutputPin<P> {
    fn set_high(&mut self) {
        if self.pin.set_high().is_ok() {
            self.high = true;
        }
    }

    fn set_low(&mut self) {
        if self.pin.set_low().is_ok() {
            self.high = false;
        }
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}
