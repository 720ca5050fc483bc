//! SPI bus abstractions
//!
//! The bus is role-asymmetric. The Master clocks every transaction and can
//! give up on one after a timeout; the Slave is clocked by its peer and can
//! only wait for the transaction to finish. Both share the same peripheral
//! lifecycle: allocate DMA-capable buffers, configure, begin.

use core::fmt;

use embassy_time::Duration;

/// Errors reported by a bus peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Transaction did not complete before the deadline
    Timeout,
    /// Receive data was lost because it was not drained in time
    Overrun,
    /// Mode fault or misconfigured clock settings
    ModeFault,
    /// Requested settings are not supported by this peripheral
    Unsupported,
    /// Peripheral could not provide a transfer buffer
    BufferAllocation,
    /// Any other peripheral-specific failure
    Other,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Timeout => f.write_str("bus transaction timed out"),
            BusError::Overrun => f.write_str("bus receive overrun"),
            BusError::ModeFault => f.write_str("bus mode fault"),
            BusError::Unsupported => f.write_str("unsupported bus settings"),
            BusError::BufferAllocation => f.write_str("transfer buffer allocation failed"),
            BusError::Other => f.write_str("bus error"),
        }
    }
}

/// SPI clock polarity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    /// Clock idles low (CPOL=0)
    IdleLow,
    /// Clock idles high (CPOL=1)
    IdleHigh,
}

/// SPI clock phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Data captured on first clock transition (CPHA=0)
    CaptureOnFirstTransition,
    /// Data captured on second clock transition (CPHA=1)
    CaptureOnSecondTransition,
}

/// SPI mode (combined polarity and phase)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Mode 0: CPOL=0, CPHA=0
    #[default]
    Mode0,
    /// Mode 1: CPOL=0, CPHA=1
    Mode1,
    /// Mode 2: CPOL=1, CPHA=0
    Mode2,
    /// Mode 3: CPOL=1, CPHA=1
    Mode3,
}

impl From<Mode> for (Polarity, Phase) {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Mode0 => (Polarity::IdleLow, Phase::CaptureOnFirstTransition),
            Mode::Mode1 => (Polarity::IdleLow, Phase::CaptureOnSecondTransition),
            Mode::Mode2 => (Polarity::IdleHigh, Phase::CaptureOnFirstTransition),
            Mode::Mode3 => (Polarity::IdleHigh, Phase::CaptureOnSecondTransition),
        }
    }
}

impl TryFrom<u8> for Mode {
    type Error = u8;

    /// Convert the conventional mode number (0-3)
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Mode::Mode0),
            1 => Ok(Mode::Mode1),
            2 => Ok(Mode::Mode2),
            3 => Ok(Mode::Mode3),
            other => Err(other),
        }
    }
}

/// Peripheral settings applied once at bridge initialization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiSettings {
    /// Clock polarity/phase
    pub mode: Mode,
    /// Largest single transaction the peripheral must accept, in bytes
    pub max_transfer_size: usize,
    /// Number of queued DMA transactions
    pub queue_depth: u8,
    /// Clock frequency in Hz (Master only; the Slave is clocked by its peer)
    pub frequency: Option<u32>,
}

impl Default for SpiSettings {
    fn default() -> Self {
        Self {
            mode: Mode::Mode0,
            max_transfer_size: 4092,
            queue_depth: 1,
            frequency: None,
        }
    }
}

/// Lifecycle shared by both bus roles
pub trait SpiPeripheral {
    /// DMA-capable transfer buffer handed out by the peripheral
    type Buffer: AsRef<[u8]> + AsMut<[u8]>;

    /// Allocate one transfer buffer of at least `len` bytes
    ///
    /// Called twice (send and receive) during initialization, never on the
    /// transfer path.
    fn allocate_buffer(&mut self, len: usize) -> Result<Self::Buffer, BusError>;

    /// Apply mode, size cap, queue depth and (Master) frequency
    fn configure(&mut self, settings: &SpiSettings) -> Result<(), BusError>;

    /// Start the peripheral
    fn begin(&mut self) -> Result<(), BusError>;
}

/// SPI bus master
///
/// The caller brackets each transaction with the select line; the
/// peripheral only moves bytes.
pub trait SpiMaster: SpiPeripheral {
    /// Full-duplex transfer bounded by `timeout`
    ///
    /// Writes `write` while reading into `read`. Both buffers are the same
    /// length. Returns [`BusError::Timeout`] if the transaction did not
    /// complete in time; the transaction is then abandoned.
    fn transfer(&mut self, read: &mut [u8], write: &[u8], timeout: Duration)
        -> Result<(), BusError>;
}

/// SPI bus slave
///
/// The slave cannot start or abort a transaction. It queues its buffers and
/// blocks until the peer has clocked the transaction through.
pub trait SpiSlave: SpiPeripheral {
    /// Queue `write`/`read` and block until the peer-driven transaction ends
    ///
    /// Returns the number of bytes actually clocked, which may be shorter
    /// than the buffers if the master deselected early.
    fn transfer_wait(&mut self, read: &mut [u8], write: &[u8]) -> Result<usize, BusError>;
}
