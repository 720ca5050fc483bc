//! Bridge error type

use core::fmt;

use tesseract_hal::BusError;
use tesseract_protocol::CodecError;

use crate::config::ConfigError;

/// Errors reported by the transport bridge
///
/// Nothing here is fatal to the process. Runtime conditions are reported so
/// the application can retry on the next poll cycle; see
/// [`BridgeError::is_retryable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    /// More ingress bytes were pending than one frame can hold
    FrameOverflow { available: usize, capacity: usize },
    /// `initialize` was called again before `teardown`
    AlreadyInitialized,
    /// Operation needs a bridge that has been initialized and started
    NotReady,
    /// Master transaction did not complete before its deadline
    TransferTimeout,
    /// Configuration rejected during initialization
    Config(ConfigError),
    /// Bus peripheral failure other than a timeout
    Bus(BusError),
    /// Command packing failed
    Codec(CodecError),
}

impl BridgeError {
    /// Whether simply running the next poll cycle may succeed
    ///
    /// Lifecycle and configuration errors need the caller to change
    /// something first.
    pub fn is_retryable(&self) -> bool {
        match self {
            BridgeError::FrameOverflow { .. }
            | BridgeError::TransferTimeout
            | BridgeError::Codec(_) => true,
            BridgeError::Bus(e) => matches!(e, BusError::Overrun | BusError::Other),
            BridgeError::AlreadyInitialized | BridgeError::NotReady | BridgeError::Config(_) => {
                false
            }
        }
    }
}

impl From<ConfigError> for BridgeError {
    fn from(e: ConfigError) -> Self {
        BridgeError::Config(e)
    }
}

impl From<BusError> for BridgeError {
    fn from(e: BusError) -> Self {
        match e {
            BusError::Timeout => BridgeError::TransferTimeout,
            other => BridgeError::Bus(other),
        }
    }
}

impl From<CodecError> for BridgeError {
    fn from(e: CodecError) -> Self {
        BridgeError::Codec(e)
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeError::FrameOverflow {
                available,
                capacity,
            } => write!(
                f,
                "frame overflow: {} bytes pending, capacity {}",
                available, capacity
            ),
            BridgeError::AlreadyInitialized => f.write_str("bridge already initialized"),
            BridgeError::NotReady => f.write_str("bridge not ready"),
            BridgeError::TransferTimeout => f.write_str("transfer timed out"),
            BridgeError::Config(e) => write!(f, "configuration error: {}", e),
            BridgeError::Bus(e) => write!(f, "bus error: {}", e),
            BridgeError::Codec(e) => write!(f, "codec error: {}", e),
        }
    }
}
