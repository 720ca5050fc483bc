//! Bridge configuration
//!
//! The role is chosen once per device image. Both roles share the bus
//! section; only the Master owns a select line, a clock and an ingress
//! binding, so those live in an optional `master` section that must be
//! present exactly when `role = "master"`.

use core::fmt;

use heapless::String;
use tesseract_hal::spi::{Mode, SpiSettings};

#[cfg(feature = "serde")]
use serde::Deserialize;

/// Maximum length of the ingress bind address
pub const MAX_ADDRESS_LEN: usize = 64;

/// Default transfer buffer capacity in bytes
pub const DEFAULT_CAPACITY: usize = 1024;

/// Default peripheral transaction size cap in bytes
pub const DEFAULT_MAX_TRANSFER_SIZE: usize = 4092;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Buffer capacity is zero
    ZeroCapacity,
    /// Queue depth is zero
    ZeroQueueDepth,
    /// Buffer capacity exceeds the peripheral's transfer size cap
    CapacityExceedsTransferSize { capacity: usize, max: usize },
    /// SPI mode outside 0-3
    InvalidMode(u8),
    /// Master role without a `master` section
    MissingMasterSection,
    /// Slave role with a `master` section
    UnexpectedMasterSection,
    /// Master clock frequency is zero
    ZeroFrequency,
    /// Bridge implementation does not match the configured role
    RoleMismatch { expected: Role, configured: Role },
    /// TOML input could not be parsed
    Parse,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroCapacity => f.write_str("buffer capacity must be non-zero"),
            ConfigError::ZeroQueueDepth => f.write_str("queue depth must be non-zero"),
            ConfigError::CapacityExceedsTransferSize { capacity, max } => write!(
                f,
                "buffer capacity {} exceeds transfer size cap {}",
                capacity, max
            ),
            ConfigError::InvalidMode(mode) => write!(f, "invalid SPI mode {}", mode),
            ConfigError::MissingMasterSection => f.write_str("master role needs a [master] section"),
            ConfigError::UnexpectedMasterSection => {
                f.write_str("slave role cannot have a [master] section")
            }
            ConfigError::ZeroFrequency => f.write_str("bus frequency must be non-zero"),
            ConfigError::RoleMismatch {
                expected,
                configured,
            } => write!(f, "bridge is {:?} but config says {:?}", expected, configured),
            ConfigError::Parse => f.write_str("malformed configuration"),
        }
    }
}

/// Side of the bus this device plays
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize), serde(rename_all = "lowercase"))]
pub enum Role {
    /// Network-facing, drives the bus clock and select line
    Master,
    /// Display-facing, clocked by the Master
    Slave,
}

/// Settings shared by both roles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize), serde(default))]
pub struct BusConfig {
    /// Size of each transfer buffer in bytes
    pub capacity: usize,
    /// Queued DMA transactions
    pub queue_depth: u8,
    /// SPI mode number (0-3)
    pub mode: u8,
    /// Largest transaction the peripheral accepts
    pub max_transfer_size: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            queue_depth: 1,
            mode: 0,
            max_transfer_size: DEFAULT_MAX_TRANSFER_SIZE,
        }
    }
}

/// Where the Master's network layer listens for the byte stream it relays
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct IngressBinding {
    /// Bind address
    pub address: String<MAX_ADDRESS_LEN>,
    /// Bind port
    pub port: u16,
}

/// Master-only settings
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct MasterConfig {
    /// Bus clock in Hz
    pub frequency_hz: u32,
    /// GPIO number of the bus-select line
    pub select_pin: u8,
    /// Ingress listener binding
    pub ingress: IngressBinding,
}

/// Complete bridge configuration
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Deserialize))]
pub struct BridgeConfig {
    /// Role of this device
    pub role: Role,
    /// Bus settings
    #[cfg_attr(feature = "serde", serde(default))]
    pub bus: BusConfig,
    /// Master-only settings
    pub master: Option<MasterConfig>,
}

impl BridgeConfig {
    /// Configuration for a Master
    pub fn master(bus: BusConfig, master: MasterConfig) -> Self {
        Self {
            role: Role::Master,
            bus,
            master: Some(master),
        }
    }

    /// Configuration for a Slave
    pub fn slave(bus: BusConfig) -> Self {
        Self {
            role: Role::Slave,
            bus,
            master: None,
        }
    }

    /// Check every constraint the bridge relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bus = &self.bus;
        if bus.capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if bus.queue_depth == 0 {
            return Err(ConfigError::ZeroQueueDepth);
        }
        if bus.capacity > bus.max_transfer_size {
            return Err(ConfigError::CapacityExceedsTransferSize {
                capacity: bus.capacity,
                max: bus.max_transfer_size,
            });
        }
        self.spi_mode()?;

        match (self.role, &self.master) {
            (Role::Master, None) => Err(ConfigError::MissingMasterSection),
            (Role::Master, Some(master)) if master.frequency_hz == 0 => {
                Err(ConfigError::ZeroFrequency)
            }
            (Role::Slave, Some(_)) => Err(ConfigError::UnexpectedMasterSection),
            _ => Ok(()),
        }
    }

    /// Check that this configuration is for `expected`
    pub fn expect_role(&self, expected: Role) -> Result<(), ConfigError> {
        if self.role != expected {
            return Err(ConfigError::RoleMismatch {
                expected,
                configured: self.role,
            });
        }
        Ok(())
    }

    /// SPI mode from the configured mode number
    pub fn spi_mode(&self) -> Result<Mode, ConfigError> {
        Mode::try_from(self.bus.mode).map_err(ConfigError::InvalidMode)
    }

    /// Peripheral settings for this role
    ///
    /// The Slave gets no frequency: it is clocked by its peer.
    pub fn spi_settings(&self) -> Result<SpiSettings, ConfigError> {
        Ok(SpiSettings {
            mode: self.spi_mode()?,
            max_transfer_size: self.bus.max_transfer_size,
            queue_depth: self.bus.queue_depth,
            frequency: self.master.as_ref().map(|m| m.frequency_hz),
        })
    }

    /// Ingress binding (Master only)
    pub fn ingress(&self) -> Option<&IngressBinding> {
        self.master.as_ref().map(|m| &m.ingress)
    }

    /// Parse and validate a TOML configuration
    #[cfg(feature = "toml")]
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: BridgeConfig = toml::from_str(input).map_err(|_| ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }
}
