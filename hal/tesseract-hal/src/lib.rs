//! Tesseract Hardware Abstraction Layer
//!
//! This crate defines the collaborator traits the display bridge is written
//! against. Chip-specific firmware implements them for its SPI peripheral,
//! its bus-select pin and its network stack, so the same bridge logic runs
//! on either side of the bus and on the host under test.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  tesseract-bridge (Master / Slave)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  tesseract-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ chip SPI/DMA  │       │ network stack │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`] - Bus-select line
//! - [`spi::SpiMaster`], [`spi::SpiSlave`] - Bus peripheral, one per role
//! - [`ingress::IngressSource`] - Push-style network byte stream
//! - [`compat`] - Adapters from `embedded-hal` 1.0 blocking traits
//!   (blocking, so the Master transfer timeout is not enforced; see
//!   [`compat::EhSpiMaster`])

#![no_std]
#![deny(unsafe_code)]

pub mod compat;
pub mod gpio;
pub mod ingress;
pub mod spi;

// Re-export key traits at crate root for convenience
pub use gpio::OutputPin;
pub use ingress::{IngressSource, NoIngress};
pub use spi::{BusError, Mode, SpiMaster, SpiPeripheral, SpiSettings, SpiSlave};
