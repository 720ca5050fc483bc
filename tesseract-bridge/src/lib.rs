//! SPI transport bridge between the Tesseract Master and Slave
//!
//! The Master receives draw commands from the network and clocks them to the
//! display-side Slave over a full-duplex bus. Each side owns one fixed-size
//! send/receive buffer pair and runs a single-threaded poll cycle:
//!
//! ```text
//!        Master                                   Slave
//! ┌──────────────────┐                    ┌──────────────────┐
//! │ ingress ─▶ send ─┼────── MOSI ───────▶│ recv ─▶ handler  │
//! │ handler ◀─ recv ◀┼────── MISO ────────┼ send             │
//! │           select ┼────── CS (low) ───▶│                  │
//! └──────────────────┘                    └──────────────────┘
//! ```
//!
//! - [`config`] - Bridge configuration and its TOML surface
//! - [`state`] - Lifecycle state machine
//! - [`frame`] - Send/receive buffer pair and ingress staging
//! - [`bridge`] - Master and Slave bridges
//! - [`cycle`] - One poll cycle and command dispatch

#![no_std]
#![deny(unsafe_code)]

#[cfg(test)]
extern crate std;

#[macro_use]
mod fmt;

pub mod bridge;
pub mod config;
pub mod cycle;
pub mod error;
pub mod frame;
pub mod state;

#[cfg(test)]
mod mock;

pub use bridge::{MasterBridge, SlaveBridge, TransportBridge};
pub use config::{BridgeConfig, BusConfig, ConfigError, IngressBinding, MasterConfig, Role};
pub use cycle::{poll, CommandHandler, CycleReport};
pub use error::BridgeError;
pub use frame::{Staged, TransferFrame};
pub use state::BridgeState;
