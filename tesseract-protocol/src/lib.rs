//! Tesseract draw command wire format
//!
//! This crate defines the binary format the network-facing Master uses to
//! ship draw and configuration commands to the display-facing Slave. Fields
//! are not byte-aligned: every command is a 6-bit opcode followed by the
//! fields of its schema, packed back to back at their declared bit widths.
//!
//! # Wire Layout
//!
//! ```text
//! bit 0      6                                      6+W       8*ceil((6+W)/8)
//! ┌──────────┬───────────┬───────────┬─────┬────────┬─────────┐
//! │ OPCODE   │ FIELD 0   │ FIELD 1   │ ... │ FIELD n│ 0 PAD   │
//! │ 6 bits   │ w0 bits   │ w1 bits   │     │ wn bits│         │
//! └──────────┴───────────┴───────────┴─────┴────────┴─────────┘
//! ```
//!
//! Bits are packed least-significant-bit first within each byte, and each
//! value is split least-significant chunk first when it straddles bytes.
//! A command always starts on a byte boundary; opcode `0` never appears as
//! a command and marks trailing padding in a transfer frame.

#![no_std]
#![deny(unsafe_code)]

pub mod bits;
pub mod command;
pub mod error;
pub mod schema;

pub use bits::{read_bits, write_bits, BitReader, BitValue, BitWriter};
pub use command::{
    pack_commands, ClearMemory, Command, Commands, DrawRect, DrawXYPixel, DrawZOrderPixels,
    SetPaletteColor, SetStripZLevel, SetTimingOffset, SetTimingScale, SetZLevelQuad,
    MAX_COMMAND_BYTES,
};
pub use error::CodecError;
pub use schema::{FieldSpec, Opcode, Schema, OPCODE_BITS, REGISTRY, SCHEMA_REVISION};
