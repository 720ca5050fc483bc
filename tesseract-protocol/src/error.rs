//! Codec error type

use core::fmt;

/// Errors that can occur while packing or unpacking bits and commands
///
/// None of these leave a partially written buffer behind: every check runs
/// before the first byte is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Bit range extends past the end of the buffer
    OutOfBounds,
    /// Width is zero, above 32, or wider than the value's container
    InvalidWidth(u8),
    /// Opcode bits do not match any registered schema
    UnknownOpcode(u8),
    /// Buffer ends before the command does (sizes in bits)
    TruncatedBuffer { required: usize, available: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecError::OutOfBounds => f.write_str("bit range out of bounds"),
            CodecError::InvalidWidth(w) => write!(f, "invalid bit width {}", w),
            CodecError::UnknownOpcode(op) => write!(f, "unknown opcode {:#04x}", op),
            CodecError::TruncatedBuffer {
                required,
                available,
            } => write!(
                f,
                "truncated buffer: need {} bits, have {}",
                required, available
            ),
        }
    }
}
