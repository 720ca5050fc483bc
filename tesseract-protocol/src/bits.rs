//! Bit-level read/write at arbitrary offsets
//!
//! Values of 1-32 bits are stored at any bit offset in a byte buffer:
//! - byte index = offset / 8, bit within byte = offset % 8
//! - bits are packed LSB-first within each byte
//! - a value straddling bytes is split least-significant chunk first
//!
//! All bounds and width checks run before the buffer is touched, so a
//! failed call never leaves a half-written value behind.

use crate::error::CodecError;

mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u16 {}
    impl Sealed for u32 {}
}

/// Unsigned integer container a bit field is read into or written from
pub trait BitValue: Copy + sealed::Sealed {
    /// Width of the container in bits
    const BITS: u8;

    /// Widen to `u32`
    fn to_u32(self) -> u32;

    /// Narrow from `u32`, keeping the low bits
    fn from_u32(value: u32) -> Self;
}

impl BitValue for u8 {
    const BITS: u8 = 8;

    fn to_u32(self) -> u32 {
        self as u32
    }

    fn from_u32(value: u32) -> Self {
        value as u8
    }
}

impl BitValue for u16 {
    const BITS: u8 = 16;

    fn to_u32(self) -> u32 {
        self as u32
    }

    fn from_u32(value: u32) -> Self {
        value as u16
    }
}

impl BitValue for u32 {
    const BITS: u8 = 32;

    fn to_u32(self) -> u32 {
        self
    }

    fn from_u32(value: u32) -> Self {
        value
    }
}

/// Largest width a single field may have
pub const MAX_WIDTH: u8 = 32;

/// Length of a buffer in bits
pub fn bit_len(buf: &[u8]) -> usize {
    buf.len().saturating_mul(8)
}

/// Keep only the low `width` bits of `value`
pub fn mask_to_width(value: u32, width: u8) -> u32 {
    if width >= 32 {
        value
    } else {
        value & ((1u32 << width) - 1)
    }
}

/// Check width and bounds for an access of `width` bits at `bit_offset`
fn check<T: BitValue>(buf_len: usize, bit_offset: usize, width: u8) -> Result<(), CodecError> {
    if width == 0 || width > MAX_WIDTH || width > T::BITS {
        return Err(CodecError::InvalidWidth(width));
    }
    let end = bit_offset
        .checked_add(width as usize)
        .ok_or(CodecError::OutOfBounds)?;
    if end > buf_len.saturating_mul(8) {
        return Err(CodecError::OutOfBounds);
    }
    Ok(())
}

/// Read an unsigned value of `width` bits starting at `bit_offset`
///
/// `width` must be in 1..=32 and no wider than `T`.
pub fn read_bits<T: BitValue>(buf: &[u8], bit_offset: usize, width: u8) -> Result<T, CodecError> {
    check::<T>(buf.len(), bit_offset, width)?;

    let mut value = 0u32;
    let mut shift = 0u32;
    let mut offset = bit_offset;
    let mut remaining = width as u32;

    while remaining > 0 {
        let byte_index = offset / 8;
        let bit_in_byte = (offset % 8) as u32;
        let chunk = remaining.min(8 - bit_in_byte);
        let mask = ((1u16 << chunk) - 1) as u8;

        let bits = (buf[byte_index] >> bit_in_byte) & mask;
        value |= (bits as u32) << shift;

        shift += chunk;
        offset += chunk as usize;
        remaining -= chunk;
    }

    Ok(T::from_u32(value))
}

/// Write the low `width` bits of `value` starting at `bit_offset`
///
/// Bits of `value` above `width` are dropped, not rejected. Bits of the
/// buffer outside the target range are preserved.
pub fn write_bits<T: BitValue>(
    buf: &mut [u8],
    bit_offset: usize,
    width: u8,
    value: T,
) -> Result<(), CodecError> {
    check::<T>(buf.len(), bit_offset, width)?;

    let value = mask_to_width(value.to_u32(), width);
    let mut shift = 0u32;
    let mut offset = bit_offset;
    let mut remaining = width as u32;

    while remaining > 0 {
        let byte_index = offset / 8;
        let bit_in_byte = (offset % 8) as u32;
        let chunk = remaining.min(8 - bit_in_byte);
        let mask = ((1u16 << chunk) - 1) as u8;

        let bits = ((value >> shift) as u8) & mask;
        let byte = &mut buf[byte_index];
        *byte = (*byte & !(mask << bit_in_byte)) | (bits << bit_in_byte);

        shift += chunk;
        offset += chunk as usize;
        remaining -= chunk;
    }

    Ok(())
}

/// Sequential bit reader over a byte slice
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> BitReader<'a> {
    /// Start reading at bit 0
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Current bit offset
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Bits left before the end of the buffer
    pub fn remaining(&self) -> usize {
        bit_len(self.buf).saturating_sub(self.offset)
    }

    /// Read the next `width` bits and advance
    pub fn read<T: BitValue>(&mut self, width: u8) -> Result<T, CodecError> {
        let value = read_bits(self.buf, self.offset, width)?;
        self.offset += width as usize;
        Ok(value)
    }
}

/// Sequential bit writer over a byte slice
#[derive(Debug)]
pub struct BitWriter<'a> {
    buf: &'a mut [u8],
    offset: usize,
}

impl<'a> BitWriter<'a> {
    /// Start writing at bit 0
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, offset: 0 }
    }

    /// Current bit offset
    pub fn position(&self) -> usize {
        self.offset
    }

    /// Write `width` bits of `value` and advance
    pub fn write<T: BitValue>(&mut self, width: u8, value: T) -> Result<(), CodecError> {
        write_bits(self.buf, self.offset, width, value)?;
        self.offset += width as usize;
        Ok(())
    }

    /// Number of whole bytes touched so far
    pub fn bytes_written(&self) -> usize {
        self.offset.div_ceil(8)
    }
}
