//! Draw and configuration commands
//!
//! Each command is a plain struct whose fields use the smallest unsigned
//! container that holds the declared wire width. Encoding walks the
//! command's [`Schema`] row and packs each field with the bit codec, so the
//! registry is the single source of truth for field order and width.
//!
//! Values wider than their declared width are masked on encode (low bits
//! kept). Encoding never fails because of a field value.

use heapless::Vec;

use crate::bits::{bit_len, read_bits, BitReader, BitWriter};
use crate::error::CodecError;
use crate::schema::{Opcode, Schema, MAX_FIELDS, OPCODE_BITS};

/// Largest encoded command (`SetPaletteColor`, `DrawZOrderPixels`, `DrawRect`)
pub const MAX_COMMAND_BYTES: usize = 6;

/// Set the Z level of the strip (opcode 0x01)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetStripZLevel {
    pub z_level: u8,
}

/// Set the timing offset (opcode 0x02, 24 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetTimingOffset {
    pub offset_nanoseconds: u32,
}

/// Set the timing scale (opcode 0x03, 24 bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetTimingScale {
    pub time_scale_factor: u32,
}

/// Clear display memory (opcode 0x04)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClearMemory {
    /// Reserved, 10 bits
    pub padding: u16,
}

/// Set the Z level of one quadrant (opcode 0x05)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetZLevelQuad {
    /// Quadrant 0-3 (2 bits)
    pub quadrant: u8,
    pub z_level: u8,
}

/// Write one palette entry (opcode 0x06)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SetPaletteColor {
    /// Reserved, 10 bits
    pub future_use: u16,
    pub color_idx: u8,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// Draw a run of pixels in Z order (opcode 0x07)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DrawZOrderPixels {
    /// Draw mode (2 bits)
    pub draw_mode: u8,
    pub z_start: u16,
    pub z_end: u16,
    /// Palette index
    pub color: u8,
}

/// Draw a single pixel (opcode 0x08)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DrawXYPixel {
    /// Draw mode (2 bits)
    pub draw_mode: u8,
    pub x_pos: u8,
    pub y_pos: u8,
    /// Palette index
    pub color: u8,
}

/// Draw a filled rectangle (opcode 0x09)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DrawRect {
    /// Draw mode (2 bits)
    pub draw_mode: u8,
    pub x_pos: u8,
    pub y_pos: u8,
    pub width: u8,
    pub height: u8,
    /// Palette index
    pub color: u8,
}

/// A decoded command, one variant per opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    SetStripZLevel(SetStripZLevel),
    SetTimingOffset(SetTimingOffset),
    SetTimingScale(SetTimingScale),
    ClearMemory(ClearMemory),
    SetZLevelQuad(SetZLevelQuad),
    SetPaletteColor(SetPaletteColor),
    DrawZOrderPixels(DrawZOrderPixels),
    DrawXYPixel(DrawXYPixel),
    DrawRect(DrawRect),
}

/// Field values in schema order
type Fields = [u32; MAX_FIELDS];

impl Command {
    /// Opcode of this command
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::SetStripZLevel(_) => Opcode::SetStripZLevel,
            Command::SetTimingOffset(_) => Opcode::SetTimingOffset,
            Command::SetTimingScale(_) => Opcode::SetTimingScale,
            Command::ClearMemory(_) => Opcode::ClearMemory,
            Command::SetZLevelQuad(_) => Opcode::SetZLevelQuad,
            Command::SetPaletteColor(_) => Opcode::SetPaletteColor,
            Command::DrawZOrderPixels(_) => Opcode::DrawZOrderPixels,
            Command::DrawXYPixel(_) => Opcode::DrawXYPixel,
            Command::DrawRect(_) => Opcode::DrawRect,
        }
    }

    /// Schema row describing this command's payload
    pub fn schema(&self) -> &'static Schema {
        self.opcode().schema()
    }

    /// Encoded size in bytes, including padding
    pub fn encoded_len(&self) -> usize {
        self.schema().total_bytes()
    }

    fn fields(&self) -> Fields {
        match *self {
            Command::SetStripZLevel(c) => [c.z_level as u32, 0, 0, 0, 0, 0],
            Command::SetTimingOffset(c) => [c.offset_nanoseconds, 0, 0, 0, 0, 0],
            Command::SetTimingScale(c) => [c.time_scale_factor, 0, 0, 0, 0, 0],
            Command::ClearMemory(c) => [c.padding as u32, 0, 0, 0, 0, 0],
            Command::SetZLevelQuad(c) => [c.quadrant as u32, c.z_level as u32, 0, 0, 0, 0],
            Command::SetPaletteColor(c) => [
                c.future_use as u32,
                c.color_idx as u32,
                c.red as u32,
                c.green as u32,
                c.blue as u32,
                0,
            ],
            Command::DrawZOrderPixels(c) => [
                c.draw_mode as u32,
                c.z_start as u32,
                c.z_end as u32,
                c.color as u32,
                0,
                0,
            ],
            Command::DrawXYPixel(c) => [
                c.draw_mode as u32,
                c.x_pos as u32,
                c.y_pos as u32,
                c.color as u32,
                0,
                0,
            ],
            Command::DrawRect(c) => [
                c.draw_mode as u32,
                c.x_pos as u32,
                c.y_pos as u32,
                c.width as u32,
                c.height as u32,
                c.color as u32,
            ],
        }
    }

    /// Rebuild a command from field values already narrowed to their widths
    fn from_fields(opcode: Opcode, f: &Fields) -> Self {
        match opcode {
            Opcode::SetStripZLevel => Command::SetStripZLevel(SetStripZLevel {
                z_level: f[0] as u8,
            }),
            Opcode::SetTimingOffset => Command::SetTimingOffset(SetTimingOffset {
                offset_nanoseconds: f[0],
            }),
            Opcode::SetTimingScale => Command::SetTimingScale(SetTimingScale {
                time_scale_factor: f[0],
            }),
            Opcode::ClearMemory => Command::ClearMemory(ClearMemory {
                padding: f[0] as u16,
            }),
            Opcode::SetZLevelQuad => Command::SetZLevelQuad(SetZLevelQuad {
                quadrant: f[0] as u8,
                z_level: f[1] as u8,
            }),
            Opcode::SetPaletteColor => Command::SetPaletteColor(SetPaletteColor {
                future_use: f[0] as u16,
                color_idx: f[1] as u8,
                red: f[2] as u8,
                green: f[3] as u8,
                blue: f[4] as u8,
            }),
            Opcode::DrawZOrderPixels => Command::DrawZOrderPixels(DrawZOrderPixels {
                draw_mode: f[0] as u8,
                z_start: f[1] as u16,
                z_end: f[2] as u16,
                color: f[3] as u8,
            }),
            Opcode::DrawXYPixel => Command::DrawXYPixel(DrawXYPixel {
                draw_mode: f[0] as u8,
                x_pos: f[1] as u8,
                y_pos: f[2] as u8,
                color: f[3] as u8,
            }),
            Opcode::DrawRect => Command::DrawRect(DrawRect {
                draw_mode: f[0] as u8,
                x_pos: f[1] as u8,
                y_pos: f[2] as u8,
                width: f[3] as u8,
                height: f[4] as u8,
                color: f[5] as u8,
            }),
        }
    }

    /// Encode this command at the start of `buf`
    ///
    /// Returns the number of bytes written. The trailing bits of the last
    /// byte are zero. Fails with [`CodecError::OutOfBounds`] without touching
    /// `buf` if it is shorter than [`Command::encoded_len`].
    pub fn encode(&self, buf: &mut [u8]) -> Result<usize, CodecError> {
        let schema = self.schema();
        let len = schema.total_bytes();
        let out = buf.get_mut(..len).ok_or(CodecError::OutOfBounds)?;
        out.fill(0);

        let mut writer = BitWriter::new(out);
        writer.write(OPCODE_BITS, schema.opcode.to_byte())?;
        for (spec, value) in schema.fields.iter().zip(self.fields()) {
            writer.write(spec.width, value)?;
        }

        Ok(len)
    }

    /// Encode this command into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_COMMAND_BYTES>, CodecError> {
        let mut buffer = [0u8; MAX_COMMAND_BYTES];
        let len = self.encode(&mut buffer)?;
        let mut vec = Vec::new();
        vec.extend_from_slice(&buffer[..len])
            .map_err(|_| CodecError::OutOfBounds)?;
        Ok(vec)
    }

    /// Decode one command from the start of `buf`
    ///
    /// Trailing bytes beyond the command are ignored.
    pub fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let available = bit_len(buf);
        if available < OPCODE_BITS as usize {
            return Err(CodecError::TruncatedBuffer {
                required: OPCODE_BITS as usize,
                available,
            });
        }

        let opcode = Opcode::try_from(read_bits::<u8>(buf, 0, OPCODE_BITS)?)?;
        let schema = opcode.schema();
        let required = schema.total_bits();
        if available < required {
            return Err(CodecError::TruncatedBuffer {
                required,
                available,
            });
        }

        let mut reader = BitReader::new(buf);
        reader.read::<u8>(OPCODE_BITS)?;

        let mut fields: Fields = [0; MAX_FIELDS];
        for (slot, spec) in fields.iter_mut().zip(schema.fields) {
            *slot = reader.read::<u32>(spec.width)?;
        }

        Ok(Self::from_fields(opcode, &fields))
    }
}

/// Pack several commands back to back, each starting on a byte boundary
///
/// Returns the total number of bytes written. Fails without touching `buf`
/// if the commands do not all fit.
pub fn pack_commands(commands: &[Command], buf: &mut [u8]) -> Result<usize, CodecError> {
    let total: usize = commands.iter().map(Command::encoded_len).sum();
    if total > buf.len() {
        return Err(CodecError::OutOfBounds);
    }

    let mut offset = 0;
    for command in commands {
        offset += command.encode(&mut buf[offset..])?;
    }
    Ok(offset)
}

/// Iterator over the commands packed into one transfer buffer
///
/// Stops at the end of the buffer or at a zero opcode (padding). A decode
/// error is yielded once and ends the iteration, since the position of any
/// following command is unknown.
#[derive(Debug, Clone)]
pub struct Commands<'a> {
    buf: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Commands<'a> {
    /// Iterate over the commands in `buf`
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            done: false,
        }
    }

    /// Bytes consumed by the commands decoded so far
    pub fn consumed(&self) -> usize {
        self.pos
    }
}

impl<'a> Iterator for Commands<'a> {
    type Item = Result<Command, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let rest = match self.buf.get(self.pos..) {
            Some(rest) if !rest.is_empty() => rest,
            _ => {
                self.done = true;
                return None;
            }
        };
        if rest[0] & 0x3F == 0 {
            self.done = true;
            return None;
        }

        match Command::decode(rest) {
            Ok(command) => {
                self.pos += command.encoded_len();
                Some(Ok(command))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
