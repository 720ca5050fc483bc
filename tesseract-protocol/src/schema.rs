//! Command schema registry
//!
//! One row per opcode, listing the command's fields in wire order with
//! their bit widths. The opcode does not version the payload: both ends of
//! the bus must be built against the same [`SCHEMA_REVISION`]. Revision 1
//! is the narrow form with 8-bit X/Y coordinates and sizes; a board built
//! against a different revision will silently misread draw commands.

use core::fmt;

use crate::error::CodecError;

/// Revision of the active field-width table
pub const SCHEMA_REVISION: u8 = 1;

/// Width of the opcode that starts every command
pub const OPCODE_BITS: u8 = 6;

/// Most fields any schema carries
pub const MAX_FIELDS: usize = 6;

/// Command opcodes (6 bits on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    SetStripZLevel = 0x01,
    SetTimingOffset = 0x02,
    SetTimingScale = 0x03,
    ClearMemory = 0x04,
    SetZLevelQuad = 0x05,
    SetPaletteColor = 0x06,
    DrawZOrderPixels = 0x07,
    DrawXYPixel = 0x08,
    DrawRect = 0x09,
}

impl Opcode {
    /// Raw 6-bit value
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// Schema row for this opcode
    pub fn schema(self) -> &'static Schema {
        // Rows are stored in opcode order starting at 0x01
        &REGISTRY[self as usize - 1]
    }
}

impl TryFrom<u8> for Opcode {
    type Error = CodecError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(Opcode::SetStripZLevel),
            0x02 => Ok(Opcode::SetTimingOffset),
            0x03 => Ok(Opcode::SetTimingScale),
            0x04 => Ok(Opcode::ClearMemory),
            0x05 => Ok(Opcode::SetZLevelQuad),
            0x06 => Ok(Opcode::SetPaletteColor),
            0x07 => Ok(Opcode::DrawZOrderPixels),
            0x08 => Ok(Opcode::DrawXYPixel),
            0x09 => Ok(Opcode::DrawRect),
            other => Err(CodecError::UnknownOpcode(other)),
        }
    }
}

/// A named, fixed-width field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FieldSpec {
    /// Field name
    pub name: &'static str,
    /// Width on the wire (1-32 bits)
    pub width: u8,
}

const fn field(name: &'static str, width: u8) -> FieldSpec {
    FieldSpec { name, width }
}

/// Payload shape of one opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Schema {
    /// Owning opcode
    pub opcode: Opcode,
    /// Command name
    pub name: &'static str,
    /// Fields in wire order
    pub fields: &'static [FieldSpec],
}

impl Schema {
    /// Sum of all field widths
    pub const fn payload_bits(&self) -> usize {
        let mut total = 0;
        let mut i = 0;
        while i < self.fields.len() {
            total += self.fields[i].width as usize;
            i += 1;
        }
        total
    }

    /// Opcode plus payload, in bits
    pub const fn total_bits(&self) -> usize {
        OPCODE_BITS as usize + self.payload_bits()
    }

    /// Encoded size including zero padding of the last byte
    pub const fn total_bytes(&self) -> usize {
        self.total_bits().div_ceil(8)
    }

    /// Bit offset of a named field from the start of the command
    pub fn field_offset(&self, name: &str) -> Option<usize> {
        let mut offset = OPCODE_BITS as usize;
        for field in self.fields {
            if field.name == name {
                return Some(offset);
            }
            offset += field.width as usize;
        }
        None
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#04x} {}(", self.opcode.to_byte(), self.name)?;
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}:{}", field.name, field.width)?;
        }
        f.write_str(")")
    }
}

/// Revision 1 field table, indexed by `opcode - 1`
pub static REGISTRY: [Schema; 9] = [
    Schema {
        opcode: Opcode::SetStripZLevel,
        name: "SetStripZLevel",
        fields: &[field("z_level", 8)],
    },
    Schema {
        opcode: Opcode::SetTimingOffset,
        name: "SetTimingOffset",
        fields: &[field("offset_nanoseconds", 24)],
    },
    Schema {
        opcode: Opcode::SetTimingScale,
        name: "SetTimingScale",
        fields: &[field("time_scale_factor", 24)],
    },
    Schema {
        opcode: Opcode::ClearMemory,
        name: "ClearMemory",
        fields: &[field("padding", 10)],
    },
    Schema {
        opcode: Opcode::SetZLevelQuad,
        name: "SetZLevelQuad",
        fields: &[field("quadrant", 2), field("z_level", 8)],
    },
    Schema {
        opcode: Opcode::SetPaletteColor,
        name: "SetPaletteColor",
        fields: &[
            field("future_use", 10),
            field("color_idx", 8),
            field("red", 8),
            field("green", 8),
            field("blue", 8),
        ],
    },
    Schema {
        opcode: Opcode::DrawZOrderPixels,
        name: "DrawZOrderPixels",
        fields: &[
            field("draw_mode", 2),
            field("z_start", 16),
            field("z_end", 16),
            field("color", 8),
        ],
    },
    Schema {
        opcode: Opcode::DrawXYPixel,
        name: "DrawXYPixel",
        fields: &[
            field("draw_mode", 2),
            field("x_pos", 8),
            field("y_pos", 8),
            field("color", 8),
        ],
    },
    Schema {
        opcode: Opcode::DrawRect,
        name: "DrawRect",
        fields: &[
            field("draw_mode", 2),
            field("x_pos", 8),
            field("y_pos", 8),
            field("width", 8),
            field("height", 8),
            field("color", 8),
        ],
    },
];

/// Look up the schema for a raw opcode value
pub fn lookup(opcode: u8) -> Result<&'static Schema, CodecError> {
    Opcode::try_from(opcode).map(Opcode::schema)
}
