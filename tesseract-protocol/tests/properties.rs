//! Property tests for the bit codec and command codec

use proptest::prelude::*;

use tesseract_protocol::bits::{mask_to_width, read_bits, write_bits};
use tesseract_protocol::{
    CodecError, Command, DrawRect, DrawXYPixel, DrawZOrderPixels, SetPaletteColor,
    SetZLevelQuad,
};

const BUF_LEN: usize = 12;

/// A width in 1..=32, a value that fits it, and an offset that keeps the
/// range inside a `BUF_LEN` buffer
fn field() -> impl Strategy<Value = (u8, u32, usize)> {
    (1u8..=32).prop_flat_map(|width| {
        let max_offset = BUF_LEN * 8 - width as usize;
        (
            Just(width),
            any::<u32>().prop_map(move |v| mask_to_width(v, width)),
            0..=max_offset,
        )
    })
}

fn bit(buf: &[u8], index: usize) -> bool {
    buf[index / 8] >> (index % 8) & 1 == 1
}

proptest! {
    #[test]
    fn write_then_read_returns_value(
        (width, value, offset) in field(),
        seed in any::<[u8; BUF_LEN]>(),
    ) {
        let mut buf = seed;
        write_bits(&mut buf, offset, width, value).unwrap();
        prop_assert_eq!(read_bits::<u32>(&buf, offset, width), Ok(value));
    }

    #[test]
    fn write_leaves_other_bits_alone(
        (width, value, offset) in field(),
        seed in any::<[u8; BUF_LEN]>(),
    ) {
        let mut buf = seed;
        write_bits(&mut buf, offset, width, value).unwrap();
        for i in 0..BUF_LEN * 8 {
            if i < offset || i >= offset + width as usize {
                prop_assert_eq!(bit(&buf, i), bit(&seed, i), "bit {} changed", i);
            }
        }
    }

    #[test]
    fn disjoint_fields_do_not_interfere(
        first in 0u32..(1 << 13),
        second in 0u32..(1 << 19),
        gap in 0usize..8,
    ) {
        let mut buf = [0u8; BUF_LEN];
        write_bits(&mut buf, 3, 13, first).unwrap();
        write_bits(&mut buf, 16 + gap, 19, second).unwrap();
        prop_assert_eq!(read_bits::<u32>(&buf, 3, 13), Ok(first));
        prop_assert_eq!(read_bits::<u32>(&buf, 16 + gap, 19), Ok(second));
    }

    #[test]
    fn out_of_bounds_never_mutates(
        width in 1u8..=32,
        overshoot in 1usize..64,
        value in any::<u32>(),
        seed in any::<[u8; BUF_LEN]>(),
    ) {
        let offset = BUF_LEN * 8 - width as usize + overshoot;
        let mut buf = seed;
        prop_assert_eq!(
            write_bits(&mut buf, offset, width, value),
            Err(CodecError::OutOfBounds)
        );
        prop_assert_eq!(buf, seed);
        prop_assert_eq!(read_bits::<u32>(&buf, offset, width), Err(CodecError::OutOfBounds));
    }

    #[test]
    fn palette_color_roundtrips(
        future_use in 0u16..1024,
        color_idx in any::<u8>(),
        red in any::<u8>(),
        green in any::<u8>(),
        blue in any::<u8>(),
    ) {
        let cmd = Command::SetPaletteColor(SetPaletteColor { future_use, color_idx, red, green, blue });
        let encoded = cmd.encode_to_vec().unwrap();
        prop_assert_eq!(Command::decode(&encoded), Ok(cmd));
    }

    #[test]
    fn draw_commands_roundtrip(
        draw_mode in 0u8..4,
        a in any::<u8>(),
        b in any::<u8>(),
        c in any::<u8>(),
        d in any::<u8>(),
        z_start in any::<u16>(),
        z_end in any::<u16>(),
    ) {
        let commands = [
            Command::DrawXYPixel(DrawXYPixel { draw_mode, x_pos: a, y_pos: b, color: c }),
            Command::DrawRect(DrawRect { draw_mode, x_pos: a, y_pos: b, width: c, height: d, color: a }),
            Command::DrawZOrderPixels(DrawZOrderPixels { draw_mode, z_start, z_end, color: d }),
            Command::SetZLevelQuad(SetZLevelQuad { quadrant: draw_mode, z_level: a }),
        ];
        for cmd in commands {
            let encoded = cmd.encode_to_vec().unwrap();
            prop_assert_eq!(Command::decode(&encoded), Ok(cmd));
        }
    }

    #[test]
    fn unregistered_opcodes_are_rejected(opcode in prop_oneof![Just(0u8), 0x0Au8..0x40], rest in any::<[u8; 6]>()) {
        let mut buf = rest;
        buf[0] = (buf[0] & 0xC0) | opcode;
        prop_assert_eq!(Command::decode(&buf), Err(CodecError::UnknownOpcode(opcode)));
    }
}
