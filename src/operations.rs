//! Per-pixel color operations: alpha flattening and word packing.

use image::{Rgb, Rgba};

use crate::format::ColorFormat;

/// Flatten a possibly translucent pixel onto an opaque background.
///
/// Each channel becomes `round(a/255 * fg + (1 - a/255) * bg)`. Fully opaque
/// pixels pass through untouched.
pub fn composite_over(pixel: Rgba<u8>, background: Rgb<u8>) -> Rgb<u8> {
    let [r, g, b, a] = pixel.0;
    if a == u8::MAX {
        return Rgb([r, g, b]);
    }

    let a = a as u32;
    let blend = |fg: u8, bg: u8| {
        // 255 is odd, so the exact quotient never lands on .5
        ((a * fg as u32 + (255 - a) * bg as u32 + 127) / 255) as u8
    };

    Rgb([
        blend(r, background[0]),
        blend(g, background[1]),
        blend(b, background[2]),
    ])
}

/// Pack an opaque pixel into a word of the given format.
///
/// This is the only place that knows the bit layout of a packed word.
pub fn pack(format: ColorFormat, pixel: Rgb<u8>) -> u16 {
    let [r, g, b] = pixel.0.map(u16::from);
    match format {
        ColorFormat::Rgb565 => ((r >> 3) << 11) | ((g >> 2) << 5) | (b >> 3),
        ColorFormat::Rgb332 => ((r >> 5) << 5) | ((g >> 5) << 2) | (b >> 6),
    }
}

/// Expand a packed word back to 8 bits per channel.
///
/// Low bits are filled by replicating the high bits, so full-scale channels
/// map back to `0xFF`.
pub fn unpack(format: ColorFormat, word: u16) -> Rgb<u8> {
    match format {
        ColorFormat::Rgb565 => {
            let r = ((word >> 11) & 0x1F) as u8;
            let g = ((word >> 5) & 0x3F) as u8;
            let b = (word & 0x1F) as u8;
            Rgb([(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2)])
        }
        ColorFormat::Rgb332 => {
            let r = ((word >> 5) & 0x07) as u8;
            let g = ((word >> 2) & 0x07) as u8;
            let b = (word & 0x03) as u8;
            Rgb([
                (r << 5) | (r << 2) | (r >> 1),
                (g << 5) | (g << 2) | (g >> 1),
                b * 0x55,
            ])
        }
    }
}

/// Composite and pack a whole RGBA8 bitmap in row-major order.
pub fn pack_rgba(input: &[u8], format: ColorFormat, background: Rgb<u8>) -> Vec<u16> {
    input
        .chunks_exact(4)
        .map(|px| {
            let pixel = Rgba([px[0], px[1], px[2], px[3]]);
            pack(format, composite_over(pixel, background))
        })
        .collect()
}
