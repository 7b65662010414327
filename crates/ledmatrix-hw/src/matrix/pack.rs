//! Pixel packing for the 9x34 matrix.
//!
//! The firmware expects one bit per pixel, pixel `(x, y)` at linear index
//! `x + y * 9`, stored little-endian and LSB first: bit `i % 8` of byte
//! `i / 8`. 306 pixels fit in 39 bytes with six spare bits at the end.

use super::glyph::{Glyph, GLYPH_HEIGHT, GLYPH_WIDTH};
use super::protocol::DRAW_PAYLOAD_SIZE;
use crate::{Error, Result};

/// Matrix width in pixels.
pub const WIDTH: usize = 9;

/// Matrix height in pixels.
pub const HEIGHT: usize = 34;

/// Total pixel count.
pub const PIXELS: usize = WIDTH * HEIGHT;

/// Most glyphs that fit on the matrix at once.
pub const MAX_GLYPHS: usize = 5;

/// Rows per glyph cell: six glyph rows plus one blank separator.
const GLYPH_STRIDE: usize = GLYPH_HEIGHT + 1;

/// Blank columns left of each glyph, centering 5 columns in 9.
const GLYPH_MARGIN: usize = 2;

/// Packed draw payload.
pub type Payload = [u8; DRAW_PAYLOAD_SIZE];

/// Logical on/off grid for the full matrix.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pixels: [bool; PIXELS],
}

impl Default for PixelBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                f.write_str(if self.get(x, y) { "#" } else { "." })?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

impl PixelBuffer {
    /// Creates a buffer with every pixel off.
    pub fn new() -> Self {
        Self {
            pixels: [false; PIXELS],
        }
    }

    /// Creates a buffer from a row-major slice of exactly [`PIXELS`] values.
    pub fn from_slice(pixels: &[bool]) -> Result<Self> {
        let pixels: [bool; PIXELS] = pixels.try_into().map_err(|_| Error::OutOfRange {
            what: "Matrix length",
            value: pixels.len() as i64,
            max: PIXELS as i64,
        })?;
        Ok(Self { pixels })
    }

    /// Creates a buffer with the given coordinates lit. Out-of-range
    /// coordinates are dropped.
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        let mut buffer = Self::new();
        for (x, y) in points {
            buffer.set(x, y, true);
        }
        buffer
    }

    /// Sets a pixel. Coordinates outside the matrix are ignored.
    pub fn set(&mut self, x: usize, y: usize, on: bool) {
        if x < WIDTH && y < HEIGHT {
            self.pixels[x + y * WIDTH] = on;
        }
    }

    /// Gets a pixel. Coordinates outside the matrix read as off.
    pub fn get(&self, x: usize, y: usize) -> bool {
        x < WIDTH && y < HEIGHT && self.pixels[x + y * WIDTH]
    }

    /// Number of lit pixels.
    pub fn lit_count(&self) -> usize {
        self.pixels.iter().filter(|&&on| on).count()
    }
}

#[inline]
fn set_bit(payload: &mut Payload, index: usize) {
    payload[index / 8] |= 1 << (index % 8);
}

/// Packs a full pixel buffer.
pub fn pack_matrix(buffer: &PixelBuffer) -> Payload {
    let mut payload = [0u8; DRAW_PAYLOAD_SIZE];
    for y in 0..HEIGHT {
        for x in 0..WIDTH {
            if buffer.get(x, y) {
                set_bit(&mut payload, x + y * WIDTH);
            }
        }
    }
    payload
}

/// Packs up to [`MAX_GLYPHS`] glyphs stacked top to bottom.
///
/// Glyph `k` starts at row `k * 7` with a two column left margin. Extra
/// glyphs are ignored.
pub fn pack_glyphs(glyphs: &[Glyph]) -> Payload {
    let mut payload = [0u8; DRAW_PAYLOAD_SIZE];
    for (k, glyph) in glyphs.iter().take(MAX_GLYPHS).enumerate() {
        let offset = k * GLYPH_STRIDE;
        for (px, py) in glyph.lit_pixels() {
            debug_assert!(px < GLYPH_WIDTH);
            set_bit(&mut payload, (GLYPH_MARGIN + px) + WIDTH * (py + offset));
        }
    }
    payload
}

/// Packs a gauge lighting the first `count` pixels.
pub fn pack_count(count: i64) -> Result<Payload> {
    if !(0..=PIXELS as i64).contains(&count) {
        return Err(Error::OutOfRange {
            what: "Count",
            value: count,
            max: PIXELS as i64,
        });
    }
    let count = count as usize;

    let mut payload = [0u8; DRAW_PAYLOAD_SIZE];
    payload[..count / 8].fill(0xFF);
    if count % 8 != 0 {
        payload[count / 8] = (1u8 << (count % 8)) - 1;
    }
    Ok(payload)
}

/// Lays out up to nine column values as bars growing from the center row.
///
/// A value `v` lights `v / 2` cells from the center row downwards and the
/// remaining `v - v / 2` cells upwards from the row above it. Values past
/// the ninth are ignored.
pub fn equalizer(values: &[u8]) -> Result<PixelBuffer> {
    let mut buffer = PixelBuffer::new();
    let center = HEIGHT / 2;

    for (col, &value) in values.iter().take(WIDTH).enumerate() {
        let value = value as usize;
        if value > HEIGHT {
            return Err(Error::OutOfRange {
                what: "Equalizer value",
                value: value as i64,
                max: HEIGHT as i64,
            });
        }

        let above = value / 2;
        let below = value - above;

        for i in 0..above {
            buffer.set(col, center + i, true);
        }
        for i in 0..below {
            buffer.set(col, center - 1 - i, true);
        }
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::glyph::GlyphTable;

    #[test]
    fn test_single_pixel_bit_position() {
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let payload = pack_matrix(&PixelBuffer::from_points([(x, y)]));
                let i = x + y * WIDTH;
                for (byte_idx, &byte) in payload.iter().enumerate() {
                    if byte_idx == i / 8 {
                        assert_eq!(byte, 1 << (i % 8), "pixel ({x}, {y})");
                    } else {
                        assert_eq!(byte, 0, "pixel ({x}, {y}) leaked into byte {byte_idx}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_points_dropped() {
        let buffer = PixelBuffer::from_points([(9, 0), (0, 34), (100, 100)]);
        assert_eq!(buffer.lit_count(), 0);
        assert_eq!(pack_matrix(&buffer), [0u8; DRAW_PAYLOAD_SIZE]);
    }

    #[test]
    fn test_from_slice_length() {
        assert!(PixelBuffer::from_slice(&[true; PIXELS]).is_ok());
        assert!(PixelBuffer::from_slice(&[true; PIXELS - 1]).is_err());

        let payload = pack_matrix(&PixelBuffer::from_slice(&[true; PIXELS]).unwrap());
        assert!(payload[..38].iter().all(|&b| b == 0xFF));
        assert_eq!(payload[38], 0b11);
    }

    #[test]
    fn test_count_bounds() {
        assert_eq!(pack_count(0).unwrap(), [0u8; DRAW_PAYLOAD_SIZE]);

        let full = pack_count(PIXELS as i64).unwrap();
        assert!(full[..38].iter().all(|&b| b == 0xFF));
        assert_eq!(full[38], 0b11);

        assert!(matches!(
            pack_count(307),
            Err(Error::OutOfRange { value: 307, .. })
        ));
        assert!(pack_count(-1).is_err());
    }

    #[test]
    fn test_count_partial_byte() {
        let payload = pack_count(11).unwrap();
        assert_eq!(payload[0], 0xFF);
        assert_eq!(payload[1], 0b0000_0111);
        assert!(payload[2..].iter().all(|&b| b == 0));

        let payload = pack_count(16).unwrap();
        assert_eq!(&payload[..3], &[0xFF, 0xFF, 0x00]);
    }

    #[test]
    fn test_count_matches_matrix() {
        for count in [1usize, 7, 8, 9, 100, 305] {
            let buffer = PixelBuffer::from_points((0..count).map(|i| (i % WIDTH, i / WIDTH)));
            assert_eq!(pack_count(count as i64).unwrap(), pack_matrix(&buffer));
        }
    }

    #[test]
    fn test_glyph_packing_formula() {
        let table = GlyphTable::builtin();
        let glyphs: Vec<Glyph> = ["1", "2", ":", "3", "4"]
            .iter()
            .map(|s| table.lookup(s))
            .collect();

        let mut expected = [0u8; DRAW_PAYLOAD_SIZE];
        for (k, glyph) in glyphs.iter().enumerate() {
            for py in 0..GLYPH_HEIGHT {
                for px in 0..GLYPH_WIDTH {
                    if glyph.pixel(px, py) {
                        let i = (2 + px) + 9 * (py + k * 7);
                        expected[i / 8] |= 1 << (i % 8);
                    }
                }
            }
        }

        let payload = pack_glyphs(&glyphs);
        assert_eq!(payload, expected);
        assert_eq!(pack_glyphs(&glyphs), payload);
    }

    #[test]
    fn test_glyph_margin_and_separator() {
        let full = Glyph::from_rows([0b11111; GLYPH_HEIGHT]);
        let payload = pack_glyphs(&[full; MAX_GLYPHS]);

        let mut unpacked = PixelBuffer::new();
        for i in 0..PIXELS {
            if payload[i / 8] & (1 << (i % 8)) != 0 {
                unpacked.set(i % WIDTH, i / WIDTH, true);
            }
        }

        for y in 0..HEIGHT {
            assert!(!unpacked.get(0, y));
            assert!(!unpacked.get(1, y));
            assert_eq!(unpacked.get(2, y), y % 7 != 6);
        }
    }

    #[test]
    fn test_glyph_packing_ignores_extra() {
        let full = Glyph::from_rows([0b11111; GLYPH_HEIGHT]);
        assert_eq!(pack_glyphs(&[full; 7]), pack_glyphs(&[full; 5]));
    }

    #[test]
    fn test_equalizer_column_split() {
        for value in 0..=HEIGHT as u8 {
            let buffer = equalizer(&[value]).unwrap();
            let lit: Vec<usize> = (0..HEIGHT).filter(|&y| buffer.get(0, y)).collect();
            assert_eq!(lit.len(), value as usize);

            let above = value as usize / 2;
            let below = value as usize - above;
            assert_eq!(lit.iter().filter(|&&y| y >= 17).count(), above);
            assert_eq!(lit.iter().filter(|&&y| y < 17).count(), below);
            assert!((1..WIDTH).all(|x| (0..HEIGHT).all(|y| !buffer.get(x, y))));
        }
    }

    #[test]
    fn test_equalizer_extra_columns_ignored() {
        let values = [3u8; 12];
        let buffer = equalizer(&values).unwrap();
        assert_eq!(buffer.lit_count(), 27);
    }

    #[test]
    fn test_equalizer_rejects_tall_bar() {
        assert!(matches!(
            equalizer(&[1, 35]),
            Err(Error::OutOfRange { value: 35, .. })
        ));
    }
}
