//! Built-in 5x6 glyph table.
//!
//! Each glyph is six rows of five pixels. In the row masks below the
//! leftmost pixel is the most significant of the five bits.

use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

/// Glyph width in pixels.
pub const GLYPH_WIDTH: usize = 5;

/// Glyph height in pixels.
pub const GLYPH_HEIGHT: usize = 6;

/// Symbol substituted for anything not in the table.
pub const FALLBACK_SYMBOL: &str = "?";

/// A fixed 5x6 monochrome bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Glyph {
    rows: [u8; GLYPH_HEIGHT],
}

impl Glyph {
    /// Creates a glyph from six 5-bit row masks.
    pub const fn from_rows(rows: [u8; GLYPH_HEIGHT]) -> Self {
        Self { rows }
    }

    /// Returns whether the pixel at (x, y) is lit. Out of range is off.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        if x >= GLYPH_WIDTH || y >= GLYPH_HEIGHT {
            return false;
        }
        self.rows[y] & (1 << (GLYPH_WIDTH - 1 - x)) != 0
    }

    /// Iterates over the coordinates of lit pixels.
    pub fn lit_pixels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..GLYPH_HEIGHT).flat_map(move |y| {
            (0..GLYPH_WIDTH).filter_map(move |x| self.pixel(x, y).then_some((x, y)))
        })
    }
}

/// Immutable symbol -> glyph lookup.
#[derive(Debug, Clone)]
pub struct GlyphTable {
    glyphs: HashMap<String, Glyph>,
    fallback: Glyph,
}

impl GlyphTable {
    /// Builds a table from `(symbol, row masks)` entries.
    ///
    /// Fails if no entry is bound to `"?"`, since every miss resolves to it.
    pub fn new<'a, I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, [u8; GLYPH_HEIGHT])>,
    {
        let glyphs: HashMap<String, Glyph> = entries
            .into_iter()
            .map(|(symbol, rows)| (symbol.to_string(), Glyph::from_rows(rows)))
            .collect();

        let fallback = *glyphs
            .get(FALLBACK_SYMBOL)
            .ok_or(Error::MissingFallbackGlyph)?;

        Ok(Self { glyphs, fallback })
    }

    /// Returns the process-wide built-in table.
    pub fn builtin() -> Arc<GlyphTable> {
        static BUILTIN: OnceLock<Arc<GlyphTable>> = OnceLock::new();
        BUILTIN
            .get_or_init(|| {
                let table = GlyphTable::new(BUILTIN_GLYPHS.iter().copied())
                    .expect("Built-in glyph table has no fallback glyph");
                Arc::new(table)
            })
            .clone()
    }

    /// Looks up a symbol, substituting the `?` glyph on a miss.
    pub fn lookup(&self, symbol: &str) -> Glyph {
        self.glyphs.get(symbol).copied().unwrap_or(self.fallback)
    }

    /// Returns true if the symbol has its own glyph.
    pub fn contains(&self, symbol: &str) -> bool {
        self.glyphs.contains_key(symbol)
    }
}

#[rustfmt::skip]
const BUILTIN_GLYPHS: &[(&str, [u8; GLYPH_HEIGHT])] = &[
    ("0", [0b01100, 0b10010, 0b10010, 0b10010, 0b10010, 0b01100]),
    ("1", [0b00100, 0b01100, 0b10100, 0b00100, 0b00100, 0b11111]),
    ("2", [0b11110, 0b00001, 0b11111, 0b10000, 0b10000, 0b11111]),
    ("3", [0b11110, 0b00001, 0b11111, 0b00001, 0b00001, 0b11110]),
    ("4", [0b00010, 0b00110, 0b01010, 0b11111, 0b00010, 0b00010]),
    ("5", [0b11111, 0b10000, 0b11111, 0b00001, 0b00001, 0b11110]),
    ("6", [0b01110, 0b10000, 0b11111, 0b10001, 0b10001, 0b01110]),
    ("7", [0b11111, 0b00001, 0b00010, 0b00100, 0b00100, 0b00100]),
    ("8", [0b01110, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110]),
    ("9", [0b01110, 0b10001, 0b11111, 0b00001, 0b00001, 0b01110]),
    (":", [0b00000, 0b00000, 0b00100, 0b00000, 0b00100, 0b00000]),
    (" ", [0b00000, 0b00000, 0b00000, 0b00000, 0b00000, 0b00000]),
    ("?", [0b01100, 0b00010, 0b00010, 0b00100, 0b00000, 0b00100]),
    (".", [0b00000, 0b00000, 0b00000, 0b00100, 0b00000, 0b00000]),
    (",", [0b00000, 0b00000, 0b00000, 0b00100, 0b00000, 0b00000]),
    ("!", [0b00100, 0b00100, 0b00100, 0b00100, 0b00000, 0b00100]),
    ("/", [0b00001, 0b00011, 0b00110, 0b01100, 0b11000, 0b10000]),
    ("*", [0b00000, 0b01010, 0b00100, 0b01010, 0b00000, 0b00000]),
    ("%", [0b11001, 0b11011, 0b00110, 0b01100, 0b11011, 0b10011]),
    ("+", [0b00100, 0b00100, 0b11111, 0b00100, 0b00100, 0b00000]),
    ("-", [0b00000, 0b00000, 0b11111, 0b00000, 0b00000, 0b00000]),
    ("=", [0b00000, 0b11111, 0b00000, 0b11111, 0b00000, 0b00000]),
    ("A", [0b01110, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ("B", [0b11110, 0b10001, 0b11110, 0b10001, 0b10001, 0b11110]),
    ("C", [0b11111, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
    ("D", [0b11110, 0b10001, 0b10001, 0b10001, 0b10001, 0b11110]),
    ("E", [0b11111, 0b10000, 0b11111, 0b10000, 0b10000, 0b11111]),
    ("F", [0b11111, 0b10000, 0b11111, 0b10000, 0b10000, 0b10000]),
    ("G", [0b01110, 0b10000, 0b10111, 0b10001, 0b10001, 0b01110]),
    ("H", [0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001]),
    ("I", [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110]),
    ("J", [0b01111, 0b00001, 0b00001, 0b00001, 0b01001, 0b00110]),
    ("K", [0b10010, 0b10100, 0b11000, 0b10100, 0b10010, 0b10001]),
    ("L", [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111]),
    ("M", [0b00000, 0b01010, 0b10101, 0b10101, 0b10101, 0b10101]),
    ("N", [0b10001, 0b11001, 0b10101, 0b10101, 0b10101, 0b10011]),
    ("O", [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110]),
    ("P", [0b11100, 0b10010, 0b10010, 0b11100, 0b10000, 0b10000]),
    ("Q", [0b01110, 0b10001, 0b10001, 0b10101, 0b10010, 0b01101]),
    ("R", [0b11110, 0b10010, 0b11110, 0b11000, 0b10100, 0b10010]),
    ("S", [0b11111, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110]),
    ("T", [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100]),
    ("U", [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b11111]),
    ("V", [0b10001, 0b10001, 0b01011, 0b01011, 0b00100, 0b00100]),
    ("W", [0b10001, 0b10001, 0b10101, 0b10101, 0b01010, 0b01010]),
    ("X", [0b10001, 0b01010, 0b00100, 0b00100, 0b01010, 0b10001]),
    ("Y", [0b10001, 0b10001, 0b01010, 0b01010, 0b00100, 0b00100]),
    ("Z", [0b11111, 0b00010, 0b00100, 0b01000, 0b10000, 0b11111]),
    ("Ä", [0b01010, 0b00000, 0b11111, 0b10001, 0b11111, 0b10001]),
    ("Ö", [0b01010, 0b00000, 0b01110, 0b10001, 0b10001, 0b01110]),
    ("Ü", [0b01010, 0b00000, 0b10001, 0b10001, 0b10001, 0b11111]),
    ("degC", [0b11000, 0b11000, 0b00111, 0b00100, 0b00100, 0b00111]),
    ("degF", [0b11000, 0b11000, 0b00111, 0b00100, 0b00111, 0b00100]),
    ("snow", [0b00000, 0b10101, 0b01110, 0b11111, 0b01110, 0b10101]),
    ("sun", [0b00000, 0b01110, 0b11111, 0b11111, 0b11111, 0b01110]),
    ("cloud", [0b00000, 0b01110, 0b11111, 0b11111, 0b00000, 0b00000]),
    ("rain", [0b01110, 0b11111, 0b11111, 0b01001, 0b00100, 0b10010]),
    ("thunder", [0b01110, 0b11111, 0b11111, 0b00100, 0b01000, 0b00100]),
    ("batteryLow", [0b00000, 0b00000, 0b11110, 0b10011, 0b10011, 0b11110]),
    ("!!", [0b01010, 0b01010, 0b01010, 0b00000, 0b01010, 0b01010]),
    ("j", [0b00000, 0b11011, 0b11111, 0b01110, 0b00100, 0b00000]),
    ("heart0", [0b11011, 0b11111, 0b01110, 0b00100, 0b00000, 0b00000]),
    ("heart2", [0b00000, 0b00000, 0b11011, 0b11111, 0b01110, 0b00100]),
    (":)", [0b00000, 0b01010, 0b00000, 0b00000, 0b10001, 0b01110]),
    (":|", [0b00000, 0b01010, 0b00000, 0b00000, 0b11111, 0b00000]),
    (":(", [0b00000, 0b01010, 0b00000, 0b00000, 0b01110, 0b10001]),
    (";)", [0b00000, 0b11010, 0b00000, 0b00000, 0b10001, 0b01110]),
];
