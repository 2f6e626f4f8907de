//! Color formats and compression types as they appear in generated bitmap
//! records.

/// The packed color layout of a pixel word.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorFormat {
    /// RGB, 5-6-5 bits per channel, one 16-bit word per pixel
    #[default]
    Rgb565 = 0,

    /// RGB, 3-3-2 bits per channel, one 8-bit word per pixel
    Rgb332 = 1,
}

impl ColorFormat {
    /// Bits of color information per pixel.
    ///
    /// Ex. Rgb565 has `16bpp`
    pub fn color_bit_depth(&self) -> u8 {
        match self {
            ColorFormat::Rgb565 => 16,
            ColorFormat::Rgb332 => 8,
        }
    }

    /// Width of one uncompressed pixel word in bits.
    pub fn word_size_bits(&self) -> u8 {
        match self {
            ColorFormat::Rgb565 => 16,
            ColorFormat::Rgb332 => 8,
        }
    }
}

impl TryFrom<u8> for ColorFormat {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::Rgb565,
            1 => Self::Rgb332,
            v => return Err(format!("invalid color format {v}")),
        })
    }
}

impl From<ColorFormat> for u8 {
    fn from(value: ColorFormat) -> Self {
        value as u8
    }
}

/// The type of compression used on a bitmap payload.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompressionType {
    /// No compression at all, raw pixel words
    None = 0,

    /// Run-length tokens, see [`crate::compression::rle`]
    Rle = 1,

    /// Output of an external still-image codec, stored as bytes
    External = 2,
}

impl TryFrom<u8> for CompressionType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0 => Self::None,
            1 => Self::Rle,
            2 => Self::External,
            v => return Err(format!("invalid compression type {v}")),
        })
    }
}

impl From<CompressionType> for u8 {
    fn from(value: CompressionType) -> Self {
        value as u8
    }
}

/// Which compression to apply when converting a bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CompressionMode {
    /// Always store raw pixel words
    None,

    /// Always run-length encode
    Rle,

    /// Always use the external still-image codec
    External,

    /// Try every available strategy and keep the smallest
    #[default]
    Auto,
}
