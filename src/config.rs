//! Conversion settings.

use std::time::Duration;

use image::Rgb;
use log::warn;

use crate::format::{ColorFormat, CompressionMode};

/// Quality handed to the still-image codec when none or an invalid one is set.
pub const DEFAULT_QUALITY: u8 = 85;

/// Background used to flatten translucent pixels when none is set.
pub const DEFAULT_BACKGROUND: [u8; 3] = [0, 0, 0];

/// How to compress a packed pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CompressionConfig {
    pub mode: CompressionMode,

    /// Still-image codec quality, 0-100.
    ///
    /// In [`CompressionMode::Auto`] the external codec is only tried when this
    /// is set.
    pub quality: Option<u8>,
}

impl CompressionConfig {
    pub fn new(mode: CompressionMode) -> Self {
        Self { mode, quality: None }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    /// The quality to use for the still-image codec.
    ///
    /// Out of range values fall back to [`DEFAULT_QUALITY`].
    pub fn effective_quality(&self) -> u8 {
        match self.quality {
            Some(q) if q <= 100 => q,
            Some(q) => {
                warn!("quality {q} is out of range, using {DEFAULT_QUALITY}");
                DEFAULT_QUALITY
            }
            None => DEFAULT_QUALITY,
        }
    }
}

/// Everything needed to turn an RGBA image into a bitmap record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvertOptions {
    /// Target packed color layout
    pub format: ColorFormat,

    /// Color that translucent pixels are flattened onto
    pub background: Option<[u8; 3]>,

    pub compression: CompressionConfig,

    /// Upper bound on a single still-image codec call
    pub codec_timeout: Option<Duration>,
}

impl ConvertOptions {
    pub fn background(&self) -> Rgb<u8> {
        Rgb(self.background.unwrap_or(DEFAULT_BACKGROUND))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_falls_back_when_out_of_range() {
        assert_eq!(CompressionConfig::default().effective_quality(), DEFAULT_QUALITY);
        assert_eq!(CompressionConfig::default().with_quality(0).effective_quality(), 0);
        assert_eq!(CompressionConfig::default().with_quality(100).effective_quality(), 100);
        assert_eq!(CompressionConfig::default().with_quality(101).effective_quality(), DEFAULT_QUALITY);
    }

    #[test]
    fn defaults() {
        let options = ConvertOptions::default();

        assert_eq!(options.format, ColorFormat::Rgb565);
        assert_eq!(options.compression.mode, CompressionMode::Auto);
        assert_eq!(options.compression.quality, None);
        assert_eq!(options.background(), Rgb(DEFAULT_BACKGROUND));
        assert_eq!(options.codec_timeout, None);
    }
}
