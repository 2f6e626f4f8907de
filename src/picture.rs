use std::io::Write;

use byteorder::WriteBytesExt;
use image::{RgbImage, RgbaImage};
use log::debug;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use thiserror::Error;

use crate::{
    compression::{
        rle::{self, RleError},
        select_encoding,
        still::{CodecError, Deadline, JpegCodec, StillImageCodec},
        CompressionCandidate, Payload,
    },
    config::ConvertOptions,
    format::{ColorFormat, CompressionType},
    operations::{pack_rgba, unpack},
};

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Rle(#[from] RleError),

    #[error(transparent)]
    ExternalCodec(#[from] CodecError),

    #[error("a {width}×{height} bitmap needs {expected} values, got {got}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        expected: usize,
        got: usize,
    },

    #[error("word {word:#x} at pixel {index} does not fit {format:?}")]
    WordOutOfRange {
        index: usize,
        word: u16,
        format: ColorFormat,
    },

    #[error("{0:?} payloads cannot be turned back into pixel words")]
    NotDecodable(CompressionType),
}

/// Packed pixel words of a bitmap, one per pixel in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    format: ColorFormat,
    data: Vec<u16>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32, format: ColorFormat, data: Vec<u16>) -> Result<Self, Error> {
        let expected = width as usize * height as usize;
        if data.len() != expected {
            return Err(Error::DimensionMismatch {
                width,
                height,
                expected,
                got: data.len(),
            });
        }

        let limit = (1u32 << format.word_size_bits()) - 1;
        if let Some((index, &word)) = data.iter().enumerate().find(|(_, w)| u32::from(**w) > limit) {
            return Err(Error::WordOutOfRange { index, word, format });
        }

        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> ColorFormat {
        self.format
    }

    pub fn data(&self) -> &[u16] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u16> {
        self.data
    }

    /// Rebuild a viewable image from the packed words.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let index = y as usize * self.width as usize + x as usize;
            unpack(self.format, self.data[index])
        })
    }
}

/// The finished, immutable record of a converted bitmap.
///
/// This is what gets handed to code generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapDescriptor {
    name: String,
    width: u32,
    height: u32,
    compression: CompressionType,
    color_bit_depth: u8,
    word_size_bits: u8,
    payload_len_words: usize,
    payload_len_bytes: usize,
    payload: Payload,
}

impl BitmapDescriptor {
    /// Assemble a descriptor from the winning candidate.
    ///
    /// Spaces in `name` become underscores so it can be used as a symbol.
    pub fn new(name: &str, pixels: &PixelBuffer, candidate: CompressionCandidate) -> Self {
        let word_size_bits = candidate.payload.word_size_bits();
        let payload_len_words = candidate.payload.len();

        Self {
            name: name.replace(' ', "_"),
            width: pixels.width(),
            height: pixels.height(),
            compression: candidate.compression,
            color_bit_depth: pixels.format().color_bit_depth(),
            word_size_bits,
            payload_len_words,
            payload_len_bytes: payload_len_words * (word_size_bits / 8) as usize,
            payload: candidate.payload,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn compression(&self) -> CompressionType {
        self.compression
    }

    pub fn color_bit_depth(&self) -> u8 {
        self.color_bit_depth
    }

    pub fn word_size_bits(&self) -> u8 {
        self.word_size_bits
    }

    pub fn payload_len_words(&self) -> usize {
        self.payload_len_words
    }

    pub fn payload_len_bytes(&self) -> usize {
        self.payload_len_bytes
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Write the payload as little-endian bytes into anything that
    /// implements [Write].
    pub fn write_payload<O: Write + WriteBytesExt>(&self, output: &mut O) -> Result<usize, std::io::Error> {
        self.payload.write_into(output)
    }

    /// Recover the packed pixel words this descriptor was built from.
    pub fn decode_pixels(&self) -> Result<Vec<u16>, Error> {
        match (self.compression, &self.payload) {
            (CompressionType::None, Payload::Words(words)) => Ok(words.clone()),
            (CompressionType::None, Payload::Bytes(bytes)) => Ok(bytes.iter().map(|&b| b as u16).collect()),
            (CompressionType::Rle, Payload::Words(words)) => Ok(rle::decode(words)?),
            (compression, _) => Err(Error::NotDecodable(compression)),
        }
    }
}

/// Turns RGBA images into [`BitmapDescriptor`]s.
pub struct BitmapConverter {
    options: ConvertOptions,
    codec: Box<dyn StillImageCodec>,
}

impl BitmapConverter {
    /// Create a converter that uses JPEG as its still-image codec.
    pub fn new(options: ConvertOptions) -> Self {
        Self::with_codec(options, JpegCodec)
    }

    /// Create a converter with a custom still-image codec.
    ///
    /// `codec_timeout` in the options is applied to it as well.
    pub fn with_codec<C: StillImageCodec + 'static>(options: ConvertOptions, codec: C) -> Self {
        let codec: Box<dyn StillImageCodec> = match options.codec_timeout {
            Some(timeout) => Box::new(Deadline::new(codec, timeout)),
            None => Box::new(codec),
        };

        Self { options, codec }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Flatten and pack an image into a pixel buffer.
    pub fn rasterize(&self, image: &RgbaImage) -> PixelBuffer {
        PixelBuffer {
            width: image.width(),
            height: image.height(),
            format: self.options.format,
            data: pack_rgba(image.as_raw(), self.options.format, self.options.background()),
        }
    }

    /// Flatten and pack a raw RGBA8 bitmap into a pixel buffer.
    pub fn rasterize_raw(&self, width: u32, height: u32, bitmap: &[u8]) -> Result<PixelBuffer, Error> {
        let expected = width as usize * height as usize * 4;
        if bitmap.len() != expected {
            return Err(Error::DimensionMismatch {
                width,
                height,
                expected,
                got: bitmap.len(),
            });
        }

        Ok(PixelBuffer {
            width,
            height,
            format: self.options.format,
            data: pack_rgba(bitmap, self.options.format, self.options.background()),
        })
    }

    pub fn convert(&self, name: &str, image: &RgbaImage) -> Result<BitmapDescriptor, Error> {
        self.convert_pixels(name, self.rasterize(image))
    }

    pub fn convert_raw(&self, name: &str, width: u32, height: u32, bitmap: &[u8]) -> Result<BitmapDescriptor, Error> {
        self.convert_pixels(name, self.rasterize_raw(width, height, bitmap)?)
    }

    /// Compress an already packed buffer.
    pub fn convert_pixels(&self, name: &str, pixels: PixelBuffer) -> Result<BitmapDescriptor, Error> {
        let candidate = select_encoding(&pixels, &self.options.compression, &self.codec)?;
        debug!(
            "{name}: {}×{} as {:?}, {} bytes",
            pixels.width(),
            pixels.height(),
            candidate.compression,
            candidate.size_bytes()
        );

        Ok(BitmapDescriptor::new(name, &pixels, candidate))
    }

    /// Convert many images in parallel. Results come back in input order.
    pub fn convert_batch<S: AsRef<str> + Sync>(&self, images: &[(S, RgbaImage)]) -> Vec<Result<BitmapDescriptor, Error>> {
        images
            .par_iter()
            .map(|(name, image)| self.convert(name.as_ref(), image))
            .collect()
    }
}
