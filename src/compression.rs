//! Trial-encoding a packed bitmap and keeping the smallest result.

pub mod rle;
pub mod still;

use std::io::Write;

use byteorder::{WriteBytesExt, LE};
use log::{debug, warn};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

use crate::{
    config::CompressionConfig,
    format::{ColorFormat, CompressionMode, CompressionType},
    picture::{Error, PixelBuffer},
};
use still::StillImageCodec;

/// The order [`CompressionMode::Auto`] compares candidates in. On a size tie
/// the earlier entry wins.
pub const AUTO_ORDER: [CompressionType; 3] = [
    CompressionType::None,
    CompressionType::Rle,
    CompressionType::External,
];

/// Encoded bitmap data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// 16-bit words
    Words(Vec<u16>),

    /// 8-bit words
    Bytes(Vec<u8>),
}

impl Payload {
    /// Number of words in the payload.
    pub fn len(&self) -> usize {
        match self {
            Payload::Words(w) => w.len(),
            Payload::Bytes(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width of a single payload word in bits.
    pub fn word_size_bits(&self) -> u8 {
        match self {
            Payload::Words(_) => 16,
            Payload::Bytes(_) => 8,
        }
    }

    /// Size of the payload in bytes.
    pub fn size_bytes(&self) -> usize {
        self.len() * (self.word_size_bits() / 8) as usize
    }

    pub fn as_words(&self) -> Option<&[u16]> {
        match self {
            Payload::Words(w) => Some(w),
            Payload::Bytes(_) => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Words(_) => None,
            Payload::Bytes(b) => Some(b),
        }
    }

    /// Write the payload out as little-endian bytes, returning the number of
    /// bytes written.
    pub fn write_into<T: WriteBytesExt + Write>(
        &self,
        output: &mut T,
    ) -> Result<usize, std::io::Error> {
        match self {
            Payload::Words(words) => {
                for &word in words {
                    output.write_u16::<LE>(word)?;
                }
            }
            Payload::Bytes(bytes) => output.write_all(bytes)?,
        }

        Ok(self.size_bytes())
    }
}

/// One trial encoding of a bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionCandidate {
    pub compression: CompressionType,
    pub payload: Payload,
}

impl CompressionCandidate {
    pub fn size_bytes(&self) -> usize {
        self.payload.size_bytes()
    }
}

/// Encode `pixels` as `config` asks.
///
/// An explicit mode fails if its strategy fails. [`CompressionMode::Auto`]
/// never fails: strategies that cannot encode the buffer are left out and the
/// uncompressed candidate is always available.
pub fn select_encoding<C: StillImageCodec + ?Sized>(
    pixels: &PixelBuffer,
    config: &CompressionConfig,
    codec: &C,
) -> Result<CompressionCandidate, Error> {
    let strategy = match config.mode {
        CompressionMode::None => CompressionType::None,
        CompressionMode::Rle => CompressionType::Rle,
        CompressionMode::External => CompressionType::External,
        CompressionMode::Auto => return Ok(select_smallest(pixels, config, codec)),
    };

    trial(strategy, pixels, config.effective_quality(), codec)
}

fn select_smallest<C: StillImageCodec + ?Sized>(
    pixels: &PixelBuffer,
    config: &CompressionConfig,
    codec: &C,
) -> CompressionCandidate {
    let try_external = config.quality.is_some();
    let quality = config.effective_quality();

    let mut best = raw_candidate(pixels);
    debug!("candidate {:?}: {} bytes", best.compression, best.size_bytes());

    let strategies: Vec<CompressionType> = AUTO_ORDER[1..]
        .iter()
        .copied()
        .filter(|&s| s != CompressionType::External || try_external)
        .collect();

    // Collecting keeps the order of `strategies`
    let trials: Vec<_> = strategies
        .par_iter()
        .map(|&strategy| (strategy, trial(strategy, pixels, quality, codec)))
        .collect();

    for (strategy, result) in trials {
        match result {
            Ok(candidate) => {
                debug!("candidate {:?}: {} bytes", strategy, candidate.size_bytes());
                if candidate.size_bytes() < best.size_bytes() {
                    best = candidate;
                }
            }
            Err(e) => warn!("leaving {strategy:?} out of the selection: {e}"),
        }
    }

    debug!("selected {:?} ({} bytes)", best.compression, best.size_bytes());
    best
}

fn trial<C: StillImageCodec + ?Sized>(
    strategy: CompressionType,
    pixels: &PixelBuffer,
    quality: u8,
    codec: &C,
) -> Result<CompressionCandidate, Error> {
    let payload = match strategy {
        CompressionType::None => return Ok(raw_candidate(pixels)),
        CompressionType::Rle => Payload::Words(rle::encode(pixels.data())?),
        CompressionType::External => Payload::Bytes(codec.encode(&pixels.to_rgb_image(), quality)?),
    };

    Ok(CompressionCandidate {
        compression: strategy,
        payload,
    })
}

fn raw_candidate(pixels: &PixelBuffer) -> CompressionCandidate {
    let payload = match pixels.format() {
        ColorFormat::Rgb565 => Payload::Words(pixels.data().to_vec()),
        ColorFormat::Rgb332 => Payload::Bytes(pixels.data().iter().map(|&w| w as u8).collect()),
    };

    CompressionCandidate {
        compression: CompressionType::None,
        payload,
    }
}
