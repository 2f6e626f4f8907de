//! Converts images into compact bitmap records for small embedded displays.
//!
//! Pixels are flattened onto a background, packed into 8 or 16-bit color
//! words, then stored whichever way is smallest: raw, run-length encoded, or
//! through an external still-image codec such as JPEG.
//!
//! # Example
//! ```no_run
//! use nbitmap::{BitmapConverter, CompressionMode, ConvertOptions};
//!
//! let image = image::RgbaImage::from_pixel(32, 32, image::Rgba([0, 128, 255, 255]));
//!
//! let mut options = ConvertOptions::default();
//! options.compression.mode = CompressionMode::Auto;
//! options.compression.quality = Some(80);
//!
//! let bitmap = BitmapConverter::new(options)
//!     .convert("splash", &image)
//!     .expect("conversion failed");
//!
//! println!("{:?}: {} bytes", bitmap.compression(), bitmap.payload_len_bytes());
//! ```

pub mod compression;
pub mod config;
pub mod format;
pub mod operations;
pub mod picture;

pub use compression::{
    rle,
    select_encoding,
    still::{CodecError, Deadline, JpegCodec, StillImageCodec},
    CompressionCandidate, Payload,
};
pub use config::{CompressionConfig, ConvertOptions, DEFAULT_BACKGROUND, DEFAULT_QUALITY};
pub use format::{ColorFormat, CompressionMode, CompressionType};
pub use picture::{BitmapConverter, BitmapDescriptor, Error, PixelBuffer};
