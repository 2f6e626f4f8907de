//! External still-image codecs.
//!
//! The selector only needs `encode(image, quality) -> bytes`, so anything that
//! can squeeze an RGB image into a byte blob can be plugged in through
//! [`StillImageCodec`]. Encoding always happens into memory.

use std::{
    io::Cursor,
    sync::{mpsc, Arc},
    thread,
    time::Duration,
};

use image::{codecs::jpeg::JpegEncoder, RgbImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("still-image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("still-image encoding did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("still-image codec unavailable: {0}")]
    Unavailable(String),

    #[error("cannot encode an empty image")]
    EmptyImage,
}

/// A lossy still-image codec.
pub trait StillImageCodec: Send + Sync {
    /// Encode `image` at `quality` (1-100, higher is better) into a byte blob.
    fn encode(&self, image: &RgbImage, quality: u8) -> Result<Vec<u8>, CodecError>;
}

impl<C: StillImageCodec + ?Sized> StillImageCodec for Box<C> {
    fn encode(&self, image: &RgbImage, quality: u8) -> Result<Vec<u8>, CodecError> {
        (**self).encode(image, quality)
    }
}

impl<C: StillImageCodec + ?Sized> StillImageCodec for Arc<C> {
    fn encode(&self, image: &RgbImage, quality: u8) -> Result<Vec<u8>, CodecError> {
        (**self).encode(image, quality)
    }
}

/// Baseline JPEG through the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegCodec;

impl StillImageCodec for JpegCodec {
    fn encode(&self, image: &RgbImage, quality: u8) -> Result<Vec<u8>, CodecError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(CodecError::EmptyImage);
        }

        let mut output = Cursor::new(Vec::new());

        // JPEG quality starts at 1
        JpegEncoder::new_with_quality(&mut output, quality.clamp(1, 100)).encode_image(image)?;

        Ok(output.into_inner())
    }
}

/// Bounds another codec by a deadline.
///
/// The wrapped encode runs on its own thread. When the deadline passes the
/// caller gets [`CodecError::TimedOut`] and the worker's result is dropped
/// whenever it eventually finishes.
pub struct Deadline<C> {
    inner: Arc<C>,
    timeout: Duration,
}

impl<C> Deadline<C> {
    pub fn new(inner: C, timeout: Duration) -> Self {
        Self {
            inner: Arc::new(inner),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl<C: StillImageCodec + 'static> StillImageCodec for Deadline<C> {
    fn encode(&self, image: &RgbImage, quality: u8) -> Result<Vec<u8>, CodecError> {
        let (tx, rx) = mpsc::sync_channel(1);
        let codec = Arc::clone(&self.inner);
        let image = image.clone();

        thread::Builder::new()
            .name("nbitmap-still-encode".into())
            .spawn(move || {
                let _ = tx.send(codec.encode(&image, quality));
            })
            .map_err(|e| CodecError::Unavailable(format!("could not spawn encoder: {e}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(CodecError::TimedOut(self.timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err(CodecError::Unavailable("encoder thread exited without a result".into()))
            }
        }
    }
}
