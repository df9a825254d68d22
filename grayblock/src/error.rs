//! Error type for the pixelation engine.
//!
//! Every failure is terminal for the image being processed: the engine never
//! hands back a partial result or the untouched input in place of an error.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PixelateError {
    /// The input bytes are not an image format the decoder recognises.
    #[error("could not decode image: {0}")]
    Decode(#[source] image::ImageError),

    /// The block size is larger than one of the image dimensions, so the
    /// downscaled image would have a zero-length side.
    #[error("a {width}x{height} image is smaller than the {block_size}px block size")]
    InvalidDimensions {
        width: u32,
        height: u32,
        block_size: u32,
    },

    #[error("could not encode image as PNG: {0}")]
    Encode(#[source] image::ImageError),

    #[error("block size must be at least 1, got {0}")]
    InvalidBlockSize(u32),
}

pub type Result<T> = std::result::Result<T, PixelateError>;
