// THEORY:
// `codec` is the engine's only contact with encoded bytes. Decoding accepts any
// format the `image` crate recognises and immediately normalises it to 8-bit RGB:
// palettes are expanded, 16-bit channels are scaled down, gray is widened and
// alpha is dropped (not composited). Encoding always writes lossless PNG.

use crate::error::{PixelateError, Result};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use tracing::trace;

pub const PNG_CONTENT_TYPE: &str = "image/png";

/// Decodes raw image bytes into an RGB raster.
pub fn decode(bytes: &[u8]) -> Result<RgbImage> {
    let decoded = image::load_from_memory(bytes).map_err(PixelateError::Decode)?;
    trace!(
        width = decoded.width(),
        height = decoded.height(),
        color = ?decoded.color(),
        "decoded input image"
    );
    Ok(decoded.to_rgb8())
}

/// Encodes an RGB raster as PNG bytes.
pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    let encoder = PngEncoder::new(&mut buffer);

    encoder
        .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgb8)
        .map_err(PixelateError::Encode)?;

    Ok(buffer)
}
