// THEORY:
// The tone stage is the last pixel-wise pass of the engine. It removes colour by
// replacing every pixel with its Rec. 601 gray value. There is also a strict
// black/white mode that cuts the gray value at a fixed level. It is never on by
// default: continuous grayscale is the normal output.

use crate::core_modules::pixel::pixel::Pixel;
use image::{ImageBuffer, Rgb, RgbImage};

/// How the pixelated colour image is mapped to its final tones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToneMode {
    /// Continuous luma: `(gray, gray, gray)`.
    #[default]
    Grayscale,
    /// Binary output: gray values below `level` become black, the rest white.
    Threshold { level: u8 },
}

impl ToneMode {
    pub fn map(&self, pixel: Pixel) -> Pixel {
        let gray = pixel.gray();
        match *self {
            ToneMode::Grayscale => Pixel::splat(gray),
            ToneMode::Threshold { level } if gray < level => Pixel::splat(0),
            ToneMode::Threshold { .. } => Pixel::splat(255),
        }
    }

    /// Builds a new, fully gray image; the input is left untouched.
    pub fn apply(&self, image: &RgbImage) -> RgbImage {
        let (width, height) = image.dimensions();
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb::from(self.map(Pixel::from(image.get_pixel(x, y))))
        })
    }
}

pub fn to_grayscale(image: &RgbImage) -> RgbImage {
    ToneMode::Grayscale.apply(image)
}
