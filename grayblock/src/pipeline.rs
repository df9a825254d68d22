// THEORY:
// The `pipeline` module is the top-level API of the pixelation engine. It wraps the
// full stack (decode, downscale, upscale, tone, encode) behind a single, immutable
// `Pixelator`. A `Pixelator` holds no per-image state, so one instance can serve
// any number of images, from any number of threads, without locking.

use crate::core_modules::{codec, resample};
use crate::error::{PixelateError, Result};
use image::RgbImage;
use tracing::debug;

// Re-export the knobs of the public API.
pub use crate::core_modules::resample::DownscaleFilter;
pub use crate::core_modules::tone::ToneMode;

/// Edge length, in source pixels, of one output block.
pub const DEFAULT_BLOCK_SIZE: u32 = 10;

/// Configuration for the Pixelator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelationConfig {
    /// Edge length of a block. Must be at least 1 and no larger than either
    /// side of an input image.
    pub block_size: u32,
    pub downscale: DownscaleFilter,
    pub tone: ToneMode,
}

impl Default for PixelationConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            downscale: DownscaleFilter::default(),
            tone: ToneMode::default(),
        }
    }
}

/// The main, top-level struct for the pixelation engine.
#[derive(Debug, Clone, Default)]
pub struct Pixelator {
    config: PixelationConfig,
}

impl Pixelator {
    pub fn new(config: PixelationConfig) -> Result<Self> {
        if config.block_size == 0 {
            return Err(PixelateError::InvalidBlockSize(config.block_size));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &PixelationConfig {
        &self.config
    }

    /// Pixelates a decoded image. The output always has the input's dimensions.
    pub fn transform(&self, image: &RgbImage) -> Result<RgbImage> {
        let (width, height) = image.dimensions();

        // Stage 1: Smoothing downscale to one pixel per block
        let small = resample::downscale(image, self.config.block_size, self.config.downscale)?;
        debug!(
            width,
            height,
            small_width = small.width(),
            small_height = small.height(),
            "downscaled"
        );

        // Stage 2: Blocky upscale back to the original size
        let blocky = resample::upscale_nearest(&small, width, height);

        // Stage 3: Tone mapping
        Ok(self.config.tone.apply(&blocky))
    }

    /// Decodes `bytes`, pixelates the image and returns it as PNG bytes.
    pub fn process(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        let image = codec::decode(bytes)?;
        let output = self.transform(&image)?;
        let png = codec::encode_png(&output)?;
        debug!(
            input_bytes = bytes.len(),
            output_bytes = png.len(),
            width = output.width(),
            height = output.height(),
            "pixelated image"
        );
        Ok(png)
    }
}

/// Pixelates `image` with the default configuration.
pub fn transform(image: &RgbImage) -> Result<RgbImage> {
    Pixelator::default().transform(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb, Rgba};
    use std::io::Cursor;

    fn grays(image: &RgbImage) -> Vec<u8> {
        image.pixels().map(|p| p.0[0]).collect()
    }

    fn texture(width: u32, height: u32) -> RgbImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([(x * 13 % 256) as u8, (y * 29 % 256) as u8, ((x * y) % 256) as u8])
        })
    }

    #[test]
    fn solid_red_becomes_uniform_gray_76() {
        let red = ImageBuffer::from_pixel(100, 100, Rgb([255u8, 0, 0]));
        let output = transform(&red).expect("transform");

        assert_eq!(output.dimensions(), (100, 100));
        assert!(output.pixels().all(|p| *p == Rgb([76, 76, 76])));
    }

    #[test]
    fn output_keeps_input_dimensions() {
        for (width, height) in [(10, 10), (100, 100), (105, 37), (11, 999), (64, 10)] {
            let output = transform(&texture(width, height)).expect("transform");
            assert_eq!(output.dimensions(), (width, height));
        }
    }

    #[test]
    fn output_is_always_gray() {
        let output = transform(&texture(57, 43)).expect("transform");
        assert!(output.pixels().all(|p| Pixel::from(p).is_gray()));
    }

    #[test]
    fn every_block_is_flat() {
        let output = transform(&texture(40, 30)).expect("transform");

        for block_y in 0..3 {
            for block_x in 0..4 {
                let expected = output.get_pixel(block_x * 10, block_y * 10);
                for y in block_y * 10..(block_y + 1) * 10 {
                    for x in block_x * 10..(block_x + 1) * 10 {
                        assert_eq!(output.get_pixel(x, y), expected, "block ({block_x}, {block_y})");
                    }
                }
            }
        }
    }

    #[test]
    fn sharp_split_is_blended_within_a_block() {
        let split = ImageBuffer::from_fn(10, 10, |x, _| {
            if x < 5 { Rgb([0u8, 0, 255]) } else { Rgb([255, 255, 255]) }
        });
        let output = transform(&split).expect("transform");

        // Average colour is (128, 128, 255), so the whole block lands on gray 142,
        // between pure blue (29) and white (255).
        assert!(grays(&output).iter().all(|&g| g == 142));
    }

    #[test]
    fn straddling_block_is_blended_at_smaller_block_sizes() {
        let split = ImageBuffer::from_fn(10, 10, |x, _| {
            if x < 5 { Rgb([0u8, 0, 255]) } else { Rgb([255, 255, 255]) }
        });
        let pixelator = Pixelator::new(PixelationConfig { block_size: 3, ..Default::default() })
            .expect("pixelator");
        let output = pixelator.transform(&split).expect("transform");
        let left = output.get_pixel(0, 0).0[0];
        let middle = output.get_pixel(5, 0).0[0];
        let right = output.get_pixel(9, 0).0[0];

        assert_eq!(left, 29);
        assert_eq!(right, 255);
        assert!(left < middle && middle < right, "middle block {middle} was not blended");
    }

    #[test]
    fn images_smaller_than_a_block_are_rejected() {
        let narrow = texture(9, 100);
        assert!(matches!(
            transform(&narrow),
            Err(PixelateError::InvalidDimensions { width: 9, height: 100, block_size: 10 })
        ));
        assert!(matches!(
            transform(&texture(100, 1)),
            Err(PixelateError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn zero_block_size_is_rejected_up_front() {
        let config = PixelationConfig { block_size: 0, ..Default::default() };
        assert!(matches!(Pixelator::new(config), Err(PixelateError::InvalidBlockSize(0))));
    }

    #[test]
    fn input_image_is_not_modified() {
        let input = texture(30, 30);
        let before = input.clone();
        let _ = transform(&input).expect("transform");
        assert_eq!(input, before);
    }

    #[test]
    fn threshold_mode_is_black_and_white() {
        let config = PixelationConfig { tone: ToneMode::Threshold { level: 128 }, ..Default::default() };
        let output = Pixelator::new(config).expect("pixelator").transform(&texture(50, 50)).expect("transform");
        assert!(grays(&output).iter().all(|&g| g == 0 || g == 255));
    }

    #[test]
    fn kernel_filters_still_produce_flat_gray_blocks() {
        let config = PixelationConfig { downscale: DownscaleFilter::CatmullRom, ..Default::default() };
        let output = Pixelator::new(config).expect("pixelator").transform(&texture(40, 40)).expect("transform");
        assert_eq!(output.dimensions(), (40, 40));
        assert!(output.pixels().all(|p| Pixel::from(p).is_gray()));
        assert_eq!(output.get_pixel(10, 10), output.get_pixel(19, 19));
    }

    #[test]
    fn process_round_trips_png_bytes() {
        let mut input = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(ImageBuffer::from_pixel(100, 100, Rgba([255u8, 0, 0, 128])))
            .write_to(&mut input, ImageFormat::Png)
            .expect("Error encoding fixture.");

        let png = Pixelator::default().process(input.get_ref()).expect("process");
        let output = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .expect("output is PNG")
            .to_rgb8();

        assert_eq!(output.dimensions(), (100, 100));
        assert!(output.pixels().all(|p| *p == Rgb([76, 76, 76])));
    }

    #[test]
    fn process_accepts_gif_input() {
        let mut input = Cursor::new(Vec::new());
        let two_tone = ImageBuffer::from_fn(20, 20, |x, _| {
            if x < 10 { Rgba([255u8, 0, 0, 255]) } else { Rgba([0, 0, 255, 255]) }
        });
        DynamicImage::ImageRgba8(two_tone)
            .write_to(&mut input, ImageFormat::Gif)
            .expect("Error encoding fixture.");

        let png = Pixelator::default().process(input.get_ref()).expect("process");
        let output = image::load_from_memory_with_format(&png, ImageFormat::Png)
            .expect("output is PNG")
            .to_rgb8();

        assert_eq!(output.dimensions(), (20, 20));
        assert_eq!(*output.get_pixel(0, 0), Rgb([76, 76, 76]));
        assert_eq!(*output.get_pixel(19, 19), Rgb([29, 29, 29]));
    }

    #[test]
    fn process_rejects_garbage() {
        assert!(matches!(Pixelator::default().process(b"\x89PNG nope"), Err(PixelateError::Decode(_))));
    }
}
