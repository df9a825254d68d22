// THEORY:
// `resample` owns both resizing steps of the pixelation effect.
//
// Downscaling must smooth: each intermediate pixel should stand for the whole
// region it replaces. The default is our own exact area average (`BlockGrid`);
// the `image` crate's convolution kernels are available as alternatives.
//
// Upscaling must NOT smooth: nearest-neighbour sampling replicates every
// intermediate pixel across its footprint, which is what makes the blocks
// visible. The target is always the original size, so the output matches the
// input dimensions even when the block size does not divide them.

use crate::core_modules::block_grid::BlockGrid;
use crate::error::{PixelateError, Result};
use image::imageops::{self, FilterType};
use image::{ImageBuffer, RgbImage};
use tracing::trace;

/// Smoothing filter used for the downscale step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DownscaleFilter {
    /// Exact coverage-weighted box average over each block.
    #[default]
    AreaAverage,
    /// Linear (tent) kernel from the `image` crate.
    Triangle,
    /// Cubic kernel from the `image` crate.
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl DownscaleFilter {
    fn image_filter(self) -> Option<FilterType> {
        match self {
            DownscaleFilter::AreaAverage => None,
            DownscaleFilter::Triangle => Some(FilterType::Triangle),
            DownscaleFilter::CatmullRom => Some(FilterType::CatmullRom),
            DownscaleFilter::Gaussian => Some(FilterType::Gaussian),
            DownscaleFilter::Lanczos3 => Some(FilterType::Lanczos3),
        }
    }
}

/// `(width / block_size, height / block_size)`, rejecting a zero-length side.
pub fn downscaled_dimensions(width: u32, height: u32, block_size: u32) -> Result<(u32, u32)> {
    if block_size == 0 {
        return Err(PixelateError::InvalidBlockSize(block_size));
    }

    let (small_width, small_height) = (width / block_size, height / block_size);
    if small_width == 0 || small_height == 0 {
        return Err(PixelateError::InvalidDimensions {
            width,
            height,
            block_size,
        });
    }

    Ok((small_width, small_height))
}

/// Shrinks `image` by `block_size` in both directions with a smoothing filter.
pub fn downscale(image: &RgbImage, block_size: u32, filter: DownscaleFilter) -> Result<RgbImage> {
    let (width, height) = image.dimensions();
    let (small_width, small_height) = downscaled_dimensions(width, height, block_size)?;

    let small = match filter.image_filter() {
        None => BlockGrid::new(width, height, small_width, small_height).downscale(image),
        Some(kernel) => imageops::resize(image, small_width, small_height, kernel),
    };
    Ok(small)
}

/// Nearest-neighbour resize of `image` to exactly `width x height`.
///
/// Output pixel `(x, y)` samples source pixel `(x * sw / width, y * sh / height)`.
pub fn upscale_nearest(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (source_width, source_height) = image.dimensions();
    if (source_width, source_height) == (width, height) {
        return image.clone();
    }
    trace!(source_width, source_height, width, height, "nearest-neighbour upscale");

    let columns = nearest_indices(source_width, width);
    let rows = nearest_indices(source_height, height);

    ImageBuffer::from_fn(width, height, |x, y| {
        *image.get_pixel(columns[x as usize], rows[y as usize])
    })
}

fn nearest_indices(source_len: u32, target_len: u32) -> Vec<u32> {
    (0..target_len as u64)
        .map(|i| (i * source_len as u64 / target_len as u64) as u32)
        .collect()
}
