// THEORY:
// The `BlockGrid` is the smoothing half of the pixelation engine. It lays a coarse
// grid over the source image and collapses every grid cell into one averaged pixel.
// That average is what later becomes a flat block in the output.
//
// Key architectural principles:
// 1.  **Spatial Pooling**: Each output pixel summarises a rectangular footprint of
//     the source. When the block size divides the image evenly that footprint is an
//     exact `block_size x block_size` square and the result is its plain mean.
// 2.  **Fractional Coverage**: When it does not divide evenly, the grid still spans
//     the whole source. Output cell `t` along an axis covers `[t*S/T, (t+1)*S/T)`
//     source pixels, so edge pixels contribute partially to two neighbouring cells.
//     All coverage is kept in integer units (source length times target length) so
//     no weight is lost to floating point.
// 3.  **Precomputed Geometry**: The per-axis spans depend only on the dimensions, so
//     they are computed once when the grid is built and reused for every cell.
//
// The output of the grid (a small `RgbImage`) is the intermediate image that the
// `resample` module blows back up with nearest-neighbour sampling.

use crate::core_modules::pixel::pixel::{CHANNELS, Pixel};
use image::{ImageBuffer, Rgb, RgbImage};
use tracing::trace;

/// One source row or column and how much of it falls inside a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    index: u32,
    weight: u64,
}

/// Maps a source image onto a coarser grid of averaged cells.
#[derive(Debug, Clone)]
pub struct BlockGrid {
    source_width: u32,
    source_height: u32,
    /// The width of the grid in cells (the width of the downscaled image).
    grid_width: u32,
    /// The height of the grid in cells.
    grid_height: u32,
    columns: Vec<Vec<Span>>,
    rows: Vec<Vec<Span>>,
}

impl BlockGrid {
    /// Creates a grid of `grid_width x grid_height` cells over a source image.
    ///
    /// Both grid dimensions must be non-zero and no larger than the source; callers
    /// validate this before building a grid (see `resample::downscaled_dimensions`).
    pub fn new(source_width: u32, source_height: u32, grid_width: u32, grid_height: u32) -> Self {
        debug_assert!(grid_width > 0 && grid_width <= source_width);
        debug_assert!(grid_height > 0 && grid_height <= source_height);

        Self {
            source_width,
            source_height,
            grid_width,
            grid_height,
            columns: spans(source_width, grid_width),
            rows: spans(source_height, grid_height),
        }
    }

    pub fn grid_width(&self) -> u32 {
        self.grid_width
    }

    pub fn grid_height(&self) -> u32 {
        self.grid_height
    }

    /// Coverage-weighted mean of one grid cell, rounded to the nearest byte.
    pub fn average_cell(&self, image: &RgbImage, cell_x: u32, cell_y: u32) -> Pixel {
        let mut sums = [0u64; CHANNELS];

        for row in &self.rows[cell_y as usize] {
            for column in &self.columns[cell_x as usize] {
                let weight = row.weight * column.weight;
                let rgb = image.get_pixel(column.index, row.index);
                for (sum, &channel) in sums.iter_mut().zip(rgb.0.iter()) {
                    *sum += channel as u64 * weight;
                }
            }
        }

        // Every cell covers exactly source_width * source_height weight units.
        let total = self.source_width as u64 * self.source_height as u64;
        let average = |sum: u64| ((sum + total / 2) / total) as u8;
        Pixel::new(average(sums[0]), average(sums[1]), average(sums[2]))
    }

    /// Collapses the source image into the grid, one averaged pixel per cell.
    pub fn downscale(&self, image: &RgbImage) -> RgbImage {
        debug_assert_eq!(image.dimensions(), (self.source_width, self.source_height));
        trace!(
            source_width = self.source_width,
            source_height = self.source_height,
            grid_width = self.grid_width,
            grid_height = self.grid_height,
            "area-averaging into block grid"
        );

        ImageBuffer::from_fn(self.grid_width, self.grid_height, |x, y| {
            Rgb::from(self.average_cell(image, x, y))
        })
    }
}

/// Area-averages `image` down to `grid_width x grid_height`.
pub fn area_average(image: &RgbImage, grid_width: u32, grid_height: u32) -> RgbImage {
    let (width, height) = image.dimensions();
    BlockGrid::new(width, height, grid_width, grid_height).downscale(image)
}

/// For each of `target_len` cells, the source indices it overlaps and by how much.
///
/// Source pixel `s` occupies `[s*T, (s+1)*T)` and cell `t` occupies `[t*S, (t+1)*S)`
/// on a common axis scaled by `S * T`; the weights of one cell always sum to `S`.
fn spans(source_len: u32, target_len: u32) -> Vec<Vec<Span>> {
    let source = source_len as u64;
    let target = target_len as u64;

    (0..target)
        .map(|cell| {
            let start = cell * source;
            let end = start + source;
            let first = start / target;
            let last = (end - 1) / target;

            (first..=last)
                .map(|index| {
                    let lo = (index * target).max(start);
                    let hi = ((index + 1) * target).min(end);
                    Span {
                        index: index as u32,
                        weight: hi - lo,
                    }
                })
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_weights_cover_the_whole_source() {
        for (source, target) in [(10, 1), (100, 10), (105, 10), (37, 3), (7, 7)] {
            let cells = spans(source, target);
            assert_eq!(cells.len(), target as usize);
            for cell in &cells {
                let covered: u64 = cell.iter().map(|span| span.weight).sum();
                assert_eq!(covered, source as u64);
            }
            let last = cells.last().and_then(|cell| cell.last()).map(|span| span.index);
            assert_eq!(last, Some(source - 1));
        }
    }

    #[test]
    fn even_blocks_use_only_their_own_pixels() {
        let cells = spans(20, 2);
        let first: Vec<u32> = cells[0].iter().map(|span| span.index).collect();
        let second: Vec<u32> = cells[1].iter().map(|span| span.index).collect();
        assert_eq!(first, (0..10).collect::<Vec<_>>());
        assert_eq!(second, (10..20).collect::<Vec<_>>());
    }

    #[test]
    fn even_blocks_average_to_their_mean() {
        // 4x2 image, two 2x2 blocks: left block mixes 0 and 100, right block is flat.
        let image = ImageBuffer::from_fn(4, 2, |x, y| match (x, y) {
            (0, _) => Rgb([0u8, 0, 0]),
            (1, _) => Rgb([100, 100, 100]),
            _ => Rgb([200, 10, 30]),
        });

        let small = area_average(&image, 2, 1);
        assert_eq!(small.dimensions(), (2, 1));
        assert_eq!(*small.get_pixel(0, 0), Rgb([50, 50, 50]));
        assert_eq!(*small.get_pixel(1, 0), Rgb([200, 10, 30]));
    }

    #[test]
    fn fractional_cells_weight_shared_pixels() {
        // Three source columns onto two cells: each cell takes 1.5 source pixels.
        let image = ImageBuffer::from_fn(3, 1, |x, _| {
            let value = (x * 90) as u8;
            Rgb([value, value, value])
        });

        let small = area_average(&image, 2, 1);
        // (0*2 + 90*1) / 3 = 30, (90*1 + 180*2) / 3 = 150
        assert_eq!(small.get_pixel(0, 0).0[0], 30);
        assert_eq!(small.get_pixel(1, 0).0[0], 150);
    }

    #[test]
    fn averages_round_to_nearest() {
        let image = ImageBuffer::from_fn(2, 1, |x, _| if x == 0 { Rgb([0u8, 0, 255]) } else { Rgb([1, 255, 255]) });
        let cell = BlockGrid::new(2, 1, 1, 1).average_cell(&image, 0, 0);
        assert_eq!(cell, Pixel::new(1, 128, 255));
    }
}
