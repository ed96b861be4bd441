use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::canvas::BackingCanvas;
use crate::geometry::ToolBounds;

const MIN_BLOCK_SIZE: u32 = 4;

/// Resampling filter used when blitting between the region and its grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingFilter {
    /// Each destination pixel is the coverage-weighted mean of the source
    /// pixels under it.
    AreaAverage,
    NearestNeighbor,
}

/// Block grid a region is reduced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MosaicGrid {
    pub block_size: u32,
    pub columns: u32,
    pub rows: u32,
}

impl MosaicGrid {
    pub fn for_region(width: u32, height: u32, stroke_size: u8) -> Self {
        let block_size = mosaic_block_size(stroke_size);
        Self {
            block_size,
            columns: (width / block_size).max(1),
            rows: (height / block_size).max(1),
        }
    }
}

pub fn mosaic_block_size(stroke_size: u8) -> u32 {
    (u32::from(stroke_size) * 2).max(MIN_BLOCK_SIZE)
}

pub struct MosaicEngine;

impl MosaicEngine {
    /// Pixelates `bounds` in place. `bounds` must already lie inside the canvas.
    pub fn apply(canvas: &mut BackingCanvas, bounds: ToolBounds, stroke_size: u8) -> MosaicGrid {
        let grid = MosaicGrid::for_region(bounds.width, bounds.height, stroke_size);
        let region = canvas.read_region(bounds);
        let blocks = resample(
            &region,
            grid.columns,
            grid.rows,
            SamplingFilter::AreaAverage,
        );
        let pixelated = resample(
            &blocks,
            bounds.width,
            bounds.height,
            SamplingFilter::NearestNeighbor,
        );
        canvas.write_region(bounds, &pixelated);
        tracing::debug!(
            x = bounds.x,
            y = bounds.y,
            width = bounds.width,
            height = bounds.height,
            block = grid.block_size,
            columns = grid.columns,
            rows = grid.rows,
            "mosaic applied"
        );
        grid
    }
}

/// Scales `source` to `width`×`height` with the given filter.
pub fn resample(
    source: &RgbaImage,
    width: u32,
    height: u32,
    filter: SamplingFilter,
) -> RgbaImage {
    if source.width() == 0 || source.height() == 0 || width == 0 || height == 0 {
        return RgbaImage::new(width, height);
    }
    match filter {
        SamplingFilter::AreaAverage => area_average(source, width, height),
        SamplingFilter::NearestNeighbor => {
            imageops::resize(source, width, height, FilterType::Nearest)
        }
    }
}

/// Source pixel indices and their overlap with `[start, end)`.
fn spans(start: f64, end: f64, limit: u32) -> impl Iterator<Item = (u32, f64)> {
    let first = start.floor() as u32;
    let last = (end.ceil() as u32).min(limit);
    (first..last).filter_map(move |index| {
        let lo = f64::from(index).max(start);
        let hi = f64::from(index + 1).min(end);
        (hi > lo).then_some((index, hi - lo))
    })
}

fn area_average(source: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    let ratio_x = f64::from(source.width()) / f64::from(width);
    let ratio_y = f64::from(source.height()) / f64::from(height);
    RgbaImage::from_fn(width, height, |x, y| {
        let x0 = f64::from(x) * ratio_x;
        let y0 = f64::from(y) * ratio_y;
        // Premultiplied sums so transparent pixels do not bleed their color.
        let mut sums = [0.0_f64; 4];
        let mut total = 0.0_f64;
        for (sy, wy) in spans(y0, y0 + ratio_y, source.height()) {
            for (sx, wx) in spans(x0, x0 + ratio_x, source.width()) {
                let weight = wx * wy;
                let pixel = source.get_pixel(sx, sy);
                let alpha = f64::from(pixel[3]) / 255.0;
                for channel in 0..3 {
                    sums[channel] += f64::from(pixel[channel]) * alpha * weight;
                }
                sums[3] += alpha * weight;
                total += weight;
            }
        }
        if total <= 0.0 || sums[3] <= 0.0 {
            return Rgba([0, 0, 0, 0]);
        }
        let channel = |sum: f64| (sum / sums[3]).round().clamp(0.0, 255.0) as u8;
        Rgba([
            channel(sums[0]),
            channel(sums[1]),
            channel(sums[2]),
            (sums[3] / total * 255.0).round().clamp(0.0, 255.0) as u8,
        ])
    })
}
