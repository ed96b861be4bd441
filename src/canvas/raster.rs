//! Anti-aliased raster primitives drawn straight into the backing bitmap.
//!
//! Every primitive computes a per-pixel coverage in `[0, 1]` and blends the
//! stroke color once per pixel, so overlapping parts of one primitive (joins,
//! arrow heads) never accumulate opacity.

use image::{Rgba, RgbaImage};

use crate::geometry::{CanvasPoint, Color};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Color,
    /// Percent, 0–100.
    pub opacity: u8,
    pub width: f64,
}

impl StrokeStyle {
    pub const fn new(color: Color, opacity: u8, width: f64) -> Self {
        Self {
            color,
            opacity,
            width,
        }
    }

    pub fn alpha(&self) -> f32 {
        f32::from(self.opacity.min(100)) / 100.0
    }

    fn radius(&self) -> f64 {
        (self.width / 2.0).max(0.5)
    }
}

/// Axis-aligned rectangle in backing coordinates with fractional edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectF {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl RectF {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_corners(a: CanvasPoint, b: CanvasPoint) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self::new(x, y, (a.x - b.x).abs(), (a.y - b.y).abs())
    }

    fn inflate(&self, amount: f64) -> Self {
        Self::new(
            self.x - amount,
            self.y - amount,
            self.width + amount * 2.0,
            self.height + amount * 2.0,
        )
    }

    /// Signed distance from `(px, py)` to the rectangle, negative inside.
    fn signed_distance(&self, px: f64, py: f64) -> f64 {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        let qx = (px - (self.x + half_w)).abs() - half_w;
        let qy = (py - (self.y + half_h)).abs() - half_h;
        let outside = qx.max(0.0).hypot(qy.max(0.0));
        outside + qx.max(qy).min(0.0)
    }
}

/// Source-over blend of `color` at `alpha` onto a straight-alpha pixel.
pub fn blend_pixel(pixel: &mut Rgba<u8>, color: Color, alpha: f32) {
    let src_a = alpha.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }
    let dst_a = f32::from(pixel[3]) / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        *pixel = Rgba([0, 0, 0, 0]);
        return;
    }

    let (r, g, b) = color.rgb();
    let mix = |src: u8, dst: u8| -> u8 {
        let value =
            (f32::from(src) * src_a + f32::from(dst) * dst_a * (1.0 - src_a)) / out_a;
        value.round().clamp(0.0, 255.0) as u8
    };
    *pixel = Rgba([
        mix(r, pixel[0]),
        mix(g, pixel[1]),
        mix(b, pixel[2]),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ]);
}

fn blend_coverage(
    image: &mut RgbaImage,
    area: RectF,
    color: Color,
    alpha: f32,
    coverage: impl Fn(f64, f64) -> f64,
) {
    if image.width() == 0 || image.height() == 0 {
        return;
    }
    let max_x = f64::from(image.width());
    let max_y = f64::from(image.height());
    let x0 = area.x.floor().clamp(0.0, max_x) as u32;
    let y0 = area.y.floor().clamp(0.0, max_y) as u32;
    let x1 = (area.x + area.width).ceil().clamp(0.0, max_x) as u32;
    let y1 = (area.y + area.height).ceil().clamp(0.0, max_y) as u32;

    for y in y0..y1 {
        for x in x0..x1 {
            let cover = coverage(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if cover > 0.0 {
                blend_pixel(image.get_pixel_mut(x, y), color, alpha * cover as f32);
            }
        }
    }
}

fn distance_to_segment(px: f64, py: f64, from: CanvasPoint, to: CanvasPoint) -> f64 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length_sq = dx * dx + dy * dy;
    let t = if length_sq > 0.0 {
        (((px - from.x) * dx + (py - from.y) * dy) / length_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (px - (from.x + t * dx)).hypot(py - (from.y + t * dy))
}

fn polyline_bounds(segments: &[(CanvasPoint, CanvasPoint)], pad: f64) -> Option<RectF> {
    let mut points = segments.iter().flat_map(|(a, b)| [*a, *b]);
    let first = points.next()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }
    Some(RectF::new(min_x, min_y, max_x - min_x, max_y - min_y).inflate(pad))
}

/// Strokes a set of segments with round caps and joins as one coverage pass.
pub fn stroke_segments(
    image: &mut RgbaImage,
    segments: &[(CanvasPoint, CanvasPoint)],
    style: StrokeStyle,
) {
    let radius = style.radius();
    let Some(area) = polyline_bounds(segments, radius + 1.0) else {
        return;
    };
    blend_coverage(image, area, style.color, style.alpha(), |px, py| {
        let distance = segments
            .iter()
            .map(|(from, to)| distance_to_segment(px, py, *from, *to))
            .fold(f64::INFINITY, f64::min);
        (radius + 0.5 - distance).clamp(0.0, 1.0)
    });
}

pub fn stroke_segment(
    image: &mut RgbaImage,
    from: CanvasPoint,
    to: CanvasPoint,
    style: StrokeStyle,
) {
    stroke_segments(image, &[(from, to)], style);
}

/// Outlines `rect` with a band of `style.width` centred on its edges.
pub fn stroke_rect(image: &mut RgbaImage, rect: RectF, style: StrokeStyle) {
    let half = style.width.max(1.0) / 2.0;
    let outer = rect.inflate(half);
    let inner = rect.inflate(-half);
    let has_inner = inner.width > 0.0 && inner.height > 0.0;
    blend_coverage(image, outer.inflate(1.0), style.color, style.alpha(), |px, py| {
        let outer_cover = (0.5 - outer.signed_distance(px, py)).clamp(0.0, 1.0);
        let inner_cover = if has_inner {
            (0.5 - inner.signed_distance(px, py)).clamp(0.0, 1.0)
        } else {
            0.0
        };
        outer_cover * (1.0 - inner_cover)
    });
}

pub fn fill_rect(image: &mut RgbaImage, rect: RectF, style: StrokeStyle) {
    blend_coverage(image, rect.inflate(1.0), style.color, style.alpha(), |px, py| {
        (0.5 - rect.signed_distance(px, py)).clamp(0.0, 1.0)
    });
}
