use std::f64::consts::FRAC_PI_6;

use image::RgbaImage;

use super::CanvasPoint;
use crate::canvas::raster::{stroke_segments, StrokeStyle};

/// Head stroke length before the stroke width is added.
pub const ARROW_HEAD_BASE_LENGTH: f64 = 16.0;
const MIN_ARROW_EXTENT: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowShape {
    pub start: CanvasPoint,
    pub end: CanvasPoint,
    pub style: StrokeStyle,
}

impl ArrowShape {
    pub const fn new(start: CanvasPoint, end: CanvasPoint, style: StrokeStyle) -> Self {
        Self { start, end, style }
    }

    pub fn head_length(&self) -> f64 {
        ARROW_HEAD_BASE_LENGTH + self.style.width
    }

    pub fn is_degenerate(&self) -> bool {
        let dx = (self.end.x - self.start.x).abs();
        let dy = (self.end.y - self.start.y).abs();
        dx.max(dy) < MIN_ARROW_EXTENT
    }

    /// Shaft followed by the two head strokes, each ending at the tip.
    pub fn segments(&self) -> [(CanvasPoint, CanvasPoint); 3] {
        let angle = (self.end.y - self.start.y).atan2(self.end.x - self.start.x);
        let length = self.head_length();
        let barb = |offset: f64| {
            CanvasPoint::new(
                self.end.x - length * (angle + offset).cos(),
                self.end.y - length * (angle + offset).sin(),
            )
        };
        [
            (self.start, self.end),
            (self.end, barb(-FRAC_PI_6)),
            (self.end, barb(FRAC_PI_6)),
        ]
    }

    pub fn draw(&self, image: &mut RgbaImage) {
        stroke_segments(image, &self.segments(), self.style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Color;
    use image::Rgba;

    fn arrow(end: CanvasPoint, width: f64) -> ArrowShape {
        ArrowShape::new(
            CanvasPoint::new(10.0, 50.0),
            end,
            StrokeStyle::new(Color::new(255, 0, 0), 100, width),
        )
    }

    #[test]
    fn head_barbs_sit_thirty_degrees_off_the_shaft() {
        let shape = arrow(CanvasPoint::new(90.0, 50.0), 4.0);
        let [shaft, upper, lower] = shape.segments();
        assert_eq!(shaft.1, CanvasPoint::new(90.0, 50.0));

        let expected_dx = 20.0 * FRAC_PI_6.cos();
        let expected_dy = 20.0 * FRAC_PI_6.sin();
        assert!((upper.1.x - (90.0 - expected_dx)).abs() < 1e-9);
        assert!((upper.1.y - (50.0 + expected_dy)).abs() < 1e-9);
        assert!((lower.1.x - (90.0 - expected_dx)).abs() < 1e-9);
        assert!((lower.1.y - (50.0 - expected_dy)).abs() < 1e-9);
    }

    #[test]
    fn draw_paints_shaft_and_head() {
        let mut image = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let shape = arrow(CanvasPoint::new(90.0, 50.0), 3.0);
        shape.draw(&mut image);
        assert_eq!(*image.get_pixel(50, 49), Rgba([255, 0, 0, 255]));
        let [_, upper, _] = shape.segments();
        let (barb_x, barb_y) = (upper.1.x.round() as u32, upper.1.y.round() as u32);
        let barb_pixel = image.get_pixel(barb_x, barb_y - 1);
        assert_ne!(*barb_pixel, Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn axis_aligned_arrow_is_not_degenerate() {
        assert!(!arrow(CanvasPoint::new(10.0, 90.0), 3.0).is_degenerate());
        assert!(arrow(CanvasPoint::new(11.0, 51.0), 3.0).is_degenerate());
    }
}
