use image::RgbaImage;

use super::CanvasPoint;
use crate::canvas::raster::{fill_rect, stroke_rect, RectF, StrokeStyle};

/// Smallest width and height a dragged box needs before it is drawn.
const MIN_SHAPE_EXTENT: f64 = 2.0;

/// Whether the box spanned by a drag is too thin to draw.
pub(crate) fn degenerate_drag(start: CanvasPoint, end: CanvasPoint) -> bool {
    let rect = RectF::from_corners(start, end);
    rect.width < MIN_SHAPE_EXTENT || rect.height < MIN_SHAPE_EXTENT
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectangleShape {
    pub start: CanvasPoint,
    pub end: CanvasPoint,
    pub style: StrokeStyle,
    pub fill_enabled: bool,
}

impl RectangleShape {
    pub const fn new(
        start: CanvasPoint,
        end: CanvasPoint,
        style: StrokeStyle,
        fill_enabled: bool,
    ) -> Self {
        Self {
            start,
            end,
            style,
            fill_enabled,
        }
    }

    pub fn rect(&self) -> RectF {
        RectF::from_corners(self.start, self.end)
    }

    pub fn is_degenerate(&self) -> bool {
        degenerate_drag(self.start, self.end)
    }

    pub fn draw(&self, image: &mut RgbaImage) {
        if self.fill_enabled {
            fill_rect(image, self.rect(), self.style);
        } else {
            stroke_rect(image, self.rect(), self.style);
        }
    }
}
