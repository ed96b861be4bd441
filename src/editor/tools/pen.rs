use image::RgbaImage;

use super::CanvasPoint;
use crate::canvas::raster::{stroke_segment, StrokeStyle};

/// Freehand stroke painted incrementally as the pointer moves.
#[derive(Debug, Clone, PartialEq)]
pub struct PenStroke {
    points: Vec<CanvasPoint>,
    style: StrokeStyle,
}

impl PenStroke {
    pub fn new(start: CanvasPoint, style: StrokeStyle) -> Self {
        Self {
            points: vec![start],
            style,
        }
    }

    pub fn points(&self) -> &[CanvasPoint] {
        &self.points
    }

    pub fn last_point(&self) -> CanvasPoint {
        self.points[self.points.len() - 1]
    }

    /// Paints the segment from the previous point to `point`.
    pub fn extend(&mut self, image: &mut RgbaImage, point: CanvasPoint) {
        let from = self.last_point();
        if from == point {
            return;
        }
        stroke_segment(image, from, point, self.style);
        self.points.push(point);
    }

    /// Whether anything was painted since pointer-down.
    pub fn has_painted(&self) -> bool {
        self.points.len() > 1
    }
}
