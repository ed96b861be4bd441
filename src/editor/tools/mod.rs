mod arrow;
mod crop;
mod mosaic;
mod pen;
mod rectangle;
mod text;

use serde::Deserialize;

use crate::canvas::raster::StrokeStyle;
pub use crate::geometry::{CanvasPoint, Color, LayoutPoint, ToolBounds};
pub use arrow::{ArrowShape, ARROW_HEAD_BASE_LENGTH};
pub use crop::{
    extract_region, CropController, CropHandle, CropRegion, CropState, CursorHint,
    CROP_HANDLE_TOLERANCE, MIN_CROP_SIZE,
};
pub use mosaic::{mosaic_block_size, resample, MosaicEngine, MosaicGrid, SamplingFilter};
pub use pen::PenStroke;
pub(crate) use rectangle::degenerate_drag;
pub use rectangle::RectangleShape;
pub use text::{
    load_glyph_rasterizer, BoxGlyphRasterizer, FontGlyphRasterizer, GlyphRasterizer,
    TextOverlay, TextSession, TextStyle,
};

pub const STROKE_SIZE_MIN: u8 = 1;
pub const STROKE_SIZE_MAX: u8 = 16;
pub const OPACITY_MIN: u8 = 10;
pub const OPACITY_MAX: u8 = 100;
pub const TEXT_SIZE_MIN: u8 = 10;
pub const TEXT_SIZE_MAX: u8 = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolOptionVisibility {
    pub has_color: bool,
    pub has_opacity: bool,
    pub has_stroke_size: bool,
    pub has_fill: bool,
    pub has_text_size: bool,
}

impl ToolOptionVisibility {
    pub const fn has_any(&self) -> bool {
        let Self {
            has_color,
            has_opacity,
            has_stroke_size,
            has_fill,
            has_text_size,
        } = *self;
        has_color || has_opacity || has_stroke_size || has_fill || has_text_size
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Pen,
    #[serde(alias = "rect")]
    Rectangle,
    Arrow,
    Mosaic,
    Text,
    Crop,
}

impl ToolKind {
    pub const ALL: [ToolKind; 6] = [
        Self::Pen,
        Self::Rectangle,
        Self::Arrow,
        Self::Mosaic,
        Self::Text,
        Self::Crop,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pen => "pen",
            Self::Rectangle => "rectangle",
            Self::Arrow => "arrow",
            Self::Mosaic => "mosaic",
            Self::Text => "text",
            Self::Crop => "crop",
        }
    }

    /// Tools whose pointer drag paints into the bitmap.
    pub const fn is_drawing(self) -> bool {
        matches!(self, Self::Pen | Self::Rectangle | Self::Arrow | Self::Mosaic)
    }

    pub const fn option_visibility(self) -> ToolOptionVisibility {
        match self {
            Self::Pen | Self::Arrow => ToolOptionVisibility {
                has_color: true,
                has_opacity: true,
                has_stroke_size: true,
                has_fill: false,
                has_text_size: false,
            },
            Self::Rectangle => ToolOptionVisibility {
                has_color: true,
                has_opacity: true,
                has_stroke_size: true,
                has_fill: true,
                has_text_size: false,
            },
            Self::Mosaic => ToolOptionVisibility {
                has_color: false,
                has_opacity: false,
                has_stroke_size: true,
                has_fill: false,
                has_text_size: false,
            },
            Self::Text => ToolOptionVisibility {
                has_color: true,
                has_opacity: true,
                has_stroke_size: false,
                has_fill: false,
                has_text_size: true,
            },
            Self::Crop => ToolOptionVisibility {
                has_color: false,
                has_opacity: false,
                has_stroke_size: false,
                has_fill: false,
                has_text_size: false,
            },
        }
    }
}

/// Current tool and its sticky parameters. Values are clamped here, on
/// change, so readers never re-validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolState {
    active_tool: ToolKind,
    color: Color,
    opacity: u8,
    stroke_size: u8,
    fill_enabled: bool,
    text_size: u8,
}

impl Default for ToolState {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolState {
    pub const fn new() -> Self {
        Self {
            active_tool: ToolKind::Pen,
            color: Color::new(0xff, 0x3b, 0x30),
            opacity: 100,
            stroke_size: 3,
            fill_enabled: false,
            text_size: 20,
        }
    }

    pub const fn active_tool(&self) -> ToolKind {
        self.active_tool
    }

    pub const fn color(&self) -> Color {
        self.color
    }

    pub const fn opacity(&self) -> u8 {
        self.opacity
    }

    pub const fn stroke_size(&self) -> u8 {
        self.stroke_size
    }

    pub const fn fill_enabled(&self) -> bool {
        self.fill_enabled
    }

    pub const fn text_size(&self) -> u8 {
        self.text_size
    }

    pub(crate) fn select_tool(&mut self, tool: ToolKind) {
        self.active_tool = tool;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_opacity(&mut self, opacity: u8) {
        self.opacity = clamp_u8_range(opacity, OPACITY_MIN, OPACITY_MAX);
    }

    pub fn set_stroke_size(&mut self, stroke_size: u8) {
        self.stroke_size = clamp_u8_range(stroke_size, STROKE_SIZE_MIN, STROKE_SIZE_MAX);
    }

    pub fn set_fill_enabled(&mut self, fill_enabled: bool) {
        self.fill_enabled = fill_enabled;
    }

    pub fn set_text_size(&mut self, text_size: u8) {
        self.text_size = clamp_u8_range(text_size, TEXT_SIZE_MIN, TEXT_SIZE_MAX);
    }

    pub fn stroke_style(&self) -> StrokeStyle {
        StrokeStyle::new(self.color, self.opacity, f64::from(self.stroke_size))
    }

    pub fn text_style(&self) -> TextStyle {
        TextStyle::new(self.color, self.opacity, self.text_size)
    }
}

const fn clamp_u8_range(value: u8, min: u8, max: u8) -> u8 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}
