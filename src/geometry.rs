//! Shared geometric and color primitives used across canvas and editor modules.

/// Pointer position in backing-store pixels. Fractional so pen strokes keep
/// sub-pixel precision when the bitmap is displayed scaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasPoint {
    pub x: f64,
    pub y: f64,
}

impl CanvasPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pointer position in on-screen layout pixels, relative to the displayed bitmap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutPoint {
    pub x: f64,
    pub y: f64,
}

impl LayoutPoint {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolBounds {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl ToolBounds {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// Normalizes a drag between two backing points into a box clipped to the
    /// image. Returns `None` when nothing of the box lies inside the image.
    pub fn from_drag(
        start: CanvasPoint,
        end: CanvasPoint,
        image_width: u32,
        image_height: u32,
    ) -> Option<Self> {
        let left = start.x.min(end.x).round().max(0.0);
        let top = start.y.min(end.y).round().max(0.0);
        let right = start.x.max(end.x).round().min(f64::from(image_width));
        let bottom = start.y.max(end.y).round().min(f64::from(image_height));
        if right <= left || bottom <= top {
            return None;
        }
        Some(Self::new(
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn rgb(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    /// Parses `#rgb` or `#rrggbb` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let value = hex.trim().trim_start_matches('#');
        let expanded = match value.len() {
            3 => value.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => value.to_string(),
            _ => return None,
        };
        let packed = u32::from_str_radix(&expanded, 16).ok()?;
        Some(Self::new(
            ((packed >> 16) & 0xff) as u8,
            ((packed >> 8) & 0xff) as u8,
            (packed & 0xff) as u8,
        ))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Largest distance below the far edge a clamped backing coordinate may reach.
const EDGE_INSET: f64 = 1e-3;

/// Maps layout coordinates of the displayed bitmap onto backing-store pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportScale {
    bitmap_width: u32,
    bitmap_height: u32,
    display_width: f64,
    display_height: f64,
}

impl ViewportScale {
    pub fn new(
        bitmap_width: u32,
        bitmap_height: u32,
        display_width: f64,
        display_height: f64,
    ) -> Self {
        Self {
            bitmap_width: bitmap_width.max(1),
            bitmap_height: bitmap_height.max(1),
            display_width,
            display_height,
        }
    }

    /// Backing pixels per layout pixel horizontally. A collapsed display maps 1:1.
    pub fn scale_x(&self) -> f64 {
        if self.display_width > 0.0 {
            f64::from(self.bitmap_width) / self.display_width
        } else {
            1.0
        }
    }

    pub fn scale_y(&self) -> f64 {
        if self.display_height > 0.0 {
            f64::from(self.bitmap_height) / self.display_height
        } else {
            1.0
        }
    }

    pub fn to_backing(&self, point: LayoutPoint) -> CanvasPoint {
        let max_x = f64::from(self.bitmap_width) - EDGE_INSET;
        let max_y = f64::from(self.bitmap_height) - EDGE_INSET;
        CanvasPoint::new(
            (point.x * self.scale_x()).clamp(0.0, max_x),
            (point.y * self.scale_y()).clamp(0.0, max_y),
        )
    }

    pub fn to_layout_x(&self, backing_x: f64) -> f64 {
        backing_x / self.scale_x()
    }

    pub fn to_layout_y(&self, backing_y: f64) -> f64 {
        backing_y / self.scale_y()
    }
}
