use image::RgbaImage;

use crate::canvas::BackingCanvas;
use crate::geometry::{CanvasPoint, LayoutPoint, ToolBounds, ViewportScale};

pub const MIN_CROP_SIZE: u32 = 4;
/// Distance in layout pixels within which a handle reacts to the pointer.
pub const CROP_HANDLE_TOLERANCE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CropHandle {
    NorthWest,
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
}

impl CropHandle {
    pub const ALL: [CropHandle; 8] = [
        Self::NorthWest,
        Self::North,
        Self::NorthEast,
        Self::East,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::West,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Self::NorthWest => "nw",
            Self::North => "n",
            Self::NorthEast => "ne",
            Self::East => "e",
            Self::SouthEast => "se",
            Self::South => "s",
            Self::SouthWest => "sw",
            Self::West => "w",
        }
    }

    pub const fn moves_left(self) -> bool {
        matches!(self, Self::NorthWest | Self::West | Self::SouthWest)
    }

    pub const fn moves_right(self) -> bool {
        matches!(self, Self::NorthEast | Self::East | Self::SouthEast)
    }

    pub const fn moves_top(self) -> bool {
        matches!(self, Self::NorthWest | Self::North | Self::NorthEast)
    }

    pub const fn moves_bottom(self) -> bool {
        matches!(self, Self::SouthWest | Self::South | Self::SouthEast)
    }

    pub const fn cursor_hint(self) -> CursorHint {
        match self {
            Self::North | Self::South => CursorHint::NsResize,
            Self::East | Self::West => CursorHint::EwResize,
            Self::NorthEast | Self::SouthWest => CursorHint::NeswResize,
            Self::NorthWest | Self::SouthEast => CursorHint::NwseResize,
        }
    }

    const fn from_sides(horizontal: Option<Side>, vertical: Option<Side>) -> Option<Self> {
        match (horizontal, vertical) {
            (Some(Side::Start), Some(Side::Start)) => Some(Self::NorthWest),
            (Some(Side::End), Some(Side::Start)) => Some(Self::NorthEast),
            (Some(Side::Start), Some(Side::End)) => Some(Self::SouthWest),
            (Some(Side::End), Some(Side::End)) => Some(Self::SouthEast),
            (Some(Side::Start), None) => Some(Self::West),
            (Some(Side::End), None) => Some(Self::East),
            (None, Some(Side::Start)) => Some(Self::North),
            (None, Some(Side::End)) => Some(Self::South),
            (None, None) => None,
        }
    }
}

/// Pointer cursor the host should show over the preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorHint {
    #[default]
    Default,
    NsResize,
    EwResize,
    NeswResize,
    NwseResize,
}

impl CursorHint {
    pub const fn css_name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::NsResize => "ns-resize",
            Self::EwResize => "ew-resize",
            Self::NeswResize => "nesw-resize",
            Self::NwseResize => "nwse-resize",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Start,
    End,
}

/// Picks the nearer of the two edges lying within tolerance.
fn nearest_side(position: f64, start: f64, end: f64) -> Option<Side> {
    let to_start = (position - start).abs();
    let to_end = (position - end).abs();
    match (
        to_start <= CROP_HANDLE_TOLERANCE,
        to_end <= CROP_HANDLE_TOLERANCE,
    ) {
        (true, true) if to_end < to_start => Some(Side::End),
        (true, _) => Some(Side::Start),
        (false, true) => Some(Side::End),
        (false, false) => None,
    }
}

/// Integer crop rectangle in backing pixels. Always at least
/// [`MIN_CROP_SIZE`] on each side and inside the canvas it was made for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRegion {
    /// The whole canvas, or `None` when the canvas is below the crop floor.
    pub fn full(canvas_width: u32, canvas_height: u32) -> Option<Self> {
        (canvas_width >= MIN_CROP_SIZE && canvas_height >= MIN_CROP_SIZE).then_some(Self {
            x: 0,
            y: 0,
            width: canvas_width,
            height: canvas_height,
        })
    }

    pub const fn right(&self) -> u32 {
        self.x + self.width
    }

    pub const fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub const fn bounds(&self) -> ToolBounds {
        ToolBounds::new(self.x, self.y, self.width, self.height)
    }

    pub const fn fits(&self, canvas_width: u32, canvas_height: u32) -> bool {
        self.width >= MIN_CROP_SIZE
            && self.height >= MIN_CROP_SIZE
            && self.right() <= canvas_width
            && self.bottom() <= canvas_height
    }

    /// Hit-tests the region's edges in layout space. Corners win over edges.
    pub fn handle_at(&self, point: LayoutPoint, scale: &ViewportScale) -> Option<CropHandle> {
        let left = scale.to_layout_x(f64::from(self.x));
        let right = scale.to_layout_x(f64::from(self.right()));
        let top = scale.to_layout_y(f64::from(self.y));
        let bottom = scale.to_layout_y(f64::from(self.bottom()));

        let within_columns = point.x >= left - CROP_HANDLE_TOLERANCE
            && point.x <= right + CROP_HANDLE_TOLERANCE;
        let within_rows =
            point.y >= top - CROP_HANDLE_TOLERANCE && point.y <= bottom + CROP_HANDLE_TOLERANCE;
        if !within_columns || !within_rows {
            return None;
        }

        CropHandle::from_sides(
            nearest_side(point.x, left, right),
            nearest_side(point.y, top, bottom),
        )
    }

    /// Moves the edges `handle` controls to `point`, keeping the other edges
    /// fixed. The result stays inside the canvas and above the crop floor.
    pub fn resized(
        &self,
        handle: CropHandle,
        point: CanvasPoint,
        canvas_width: u32,
        canvas_height: u32,
    ) -> Self {
        let min = i64::from(MIN_CROP_SIZE);
        let px = point.x.round() as i64;
        let py = point.y.round() as i64;

        let mut left = i64::from(self.x);
        let mut right = i64::from(self.right());
        let mut top = i64::from(self.y);
        let mut bottom = i64::from(self.bottom());

        if handle.moves_left() {
            left = px.clamp(0, (right - min).max(0));
        }
        if handle.moves_right() {
            right = px.clamp(left + min, i64::from(canvas_width).max(left + min));
        }
        if handle.moves_top() {
            top = py.clamp(0, (bottom - min).max(0));
        }
        if handle.moves_bottom() {
            bottom = py.clamp(top + min, i64::from(canvas_height).max(top + min));
        }

        Self {
            x: left as u32,
            y: top as u32,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropState {
    Idle,
    Dragging {
        handle: CropHandle,
        origin: CropRegion,
    },
}

/// Interactive crop region shown while the crop tool is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CropController {
    region: Option<CropRegion>,
    state: CropState,
}

impl Default for CropController {
    fn default() -> Self {
        Self::new()
    }
}

impl CropController {
    pub const fn new() -> Self {
        Self {
            region: None,
            state: CropState::Idle,
        }
    }

    pub const fn region(&self) -> Option<CropRegion> {
        self.region
    }

    pub const fn state(&self) -> CropState {
        self.state
    }

    pub const fn is_active(&self) -> bool {
        self.region.is_some()
    }

    pub const fn dragging_handle(&self) -> Option<CropHandle> {
        match self.state {
            CropState::Dragging { handle, .. } => Some(handle),
            CropState::Idle => None,
        }
    }

    /// Shows a region covering the whole canvas.
    pub fn activate(&mut self, canvas_width: u32, canvas_height: u32) {
        self.region = CropRegion::full(canvas_width, canvas_height);
        self.state = CropState::Idle;
    }

    pub fn deactivate(&mut self) {
        self.region = None;
        self.state = CropState::Idle;
    }

    /// Starts a drag if `point` is on a handle of the current region.
    pub fn begin_drag(&mut self, point: LayoutPoint, scale: &ViewportScale) -> Option<CropHandle> {
        if self.state != CropState::Idle {
            return None;
        }
        let region = self.region?;
        let handle = region.handle_at(point, scale)?;
        self.state = CropState::Dragging {
            handle,
            origin: region,
        };
        Some(handle)
    }

    pub fn drag_to(&mut self, point: CanvasPoint, canvas_width: u32, canvas_height: u32) {
        let CropState::Dragging { handle, .. } = self.state else {
            return;
        };
        if let Some(region) = self.region {
            self.region = Some(region.resized(handle, point, canvas_width, canvas_height));
        }
    }

    /// Ends the drag and hands back the region to commit.
    pub fn finish_drag(&mut self) -> Option<CropRegion> {
        if matches!(self.state, CropState::Idle) {
            return None;
        }
        self.state = CropState::Idle;
        self.region
    }

    /// Abandons the drag and restores the region it started from.
    pub fn cancel_drag(&mut self) -> bool {
        let CropState::Dragging { origin, .. } = self.state else {
            return false;
        };
        self.region = Some(origin);
        self.state = CropState::Idle;
        true
    }

    pub fn cursor_hint(&self, point: LayoutPoint, scale: &ViewportScale) -> CursorHint {
        if let Some(handle) = self.dragging_handle() {
            return handle.cursor_hint();
        }
        self.region
            .and_then(|region| region.handle_at(point, scale))
            .map(CropHandle::cursor_hint)
            .unwrap_or_default()
    }
}

/// Copies `region` out of the canvas as the new bitmap.
pub fn extract_region(canvas: &BackingCanvas, region: CropRegion) -> RgbaImage {
    canvas.read_region(region.bounds())
}
