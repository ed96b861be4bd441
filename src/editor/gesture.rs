use image::RgbaImage;
use thiserror::Error;

use super::history::HistoryManager;
use super::tools::{
    degenerate_drag, extract_region, ArrowShape, CanvasPoint, Color, CropController, CropHandle,
    CropRegion, CursorHint, GlyphRasterizer, LayoutPoint, MosaicEngine, PenStroke,
    RectangleShape, TextOverlay, TextSession, ToolBounds, ToolKind, ToolState,
};
use crate::canvas::raster::{stroke_rect, RectF, StrokeStyle};
use crate::canvas::BackingCanvas;
use crate::geometry::ViewportScale;
use crate::input::{resolve_text_input, TextInputAction, TextInputEvent};

const MOSAIC_PREVIEW_COLOR: Color = Color::new(0xff, 0x00, 0x00);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GestureState {
    #[default]
    Idle,
    Drawing(ToolKind),
    TextComposing,
    CropIdle,
    CropDragging(CropHandle),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureEvent {
    BeginDrawing(ToolKind),
    FinishDrawing,
    OpenText,
    CloseText,
    EnterCrop,
    LeaveCrop,
    GrabHandle(CropHandle),
    ReleaseHandle,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GestureError {
    #[error("gesture event {event:?} is not valid in state {from:?}")]
    InvalidTransition {
        from: GestureState,
        event: GestureEvent,
    },
    #[error("pointer input is already captured by {holder:?}")]
    InputCaptured { holder: GestureState },
}

pub type GestureResult<T> = std::result::Result<T, GestureError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Position relative to the displayed bitmap, in layout pixels.
    pub position: LayoutPoint,
    pub button: PointerButton,
}

impl PointerEvent {
    pub const fn primary(x: f64, y: f64) -> Self {
        Self {
            position: LayoutPoint::new(x, y),
            button: PointerButton::Primary,
        }
    }

    pub const fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    PenStroke,
    Rectangle,
    Arrow,
    Mosaic,
    Text,
    Crop,
}

impl CommitKind {
    const fn for_drawing(tool: ToolKind) -> Self {
        match tool {
            ToolKind::Rectangle => Self::Rectangle,
            ToolKind::Arrow => Self::Arrow,
            ToolKind::Mosaic => Self::Mosaic,
            ToolKind::Text => Self::Text,
            ToolKind::Crop => Self::Crop,
            ToolKind::Pen => Self::PenStroke,
        }
    }
}

/// What a gesture step did to the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Nothing changed.
    Ignored,
    /// Preview or overlay state changed; no history entry.
    Updated,
    /// A gesture ended without producing anything to record.
    Discarded,
    /// A history snapshot was pushed.
    Committed(CommitKind),
}

impl GestureOutcome {
    pub const fn is_commit(self) -> bool {
        matches!(self, Self::Committed(_))
    }

    /// Keeps a commit from either step; otherwise the later outcome wins.
    const fn then(self, next: Self) -> Self {
        match (self, next) {
            (_, Self::Committed(_)) => next,
            (Self::Committed(_), _) => self,
            _ => next,
        }
    }
}

/// Exclusive pointer capture. A gesture holds it from pointer-down until
/// pointer-up or cancel; nothing else may start meanwhile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputSession {
    holder: Option<GestureState>,
}

impl InputSession {
    pub fn acquire(&mut self, holder: GestureState) -> GestureResult<()> {
        if let Some(current) = self.holder {
            return Err(GestureError::InputCaptured { holder: current });
        }
        self.holder = Some(holder);
        Ok(())
    }

    pub fn release(&mut self) -> Option<GestureState> {
        self.holder.take()
    }

    pub const fn is_held(&self) -> bool {
        self.holder.is_some()
    }
}

/// Borrowed editor state a gesture step works on.
pub struct GestureContext<'a> {
    pub canvas: &'a mut BackingCanvas,
    pub history: &'a mut HistoryManager,
    pub tools: &'a ToolState,
    pub scale: ViewportScale,
    pub glyphs: &'a dyn GlyphRasterizer,
    /// Drawing tools need a recent entry to report edits against.
    pub drawing_enabled: bool,
}

impl GestureContext<'_> {
    fn commit(&mut self, kind: CommitKind) -> GestureOutcome {
        self.history.push(self.canvas.snapshot());
        tracing::debug!(
            ?kind,
            width = self.canvas.width(),
            height = self.canvas.height(),
            history = self.history.len(),
            "edit committed"
        );
        GestureOutcome::Committed(kind)
    }
}

#[derive(Debug, Clone)]
enum ActiveDrawing {
    Pen(PenStroke),
    Shape {
        tool: ToolKind,
        start: CanvasPoint,
        current: CanvasPoint,
        base: RgbaImage,
    },
}

/// Turns pointer and keyboard input into tool operations on the canvas.
#[derive(Debug, Default)]
pub struct GestureController {
    state: GestureState,
    input: InputSession,
    drawing: Option<ActiveDrawing>,
    text: Option<TextSession>,
    crop: CropController,
}

impl GestureController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        self.input.is_held()
    }

    pub fn crop_region(&self) -> Option<CropRegion> {
        self.crop.region()
    }

    pub fn text_session(&self) -> Option<&TextSession> {
        self.text.as_ref()
    }

    pub fn text_overlay(&self) -> Option<TextOverlay> {
        self.text.as_ref().map(TextSession::overlay)
    }

    pub fn can_transition(&self, event: GestureEvent) -> bool {
        self.next_state(event).is_some()
    }

    pub fn next_state(&self, event: GestureEvent) -> Option<GestureState> {
        use GestureEvent::*;
        match (self.state, event) {
            (GestureState::Idle, BeginDrawing(tool)) if tool.is_drawing() => {
                Some(GestureState::Drawing(tool))
            }
            (GestureState::Drawing(_), FinishDrawing) => Some(GestureState::Idle),
            (GestureState::Idle, OpenText) => Some(GestureState::TextComposing),
            (GestureState::TextComposing, CloseText) => Some(GestureState::Idle),
            (GestureState::Idle | GestureState::CropIdle, EnterCrop) => {
                Some(GestureState::CropIdle)
            }
            (GestureState::CropIdle, LeaveCrop) => Some(GestureState::Idle),
            (GestureState::CropIdle, GrabHandle(handle)) => {
                Some(GestureState::CropDragging(handle))
            }
            (GestureState::CropDragging(_), ReleaseHandle) => Some(GestureState::CropIdle),
            _ => None,
        }
    }

    pub fn transition(&mut self, event: GestureEvent) -> GestureResult<GestureState> {
        let next = self.next_state(event).ok_or_else(|| {
            let from = self.state;
            tracing::debug!(from = ?from, event = ?event, "gesture event ignored");
            GestureError::InvalidTransition { from, event }
        })?;
        tracing::debug!(from = ?self.state, to = ?next, event = ?event, "gesture transition");
        self.state = next;
        Ok(next)
    }

    /// Drops any in-flight gesture without committing it, e.g. when a new
    /// image replaces the canvas.
    pub fn reset(&mut self, active_tool: ToolKind, canvas: &BackingCanvas) {
        self.input.release();
        self.drawing = None;
        self.text = None;
        self.crop.deactivate();
        self.state = GestureState::Idle;
        if active_tool == ToolKind::Crop {
            self.crop.activate(canvas.width(), canvas.height());
            self.state = GestureState::CropIdle;
        }
    }

    /// Re-fits the crop region after the canvas dimensions changed.
    pub fn canvas_replaced(&mut self, canvas: &BackingCanvas) {
        if self.crop.is_active() {
            self.crop.activate(canvas.width(), canvas.height());
        }
    }

    pub fn cursor_hint(&self, position: LayoutPoint, scale: &ViewportScale) -> CursorHint {
        match self.state {
            GestureState::CropIdle | GestureState::CropDragging(_) => {
                self.crop.cursor_hint(position, scale)
            }
            _ => CursorHint::Default,
        }
    }

    pub fn select_tool(&mut self, ctx: &mut GestureContext<'_>, tool: ToolKind) -> GestureOutcome {
        let mut outcome = self.settle(ctx);
        match (tool, self.state) {
            (ToolKind::Crop, GestureState::Idle | GestureState::CropIdle) => {
                self.crop.activate(ctx.canvas.width(), ctx.canvas.height());
                if self.transition(GestureEvent::EnterCrop).is_ok() {
                    outcome = outcome.then(GestureOutcome::Updated);
                }
            }
            (_, GestureState::CropIdle) => {
                self.crop.deactivate();
                if self.transition(GestureEvent::LeaveCrop).is_ok() {
                    outcome = outcome.then(GestureOutcome::Updated);
                }
            }
            _ => {}
        }
        outcome
    }

    /// Ends whatever is in flight the way losing focus would: text and
    /// drawings commit, a crop drag is abandoned.
    pub fn settle(&mut self, ctx: &mut GestureContext<'_>) -> GestureOutcome {
        match self.state {
            GestureState::TextComposing => self.commit_text(ctx),
            GestureState::Drawing(_) => self.finish_drawing(ctx, None),
            GestureState::CropDragging(_) => self.cancel_crop_drag(),
            GestureState::Idle | GestureState::CropIdle => GestureOutcome::Ignored,
        }
    }

    pub fn pointer_down(
        &mut self,
        ctx: &mut GestureContext<'_>,
        event: PointerEvent,
    ) -> GestureResult<GestureOutcome> {
        if event.button != PointerButton::Primary {
            return Ok(GestureOutcome::Ignored);
        }
        if let Some(holder) = self.input.holder {
            return Err(GestureError::InputCaptured { holder });
        }

        let committed = match self.state {
            GestureState::TextComposing => self.commit_text(ctx),
            _ => GestureOutcome::Ignored,
        };
        let point = ctx.scale.to_backing(event.position);
        let tool = ctx.tools.active_tool();

        let started = match tool {
            ToolKind::Crop => self.grab_crop_handle(event.position, &ctx.scale)?,
            ToolKind::Text => {
                self.transition(GestureEvent::OpenText)?;
                self.text = Some(TextSession::new(
                    point,
                    event.position,
                    ctx.tools.text_style(),
                ));
                GestureOutcome::Updated
            }
            _ if !ctx.drawing_enabled => GestureOutcome::Ignored,
            _ => {
                self.transition(GestureEvent::BeginDrawing(tool))?;
                self.input.acquire(self.state)?;
                self.drawing = Some(match tool {
                    ToolKind::Pen => {
                        ActiveDrawing::Pen(PenStroke::new(point, ctx.tools.stroke_style()))
                    }
                    _ => ActiveDrawing::Shape {
                        tool,
                        start: point,
                        current: point,
                        base: ctx.canvas.image().clone(),
                    },
                });
                GestureOutcome::Updated
            }
        };
        Ok(committed.then(started))
    }

    fn grab_crop_handle(
        &mut self,
        position: LayoutPoint,
        scale: &ViewportScale,
    ) -> GestureResult<GestureOutcome> {
        if self.state != GestureState::CropIdle {
            return Ok(GestureOutcome::Ignored);
        }
        let Some(handle) = self.crop.begin_drag(position, scale) else {
            return Ok(GestureOutcome::Ignored);
        };
        self.transition(GestureEvent::GrabHandle(handle))?;
        self.input.acquire(self.state)?;
        tracing::debug!(handle = handle.label(), "crop handle grabbed");
        Ok(GestureOutcome::Updated)
    }

    pub fn pointer_move(
        &mut self,
        ctx: &mut GestureContext<'_>,
        position: LayoutPoint,
    ) -> GestureOutcome {
        let point = ctx.scale.to_backing(position);
        match self.state {
            GestureState::CropDragging(_) => {
                self.crop
                    .drag_to(point, ctx.canvas.width(), ctx.canvas.height());
                GestureOutcome::Updated
            }
            GestureState::Drawing(_) => {
                match self.drawing.as_mut() {
                    Some(ActiveDrawing::Pen(stroke)) => {
                        stroke.extend(ctx.canvas.image_mut(), point);
                    }
                    Some(ActiveDrawing::Shape {
                        tool,
                        start,
                        current,
                        base,
                    }) => {
                        *current = point;
                        draw_preview(ctx, *tool, *start, point, base);
                    }
                    None => return GestureOutcome::Ignored,
                }
                GestureOutcome::Updated
            }
            _ => GestureOutcome::Ignored,
        }
    }

    pub fn pointer_up(
        &mut self,
        ctx: &mut GestureContext<'_>,
        position: LayoutPoint,
    ) -> GestureOutcome {
        let point = ctx.scale.to_backing(position);
        match self.state {
            GestureState::Drawing(_) => self.finish_drawing(ctx, Some(point)),
            GestureState::CropDragging(_) => {
                self.crop
                    .drag_to(point, ctx.canvas.width(), ctx.canvas.height());
                self.commit_crop(ctx)
            }
            _ => GestureOutcome::Ignored,
        }
    }

    /// Platform cancel: drawings finish at their last point, crop drags abort.
    pub fn pointer_cancel(&mut self, ctx: &mut GestureContext<'_>) -> GestureOutcome {
        match self.state {
            GestureState::Drawing(_) => self.finish_drawing(ctx, None),
            GestureState::CropDragging(_) => self.cancel_crop_drag(),
            _ => GestureOutcome::Ignored,
        }
    }

    /// Escape aborts a crop drag or an open text session.
    pub fn escape(&mut self) -> GestureOutcome {
        match self.state {
            GestureState::CropDragging(_) => self.cancel_crop_drag(),
            GestureState::TextComposing => self.cancel_text(),
            _ => GestureOutcome::Ignored,
        }
    }

    fn finish_drawing(
        &mut self,
        ctx: &mut GestureContext<'_>,
        end: Option<CanvasPoint>,
    ) -> GestureOutcome {
        let GestureState::Drawing(tool) = self.state else {
            return GestureOutcome::Ignored;
        };
        let drawing = self.drawing.take();
        self.input.release();
        if self.transition(GestureEvent::FinishDrawing).is_err() {
            return GestureOutcome::Ignored;
        }

        match drawing {
            Some(ActiveDrawing::Pen(mut stroke)) => {
                if let Some(end) = end {
                    stroke.extend(ctx.canvas.image_mut(), end);
                }
                if stroke.has_painted() {
                    ctx.commit(CommitKind::PenStroke)
                } else {
                    GestureOutcome::Discarded
                }
            }
            Some(ActiveDrawing::Shape {
                tool,
                start,
                current,
                base,
            }) => {
                let end = end.unwrap_or(current);
                ctx.canvas.restore_base(&base);
                if finalize_shape(ctx, tool, start, end) {
                    ctx.commit(CommitKind::for_drawing(tool))
                } else {
                    tracing::debug!(?tool, "degenerate shape discarded");
                    GestureOutcome::Discarded
                }
            }
            None => {
                tracing::debug!(?tool, "drawing state without an active gesture");
                GestureOutcome::Discarded
            }
        }
    }

    fn commit_crop(&mut self, ctx: &mut GestureContext<'_>) -> GestureOutcome {
        let region = self.crop.finish_drag();
        self.input.release();
        if self.transition(GestureEvent::ReleaseHandle).is_err() {
            return GestureOutcome::Ignored;
        }
        let Some(region) = region else {
            return GestureOutcome::Discarded;
        };
        if !region.fits(ctx.canvas.width(), ctx.canvas.height()) {
            tracing::warn!(?region, "crop region outside canvas; ignoring");
            self.crop.activate(ctx.canvas.width(), ctx.canvas.height());
            return GestureOutcome::Discarded;
        }

        let cropped = extract_region(ctx.canvas, region);
        ctx.canvas.replace(cropped);
        self.crop.activate(ctx.canvas.width(), ctx.canvas.height());
        ctx.commit(CommitKind::Crop)
    }

    fn cancel_crop_drag(&mut self) -> GestureOutcome {
        if !self.crop.cancel_drag() {
            return GestureOutcome::Ignored;
        }
        self.input.release();
        match self.transition(GestureEvent::ReleaseHandle) {
            Ok(_) => GestureOutcome::Updated,
            Err(_) => GestureOutcome::Ignored,
        }
    }

    /// Restyles the open text session after a parameter change.
    pub fn restyle_text(&mut self, tools: &ToolState) -> GestureOutcome {
        match self.text.as_mut() {
            Some(session) => {
                session.set_style(tools.text_style());
                GestureOutcome::Updated
            }
            None => GestureOutcome::Ignored,
        }
    }

    /// Applies an editing key to the open text session. `Commit` and
    /// `Cancel` are reported back for the caller to finish the session.
    pub fn apply_text_input(&mut self, event: TextInputEvent) -> TextInputAction {
        let action = resolve_text_input(event, self.text.is_some());
        let Some(session) = self.text.as_mut() else {
            return action;
        };

        match action {
            TextInputAction::InsertCharacter(c) => {
                session.insert_char(c);
                action
            }
            TextInputAction::DeleteBackward => {
                if session.delete_backward() {
                    action
                } else {
                    TextInputAction::NoAction
                }
            }
            TextInputAction::InsertLineBreak => {
                session.insert_newline();
                action
            }
            TextInputAction::MoveCursor => {
                let moved = match event {
                    TextInputEvent::CursorLeft => session.move_cursor_left(),
                    TextInputEvent::CursorRight => session.move_cursor_right(),
                    TextInputEvent::CursorUp => session.move_cursor_up(),
                    TextInputEvent::CursorDown => session.move_cursor_down(),
                    _ => false,
                };
                if moved {
                    action
                } else {
                    TextInputAction::NoAction
                }
            }
            TextInputAction::Commit
            | TextInputAction::Cancel
            | TextInputAction::CopyRequested
            | TextInputAction::NoTextTarget
            | TextInputAction::NoAction => action,
        }
    }

    /// Rasterizes the open text session. Blank content closes the session
    /// without touching the bitmap.
    pub fn commit_text(&mut self, ctx: &mut GestureContext<'_>) -> GestureOutcome {
        if self.transition(GestureEvent::CloseText).is_err() {
            return GestureOutcome::Ignored;
        }
        let Some(session) = self.text.take() else {
            return GestureOutcome::Discarded;
        };
        if session.rasterize(ctx.canvas.image_mut(), ctx.glyphs) {
            ctx.commit(CommitKind::Text)
        } else {
            tracing::debug!("blank text discarded");
            GestureOutcome::Discarded
        }
    }

    pub fn cancel_text(&mut self) -> GestureOutcome {
        if self.transition(GestureEvent::CloseText).is_err() {
            return GestureOutcome::Ignored;
        }
        self.text = None;
        GestureOutcome::Discarded
    }
}

fn draw_preview(
    ctx: &mut GestureContext<'_>,
    tool: ToolKind,
    start: CanvasPoint,
    end: CanvasPoint,
    base: &RgbaImage,
) {
    ctx.canvas.restore_base(base);
    let style = ctx.tools.stroke_style();
    let image = ctx.canvas.image_mut();
    match tool {
        ToolKind::Rectangle => {
            RectangleShape::new(start, end, style, ctx.tools.fill_enabled()).draw(image);
        }
        ToolKind::Arrow => ArrowShape::new(start, end, style).draw(image),
        ToolKind::Mosaic => stroke_rect(
            image,
            RectF::from_corners(start, end),
            StrokeStyle::new(MOSAIC_PREVIEW_COLOR, 100, 1.0),
        ),
        ToolKind::Pen | ToolKind::Text | ToolKind::Crop => {}
    }
}

/// Draws the final shape onto the restored base. Returns `false` when the
/// drag was too small to produce anything.
fn finalize_shape(
    ctx: &mut GestureContext<'_>,
    tool: ToolKind,
    start: CanvasPoint,
    end: CanvasPoint,
) -> bool {
    let style = ctx.tools.stroke_style();
    match tool {
        ToolKind::Rectangle => {
            let shape = RectangleShape::new(start, end, style, ctx.tools.fill_enabled());
            if shape.is_degenerate() {
                return false;
            }
            shape.draw(ctx.canvas.image_mut());
            true
        }
        ToolKind::Arrow => {
            let shape = ArrowShape::new(start, end, style);
            if shape.is_degenerate() {
                return false;
            }
            shape.draw(ctx.canvas.image_mut());
            true
        }
        ToolKind::Mosaic => {
            if degenerate_drag(start, end) {
                return false;
            }
            let Some(bounds) =
                ToolBounds::from_drag(start, end, ctx.canvas.width(), ctx.canvas.height())
            else {
                return false;
            };
            MosaicEngine::apply(ctx.canvas, bounds, ctx.tools.stroke_size());
            true
        }
        ToolKind::Pen | ToolKind::Text | ToolKind::Crop => false,
    }
}
