use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::Deserialize;

use super::gesture::{
    GestureContext, GestureController, GestureOutcome, GestureState, PointerEvent,
};
use super::history::{HistoryAction, HistoryManager};
use super::tools::{
    load_glyph_rasterizer, Color, CropRegion, CursorHint, GlyphRasterizer, LayoutPoint,
    TextOverlay, ToolKind, ToolState,
};
use crate::canvas::{encode_png_data_url, thumbnail, BackingCanvas};
use crate::config::AppConfig;
use crate::error::AppResult;
use crate::geometry::ViewportScale;
use crate::input::{
    resolve_shortcut, text_input_event, InputContext, ShortcutAction, ShortcutKey,
    ShortcutModifiers, TextInputAction, TextInputEvent,
};
use crate::storage::{
    saved_path_label, CaptureStore, PassThroughCommand, RecentCaptures, RecentEntry,
};
use crate::sync::{Clock, EditCommit, SyncBridge, SystemClock};

/// Payload the capture side sends to (re)initialize the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadRequest {
    pub data_url: Option<String>,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default, alias = "recentList")]
    pub recent: Vec<RecentEntry>,
    #[serde(default)]
    pub selected_index: usize,
}

/// Owns every piece of mutable editor state for one preview window.
pub struct EditorSession<S: CaptureStore> {
    store: S,
    canvas: BackingCanvas,
    history: HistoryManager,
    tools: ToolState,
    gestures: GestureController,
    recent: RecentCaptures,
    sync: SyncBridge,
    clock: Box<dyn Clock>,
    glyphs: Box<dyn GlyphRasterizer>,
    display_size: (f64, f64),
    thumbnail_width: u32,
}

impl<S: CaptureStore> EditorSession<S> {
    pub fn new(store: S, config: &AppConfig) -> Self {
        let glyphs = load_glyph_rasterizer(config.font_path.as_deref());
        Self::with_parts(store, config, glyphs, Box::new(SystemClock))
    }

    pub fn with_parts(
        store: S,
        config: &AppConfig,
        glyphs: Box<dyn GlyphRasterizer>,
        clock: Box<dyn Clock>,
    ) -> Self {
        let canvas = BackingCanvas::new();
        let mut history = HistoryManager::new();
        history.push(canvas.snapshot());
        let tools = config.tool_state();
        let mut gestures = GestureController::new();
        gestures.reset(tools.active_tool(), &canvas);

        Self {
            store,
            canvas,
            history,
            tools,
            gestures,
            recent: RecentCaptures::default(),
            sync: SyncBridge::new(config.sync_debounce()),
            clock,
            glyphs,
            display_size: (0.0, 0.0),
            thumbnail_width: config.thumbnail_width,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn canvas(&self) -> &BackingCanvas {
        &self.canvas
    }

    pub fn tools(&self) -> &ToolState {
        &self.tools
    }

    pub fn recent(&self) -> &RecentCaptures {
        &self.recent
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn gesture_state(&self) -> GestureState {
        self.gestures.state()
    }

    pub fn crop_region(&self) -> Option<CropRegion> {
        self.gestures.crop_region()
    }

    pub fn text_overlay(&self) -> Option<TextOverlay> {
        self.gestures.text_overlay()
    }

    pub fn cursor_hint(&self, position: LayoutPoint) -> CursorHint {
        self.gestures.cursor_hint(position, &self.scale())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// `"W × H"` of the bitmap being edited.
    pub fn dimension_label(&self) -> String {
        let (width, height) = self.canvas.dimensions();
        format!("{width} × {height}")
    }

    pub fn saved_path_label(&self) -> String {
        saved_path_label(
            self.recent
                .selected()
                .and_then(|entry| entry.saved_path.as_deref()),
        )
    }

    pub fn counter_label(&self) -> String {
        self.recent.counter_label()
    }

    /// The current bitmap as a PNG data URL, for copy and save.
    pub fn encoded_image(&self) -> AppResult<String> {
        Ok(self.canvas.encode_data_url()?)
    }

    /// Size of the displayed bitmap in layout pixels.
    pub fn set_display_size(&mut self, width: f64, height: f64) {
        self.display_size = (width, height);
    }

    fn scale(&self) -> ViewportScale {
        let (width, height) = self.canvas.dimensions();
        ViewportScale::new(width, height, self.display_size.0, self.display_size.1)
    }

    fn split(&mut self) -> (&mut GestureController, GestureContext<'_>) {
        let scale = self.scale();
        let ctx = GestureContext {
            canvas: &mut self.canvas,
            history: &mut self.history,
            tools: &self.tools,
            scale,
            glyphs: self.glyphs.as_ref(),
            drawing_enabled: !self.recent.is_empty(),
        };
        (&mut self.gestures, ctx)
    }

    /// Replaces the bitmap and recent list. Open gestures are dropped without
    /// committing; a pending push for the previous image is sent first.
    pub fn load_image(&mut self, request: LoadRequest) {
        self.flush_sync();
        let (width, height) = self.canvas.load_data_url(request.data_url.as_deref());
        if (request.width, request.height) != (width, height) && request.data_url.is_some() {
            tracing::debug!(
                declared_width = request.width,
                declared_height = request.height,
                width,
                height,
                "declared size differs from decoded image"
            );
        }
        self.history.reset();
        self.history.push(self.canvas.snapshot());
        self.recent.replace(request.recent, request.selected_index);
        self.gestures.reset(self.tools.active_tool(), &self.canvas);
        tracing::info!(
            width,
            height,
            entries = self.recent.len(),
            selected = self.recent.selected_index(),
            "image loaded"
        );
    }

    /// Asks the store to switch entries after finishing the current one. The
    /// local selection only moves when the store answers with `load_image`.
    pub fn select_entry(&mut self, index: usize) {
        if !self.recent.contains(index) {
            tracing::warn!(index, entries = self.recent.len(), "unknown recent entry");
            return;
        }
        let (gestures, mut ctx) = self.split();
        let outcome = gestures.settle(&mut ctx);
        self.record(outcome);
        self.flush_sync();

        tracing::info!(index, "recent entry requested");
        if let Err(err) = self.store.select_entry(index) {
            tracing::warn!(%err, index, "store failed to select entry");
        }
    }

    pub fn path_updated(&mut self, path: PathBuf) {
        tracing::debug!(path = %path.display(), "saved path updated");
        if !self.recent.set_saved_path(path) {
            tracing::debug!("no selected entry for saved path");
        }
    }

    pub fn run_command(&mut self, command: PassThroughCommand) {
        tracing::debug!(command = command.label(), "forwarding command");
        if let Err(err) = self.store.run_command(command) {
            tracing::warn!(%err, command = command.label(), "store command failed");
        }
    }

    pub fn pointer_down(&mut self, event: PointerEvent) -> GestureOutcome {
        let (gestures, mut ctx) = self.split();
        let result = gestures.pointer_down(&mut ctx, event);
        match result {
            Ok(outcome) => self.record(outcome),
            Err(err) => {
                tracing::debug!(%err, "pointer down ignored");
                GestureOutcome::Ignored
            }
        }
    }

    pub fn pointer_move(&mut self, position: LayoutPoint) -> GestureOutcome {
        let (gestures, mut ctx) = self.split();
        let outcome = gestures.pointer_move(&mut ctx, position);
        self.record(outcome)
    }

    pub fn pointer_up(&mut self, position: LayoutPoint) -> GestureOutcome {
        let (gestures, mut ctx) = self.split();
        let outcome = gestures.pointer_up(&mut ctx, position);
        self.record(outcome)
    }

    pub fn pointer_cancel(&mut self) -> GestureOutcome {
        let (gestures, mut ctx) = self.split();
        let outcome = gestures.pointer_cancel(&mut ctx);
        self.record(outcome)
    }

    /// Routes a key press. Returns `true` when the editor consumed it.
    pub fn handle_key(&mut self, key: ShortcutKey, modifiers: ShortcutModifiers) -> bool {
        let state = self.gestures.state();
        let context = InputContext {
            text_input_active: state == GestureState::TextComposing,
            crop_dragging: matches!(state, GestureState::CropDragging(_)),
        };

        if let Some(action) = resolve_shortcut(key, modifiers, context) {
            self.apply_shortcut(action);
            return true;
        }
        if !context.text_input_active {
            return false;
        }
        text_input_event(key, modifiers).is_some_and(|event| {
            !matches!(
                self.text_input(event),
                TextInputAction::NoAction | TextInputAction::NoTextTarget
            )
        })
    }

    fn apply_shortcut(&mut self, action: ShortcutAction) {
        match action {
            ShortcutAction::TextInsertLineBreak => {
                self.text_input(TextInputEvent::ShiftEnter);
            }
            ShortcutAction::TextCommit => {
                self.text_input(TextInputEvent::Enter);
            }
            ShortcutAction::TextCopySelection => {
                tracing::debug!("copy inside text composition left to the text field");
            }
            ShortcutAction::TextCancel => {
                self.text_input(TextInputEvent::Escape);
            }
            ShortcutAction::CropCancel => {
                self.gestures.escape();
            }
            ShortcutAction::EditorUndo => {
                self.undo();
            }
            ShortcutAction::EditorRedo => {
                self.redo();
            }
            ShortcutAction::EditorCopyImage => self.run_command(PassThroughCommand::Copy),
        }
    }

    /// Feeds one editing event to the open text session.
    pub fn text_input(&mut self, event: TextInputEvent) -> TextInputAction {
        let action = self.gestures.apply_text_input(event);
        match action {
            TextInputAction::Commit => {
                let (gestures, mut ctx) = self.split();
                let outcome = gestures.commit_text(&mut ctx);
                self.record(outcome);
            }
            TextInputAction::Cancel => {
                self.gestures.cancel_text();
            }
            _ => {}
        }
        action
    }

    /// Switches tools, finishing whatever the old tool had in flight.
    pub fn select_tool(&mut self, tool: ToolKind) {
        let (gestures, mut ctx) = self.split();
        let outcome = gestures.select_tool(&mut ctx, tool);
        self.record(outcome);
        self.tools.select_tool(tool);
        tracing::debug!(tool = tool.label(), "tool selected");
    }

    pub fn set_color(&mut self, color: Color) {
        self.tools.set_color(color);
        self.gestures.restyle_text(&self.tools);
    }

    pub fn set_opacity(&mut self, opacity: u8) {
        self.tools.set_opacity(opacity);
        self.gestures.restyle_text(&self.tools);
    }

    pub fn set_stroke_size(&mut self, stroke_size: u8) {
        self.tools.set_stroke_size(stroke_size);
    }

    pub fn set_fill_enabled(&mut self, fill_enabled: bool) {
        self.tools.set_fill_enabled(fill_enabled);
    }

    pub fn set_text_size(&mut self, text_size: u8) {
        self.tools.set_text_size(text_size);
        self.gestures.restyle_text(&self.tools);
    }

    pub fn undo(&mut self) -> bool {
        self.step_history(HistoryAction::Undo)
    }

    pub fn redo(&mut self) -> bool {
        self.step_history(HistoryAction::Redo)
    }

    fn step_history(&mut self, action: HistoryAction) -> bool {
        if self.gestures.is_busy() {
            tracing::debug!(?action, "history step ignored during a gesture");
            return false;
        }
        if self.gestures.state() == GestureState::TextComposing {
            let (gestures, mut ctx) = self.split();
            let outcome = gestures.commit_text(&mut ctx);
            self.record(outcome);
        }

        let Some(snapshot) = self.history.step(action) else {
            tracing::debug!("{}", action.empty_message());
            return false;
        };
        self.canvas.apply_snapshot(snapshot);
        self.gestures.canvas_replaced(&self.canvas);
        tracing::debug!(cursor = self.history.cursor(), "{}", action.applied_message());
        self.publish_edit();
        true
    }

    pub fn next_sync_deadline(&self) -> Option<Instant> {
        self.sync.next_deadline()
    }

    pub fn sync_delay(&self) -> Duration {
        self.sync.delay()
    }

    /// Sends the pending push if its debounce window has closed.
    pub fn poll_sync(&mut self, now: Instant) -> bool {
        match self.sync.poll(now) {
            Some(commit) => self.send(commit),
            None => false,
        }
    }

    /// Sends the pending push right away.
    pub fn flush_sync(&mut self) -> bool {
        match self.sync.flush() {
            Some(commit) => self.send(commit),
            None => false,
        }
    }

    fn send(&self, commit: EditCommit) -> bool {
        match self.push_edit(&commit) {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%err, index = commit.selected_index, "store rejected edit");
                false
            }
        }
    }

    fn push_edit(&self, commit: &EditCommit) -> AppResult<()> {
        self.store.commit_edit(commit)?;
        tracing::debug!(
            index = commit.selected_index,
            width = commit.width,
            height = commit.height,
            "edit pushed to store"
        );
        Ok(())
    }

    fn record(&mut self, outcome: GestureOutcome) -> GestureOutcome {
        if outcome.is_commit() {
            self.publish_edit();
        }
        outcome
    }

    /// Mirrors the bitmap into the selected entry now and schedules the
    /// debounced push.
    fn publish_edit(&mut self) {
        let data_url = match self.canvas.encode_data_url() {
            Ok(data_url) => data_url,
            Err(err) => {
                tracing::warn!(%err, "failed to encode edited image");
                return;
            }
        };
        let (width, height) = self.canvas.dimensions();
        let selected_index = self.recent.selected_index();
        if self.recent.is_empty() {
            tracing::debug!("no recent entry to mirror the edit into");
        } else {
            let thumb =
                encode_png_data_url(&thumbnail(self.canvas.image(), self.thumbnail_width))
                    .map_err(|err| tracing::warn!(%err, "failed to encode thumbnail"))
                    .ok();
            self.recent.apply_edit(data_url.clone(), thumb, width, height);
        }
        self.sync.schedule(
            EditCommit {
                data_url,
                width,
                height,
                selected_index,
            },
            self.clock.now(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::decode_data_url;
    use crate::editor::history::MAX_HISTORY;
    use crate::editor::tools::BoxGlyphRasterizer;
    use crate::storage::{StoreError, StoreResult};
    use image::{imageops, Rgba, RgbaImage};
    use std::cell::{Cell, RefCell};
    use std::collections::HashSet;
    use std::rc::Rc;

    #[derive(Default)]
    struct RecordingStore {
        commits: RefCell<Vec<EditCommit>>,
        selected: RefCell<Vec<usize>>,
        commands: RefCell<Vec<PassThroughCommand>>,
        reject_commits: bool,
    }

    impl CaptureStore for RecordingStore {
        fn commit_edit(&self, commit: &EditCommit) -> StoreResult<()> {
            if self.reject_commits {
                return Err(StoreError::Rejected("read-only".to_string()));
            }
            self.commits.borrow_mut().push(commit.clone());
            Ok(())
        }

        fn select_entry(&self, index: usize) -> StoreResult<()> {
            self.selected.borrow_mut().push(index);
            Ok(())
        }

        fn run_command(&self, command: PassThroughCommand) -> StoreResult<()> {
            self.commands.borrow_mut().push(command);
            Ok(())
        }
    }

    #[derive(Clone)]
    struct ManualClock(Rc<Cell<Instant>>);

    impl ManualClock {
        fn advance(&self, millis: u64) {
            self.0.set(self.0.get() + Duration::from_millis(millis));
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.0.get()
        }
    }

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn session() -> (EditorSession<RecordingStore>, ManualClock) {
        session_with_store(RecordingStore::default())
    }

    fn session_with_store(store: RecordingStore) -> (EditorSession<RecordingStore>, ManualClock) {
        let clock = ManualClock(Rc::new(Cell::new(Instant::now())));
        let session = EditorSession::with_parts(
            store,
            &AppConfig::default(),
            Box::new(BoxGlyphRasterizer),
            Box::new(clock.clone()),
        );
        (session, clock)
    }

    fn entry(image: &RgbaImage) -> RecentEntry {
        RecentEntry {
            data_url: encode_png_data_url(image).expect("encodable"),
            thumb_data_url: None,
            saved_path: None,
            width: image.width(),
            height: image.height(),
            created_at: 1_700_000_000,
        }
    }

    fn load(session: &mut EditorSession<RecordingStore>, image: &RgbaImage, entries: usize) {
        session.load_image(LoadRequest {
            data_url: Some(encode_png_data_url(image).expect("encodable")),
            width: image.width(),
            height: image.height(),
            recent: (0..entries).map(|_| entry(image)).collect(),
            selected_index: 0,
        });
    }

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 7, 255]))
    }

    fn drag(session: &mut EditorSession<RecordingStore>, from: (f64, f64), to: (f64, f64)) {
        session.pointer_down(PointerEvent::primary(from.0, from.1));
        session.pointer_move(LayoutPoint::new((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0));
        session.pointer_move(LayoutPoint::new(to.0, to.1));
        session.pointer_up(LayoutPoint::new(to.0, to.1));
    }

    #[test]
    fn pen_stroke_then_undo_restores_the_loaded_baseline() {
        let (mut session, _clock) = session();
        let image = RgbaImage::from_pixel(800, 600, WHITE);
        load(&mut session, &image, 1);
        let baseline = session.canvas().snapshot();

        drag(&mut session, (100.0, 100.0), (400.0, 300.0));
        assert_ne!(session.canvas().image().as_raw(), baseline.pixels());
        assert!(session.can_undo());

        assert!(session.undo());
        assert_eq!(session.canvas().image().as_raw(), baseline.pixels());
        assert!(session.can_redo());
    }

    #[test]
    fn undo_and_redo_walk_pixel_identical_snapshots() {
        let (mut session, _clock) = session();
        load(&mut session, &RgbaImage::from_pixel(120, 80, WHITE), 1);

        let mut states = vec![session.canvas().image().clone()];
        for row in 0..4 {
            let y = 10.0 + f64::from(row) * 15.0;
            drag(&mut session, (10.0, y), (110.0, y));
            states.push(session.canvas().image().clone());
        }

        for expected in states.iter().rev().skip(1) {
            assert!(session.undo());
            assert_eq!(session.canvas().image(), expected);
        }
        assert!(!session.undo());
        for expected in states.iter().skip(1) {
            assert!(session.redo());
            assert_eq!(session.canvas().image(), expected);
        }
        assert!(!session.redo());
    }

    #[test]
    fn crop_south_east_handle_to_center_keeps_top_left_quadrant() {
        let (mut session, _clock) = session();
        let image = gradient(800, 600);
        load(&mut session, &image, 1);
        session.select_tool(ToolKind::Crop);
        assert_eq!(session.gesture_state(), GestureState::CropIdle);

        drag(&mut session, (799.0, 599.0), (400.0, 300.0));

        assert_eq!(session.canvas().dimensions(), (400, 300));
        let expected = imageops::crop_imm(&image, 0, 0, 400, 300).to_image();
        assert_eq!(session.canvas().image(), &expected);
        assert_eq!(session.dimension_label(), "400 × 300");
        assert_eq!(
            session.crop_region(),
            Some(CropRegion {
                x: 0,
                y: 0,
                width: 400,
                height: 300
            })
        );

        assert!(session.undo());
        assert_eq!(session.canvas().dimensions(), (800, 600));
        assert_eq!(session.crop_region().map(|region| region.width), Some(800));
    }

    #[test]
    fn crop_handles_follow_display_scale() {
        let (mut session, _clock) = session();
        load(&mut session, &gradient(800, 600), 1);
        session.set_display_size(400.0, 300.0);
        session.select_tool(ToolKind::Crop);
        assert_eq!(
            session.cursor_hint(LayoutPoint::new(398.0, 298.0)),
            CursorHint::NwseResize
        );

        drag(&mut session, (0.0, 0.0), (100.0, 50.0));
        assert_eq!(session.canvas().dimensions(), (600, 500));
    }

    #[test]
    fn mosaic_tiles_region_with_flat_blocks() {
        let (mut session, _clock) = session();
        load(&mut session, &gradient(200, 150), 1);
        session.select_tool(ToolKind::Mosaic);
        session.set_stroke_size(3);

        drag(&mut session, (10.0, 10.0), (130.0, 100.0));

        let image = session.canvas().image();
        let mut colors = HashSet::new();
        for block_y in 0..15 {
            for block_x in 0..20 {
                let left = 10 + block_x * 6;
                let top = 10 + block_y * 6;
                let color = *image.get_pixel(left, top);
                for y in top..top + 6 {
                    for x in left..left + 6 {
                        assert_eq!(*image.get_pixel(x, y), color, "block ({block_x},{block_y})");
                    }
                }
                colors.insert(color);
            }
        }
        assert_eq!(colors.len(), 300);
        assert_eq!(*image.get_pixel(9, 9), Rgba([9, 9, 7, 255]));
        assert_eq!(*image.get_pixel(130, 100), Rgba([130, 100, 7, 255]));
    }

    #[test]
    fn history_keeps_the_last_twenty_commits() {
        let (mut session, _clock) = session();
        load(&mut session, &RgbaImage::from_pixel(60, 140, WHITE), 1);

        let mut after_commit = Vec::new();
        for commit in 0..25 {
            let y = 5.0 + f64::from(commit) * 5.0;
            drag(&mut session, (5.0, y), (55.0, y));
            after_commit.push(session.canvas().image().clone());
        }
        assert_eq!(session.history_len(), MAX_HISTORY);

        for _ in 0..19 {
            assert!(session.undo());
        }
        assert_eq!(session.canvas().image(), &after_commit[5]);
        assert!(!session.undo());
        assert_eq!(session.canvas().image(), &after_commit[5]);
    }

    #[test]
    fn text_commit_draws_at_anchor_and_blank_text_is_discarded() {
        let (mut session, _clock) = session();
        load(&mut session, &RgbaImage::from_pixel(200, 120, WHITE), 1);
        session.select_tool(ToolKind::Text);

        session.pointer_down(PointerEvent::primary(20.0, 20.0));
        assert_eq!(session.gesture_state(), GestureState::TextComposing);
        for c in ['H', 'i'] {
            assert!(session.handle_key(ShortcutKey::Character(c), ShortcutModifiers::default()));
        }
        let overlay = session.text_overlay().expect("overlay while composing");
        assert_eq!(overlay.content, "Hi");
        assert_eq!(overlay.position, LayoutPoint::new(20.0, 20.0));

        assert!(session.handle_key(ShortcutKey::Enter, ShortcutModifiers::default()));
        assert_eq!(session.gesture_state(), GestureState::Idle);
        assert_eq!(session.history_len(), 2);
        let image = session.canvas().image();
        let changed = (20..60)
            .flat_map(|x| (20..50).map(move |y| (x, y)))
            .any(|(x, y)| *image.get_pixel(x, y) != WHITE);
        assert!(changed, "glyphs should land below and right of the anchor");
        assert_eq!(*image.get_pixel(150, 100), WHITE);

        let before = session.canvas().snapshot();
        session.pointer_down(PointerEvent::primary(100.0, 60.0));
        assert!(session.handle_key(ShortcutKey::Enter, ShortcutModifiers::default()));
        assert_eq!(session.history_len(), 2);
        assert_eq!(session.canvas().image().as_raw(), before.pixels());
    }

    #[test]
    fn rapid_commits_reach_the_store_once_with_the_final_state() {
        let (mut session, clock) = session();
        load(&mut session, &RgbaImage::from_pixel(100, 100, WHITE), 2);

        let start = clock.now();
        for commit in 0..5 {
            let y = 10.0 + f64::from(commit) * 10.0;
            drag(&mut session, (10.0, y), (90.0, y));
            clock.advance(10);
        }
        assert!(session.store().commits.borrow().is_empty());

        for millis in (0..300).step_by(5) {
            session.poll_sync(start + Duration::from_millis(millis));
        }

        let commits = session.store().commits.borrow();
        assert_eq!(commits.len(), 1);
        let pushed = decode_data_url(&commits[0].data_url).expect("pushed png decodes");
        assert_eq!(&pushed, session.canvas().image());
        assert_eq!((commits[0].width, commits[0].height), (100, 100));
        assert_eq!(commits[0].selected_index, 0);
    }

    #[test]
    fn commit_updates_selected_entry_immediately() {
        let (mut session, _clock) = session();
        load(&mut session, &RgbaImage::from_pixel(600, 300, WHITE), 2);
        drag(&mut session, (10.0, 10.0), (500.0, 200.0));

        let entry = session.recent().selected().expect("selected entry");
        let stored = decode_data_url(&entry.data_url).expect("entry png decodes");
        assert_eq!(&stored, session.canvas().image());
        let thumb = entry
            .thumb_data_url
            .as_deref()
            .map(decode_data_url)
            .expect("thumbnail refreshed")
            .expect("thumbnail decodes");
        assert_eq!(thumb.dimensions(), (240, 120));
        assert!(session.next_sync_deadline().is_some());
        assert!(session.store().commits.borrow().is_empty());
    }

    #[test]
    fn selecting_another_entry_flushes_pending_edit_first() {
        let (mut session, _clock) = session();
        load(&mut session, &RgbaImage::from_pixel(50, 50, WHITE), 3);
        drag(&mut session, (5.0, 5.0), (45.0, 45.0));

        session.select_entry(2);
        assert_eq!(session.store().commits.borrow().len(), 1);
        assert_eq!(session.store().commits.borrow()[0].selected_index, 0);
        assert_eq!(*session.store().selected.borrow(), vec![2]);
        assert_eq!(session.counter_label(), "1/3");
        assert!(session.next_sync_deadline().is_none());

        session.select_entry(7);
        assert_eq!(*session.store().selected.borrow(), vec![2]);
    }

    #[test]
    fn drawing_needs_a_recent_entry_but_text_does_not() {
        let (mut session, _clock) = session();
        load(&mut session, &RgbaImage::from_pixel(80, 60, WHITE), 0);
        let before = session.canvas().snapshot();

        drag(&mut session, (5.0, 5.0), (70.0, 50.0));
        assert_eq!(session.canvas().image().as_raw(), before.pixels());
        assert_eq!(session.gesture_state(), GestureState::Idle);

        session.select_tool(ToolKind::Text);
        session.pointer_down(PointerEvent::primary(5.0, 5.0));
        session.text_input(TextInputEvent::Character('A'));
        assert_eq!(session.text_input(TextInputEvent::Enter), TextInputAction::Commit);
        assert_eq!(session.history_len(), 2);
        assert!(session.recent().is_empty());

        assert!(session.flush_sync());
        let commits = session.store().commits.borrow();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].selected_index, 0);
        assert_eq!((commits[0].width, commits[0].height), (80, 60));
    }

    #[test]
    fn missing_image_loads_empty_bitmap_and_resets_history() {
        let (mut session, _clock) = session();
        load(&mut session, &RgbaImage::from_pixel(40, 40, WHITE), 1);
        drag(&mut session, (5.0, 5.0), (35.0, 35.0));

        session.load_image(LoadRequest::default());
        assert_eq!(session.canvas().dimensions(), (1, 1));
        assert_eq!(session.history_len(), 1);
        assert!(!session.can_undo());
        assert_eq!(session.counter_label(), "0/0");
        assert_eq!(session.store().commits.borrow().len(), 1);
    }

    #[test]
    fn load_request_deserializes_from_camel_case() {
        let request: LoadRequest = serde_json::from_str(
            r#"{"dataUrl":null,"width":3,"height":2,"recentList":[],"selectedIndex":4}"#,
        )
        .expect("valid request");
        assert!(request.data_url.is_none());
        assert_eq!((request.width, request.height), (3, 2));
        assert_eq!(request.selected_index, 4);
    }

    #[test]
    fn tool_switch_commits_open_text() {
        let (mut session, _clock) = session();
        load(&mut session, &RgbaImage::from_pixel(120, 60, WHITE), 1);
        session.select_tool(ToolKind::Text);
        session.pointer_down(PointerEvent::primary(10.0, 10.0));
        session.text_input(TextInputEvent::Character('x'));

        session.select_tool(ToolKind::Pen);
        assert_eq!(session.gesture_state(), GestureState::Idle);
        assert!(session.text_overlay().is_none());
        assert_eq!(session.history_len(), 2);
        assert_eq!(session.tools().active_tool(), ToolKind::Pen);
    }

    #[test]
    fn text_style_changes_restyle_the_open_overlay() {
        let (mut session, _clock) = session();
        load(&mut session, &RgbaImage::from_pixel(120, 60, WHITE), 1);
        session.select_tool(ToolKind::Text);
        session.pointer_down(PointerEvent::primary(10.0, 10.0));

        session.set_text_size(90);
        session.set_color(Color::new(0, 0, 255));
        let overlay = session.text_overlay().expect("composing");
        assert_eq!(overlay.font_px, 48.0);
        assert_eq!(overlay.color, Color::new(0, 0, 255));
    }

    #[test]
    fn copy_shortcut_is_forwarded_only_outside_text_composition() {
        let (mut session, _clock) = session();
        load(&mut session, &RgbaImage::from_pixel(120, 60, WHITE), 1);
        let copy = ShortcutKey::Character('c');

        assert!(session.handle_key(copy, ShortcutModifiers::command()));
        assert_eq!(
            *session.store().commands.borrow(),
            vec![PassThroughCommand::Copy]
        );

        session.select_tool(ToolKind::Text);
        session.pointer_down(PointerEvent::primary(10.0, 10.0));
        assert!(session.handle_key(copy, ShortcutModifiers::command()));
        assert_eq!(session.store().commands.borrow().len(), 1);
        assert_eq!(session.gesture_state(), GestureState::TextComposing);

        session.run_command(PassThroughCommand::SaveAll);
        assert_eq!(session.store().commands.borrow().len(), 2);
    }

    #[test]
    fn undo_shortcut_is_ignored_during_a_drawing() {
        let (mut session, _clock) = session();
        load(&mut session, &RgbaImage::from_pixel(120, 60, WHITE), 1);
        drag(&mut session, (10.0, 10.0), (100.0, 10.0));

        session.pointer_down(PointerEvent::primary(10.0, 30.0));
        session.pointer_move(LayoutPoint::new(100.0, 30.0));
        assert!(session.handle_key(ShortcutKey::Character('z'), ShortcutModifiers::command()));
        assert_eq!(session.history_len(), 2);
        assert!(!session.can_redo());

        session.pointer_up(LayoutPoint::new(100.0, 30.0));
        assert_eq!(session.history_len(), 3);
        assert!(session.handle_key(ShortcutKey::Character('z'), ShortcutModifiers::command()));
        assert!(session.can_redo());
    }

    #[test]
    fn escape_cancels_crop_drag_through_keyboard() {
        let (mut session, _clock) = session();
        load(&mut session, &gradient(100, 80), 1);
        session.select_tool(ToolKind::Crop);

        session.pointer_down(PointerEvent::primary(99.0, 40.0));
        session.pointer_move(LayoutPoint::new(50.0, 40.0));
        assert!(session.handle_key(ShortcutKey::Escape, ShortcutModifiers::default()));
        assert_eq!(session.crop_region().map(|region| region.width), Some(100));

        session.pointer_up(LayoutPoint::new(50.0, 40.0));
        assert_eq!(session.canvas().dimensions(), (100, 80));
        assert!(!session.handle_key(ShortcutKey::Escape, ShortcutModifiers::default()));
    }

    #[test]
    fn path_update_shows_in_metadata() {
        let (mut session, _clock) = session();
        load(&mut session, &RgbaImage::from_pixel(30, 20, WHITE), 1);
        assert_eq!(session.saved_path_label(), "unsaved");
        session.path_updated(PathBuf::from("/tmp/shot.png"));
        assert_eq!(session.saved_path_label(), "/tmp/shot.png");
        assert_eq!(session.dimension_label(), "30 × 20");
    }

    #[test]
    fn rejected_push_is_logged_not_raised() {
        let store = RecordingStore {
            reject_commits: true,
            ..Default::default()
        };
        let (mut session, _clock) = session_with_store(store);
        load(&mut session, &RgbaImage::from_pixel(30, 20, WHITE), 1);
        drag(&mut session, (2.0, 2.0), (25.0, 15.0));
        assert!(!session.flush_sync());
        assert!(session.next_sync_deadline().is_none());
        assert!(session.encoded_image().is_ok());
    }

    #[test]
    fn edits_after_selecting_stay_with_the_loaded_entry() {
        let (mut session, _clock) = session();
        let red = RgbaImage::from_pixel(40, 40, Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(60, 30, Rgba([0, 0, 255, 255]));
        session.load_image(LoadRequest {
            data_url: Some(encode_png_data_url(&red).expect("encodable")),
            width: 40,
            height: 40,
            recent: vec![entry(&red), entry(&blue)],
            selected_index: 0,
        });
        let untouched = entry(&blue);

        session.select_entry(1);
        assert_eq!(*session.store().selected.borrow(), vec![1]);
        assert_eq!(session.recent().selected_index(), 0);

        drag(&mut session, (5.0, 5.0), (35.0, 35.0));
        assert!(session.flush_sync());

        assert_eq!(session.recent().entries()[1], untouched);
        let commits = session.store().commits.borrow();
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].selected_index, 0);
        assert_eq!((commits[0].width, commits[0].height), (40, 40));
    }

    #[test]
    fn selection_moves_when_the_store_loads_the_entry() {
        let (mut session, _clock) = session();
        let red = RgbaImage::from_pixel(40, 40, Rgba([255, 0, 0, 255]));
        let blue = RgbaImage::from_pixel(60, 30, Rgba([0, 0, 255, 255]));
        let entries = vec![entry(&red), entry(&blue)];
        load(&mut session, &red, 2);

        session.select_entry(1);
        session.load_image(LoadRequest {
            data_url: Some(entries[1].data_url.clone()),
            width: 60,
            height: 30,
            recent: entries,
            selected_index: 1,
        });
        assert_eq!(session.counter_label(), "2/2");

        drag(&mut session, (5.0, 5.0), (50.0, 25.0));
        assert!(session.flush_sync());
        let commits = session.store().commits.borrow();
        assert_eq!(commits[0].selected_index, 1);
        assert_eq!((commits[0].width, commits[0].height), (60, 30));
        let first = decode_data_url(&session.recent().entries()[0].data_url).expect("decodes");
        assert_eq!(first, red);
    }

    #[test]
    fn undo_and_redo_keys_reach_history_while_composing_text() {
        let (mut session, _clock) = session();
        load(&mut session, &RgbaImage::from_pixel(120, 60, WHITE), 1);
        drag(&mut session, (10.0, 10.0), (100.0, 10.0));
        let after_stroke = session.canvas().image().clone();

        session.select_tool(ToolKind::Text);
        session.pointer_down(PointerEvent::primary(10.0, 30.0));
        assert_eq!(session.gesture_state(), GestureState::TextComposing);

        assert!(session.handle_key(ShortcutKey::Character('z'), ShortcutModifiers::command()));
        assert_eq!(session.gesture_state(), GestureState::Idle);
        assert_eq!(session.history_len(), 2);
        assert!(session.can_redo());
        assert_eq!(session.canvas().image(), &RgbaImage::from_pixel(120, 60, WHITE));

        session.pointer_down(PointerEvent::primary(10.0, 30.0));
        assert!(session.handle_key(ShortcutKey::Character('y'), ShortcutModifiers::command()));
        assert_eq!(session.gesture_state(), GestureState::Idle);
        assert_eq!(session.canvas().image(), &after_stroke);
    }
}
