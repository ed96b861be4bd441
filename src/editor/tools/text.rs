use std::path::{Path, PathBuf};

use ab_glyph::{point, Font, FontArc, GlyphId, ScaleFont};
use anyhow::Context;
use image::RgbaImage;

use super::{CanvasPoint, Color, LayoutPoint};
use crate::canvas::raster::{blend_pixel, stroke_rect, RectF, StrokeStyle};

const SYSTEM_FONT_CANDIDATES: [&str; 7] = [
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/usr/share/fonts/noto/NotoSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextStyle {
    pub color: Color,
    /// Percent, 0–100.
    pub opacity: u8,
    /// Font size in backing pixels.
    pub size: u8,
}

impl TextStyle {
    pub const fn new(color: Color, opacity: u8, size: u8) -> Self {
        Self {
            color,
            opacity,
            size,
        }
    }

    pub fn font_px(&self) -> f32 {
        f32::from(self.size)
    }

    pub fn alpha(&self) -> f32 {
        f32::from(self.opacity.min(100)) / 100.0
    }
}

/// What the host needs to draw the editable overlay above the preview.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub position: LayoutPoint,
    pub font_px: f32,
    pub color: Color,
    pub opacity: u8,
    pub content: String,
    pub caret: usize,
}

/// Draws text lines into the bitmap. `baseline_origin` is the left end of
/// the baseline in backing pixels.
pub trait GlyphRasterizer {
    fn ascent(&self, size: f32) -> f32;
    fn line_height(&self, size: f32) -> f32;
    fn draw_line(
        &self,
        image: &mut RgbaImage,
        line: &str,
        baseline_origin: CanvasPoint,
        style: TextStyle,
    );
}

pub struct FontGlyphRasterizer {
    font: FontArc,
}

impl FontGlyphRasterizer {
    pub fn new(font: FontArc) -> Self {
        Self { font }
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read font file {}", path.display()))?;
        let font = FontArc::try_from_vec(bytes)
            .with_context(|| format!("failed to parse font file {}", path.display()))?;
        Ok(Self::new(font))
    }
}

impl GlyphRasterizer for FontGlyphRasterizer {
    fn ascent(&self, size: f32) -> f32 {
        self.font.as_scaled(size).ascent()
    }

    fn line_height(&self, size: f32) -> f32 {
        let scaled = self.font.as_scaled(size);
        scaled.height() + scaled.line_gap()
    }

    fn draw_line(
        &self,
        image: &mut RgbaImage,
        line: &str,
        baseline_origin: CanvasPoint,
        style: TextStyle,
    ) {
        let size = style.font_px();
        let scaled = self.font.as_scaled(size);
        let (width, height) = (image.width() as i32, image.height() as i32);
        let alpha = style.alpha();
        let mut caret_x = baseline_origin.x as f32;
        let mut previous: Option<GlyphId> = None;

        for ch in line.chars() {
            let glyph_id = self.font.glyph_id(ch);
            if let Some(previous) = previous {
                caret_x += scaled.kern(previous, glyph_id);
            }
            let glyph =
                glyph_id.with_scale_and_position(size, point(caret_x, baseline_origin.y as f32));
            caret_x += scaled.h_advance(glyph_id);
            previous = Some(glyph_id);

            let Some(outlined) = self.font.outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let px = bounds.min.x as i32 + gx as i32;
                let py = bounds.min.y as i32 + gy as i32;
                if px < 0 || py < 0 || px >= width || py >= height || coverage <= 0.0 {
                    return;
                }
                blend_pixel(
                    image.get_pixel_mut(px as u32, py as u32),
                    style.color,
                    alpha * coverage.min(1.0),
                );
            });
        }
    }
}

/// Renders every visible character as an outlined box. Used when no font
/// file can be loaded.
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxGlyphRasterizer;

impl BoxGlyphRasterizer {
    const ADVANCE: f64 = 0.6;
    const ASCENT: f32 = 0.8;
    const LINE_HEIGHT: f32 = 1.2;
}

impl GlyphRasterizer for BoxGlyphRasterizer {
    fn ascent(&self, size: f32) -> f32 {
        size * Self::ASCENT
    }

    fn line_height(&self, size: f32) -> f32 {
        size * Self::LINE_HEIGHT
    }

    fn draw_line(
        &self,
        image: &mut RgbaImage,
        line: &str,
        baseline_origin: CanvasPoint,
        style: TextStyle,
    ) {
        let size = f64::from(style.size);
        let stroke = StrokeStyle::new(style.color, style.opacity, (size / 10.0).max(1.0));
        for (index, ch) in line.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let left = baseline_origin.x + index as f64 * size * Self::ADVANCE;
            let glyph_box = RectF::new(
                left + size * 0.1,
                baseline_origin.y - size * 0.7,
                size * 0.4,
                size * 0.7,
            );
            stroke_rect(image, glyph_box, stroke);
        }
    }
}

/// Loads the configured font, then the first usable system font, and falls
/// back to box glyphs when nothing loads.
pub fn load_glyph_rasterizer(font_path: Option<&Path>) -> Box<dyn GlyphRasterizer> {
    let configured = font_path.map(Path::to_path_buf);
    let candidates = configured
        .into_iter()
        .chain(SYSTEM_FONT_CANDIDATES.iter().map(PathBuf::from));
    for path in candidates {
        if !path.is_file() {
            continue;
        }
        match FontGlyphRasterizer::from_file(&path) {
            Ok(rasterizer) => {
                tracing::debug!(path = %path.display(), "text font loaded");
                return Box::new(rasterizer);
            }
            Err(err) => tracing::warn!(?err, "font rejected"),
        }
    }
    tracing::warn!("no usable font found; text renders as boxes");
    Box::new(BoxGlyphRasterizer)
}

/// An open text composition: anchor, editable content and caret.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSession {
    anchor: CanvasPoint,
    layout_anchor: LayoutPoint,
    content: String,
    cursor_chars: usize,
    style: TextStyle,
}

impl TextSession {
    pub fn new(anchor: CanvasPoint, layout_anchor: LayoutPoint, style: TextStyle) -> Self {
        Self {
            anchor,
            layout_anchor,
            content: String::new(),
            cursor_chars: 0,
            style,
        }
    }

    pub fn anchor(&self) -> CanvasPoint {
        self.anchor
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn style(&self) -> TextStyle {
        self.style
    }

    pub fn set_style(&mut self, style: TextStyle) {
        self.style = style;
    }

    /// Content as it will be drawn, or `None` when only whitespace remains.
    pub fn committed_text(&self) -> Option<&str> {
        let trimmed = self.content.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }

    pub fn overlay(&self) -> TextOverlay {
        TextOverlay {
            position: self.layout_anchor,
            font_px: self.style.font_px(),
            color: self.style.color,
            opacity: self.style.opacity,
            content: self.content.clone(),
            caret: self.cursor_chars(),
        }
    }

    /// Draws the trimmed content with its glyph tops at the anchor. Returns
    /// `false` without touching the bitmap when there is nothing to draw.
    pub fn rasterize(&self, image: &mut RgbaImage, glyphs: &dyn GlyphRasterizer) -> bool {
        let Some(text) = self.committed_text() else {
            return false;
        };
        let size = self.style.font_px();
        let first_baseline = self.anchor.y + f64::from(glyphs.ascent(size));
        let line_height = f64::from(glyphs.line_height(size));
        for (index, line) in text.lines().enumerate() {
            let baseline = first_baseline + index as f64 * line_height;
            glyphs.draw_line(image, line, CanvasPoint::new(self.anchor.x, baseline), self.style);
        }
        true
    }

    pub fn insert_char(&mut self, c: char) {
        let byte_index = self.byte_index_for_cursor(self.cursor_chars);
        self.content.insert(byte_index, c);
        self.cursor_chars = self.cursor_chars.saturating_add(1);
    }

    pub fn insert_str(&mut self, text: &str) {
        for c in text.chars() {
            self.insert_char(c);
        }
    }

    pub fn delete_backward(&mut self) -> bool {
        if self.cursor_chars == 0 {
            return false;
        }
        let end = self.byte_index_for_cursor(self.cursor_chars);
        let start = self.byte_index_for_cursor(self.cursor_chars.saturating_sub(1));
        if start >= end || end > self.content.len() {
            return false;
        }
        self.content.drain(start..end);
        self.cursor_chars = self.cursor_chars.saturating_sub(1);
        true
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    pub fn cursor_chars(&self) -> usize {
        self.cursor_chars.min(self.content.chars().count())
    }

    pub fn move_cursor_left(&mut self) -> bool {
        if self.cursor_chars() == 0 {
            return false;
        }
        self.cursor_chars = self.cursor_chars().saturating_sub(1);
        true
    }

    pub fn move_cursor_right(&mut self) -> bool {
        if self.cursor_chars() >= self.content.chars().count() {
            return false;
        }
        self.cursor_chars = self.cursor_chars().saturating_add(1);
        true
    }

    pub fn move_cursor_up(&mut self) -> bool {
        self.move_cursor_vertically(-1)
    }

    pub fn move_cursor_down(&mut self) -> bool {
        self.move_cursor_vertically(1)
    }

    fn byte_index_for_cursor(&self, cursor_chars: usize) -> usize {
        self.content
            .char_indices()
            .nth(cursor_chars)
            .map(|(index, _)| index)
            .unwrap_or(self.content.len())
    }

    fn cursor_line_column(&self) -> (usize, usize) {
        let before_cursor = self.content.chars().take(self.cursor_chars());
        before_cursor.fold((0, 0), |(line, column), ch| {
            if ch == '\n' {
                (line + 1, 0)
            } else {
                (line, column + 1)
            }
        })
    }

    fn move_cursor_vertically(&mut self, delta_lines: isize) -> bool {
        let lines = self.content.split('\n').collect::<Vec<_>>();
        if lines.len() <= 1 {
            return false;
        }
        let (line, column) = self.cursor_line_column();
        let target_line = line
            .saturating_add_signed(delta_lines)
            .min(lines.len() - 1);
        if target_line == line {
            return false;
        }

        let line_start = lines[..target_line]
            .iter()
            .map(|text| text.chars().count() + 1)
            .sum::<usize>();
        let target_column = column.min(lines[target_line].chars().count());
        self.cursor_chars = line_start + target_column;
        true
    }
}
