//! The authoritative bitmap being edited and its immutable snapshots.

mod encoding;
pub mod raster;

use image::{imageops, Rgba, RgbaImage};
use thiserror::Error;

use crate::geometry::ToolBounds;

pub use encoding::{decode_data_url, encode_png_bytes, encode_png_data_url, thumbnail};

#[derive(Debug, Error)]
pub enum CanvasError {
    #[error("malformed image data url")]
    MalformedDataUrl,
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("image decode failed: {0}")]
    Decode(#[source] image::ImageError),
    #[error("image encode failed: {0}")]
    Encode(#[source] image::ImageError),
    #[error("image has no area: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },
}

pub type CanvasResult<T> = std::result::Result<T, CanvasError>;

/// Immutable copy of the bitmap at a commit point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    image: RgbaImage,
}

impl Snapshot {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

#[derive(Debug, Clone)]
pub struct BackingCanvas {
    image: RgbaImage,
}

impl Default for BackingCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl BackingCanvas {
    /// A 1×1 transparent bitmap, used whenever there is no valid image.
    pub fn new() -> Self {
        Self {
            image: RgbaImage::from_pixel(1, 1, Rgba([0, 0, 0, 0])),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        let mut canvas = Self::new();
        canvas.load(Some(image));
        canvas
    }

    /// Replaces the bitmap with `image`, falling back to the empty 1×1 bitmap
    /// when it is absent or has no area. Returns the new dimensions.
    pub fn load(&mut self, image: Option<RgbaImage>) -> (u32, u32) {
        self.image = match image {
            Some(image) if image.width() > 0 && image.height() > 0 => image,
            _ => Self::new().image,
        };
        self.dimensions()
    }

    /// Decodes `data_url` and loads it; undecodable payloads load as empty.
    pub fn load_data_url(&mut self, data_url: Option<&str>) -> (u32, u32) {
        let decoded = data_url.and_then(|data_url| match decode_data_url(data_url) {
            Ok(image) => Some(image),
            Err(err) => {
                tracing::warn!(?err, "image payload rejected; loading empty bitmap");
                None
            }
        });
        self.load(decoded)
    }

    /// Structural replacement used by crop commit and snapshot restore.
    pub fn replace(&mut self, image: RgbaImage) {
        debug_assert!(image.width() > 0 && image.height() > 0);
        self.image = image;
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    fn assert_in_bounds(&self, bounds: ToolBounds) {
        assert!(
            bounds.right() <= self.width() && bounds.bottom() <= self.height(),
            "region {bounds:?} exceeds canvas {}x{}",
            self.width(),
            self.height()
        );
    }

    /// Copies a pre-clamped region out of the bitmap.
    pub fn read_region(&self, bounds: ToolBounds) -> RgbaImage {
        self.assert_in_bounds(bounds);
        imageops::crop_imm(&self.image, bounds.x, bounds.y, bounds.width, bounds.height)
            .to_image()
    }

    /// Writes `pixels` at a pre-clamped region whose size matches `pixels`.
    pub fn write_region(&mut self, bounds: ToolBounds, pixels: &RgbaImage) {
        self.assert_in_bounds(bounds);
        assert_eq!(
            (bounds.width, bounds.height),
            pixels.dimensions(),
            "region size mismatch"
        );
        imageops::replace(
            &mut self.image,
            pixels,
            i64::from(bounds.x),
            i64::from(bounds.y),
        );
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            image: self.image.clone(),
        }
    }

    /// Overwrites pixels and dimensions with the snapshot's.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) {
        self.image = snapshot.image.clone();
    }

    /// Repaints from a same-sized base copy taken before a preview gesture.
    pub fn restore_base(&mut self, base: &RgbaImage) {
        if base.dimensions() == self.dimensions() {
            self.image.copy_from_slice(base.as_raw());
        } else {
            self.image = base.clone();
        }
    }

    pub fn encode_data_url(&self) -> CanvasResult<String> {
        encode_png_data_url(&self.image)
    }
}
