use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::{imageops, ImageFormat, RgbaImage};

use super::{CanvasError, CanvasResult};

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Decodes a `data:image/*;base64,` URL into an RGBA bitmap.
pub fn decode_data_url(data_url: &str) -> CanvasResult<RgbaImage> {
    let (header, payload) = data_url
        .split_once(',')
        .ok_or(CanvasError::MalformedDataUrl)?;
    if !header.starts_with("data:image/") || !header.ends_with(";base64") {
        return Err(CanvasError::MalformedDataUrl);
    }

    let bytes = STANDARD.decode(payload.trim())?;
    let image = image::load_from_memory(&bytes)
        .map_err(CanvasError::Decode)?
        .to_rgba8();
    if image.width() == 0 || image.height() == 0 {
        return Err(CanvasError::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(image)
}

pub fn encode_png_bytes(image: &RgbaImage) -> CanvasResult<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(CanvasError::Encode)?;
    Ok(bytes)
}

pub fn encode_png_data_url(image: &RgbaImage) -> CanvasResult<String> {
    let bytes = encode_png_bytes(image)?;
    Ok(format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(bytes)))
}

/// Scales the image down to `max_width`, keeping the aspect ratio. Narrower
/// images are returned unchanged.
pub fn thumbnail(image: &RgbaImage, max_width: u32) -> RgbaImage {
    let max_width = max_width.max(1);
    if image.width() <= max_width {
        return image.clone();
    }
    let scaled_height = u64::from(image.height()) * u64::from(max_width) / u64::from(image.width());
    let height = u32::try_from(scaled_height).unwrap_or(u32::MAX).max(1);
    imageops::resize(image, max_width, height, imageops::FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn checker(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 0, 0, 255])
            } else {
                Rgba([0, 0, 255, 128])
            }
        })
    }

    #[test]
    fn png_data_url_decodes_back_to_identical_pixels() {
        let image = checker(7, 5);
        let data_url = encode_png_data_url(&image).expect("encode should succeed");
        assert!(data_url.starts_with(PNG_DATA_URL_PREFIX));

        let decoded = decode_data_url(&data_url).expect("decode should succeed");
        assert_eq!(decoded, image);
    }

    #[test]
    fn decode_rejects_missing_header_and_bad_payload() {
        assert!(matches!(
            decode_data_url("not a data url"),
            Err(CanvasError::MalformedDataUrl)
        ));
        assert!(matches!(
            decode_data_url("data:text/plain;base64,aGVsbG8="),
            Err(CanvasError::MalformedDataUrl)
        ));
        assert!(matches!(
            decode_data_url("data:image/png;base64,!!!"),
            Err(CanvasError::Base64(_))
        ));
        assert!(matches!(
            decode_data_url("data:image/png;base64,aGVsbG8="),
            Err(CanvasError::Decode(_))
        ));
    }

    #[test]
    fn thumbnail_keeps_aspect_ratio_and_skips_small_images() {
        let wide = RgbaImage::new(960, 480);
        let thumb = thumbnail(&wide, 240);
        assert_eq!(thumb.dimensions(), (240, 120));

        let small = checker(100, 40);
        assert_eq!(thumbnail(&small, 240), small);
    }
}
