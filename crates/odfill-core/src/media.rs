//! Raster media helpers
//!
//! Thin wrappers over the `image` and `qrcode` crates: intrinsic pixel
//! dimensions, bounded downsizing of oversized pictures, and QR raster
//! generation. Vector formats (.svg) are passed through untouched.

use crate::error::{OdfillError, Result};
use std::path::Path;

/// Upper bound applied to embedded raster pictures
pub const MAX_PIXEL_EDGE: u32 = 1024;

/// QR symbols are rendered at least this many pixels wide
const QR_MIN_EDGE: u32 = 240;

pub fn is_vector(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

/// Intrinsic pixel dimensions of a stored image
///
/// Returns `None` for vector formats and for files the decoder rejects;
/// the caller degrades to attribute-less markup in that case.
pub fn dimensions(path: &Path) -> Option<(u32, u32)> {
    if is_vector(path) {
        return None;
    }
    image::image_dimensions(path).ok()
}

/// Downsize an image in place so both edges fit `MAX_PIXEL_EDGE`
///
/// Aspect ratio is preserved. Smaller images and vector formats are left
/// untouched.
///
/// # Errors
///
/// Returns `Media` when decoding or re-encoding fails. Callers treat this
/// as best-effort and keep the original file.
pub fn shrink_to_fit(path: &Path) -> Result<()> {
    if is_vector(path) {
        return Ok(());
    }

    let img = image::open(path).map_err(|e| OdfillError::Media(format!("decode {}: {}", path.display(), e)))?;

    if img.width() <= MAX_PIXEL_EDGE && img.height() <= MAX_PIXEL_EDGE {
        return Ok(());
    }

    let resized = img.resize(
        MAX_PIXEL_EDGE,
        MAX_PIXEL_EDGE,
        image::imageops::FilterType::CatmullRom,
    );
    resized
        .save(path)
        .map_err(|e| OdfillError::Media(format!("encode {}: {}", path.display(), e)))?;

    Ok(())
}

/// Encode a payload string as a QR symbol, returned as PNG bytes
///
/// # Errors
///
/// Returns `Media` when the payload exceeds QR capacity or PNG encoding
/// fails.
pub fn qr_png(payload: &str) -> Result<Vec<u8>> {
    let code = qrcode::QrCode::new(payload.as_bytes())
        .map_err(|e| OdfillError::Media(format!("QR encode: {}", e)))?;

    let img = code
        .render::<image::Luma<u8>>()
        .min_dimensions(QR_MIN_EDGE, QR_MIN_EDGE)
        .build();

    let mut bytes: Vec<u8> = Vec::new();
    image::DynamicImage::ImageLuma8(img)
        .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .map_err(|e| OdfillError::Media(format!("QR PNG encode: {}", e)))?;

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn reads_intrinsic_dimensions() {
        let temp = odfill_testkit::temp_dir_in_workspace();
        let path = temp.path().join("img.png");
        fs::write(&path, odfill_testkit::png_bytes(200, 100)).unwrap();

        assert_eq!(dimensions(&path), Some((200, 100)));
    }

    #[test]
    fn svg_has_no_dimensions() {
        let temp = odfill_testkit::temp_dir_in_workspace();
        let path = temp.path().join("img.svg");
        fs::write(&path, "<svg xmlns=\"http://www.w3.org/2000/svg\"/>").unwrap();

        assert_eq!(dimensions(&path), None);
    }

    #[test]
    fn shrink_leaves_small_images_alone() {
        let temp = odfill_testkit::temp_dir_in_workspace();
        let path = temp.path().join("small.png");
        fs::write(&path, odfill_testkit::png_bytes(10, 10)).unwrap();
        let before = fs::read(&path).unwrap();

        shrink_to_fit(&path).unwrap();
        assert_eq!(fs::read(&path).unwrap(), before);
    }

    #[test]
    fn shrink_bounds_oversized_images() {
        let temp = odfill_testkit::temp_dir_in_workspace();
        let path = temp.path().join("big.png");
        fs::write(&path, odfill_testkit::png_bytes(2048, 1024)).unwrap();

        shrink_to_fit(&path).unwrap();
        let (w, h) = dimensions(&path).unwrap();
        assert!(w <= MAX_PIXEL_EDGE && h <= MAX_PIXEL_EDGE);
        // Aspect ratio preserved (2:1)
        assert_eq!(w, 2 * h);
    }

    #[test]
    fn qr_payload_produces_decodable_png() {
        let bytes = qr_png("https://example.com/ticket/42").unwrap();
        let img = image::load_from_memory(&bytes).unwrap();
        assert!(img.width() >= QR_MIN_EDGE);
        assert_eq!(img.width(), img.height());
    }
}
