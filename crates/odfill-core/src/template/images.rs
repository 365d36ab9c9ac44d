//! Image directive resolution
//!
//! `[ @@name width height ]` tokens become embedded `draw:frame` fragments.
//! The locator behind `name` selects one of three strategies: remote
//! fetch (`http(s)://`), `qrcode://` generation, or a local file copy. Resolved bytes are
//! persisted under the working directory's `Pictures/` folder and missing
//! dimensions are derived from the image's aspect ratio.
//!
//! Failures are caught per occurrence: one bad image degrades to empty
//! markup and never aborts the fill run.

use crate::data::Record;
use crate::error::{OdfillError, Result};
use crate::markup::escape_xml;
use crate::media;
use crate::remote;
use crate::template::FillRun;
use crate::template::tokenize::{Dim, ImageToken, apply_replacements, scan_image_tokens};
use crate::units::{Length, LengthUnit, PX_TO_CM, format_cm};
use std::fs;
use std::path::{Path, PathBuf};

/// Default height when a document-level directive specifies no dimensions
const DEFAULT_HEIGHT: Length = Length {
    value: 1.0,
    unit: LengthUnit::Inch,
};

/// Resolve all document-level image directives in the part
///
/// Tokens whose key has no matching placeholder are left in place; the
/// leftover pass deletes them at the end of the run.
pub(crate) fn resolve_document_images(content: &str, run: &mut FillRun) -> String {
    let mut replacements = Vec::new();

    for token in scan_image_tokens(content) {
        if let Some(fragment) = resolve_document_token(&token, run) {
            replacements.push((token.start..token.end, fragment));
        }
    }

    apply_replacements(content, &replacements)
}

/// Resolve the image directives inside one cloned table row
///
/// The locator comes from the array element record, keyed by the last
/// segment of the token key. Tokens whose field is absent from the record
/// stay in place.
pub(crate) fn resolve_row_images(row: &str, record: &Record, run: &mut FillRun) -> String {
    let mut replacements = Vec::new();

    for token in scan_image_tokens(row) {
        let field = token.key.rsplit('.').next().unwrap_or(&token.key);
        let Some(locator) = record.get(field).filter(|v| !v.is_empty()) else {
            continue;
        };
        let fragment = emit_row_image(&token, locator, run).unwrap_or_default();
        replacements.push((token.start..token.end, fragment));
    }

    apply_replacements(row, &replacements)
}

fn resolve_document_token(token: &ImageToken, run: &mut FillRun) -> Option<String> {
    let data = run.data();

    if let Some(locator) = data.scalar(&token.key).filter(|v| !v.is_empty()) {
        return Some(emit_document_image(token, locator, run).unwrap_or_default());
    }

    // Legacy per-field form: name.path plus optional name.width/name.height
    if let Some(locator) = data.scalar(&format!("{}.path", token.key)) {
        let width = dim_or_subkey(&token.width, data.scalar(&format!("{}.width", token.key)));
        let height = dim_or_subkey(&token.height, data.scalar(&format!("{}.height", token.key)));
        let legacy = ImageToken {
            width,
            height,
            ..token.clone()
        };
        return Some(
            emit_document_image(&legacy, &locator.to_string(), run)
                .unwrap_or_else(|_| format!("[{} not found]", legacy.key)),
        );
    }

    None
}

fn dim_or_subkey(dim: &Dim, subkey: Option<&str>) -> Dim {
    match (dim, subkey) {
        (Dim::Absent, Some(value)) if !value.is_empty() => Dim::Literal(value.to_string()),
        _ => dim.clone(),
    }
}

/// Stage image bytes into the media folder, returning the stored file name
///
/// File names are collision-resistant: placeholder name plus the original
/// file name, or placeholder name plus a per-run ordinal for generated QR
/// images.
fn stage_image(key: &str, locator: &str, run: &mut FillRun) -> Result<String> {
    let media_dir = run.media_dir();
    fs::create_dir_all(&media_dir)?;

    let flat_key = key.replace('.', "_");

    if locator.starts_with("https://") || locator.starts_with("http://") {
        let bytes = remote::fetch_bytes(locator, run.options().fetch_timeout)?;
        let file_name = format!("{}_{}", flat_key, remote::url_file_name(locator));
        let dest = media_dir.join(&file_name);
        fs::write(&dest, bytes)?;
        let _ = media::shrink_to_fit(&dest);
        Ok(file_name)
    } else if let Some(payload) = locator.strip_prefix("qrcode://") {
        let bytes = media::qr_png(payload)?;
        let file_name = format!("{}_{}_qrcode.png", flat_key, run.next_ordinal());
        fs::write(media_dir.join(&file_name), bytes)?;
        Ok(file_name)
    } else {
        let source = Path::new(locator);
        if !source.is_file() {
            return Err(OdfillError::Media(format!("image '{}' not found", locator)));
        }
        let original = source
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image");
        let file_name = format!("{}_{}", flat_key, original);
        fs::copy(source, media_dir.join(&file_name))?;
        let _ = media::shrink_to_fit(&media_dir.join(&file_name));
        Ok(file_name)
    }
}

fn parse_literal(dim: &Dim) -> Option<Length> {
    match dim {
        Dim::Literal(text) => Length::parse(text),
        _ => None,
    }
}

/// Document-level sizing: explicit lengths may carry units; with neither
/// dimension given, height defaults to one inch and width is derived
fn document_attrs(token: &ImageToken, stored: &Path) -> (Option<String>, Option<String>) {
    let width = parse_literal(&token.width);
    let mut height = parse_literal(&token.height);

    if width.is_some() && height.is_some() {
        return (
            width.map(Length::to_odf_attr),
            height.map(Length::to_odf_attr),
        );
    }

    if width.is_none() && height.is_none() {
        height = Some(DEFAULT_HEIGHT);
    }

    let mut width_attr = width.map(Length::to_odf_attr);
    let mut height_attr = height.map(Length::to_odf_attr);

    if let Some((px_w, px_h)) = media::dimensions(stored) {
        let aspect = px_w as f64 / px_h as f64;
        match (width, height) {
            (Some(w), None) => height_attr = Some(format_cm(w.to_cm() / aspect)),
            (None, Some(h)) => width_attr = Some(format_cm(h.to_cm() * aspect)),
            _ => {}
        }
    }

    (width_attr, height_attr)
}

/// Row-scoped sizing: lengths are unitless centimeters; with neither
/// dimension given, both default to the intrinsic pixel size in cm
fn row_attrs(token: &ImageToken, stored: &Path) -> (Option<String>, Option<String>) {
    let width_cm = parse_literal(&token.width).map(Length::to_cm);
    let height_cm = parse_literal(&token.height).map(Length::to_cm);
    let intrinsic = media::dimensions(stored);

    let (width_cm, height_cm) = match (width_cm, height_cm, intrinsic) {
        (Some(w), Some(h), _) => (Some(w), Some(h)),
        (Some(w), None, Some((px_w, px_h))) => {
            (Some(w), Some(w / (px_w as f64 / px_h as f64)))
        }
        (None, Some(h), Some((px_w, px_h))) => {
            (Some(h * (px_w as f64 / px_h as f64)), Some(h))
        }
        (None, None, Some((px_w, px_h))) => {
            (Some(px_w as f64 * PX_TO_CM), Some(px_h as f64 * PX_TO_CM))
        }
        (w, h, None) => (w, h),
    };

    (width_cm.map(format_cm), height_cm.map(format_cm))
}

fn emit_document_image(token: &ImageToken, locator: &str, run: &mut FillRun) -> Result<String> {
    let file_name = stage_image(&token.key, locator, run)?;
    let stored = run.media_dir().join(&file_name);
    let (width, height) = document_attrs(token, &stored);

    let frame_name = token.key.split('.').next().unwrap_or(&token.key);
    Ok(frame_fragment(frame_name, &file_name, width, height))
}

fn emit_row_image(token: &ImageToken, locator: &str, run: &mut FillRun) -> Result<String> {
    let ordinal = run.next_ordinal();
    let key = format!("{}_{}", token.key, ordinal);
    let file_name = stage_image(&key, locator, run)?;
    let stored = run.media_dir().join(&file_name);
    let (width, height) = row_attrs(token, &stored);

    Ok(frame_fragment(&token.key, &file_name, width, height))
}

fn frame_fragment(
    name: &str,
    file_name: &str,
    width: Option<String>,
    height: Option<String>,
) -> String {
    let width_attr = width
        .map(|w| format!(" svg:width=\"{}\"", w))
        .unwrap_or_default();
    let height_attr = height
        .map(|h| format!(" svg:height=\"{}\"", h))
        .unwrap_or_default();

    format!(
        "<draw:frame draw:name=\"{}\" text:anchor-type=\"as-char\" draw:z-index=\"0\"{}{}>\
         <draw:image xlink:href=\"Pictures/{}\" xlink:type=\"simple\" xlink:show=\"embed\" xlink:actuate=\"onLoad\"/>\
         </draw:frame>",
        escape_xml(name),
        width_attr,
        height_attr,
        escape_xml(file_name),
    )
}
