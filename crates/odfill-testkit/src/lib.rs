//! Test utilities for odfill
//!
//! This crate provides shared testing utilities used across the odfill
//! workspace: workspace-local temp directories, tiny PNG fixtures, and a
//! minimal ODT container builder.

use std::fs::File;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

/// Mimetype string of an OpenDocument text document
pub const ODT_MIMETYPE: &str = "application/vnd.oasis.opendocument.text";

/// Creates a temporary directory within `.tmp/` at the project root
///
/// This ensures all test temporary files are centralized in a single
/// location that is gitignored and easy to clean up manually if needed.
///
/// # Panics
///
/// Panics if the current directory cannot be determined or the temporary
/// directory cannot be created.
pub fn temp_dir_in_workspace() -> TempDir {
    let workspace_root = std::env::current_dir().expect("Failed to get current directory");

    let tmp_base = workspace_root.join(".tmp");

    // Ensure .tmp/ exists
    std::fs::create_dir_all(&tmp_base).expect("Failed to create .tmp directory");

    // Create unique subdirectory within .tmp/
    TempDir::new_in(&tmp_base).expect("Failed to create temporary directory in .tmp/")
}

/// Encode a solid gray PNG of the given pixel dimensions
///
/// # Panics
///
/// Panics if PNG encoding fails.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageLuma8(image::GrayImage::from_pixel(
        width,
        height,
        image::Luma([128u8]),
    ));
    let mut bytes = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)
        .expect("Failed to encode PNG fixture");
    bytes
}

/// Default manifest listing the standard parts of a minimal document
fn minimal_manifest() -> String {
    format!(
        concat!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>",
            "<manifest:manifest xmlns:manifest=\"urn:oasis:names:tc:opendocument:xmlns:manifest:1.0\">",
            "<manifest:file-entry manifest:media-type=\"{}\" manifest:full-path=\"/\"/>",
            "<manifest:file-entry manifest:media-type=\"text/xml\" manifest:full-path=\"content.xml\"/>",
            "<manifest:file-entry manifest:media-type=\"text/xml\" manifest:full-path=\"styles.xml\"/>",
            "</manifest:manifest>",
        ),
        ODT_MIMETYPE
    )
}

/// Write a minimal but well-formed ODT container
///
/// The archive carries the uncompressed `mimetype` entry first, the given
/// body as `content.xml`, an empty `styles.xml`, and a manifest listing
/// the parts.
///
/// # Panics
///
/// Panics on any I/O or zip error; fixtures are expected to be writable.
pub fn write_odt(path: &Path, content_xml: &str) {
    write_odt_with_styles(path, content_xml, "<office:document-styles/>");
}

/// Like [`write_odt`] with an explicit `styles.xml` body
///
/// # Panics
///
/// Panics on any I/O or zip error.
pub fn write_odt_with_styles(path: &Path, content_xml: &str, styles_xml: &str) {
    let mut writer = zip::ZipWriter::new(File::create(path).expect("Failed to create fixture"));

    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    writer
        .start_file("mimetype", stored)
        .expect("Failed to start mimetype entry");
    writer
        .write_all(ODT_MIMETYPE.as_bytes())
        .expect("Failed to write mimetype");

    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, body) in [
        ("content.xml", content_xml),
        ("styles.xml", styles_xml),
        ("META-INF/manifest.xml", minimal_manifest().as_str()),
    ] {
        writer
            .start_file(name, deflated)
            .expect("Failed to start entry");
        writer
            .write_all(body.as_bytes())
            .expect("Failed to write entry");
    }

    writer.finish().expect("Failed to finish fixture archive");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_temp_dir_in_workspace_creates_in_tmp() {
        let temp = temp_dir_in_workspace();
        let path = temp.path();

        assert!(
            path.to_string_lossy().contains(".tmp"),
            "Path should contain .tmp, got: {}",
            path.display()
        );
        assert!(path.is_dir(), "Path should be a directory");
    }

    #[test]
    fn test_temp_dir_auto_cleanup() {
        let path = {
            let temp = temp_dir_in_workspace();
            let p = temp.path().to_path_buf();
            assert!(p.exists(), "Directory should exist before drop");
            p
        }; // temp dropped here

        assert!(
            !path.exists(),
            "Directory should not exist after drop: {}",
            path.display()
        );
    }

    #[test]
    fn test_png_bytes_decode_to_requested_size() {
        let bytes = png_bytes(32, 16);
        let img = image::load_from_memory(&bytes).expect("fixture should decode");
        assert_eq!((img.width(), img.height()), (32, 16));
    }

    #[test]
    fn test_write_odt_puts_mimetype_first_and_stored() {
        let temp = temp_dir_in_workspace();
        let path = temp.path().join("doc.odt");
        write_odt(&path, "<office:text/>");

        let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
        let mut first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "mimetype");
        assert_eq!(first.compression(), CompressionMethod::Stored);

        let mut body = String::new();
        first.read_to_string(&mut body).unwrap();
        assert_eq!(body, ODT_MIMETYPE);
    }

    #[test]
    fn test_write_odt_contains_standard_parts() {
        let temp = temp_dir_in_workspace();
        let path = temp.path().join("doc.odt");
        write_odt(&path, "<office:text><text:p>x</text:p></office:text>");

        let mut archive = zip::ZipArchive::new(File::open(&path).unwrap()).unwrap();
        for name in ["content.xml", "styles.xml", "META-INF/manifest.xml"] {
            assert!(archive.by_name(name).is_ok(), "missing part: {name}");
        }
    }
}
