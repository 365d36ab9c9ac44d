//! Document packaging
//!
//! ODF documents are zip containers with one hard constraint: the
//! `mimetype` entry must come first and be stored uncompressed, so format
//! sniffers can read it from a fixed offset. Extraction guards every entry
//! name against path traversal.

use crate::error::{OdfillError, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::SimpleFileOptions;

const MIMETYPE: &str = "mimetype";
const MANIFEST: &str = "META-INF/manifest.xml";
const MANIFEST_CLOSE: &str = "</manifest:manifest>";

/// Extract a template container into `dest`
///
/// # Errors
///
/// Returns `Extraction` for unreadable containers and for entries whose
/// names escape the destination directory.
pub fn extract_template(template: &Path, dest: &Path) -> Result<()> {
    let file = File::open(template)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| OdfillError::Extraction(format!("open {}: {}", template.display(), e)))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| OdfillError::Extraction(e.to_string()))?;

        let Some(relative) = entry.enclosed_name() else {
            return Err(OdfillError::Extraction(format!(
                "unsafe entry name '{}'",
                entry.name()
            )));
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = File::create(&target)?;
            io::copy(&mut entry, &mut out)?;
        }
    }

    Ok(())
}

/// Repackage an extracted document tree at `dest`
///
/// Writes the `mimetype` entry first and uncompressed, then every other
/// file deflated, with forward-slash entry names. A partially written
/// output file is removed on failure.
pub fn write_package(src_dir: &Path, dest: &Path) -> Result<()> {
    let result = write_package_inner(src_dir, dest);
    if result.is_err() {
        let _ = fs::remove_file(dest);
    }
    result
}

fn write_package_inner(src_dir: &Path, dest: &Path) -> Result<()> {
    let mimetype_path = src_dir.join(MIMETYPE);
    if !mimetype_path.is_file() {
        return Err(OdfillError::MissingMimetype);
    }

    let mut writer = zip::ZipWriter::new(File::create(dest)?);

    let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    writer
        .start_file(MIMETYPE, stored)
        .map_err(|e| OdfillError::Packaging(e.to_string()))?;
    io::copy(&mut File::open(&mimetype_path)?, &mut writer)?;

    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    for entry in WalkDir::new(src_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| OdfillError::Packaging(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry
            .path()
            .strip_prefix(src_dir)
            .map_err(|e| OdfillError::Packaging(e.to_string()))?
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if name == MIMETYPE {
            continue;
        }
        writer
            .start_file(&name, deflated)
            .map_err(|e| OdfillError::Packaging(e.to_string()))?;
        io::copy(&mut File::open(entry.path())?, &mut writer)?;
    }

    writer
        .finish()
        .map_err(|e| OdfillError::Packaging(e.to_string()))?;
    Ok(())
}

/// Manifest media type for a stored picture
fn media_type_for(name: &str) -> &'static str {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Register staged pictures in the package manifest
///
/// Every file under `Pictures/` missing from `META-INF/manifest.xml` gets
/// a `manifest:file-entry` spliced in before the closing element. A tree
/// without staged pictures or without a manifest is left untouched.
pub fn update_manifest(work_dir: &Path) -> Result<()> {
    let pictures = work_dir.join("Pictures");
    let manifest_path = work_dir.join(MANIFEST);
    if !pictures.is_dir() || !manifest_path.is_file() {
        return Ok(());
    }

    let manifest = fs::read_to_string(&manifest_path)?;
    let mut additions = String::new();

    let mut names: Vec<String> = Vec::new();
    for entry in fs::read_dir(&pictures)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();

    for name in names {
        let full_path = format!("Pictures/{}", name);
        if manifest.contains(&format!("manifest:full-path=\"{}\"", full_path)) {
            continue;
        }
        additions.push_str(&format!(
            "<manifest:file-entry manifest:media-type=\"{}\" manifest:full-path=\"{}\"/>",
            media_type_for(&name),
            full_path
        ));
    }

    if additions.is_empty() {
        return Ok(());
    }
    let Some(close) = manifest.rfind(MANIFEST_CLOSE) else {
        return Err(OdfillError::Packaging(
            "manifest has no closing element".to_string(),
        ));
    };

    let mut updated = String::with_capacity(manifest.len() + additions.len());
    updated.push_str(&manifest[..close]);
    updated.push_str(&additions);
    updated.push_str(&manifest[close..]);
    fs::write(&manifest_path, updated)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn read_entry(archive_path: &Path, name: &str) -> (usize, CompressionMethod, Vec<u8>) {
        let mut archive = zip::ZipArchive::new(File::open(archive_path).unwrap()).unwrap();
        let index = (0..archive.len())
            .find(|&i| archive.by_index(i).unwrap().name() == name)
            .unwrap();
        let mut entry = archive.by_index(index).unwrap();
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes).unwrap();
        (index, entry.compression(), bytes)
    }

    #[test]
    fn extract_then_repack_round_trips() {
        let temp = odfill_testkit::temp_dir_in_workspace();
        let source = temp.path().join("in.odt");
        odfill_testkit::write_odt(&source, "<office:text><text:p>hi</text:p></office:text>");

        let work = temp.path().join("work");
        extract_template(&source, &work).unwrap();
        assert!(work.join("content.xml").is_file());
        assert!(work.join(MANIFEST).is_file());

        let dest = temp.path().join("out.odt");
        write_package(&work, &dest).unwrap();

        let (_, _, bytes) = read_entry(&dest, "content.xml");
        assert!(String::from_utf8(bytes).unwrap().contains("hi"));
    }

    #[test]
    fn mimetype_is_first_and_stored() {
        let temp = odfill_testkit::temp_dir_in_workspace();
        let source = temp.path().join("in.odt");
        odfill_testkit::write_odt(&source, "<office:text/>");

        let work = temp.path().join("work");
        extract_template(&source, &work).unwrap();
        let dest = temp.path().join("out.odt");
        write_package(&work, &dest).unwrap();

        let (index, method, bytes) = read_entry(&dest, MIMETYPE);
        assert_eq!(index, 0);
        assert_eq!(method, CompressionMethod::Stored);
        assert_eq!(bytes, odfill_testkit::ODT_MIMETYPE.as_bytes());
    }

    #[test]
    fn repack_without_mimetype_fails_and_cleans_up() {
        let temp = odfill_testkit::temp_dir_in_workspace();
        let work = temp.path().join("work");
        fs::create_dir_all(&work).unwrap();
        fs::write(work.join("content.xml"), "<office:text/>").unwrap();

        let dest = temp.path().join("out.odt");
        let err = write_package(&work, &dest).unwrap_err();
        assert!(matches!(err, OdfillError::MissingMimetype));
        assert!(!dest.exists());
    }

    #[test]
    fn manifest_gains_entries_for_staged_pictures() {
        let temp = odfill_testkit::temp_dir_in_workspace();
        let source = temp.path().join("in.odt");
        odfill_testkit::write_odt(&source, "<office:text/>");

        let work = temp.path().join("work");
        extract_template(&source, &work).unwrap();
        fs::create_dir_all(work.join("Pictures")).unwrap();
        fs::write(work.join("Pictures/logo_logo.png"), b"png").unwrap();
        fs::write(work.join("Pictures/scan.jpg"), b"jpg").unwrap();

        update_manifest(&work).unwrap();

        let manifest = fs::read_to_string(work.join(MANIFEST)).unwrap();
        assert!(manifest.contains(
            "<manifest:file-entry manifest:media-type=\"image/png\" manifest:full-path=\"Pictures/logo_logo.png\"/>"
        ));
        assert!(manifest.contains("manifest:full-path=\"Pictures/scan.jpg\""));
        assert!(manifest.ends_with(MANIFEST_CLOSE));
    }

    #[test]
    fn manifest_update_is_idempotent() {
        let temp = odfill_testkit::temp_dir_in_workspace();
        let source = temp.path().join("in.odt");
        odfill_testkit::write_odt(&source, "<office:text/>");

        let work = temp.path().join("work");
        extract_template(&source, &work).unwrap();
        fs::create_dir_all(work.join("Pictures")).unwrap();
        fs::write(work.join("Pictures/logo.png"), b"png").unwrap();

        update_manifest(&work).unwrap();
        let first = fs::read_to_string(work.join(MANIFEST)).unwrap();
        update_manifest(&work).unwrap();
        let second = fs::read_to_string(work.join(MANIFEST)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn traversal_entry_names_are_rejected() {
        let temp = odfill_testkit::temp_dir_in_workspace();
        let source = temp.path().join("evil.zip");
        let mut writer = zip::ZipWriter::new(File::create(&source).unwrap());
        writer
            .start_file("../outside.txt", SimpleFileOptions::default())
            .unwrap();
        io::Write::write_all(&mut writer, b"x").unwrap();
        writer.finish().unwrap();

        let err = extract_template(&source, &temp.path().join("work")).unwrap_err();
        assert!(matches!(err, OdfillError::Extraction(_)));
    }
}
