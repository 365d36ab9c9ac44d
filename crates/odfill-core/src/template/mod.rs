//! Template filling
//!
//! A fill run rewrites the text parts of an extracted document against one
//! flattened data set. Each part goes through a fixed pass order:
//!
//! 1. conditional annotation regions
//! 2. document-level image directives
//! 3. table-row expansion for array placeholders
//! 4. scalar substitution
//! 5. leftover cleanup
//!
//! The run owns per-run state only (the working directory and an image
//! ordinal counter); nothing persists across runs.

pub(crate) mod images;
pub(crate) mod regions;
pub(crate) mod rows;
pub(crate) mod scalars;
pub(crate) mod tokenize;

use crate::data::FlattenedData;
use crate::error::{OdfillError, Result};
use crate::package;
use crate::remote;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Text parts rewritten by a fill run, in processing order
const TEXT_PARTS: [&str; 2] = ["content.xml", "styles.xml"];

/// Knobs for one fill run
#[derive(Debug, Clone)]
pub struct FillOptions {
    /// Replacement text for placeholders left unresolved at the end of the
    /// run; `None` keeps them verbatim
    pub fallback: Option<String>,
    /// Timeout applied to each remote image fetch
    pub fetch_timeout: Duration,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            fallback: None,
            fetch_timeout: remote::DEFAULT_TIMEOUT,
        }
    }
}

/// State for one fill run over one extracted document
pub struct FillRun<'a> {
    data: &'a FlattenedData,
    options: &'a FillOptions,
    work_dir: &'a Path,
    image_ordinal: usize,
}

impl<'a> FillRun<'a> {
    pub fn new(work_dir: &'a Path, data: &'a FlattenedData, options: &'a FillOptions) -> Self {
        Self {
            data,
            options,
            work_dir,
            image_ordinal: 0,
        }
    }

    pub(crate) fn data(&self) -> &'a FlattenedData {
        self.data
    }

    pub(crate) fn options(&self) -> &'a FillOptions {
        self.options
    }

    /// Folder receiving staged images, `Pictures/` under the working
    /// directory
    pub(crate) fn media_dir(&self) -> PathBuf {
        self.work_dir.join("Pictures")
    }

    /// Next value of the run-scoped image counter, starting at 1
    pub(crate) fn next_ordinal(&mut self) -> usize {
        self.image_ordinal += 1;
        self.image_ordinal
    }

    /// Run all passes over one part's XML text
    pub fn fill_part(&mut self, content: &str) -> String {
        let content = regions::resolve_regions(content, self.data);
        let content = images::resolve_document_images(&content, self);
        let content = rows::expand_rows(&content, self);
        let content = scalars::substitute_scalars(&content, self.data);
        scalars::resolve_leftovers(&content, self.options)
    }

    /// Fill the document's text parts in place
    ///
    /// `content.xml` must exist; `styles.xml` is filled when present so
    /// placeholders in headers and footers resolve too.
    pub fn fill_document(&mut self) -> Result<()> {
        for (index, part) in TEXT_PARTS.iter().enumerate() {
            let path = self.work_dir.join(part);
            if !path.is_file() {
                if index == 0 {
                    return Err(OdfillError::MissingPart(part.to_string()));
                }
                continue;
            }
            let content = fs::read_to_string(&path)?;
            fs::write(&path, self.fill_part(&content))?;
        }
        Ok(())
    }
}

/// Fill a template document into a new file
///
/// The template is extracted into a throwaway working directory, filled,
/// its manifest updated for any embedded images, and repackaged at `dest`.
pub fn fill_template(
    template: &Path,
    data: &FlattenedData,
    options: &FillOptions,
    dest: &Path,
) -> Result<()> {
    let work = tempfile::tempdir()?;

    package::extract_template(template, work.path())?;
    FillRun::new(work.path(), data, options).fill_document()?;
    package::update_manifest(work.path())?;
    package::write_package(work.path(), dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CONTENT: &str = concat!(
        "<office:text>",
        "<text:p>Invoice for @@customer.name</text:p>",
        "<office:annotation office:name=\"c1\"><text:p>@@vip</text:p></office:annotation>",
        "<text:p>VIP terms apply</text:p>",
        "<office:annotation-end office:name=\"c1\"/>",
        "<table:table>",
        "<table:table-row><table:table-cell><text:p>@@items.label: @@items.price @@currency</text:p></table:table-cell></table:table-row>",
        "</table:table>",
        "<text:p>Contact: @@missing</text:p>",
        "</office:text>",
    );

    fn fill(value: serde_json::Value, options: &FillOptions) -> String {
        let data = FlattenedData::from_json(&value).unwrap();
        let temp = odfill_testkit::temp_dir_in_workspace();
        let mut run = FillRun::new(temp.path(), &data, options);
        run.fill_part(CONTENT)
    }

    #[test]
    fn passes_compose_over_a_full_part() {
        let result = fill(
            json!({
                "customer": {"name": "Acme"},
                "vip": true,
                "currency": "EUR",
                "items": [
                    {"label": "Widget", "price": "9.50"},
                    {"label": "Gadget", "price": "12.00"}
                ]
            }),
            &FillOptions::default(),
        );

        assert!(result.contains("Invoice for Acme"));
        assert!(result.contains("VIP terms apply"));
        assert_eq!(result.matches("<table:table-row>").count(), 2);
        assert!(result.contains("Widget: 9.50 EUR"));
        assert!(result.contains("Gadget: 12.00 EUR"));
        // No fallback configured, unresolved token stays
        assert!(result.contains("@@missing"));
    }

    #[test]
    fn falsy_region_and_fallback_cleanup() {
        let options = FillOptions {
            fallback: Some("-".to_string()),
            ..FillOptions::default()
        };
        let result = fill(
            json!({
                "customer": {"name": "Acme"},
                "currency": "EUR",
                "items": [{"label": "Widget", "price": "9.50"}]
            }),
            &options,
        );

        assert!(!result.contains("VIP terms apply"));
        assert!(result.contains("Contact: -"));
        assert!(!result.contains("@@"));
    }

    #[test]
    fn fill_document_requires_content_part() {
        let data = FlattenedData::from_json(&json!({})).unwrap();
        let options = FillOptions::default();
        let temp = odfill_testkit::temp_dir_in_workspace();

        let err = FillRun::new(temp.path(), &data, &options)
            .fill_document()
            .unwrap_err();
        assert!(matches!(err, OdfillError::MissingPart(_)));
    }

    #[test]
    fn fill_document_rewrites_both_parts() {
        let data = FlattenedData::from_json(&json!({"firm": "Acme"})).unwrap();
        let options = FillOptions::default();
        let temp = odfill_testkit::temp_dir_in_workspace();
        std::fs::write(temp.path().join("content.xml"), "<text:p>@@firm</text:p>").unwrap();
        std::fs::write(temp.path().join("styles.xml"), "<text:p>Footer @@firm</text:p>").unwrap();

        FillRun::new(temp.path(), &data, &options).fill_document().unwrap();

        let content = std::fs::read_to_string(temp.path().join("content.xml")).unwrap();
        let styles = std::fs::read_to_string(temp.path().join("styles.xml")).unwrap();
        assert_eq!(content, "<text:p>Acme</text:p>");
        assert_eq!(styles, "<text:p>Footer Acme</text:p>");
    }
}
