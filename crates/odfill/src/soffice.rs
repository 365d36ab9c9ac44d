//! LibreOffice integration
//!
//! PDF conversion and printing shell out to a headless `soffice`. The
//! binary is resolved from PATH, or from the `SOFFICE_BINARY` environment
//! variable when set.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

fn soffice_binary() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("SOFFICE_BINARY") {
        return Ok(PathBuf::from(path));
    }
    which::which("soffice").context(
        "LibreOffice not found; install it or set SOFFICE_BINARY to the soffice binary",
    )
}

/// Convert a document to PDF next to it, returning the PDF path
pub fn convert_to_pdf(document: &Path) -> Result<PathBuf> {
    let outdir = document.parent().unwrap_or_else(|| Path::new("."));

    let status = Command::new(soffice_binary()?)
        .arg("--headless")
        .arg("--convert-to")
        .arg("pdf")
        .arg("--outdir")
        .arg(outdir)
        .arg(document)
        .status()
        .context("Failed to run soffice")?;

    if !status.success() {
        bail!("soffice PDF conversion failed with status {}", status);
    }

    Ok(document.with_extension("pdf"))
}

/// Print a document on the default printer
pub fn print_document(document: &Path) -> Result<()> {
    let status = Command::new(soffice_binary()?)
        .arg("--headless")
        .arg("-p")
        .arg(document)
        .status()
        .context("Failed to run soffice")?;

    if !status.success() {
        bail!("soffice printing failed with status {}", status);
    }

    Ok(())
}
