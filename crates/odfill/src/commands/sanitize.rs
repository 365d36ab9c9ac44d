//! Sanitize command - rejoin placeholders split by vacuous spans

use anyhow::{Context, Result, bail};
use colored::Colorize;
use odfill_core::sanitize::sanitize_template;
use std::path::PathBuf;

pub fn run(template: PathBuf, output: Option<PathBuf>, verbose: bool) -> Result<()> {
    if !template.is_file() {
        bail!("'{}' is not a file", template.display());
    }

    let output = output.unwrap_or_else(|| {
        let stem = template
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        template.with_file_name(format!("{}_sanitized.odt", stem))
    });

    if verbose {
        println!("{} Sanitizing '{}'", "→".cyan(), template.display());
    }

    sanitize_template(&template, &output)
        .with_context(|| format!("Failed to sanitize '{}'", template.display()))?;

    println!("{} Wrote {}", "✓".green().bold(), output.display());
    Ok(())
}
