//! Fill command - produce a filled document from a template and data

use anyhow::{Context, Result, bail};
use colored::Colorize;
use odfill_core::data::{FlattenedData, xml::parse_xml_data};
use odfill_core::remote;
use odfill_core::template::{FillOptions, fill_template};
use std::fs;
use std::path::{Path, PathBuf};

pub struct FillArgs {
    pub template: String,
    pub json: Option<String>,
    pub xml: Option<String>,
    pub output: Option<PathBuf>,
    pub fallback: Option<String>,
    pub overwrite: bool,
    pub pdf: bool,
    pub print: bool,
    pub verbose: bool,
}

/// Fill a template with data
pub fn run(args: FillArgs) -> Result<()> {
    let options = FillOptions {
        fallback: args.fallback.clone(),
        ..FillOptions::default()
    };

    // Step 1: Materialize the template locally
    let staging = tempfile::tempdir()?;
    let template = materialize(&args.template, staging.path(), args.verbose)
        .with_context(|| format!("Failed to load template '{}'", args.template))?;

    // Step 2: Load and flatten the data
    if args.verbose {
        println!("{} Loading data", "→".cyan());
    }
    let data = load_data(&args, staging.path())?;

    // Step 3: Decide the output path
    let output = output_path(&args, &template, &data, is_remote(&args.template));
    if output.exists() && !args.overwrite {
        bail!(
            "Output '{}' already exists (use --overwrite to replace it)",
            output.display()
        );
    }

    // Step 4: Fill
    if args.verbose {
        println!("{} Filling '{}'", "→".cyan(), template.display());
    }
    fill_template(&template, &data, &options, &output)
        .with_context(|| format!("Failed to fill '{}'", template.display()))?;

    println!("{} Wrote {}", "✓".green().bold(), output.display());

    // Step 5: Optional LibreOffice post-processing
    if args.pdf {
        let pdf = crate::soffice::convert_to_pdf(&output)?;
        println!("{} Wrote {}", "✓".green().bold(), pdf.display());
    }
    if args.print {
        crate::soffice::print_document(&output)?;
        println!("{} Sent to default printer", "✓".green().bold());
    }

    Ok(())
}

fn is_remote(source: &str) -> bool {
    source.starts_with("https://") || source.starts_with("http://")
}

/// Resolve a template or data argument to a local file, downloading
/// `http(s)://` sources into the staging directory
fn materialize(source: &str, staging: &Path, verbose: bool) -> Result<PathBuf> {
    if is_remote(source) {
        if verbose {
            println!("{} Downloading '{}'", "→".cyan(), source);
        }
        let bytes = remote::fetch_bytes(source, remote::DEFAULT_TIMEOUT)?;
        let path = staging.join(remote::url_file_name(source));
        fs::write(&path, bytes)?;
        return Ok(path);
    }

    let path = PathBuf::from(source);
    if !path.is_file() {
        bail!("'{}' is not a file", path.display());
    }
    Ok(path)
}

fn load_data(args: &FillArgs, staging: &Path) -> Result<FlattenedData> {
    match (&args.json, &args.xml) {
        (Some(source), None) => {
            let path = materialize(source, staging, args.verbose)?;
            let text = fs::read_to_string(&path)?;
            Ok(FlattenedData::from_json_str(&text)?)
        }
        (None, Some(source)) => {
            let path = materialize(source, staging, args.verbose)?;
            let text = fs::read_to_string(&path)?;
            let value = parse_xml_data(&text)?;
            Ok(FlattenedData::from_json(&value)?)
        }
        _ => bail!("Provide the data with exactly one of --json or --xml"),
    }
}

/// Default output path: next to the template, `<stem>_filled.odt`
///
/// A downloaded template lives in the throwaway staging directory, so its
/// default output goes to the current directory instead. Data flagged
/// incomplete gets a `__` stem suffix so drafts are easy to spot in a
/// folder listing.
fn output_path(args: &FillArgs, template: &Path, data: &FlattenedData, remote: bool) -> PathBuf {
    let mut path = match &args.output {
        Some(output) => output.clone(),
        None => {
            let stem = template
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("document");
            let name = format!("{}_filled.odt", stem);
            if remote {
                PathBuf::from(name)
            } else {
                template.with_file_name(name)
            }
        }
    };

    if path.extension().is_none_or(|e| e != "odt") {
        path.set_extension("odt");
    }

    if data.incomplete() {
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("document")
            .to_string();
        path.set_file_name(format!("{}__.odt", stem));
    }

    path
}
