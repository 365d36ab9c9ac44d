//! CLI command structure using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "odfill")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fill a template document with data
    Fill {
        /// Template document, a local path or an https:// URL
        template: String,

        /// JSON data, a local path or an https:// URL
        #[arg(long, conflicts_with = "xml")]
        json: Option<String>,

        /// XML data, a local path or an https:// URL
        #[arg(long)]
        xml: Option<String>,

        /// Output path (defaults next to the template)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replacement text for placeholders the data does not cover
        #[arg(long)]
        fallback: Option<String>,

        /// Overwrite the output file if it exists
        #[arg(long)]
        overwrite: bool,

        /// Also convert the filled document to PDF via LibreOffice
        #[arg(long)]
        pdf: bool,

        /// Print the filled document on the default printer via LibreOffice
        #[arg(long)]
        print: bool,
    },

    /// Strip vacuous character spans that break placeholders apart
    Sanitize {
        /// Template document to sanitize
        template: PathBuf,

        /// Output path (defaults to <template>_sanitized.odt)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
