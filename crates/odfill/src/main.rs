mod cli;
mod commands;
mod soffice;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fill {
            template,
            json,
            xml,
            output,
            fallback,
            overwrite,
            pdf,
            print,
        } => commands::fill::run(commands::fill::FillArgs {
            template,
            json,
            xml,
            output,
            fallback,
            overwrite,
            pdf,
            print,
            verbose: cli.verbose,
        }),
        Commands::Sanitize { template, output } => {
            commands::sanitize::run(template, output, cli.verbose)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
