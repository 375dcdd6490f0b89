//! # statpilot command-line entry point
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Initialise logging (stderr, optional rolling file)
//!   └─> Execute the subcommand, printing JSON or APA text on stdout
//! ```
//!
//! ```bash
//! statpilot profile survey.csv
//! statpilot run survey.csv --dependent score --independent group --format apa
//! ```

#![warn(clippy::all, rust_2018_idioms)]
#![expect(clippy::print_stdout)] // results are the program's output

mod cli;

use anyhow::Result;
use clap::Parser as _;
use statpilot::logging::{self, LogOptions};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    logging::init(&LogOptions {
        verbose: cli.verbose,
        to_file: cli.log_file,
    })?;
    if cli.log_file {
        let path = logging::get_current_log_path()?;
        tracing::info!("Writing logs to {}", path.display());
    }

    if let Err(e) = cli::run_command(cli) {
        tracing::error!("{e:#}");
        return Err(e);
    }
    Ok(())
}
