//! # fleetpm
//!
//! Command-line entry point. Parses arguments, installs logging and runs the
//! requested command; any error is printed on one line with a non-zero exit.

use clap::Parser;
use fleetpm::cli::{Cli, run};
use fleetpm::config::init_tracing;
use std::process::ExitCode;
use tracing::warn;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            warn!(error = %err, "command rejected");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
