//! Entry point of the `dicod` DICT protocol server.

use std::process::ExitCode;

use clap::Parser;
use dico_config::Cli;

#[expect(
    clippy::print_stderr,
    reason = "fatal errors may occur before telemetry is installed"
)]
fn main() -> ExitCode {
    match dicod::run_daemon(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("dicod: {error}");
            ExitCode::FAILURE
        }
    }
}
