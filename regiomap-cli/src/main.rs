//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use std::process::ExitCode;

use regiomap_cli::CliError;

#[expect(
    clippy::print_stderr,
    reason = "fatal startup errors are reported on stderr before exiting"
)]
fn main() -> ExitCode {
    match regiomap_cli::run() {
        Ok(outcome) if outcome.error_occurred => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(CliError::ArgumentParsing(err)) => err.exit(),
        Err(err) => {
            eprintln!("regiomap: {err}");
            ExitCode::from(2)
        }
    }
}
