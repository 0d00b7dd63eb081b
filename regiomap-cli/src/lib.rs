//! Command-line interface for building region map hierarchies.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use regiomap_core::BuildOutcome;

mod build;
mod error;
mod logging;
mod plan;

pub use error::CliError;

use build::BuildArgs;
use plan::Plan;

pub(crate) const ARG_PLAN: &str = "plan";
pub(crate) const ARG_DRY_RUN: &str = "dry-run";
pub(crate) const ENV_PLAN: &str = "REGIOMAP_CMDS_BUILD_PLAN";

/// Run the regiomap CLI with the current process arguments and environment.
///
/// Returns the aggregate outcome of the build; per-region failures are
/// reported through the log and folded into
/// [`BuildOutcome::error_occurred`] rather than returned as errors.
pub fn run() -> Result<BuildOutcome, CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Build(args) => build::run_build(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "regiomap",
    about = "Build map artefacts for a hierarchy of regions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Carve data subsets and build maps for every region in a plan.
    Build(BuildArgs),
}

#[cfg(test)]
mod tests;
