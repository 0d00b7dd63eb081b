//! Build command implementation for the regiomap CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use log::{info, warn};
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use regiomap_core::{BuildOutcome, LogReporter, process_subtree};
use regiomap_data::{CommandRunner, OsmosisBuilder, SystemRunner, unpack_land_archive};
use serde::{Deserialize, Serialize};

use crate::logging::init_logging;
use crate::plan::{ResolvedPlan, locate_toolchain};
use crate::{ARG_DRY_RUN, ARG_PLAN, CliError, ENV_PLAN, Plan};

/// CLI arguments for the `build` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    long_about = "Walk the region tree of a build plan depth-first, carving \
                 data subsets with osmosis and writing a map for every \
                 region that asks for one. Failures are confined to the \
                 region that caused them; the exit status is non-zero when \
                 any region failed.",
    about = "Build subsets and maps for a region plan"
)]
#[ortho_config(prefix = "REGIOMAP")]
pub(crate) struct BuildArgs {
    /// Path to the JSON build plan.
    #[arg(short = 'c', long = ARG_PLAN, value_name = "path")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) plan: Option<Utf8PathBuf>,
    /// Log external commands and create empty placeholders instead of
    /// running them.
    #[arg(short = 'd', long = ARG_DRY_RUN)]
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub(crate) dry_run: bool,
}

impl BuildArgs {
    pub(crate) fn into_config(self) -> Result<BuildConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        BuildConfig::try_from(merged)
    }
}

/// Resolved `build` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BuildConfig {
    /// Path to the JSON plan.
    pub(crate) plan: Utf8PathBuf,
    /// Skip external tools and only stage placeholders.
    pub(crate) dry_run: bool,
}

impl TryFrom<BuildArgs> for BuildConfig {
    type Error = CliError;

    fn try_from(args: BuildArgs) -> Result<Self, Self::Error> {
        let plan = args.plan.ok_or(CliError::MissingArgument {
            field: ARG_PLAN,
            env: ENV_PLAN,
        })?;
        Ok(Self {
            plan,
            dry_run: args.dry_run,
        })
    }
}

pub(crate) fn run_build(args: BuildArgs) -> Result<BuildOutcome, CliError> {
    let config = args.into_config()?;
    let plan = Plan::load(&config.plan)?.resolve(&config.plan)?;
    init_logging(&plan.layout.logs, config.dry_run)?;
    execute_build(&config, plan, SystemRunner)
}

/// Build every region of a resolved `plan` with `runner`.
pub(crate) fn execute_build<R: CommandRunner>(
    config: &BuildConfig,
    plan: ResolvedPlan,
    runner: R,
) -> Result<BuildOutcome, CliError> {
    info!("start creating maps from configuration at {}", config.plan);
    let toolchain = if config.dry_run {
        info!("dry run: external tools are logged but not executed");
        plan.toolchain
    } else {
        let located = locate_toolchain(&plan.toolchain)?;
        unpack_land_archive(&plan.layout).map_err(|source| CliError::UnpackLandArchive {
            path: plan.layout.land_archive(),
            source,
        })?;
        located
    };
    info!(
        "building {} top-level regions from {}",
        plan.regions.len(),
        plan.context.source()
    );
    let builder =
        OsmosisBuilder::new(plan.layout, toolchain, runner).with_dry_run(config.dry_run);
    let outcome = process_subtree(&plan.regions, &plan.context, &builder, &LogReporter);
    if outcome.error_occurred {
        warn!(
            "finished with {} failed steps, {} maps published",
            outcome.failures, outcome.published
        );
    } else {
        info!("finished, {} maps published", outcome.published);
    }
    Ok(outcome)
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<BuildConfig, CliError> {
    let merged = BuildArgs::merge_from_layers(layers).map_err(CliError::from)?;
    BuildConfig::try_from(merged)
}
