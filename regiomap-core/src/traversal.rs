//! Depth-first traversal of the region hierarchy.
//!
//! [`process_subtree`] walks regions in declaration order and decides, per
//! region, whether to carve a subset, whether to build a map and which source
//! and paths the children inherit. The work itself is delegated to a
//! [`RegionBuilder`]; diagnostics go to a [`BuildReporter`].
//!
//! Failure handling:
//! - a failed subset skips the region's map and its whole subtree;
//! - a failed map (including overlay staging) still descends into children;
//! - a carved subset is removed once its subtree finished without errors and
//!   kept otherwise.

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info, warn};

use crate::{BoundingBox, BuildContext, BuildError, RegionJob, RegionNode};

/// Overlay files prepared for a region's map build.
#[derive(Debug, Clone, PartialEq)]
pub struct StagedOverlays {
    /// Buffered, clamped bounds of the region polygon.
    pub bounds: BoundingBox,
    /// Synthetic sea overlay document.
    pub sea: Utf8PathBuf,
    /// Land overlay document produced by the converter.
    pub land: Utf8PathBuf,
}

/// Inputs for building one region's map artefact.
#[derive(Debug, Clone, Copy)]
pub struct MapRequest<'a> {
    /// The region being built.
    pub region: RegionJob<'a>,
    /// Source PBF, relative to the PBF staging root.
    pub source: &'a Utf8Path,
    /// Whether the source must be filtered by the region polygon.
    pub area_filter: bool,
    /// Overlays staged for the region.
    pub overlays: &'a StagedOverlays,
}

/// Where a finished map ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapArtefact {
    /// Moved to the publication root.
    Published(Utf8PathBuf),
    /// Left in the staging root, as in a dry run.
    Staged(Utf8PathBuf),
}

/// Performs the filesystem and process work for each region.
pub trait RegionBuilder {
    /// Carve the region's subset from the inherited source and return its
    /// path relative to the PBF staging root.
    fn build_subset(&self, region: &RegionJob<'_>) -> Result<Utf8PathBuf, BuildError>;

    /// Derive the region's bounds and write its sea and land overlays.
    fn stage_overlays(&self, region: &RegionJob<'_>) -> Result<StagedOverlays, BuildError>;

    /// Build the region's map and publish it unless publication is disabled.
    fn build_map(&self, request: &MapRequest<'_>) -> Result<MapArtefact, BuildError>;

    /// Remove a consumed subset. Returns `false` when it no longer exists.
    fn discard_subset(&self, subset: &Utf8Path) -> Result<bool, BuildError>;
}

/// Step of the per-region workflow an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Carving the region subset.
    Subset,
    /// Staging overlays or building the map.
    Map,
    /// Removing the consumed subset.
    Cleanup,
}

/// Receives traversal diagnostics.
pub trait BuildReporter {
    /// A region is about to be evaluated.
    fn region_started(&self, region: &RegionJob<'_>);
    /// A step failed for `region`.
    fn region_failed(&self, region: &RegionJob<'_>, stage: Stage, error: &BuildError);
    /// A map was published for `region`.
    fn map_published(&self, region: &RegionJob<'_>, artefact: &Utf8Path);
    /// A map was built for `region` but left in staging.
    fn map_staged(&self, region: &RegionJob<'_>, artefact: &Utf8Path);
    /// A subset was removed after its subtree succeeded.
    fn subset_removed(&self, region: &RegionJob<'_>, subset: &Utf8Path);
    /// A subset was kept because its subtree reported errors.
    fn subset_retained(&self, region: &RegionJob<'_>, subset: &Utf8Path);
}

/// Reporter forwarding diagnostics to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl BuildReporter for LogReporter {
    fn region_started(&self, region: &RegionJob<'_>) {
        info!("evaluating part '{}'", region.hierarchical_name());
    }

    fn region_failed(&self, region: &RegionJob<'_>, stage: Stage, error: &BuildError) {
        let name = region.hierarchical_name();
        match stage {
            Stage::Subset => warn!("{name}: {error}, skipping all sub parts"),
            Stage::Map => warn!("{name}: {error}"),
            Stage::Cleanup => warn!("{name}: could not remove subset: {error}"),
        }
    }

    fn map_published(&self, region: &RegionJob<'_>, artefact: &Utf8Path) {
        info!("{}: published {artefact}", region.hierarchical_name());
    }

    fn map_staged(&self, region: &RegionJob<'_>, artefact: &Utf8Path) {
        info!(
            "{}: map staged at {artefact}, not published",
            region.hierarchical_name()
        );
    }

    fn subset_removed(&self, _region: &RegionJob<'_>, subset: &Utf8Path) {
        debug!("removing pbf file {subset}");
    }

    fn subset_retained(&self, _region: &RegionJob<'_>, subset: &Utf8Path) {
        debug!("error occurred in sub part, keeping pbf file {subset}");
    }
}

/// Aggregated result of processing a subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Whether any region in the subtree failed.
    pub error_occurred: bool,
    /// Number of maps published.
    pub published: usize,
    /// Number of failed steps.
    pub failures: usize,
}

impl BuildOutcome {
    /// Combine the outcomes of two disjoint subtrees.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        Self {
            error_occurred: self.error_occurred || other.error_occurred,
            published: self.published + other.published,
            failures: self.failures + other.failures,
        }
    }

    const fn failure() -> Self {
        Self {
            error_occurred: true,
            published: 0,
            failures: 1,
        }
    }

    const fn publication() -> Self {
        Self {
            error_occurred: false,
            published: 1,
            failures: 0,
        }
    }
}

/// Process `nodes` and their descendants in order.
///
/// Errors never abort the walk: each one is reported to `reporter` and
/// reflected in the returned [`BuildOutcome`]. Siblings are always visited.
pub fn process_subtree<B, R>(
    nodes: &[RegionNode],
    context: &BuildContext,
    builder: &B,
    reporter: &R,
) -> BuildOutcome
where
    B: RegionBuilder + ?Sized,
    R: BuildReporter + ?Sized,
{
    nodes.iter().fold(BuildOutcome::default(), |outcome, node| {
        outcome.merge(process_region(node, context, builder, reporter))
    })
}

fn process_region<B, R>(
    node: &RegionNode,
    context: &BuildContext,
    builder: &B,
    reporter: &R,
) -> BuildOutcome
where
    B: RegionBuilder + ?Sized,
    R: BuildReporter + ?Sized,
{
    let region = RegionJob::new(node, context);
    reporter.region_started(&region);
    let area_filter = region.needs_area_filter();

    let (source, subset) = if node.creates_data_subset() {
        match builder.build_subset(&region) {
            Ok(subset) => (subset.clone(), Some(subset)),
            Err(error) => {
                reporter.region_failed(&region, Stage::Subset, &error);
                return BuildOutcome::failure();
            }
        }
    } else {
        (context.source().to_path_buf(), None)
    };

    let mut outcome = BuildOutcome::default();
    if node.creates_map_artifact() {
        let built = builder.stage_overlays(&region).and_then(|overlays| {
            builder.build_map(&MapRequest {
                region,
                source: &source,
                area_filter,
                overlays: &overlays,
            })
        });
        outcome = match built {
            Ok(MapArtefact::Published(artefact)) => {
                reporter.map_published(&region, &artefact);
                BuildOutcome::publication()
            }
            Ok(MapArtefact::Staged(artefact)) => {
                reporter.map_staged(&region, &artefact);
                BuildOutcome::default()
            }
            Err(error) => {
                reporter.region_failed(&region, Stage::Map, &error);
                BuildOutcome::failure()
            }
        };
    }

    let child_context = context.descend(node, source);
    outcome = outcome.merge(process_subtree(
        node.children(),
        &child_context,
        builder,
        reporter,
    ));

    if let Some(subset) = subset {
        outcome = outcome.merge(release_subset(&region, &subset, outcome, builder, reporter));
    }
    outcome
}

fn release_subset<B, R>(
    region: &RegionJob<'_>,
    subset: &Utf8Path,
    subtree: BuildOutcome,
    builder: &B,
    reporter: &R,
) -> BuildOutcome
where
    B: RegionBuilder + ?Sized,
    R: BuildReporter + ?Sized,
{
    if subtree.error_occurred {
        reporter.subset_retained(region, subset);
        return BuildOutcome::default();
    }
    match builder.discard_subset(subset) {
        Ok(true) => {
            reporter.subset_removed(region, subset);
            BuildOutcome::default()
        }
        Ok(false) => BuildOutcome::default(),
        Err(error) => {
            reporter.region_failed(region, Stage::Cleanup, &error);
            BuildOutcome::failure()
        }
    }
}
