//! Test doubles for exercising the traversal without touching the filesystem
//! or spawning processes.

use std::cell::RefCell;
use std::collections::HashSet;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};

use crate::{
    BoundingBox, BuildError, BuildReporter, EngineFailure, MapArtefact, MapRequest, RegionBuilder,
    RegionJob, Stage, StagedOverlays,
};

/// Call recorded by [`ScriptedBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuilderCall {
    /// `build_subset` for the named region.
    Subset(String),
    /// `stage_overlays` for the named region.
    Overlays(String),
    /// `build_map` for the named region.
    Map {
        /// Hierarchical region name.
        region: String,
        /// Source the map was built from.
        source: Utf8PathBuf,
        /// Whether the polygon filter was requested.
        area_filter: bool,
    },
    /// `discard_subset` for the given path.
    Discard(Utf8PathBuf),
}

/// `RegionBuilder` that records calls and fails on demand.
///
/// Subsets are reported at `<hierarchical name>.osm.pbf`. Failures are keyed
/// by hierarchical name, e.g. `europe/greece`.
#[derive(Debug, Default)]
pub struct ScriptedBuilder {
    calls: RefCell<Vec<BuilderCall>>,
    failing_subsets: HashSet<String>,
    failing_overlays: HashSet<String>,
    failing_maps: HashSet<String>,
    failing_discard: bool,
    staging_only: bool,
}

impl ScriptedBuilder {
    /// Fail `build_subset` for `region`.
    #[must_use]
    pub fn failing_subset(mut self, region: &str) -> Self {
        self.failing_subsets.insert(region.to_owned());
        self
    }

    /// Fail `stage_overlays` for `region`.
    #[must_use]
    pub fn failing_overlays(mut self, region: &str) -> Self {
        self.failing_overlays.insert(region.to_owned());
        self
    }

    /// Fail `build_map` for `region`.
    #[must_use]
    pub fn failing_map(mut self, region: &str) -> Self {
        self.failing_maps.insert(region.to_owned());
        self
    }

    /// Fail every `discard_subset` call.
    #[must_use]
    pub fn failing_discard(mut self) -> Self {
        self.failing_discard = true;
        self
    }

    /// Leave every map staged instead of publishing it.
    #[must_use]
    pub fn staging_only(mut self) -> Self {
        self.staging_only = true;
        self
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<BuilderCall> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: BuilderCall) {
        self.calls.borrow_mut().push(call);
    }
}

fn engine_error(tool: &str, artefact: Utf8PathBuf) -> BuildError {
    BuildError::EngineInvocation {
        tool: tool.to_owned(),
        artefact,
        failure: EngineFailure::Exit {
            code: Some(1),
            log: None,
        },
    }
}

impl RegionBuilder for ScriptedBuilder {
    fn build_subset(&self, region: &RegionJob<'_>) -> Result<Utf8PathBuf, BuildError> {
        let name = region.hierarchical_name();
        self.record(BuilderCall::Subset(name.to_string()));
        let subset = Utf8PathBuf::from(format!("{name}.osm.pbf"));
        if self.failing_subsets.contains(name.as_str()) {
            return Err(engine_error("osmosis", subset));
        }
        Ok(subset)
    }

    fn stage_overlays(&self, region: &RegionJob<'_>) -> Result<StagedOverlays, BuildError> {
        let name = region.hierarchical_name();
        self.record(BuilderCall::Overlays(name.to_string()));
        let flat = region.flat_name();
        if self.failing_overlays.contains(name.as_str()) {
            return Err(engine_error("ogr2ogr", Utf8PathBuf::from(format!("{flat}.osm"))));
        }
        Ok(StagedOverlays {
            bounds: BoundingBox::WORLD,
            sea: Utf8PathBuf::from(format!("{flat}-sea.osm")),
            land: Utf8PathBuf::from(format!("{flat}.osm")),
        })
    }

    fn build_map(&self, request: &MapRequest<'_>) -> Result<MapArtefact, BuildError> {
        let name = request.region.hierarchical_name();
        self.record(BuilderCall::Map {
            region: name.to_string(),
            source: request.source.to_path_buf(),
            area_filter: request.area_filter,
        });
        let map = Utf8PathBuf::from(format!("{name}.map"));
        if self.failing_maps.contains(name.as_str()) {
            return Err(engine_error("osmosis", map));
        }
        if self.staging_only {
            return Ok(MapArtefact::Staged(map));
        }
        Ok(MapArtefact::Published(map))
    }

    fn discard_subset(&self, subset: &Utf8Path) -> Result<bool, BuildError> {
        self.record(BuilderCall::Discard(subset.to_path_buf()));
        if self.failing_discard {
            return Err(BuildError::staging(
                subset,
                io::Error::new(io::ErrorKind::PermissionDenied, "read-only staging"),
            ));
        }
        Ok(true)
    }
}

/// Event captured by [`RecordingReporter`], keyed by hierarchical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    /// Region evaluation started.
    Started(String),
    /// A step failed.
    Failed(String, Stage),
    /// A map was published.
    Published(String),
    /// A map was left in staging.
    Staged(String),
    /// A subset was removed.
    SubsetRemoved(String),
    /// A subset was retained.
    SubsetRetained(String),
}

/// `BuildReporter` collecting events in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: RefCell<Vec<ReportEvent>>,
}

impl RecordingReporter {
    /// All events, in order.
    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.borrow().clone()
    }

    /// Hierarchical names of regions in the order they were started.
    pub fn started(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                ReportEvent::Started(name) => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ReportEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl BuildReporter for RecordingReporter {
    fn region_started(&self, region: &RegionJob<'_>) {
        self.push(ReportEvent::Started(region.hierarchical_name().to_string()));
    }

    fn region_failed(&self, region: &RegionJob<'_>, stage: Stage, _error: &BuildError) {
        self.push(ReportEvent::Failed(
            region.hierarchical_name().to_string(),
            stage,
        ));
    }

    fn map_published(&self, region: &RegionJob<'_>, _artefact: &Utf8Path) {
        self.push(ReportEvent::Published(
            region.hierarchical_name().to_string(),
        ));
    }

    fn map_staged(&self, region: &RegionJob<'_>, _artefact: &Utf8Path) {
        self.push(ReportEvent::Staged(region.hierarchical_name().to_string()));
    }

    fn subset_removed(&self, region: &RegionJob<'_>, _subset: &Utf8Path) {
        self.push(ReportEvent::SubsetRemoved(
            region.hierarchical_name().to_string(),
        ));
    }

    fn subset_retained(&self, region: &RegionJob<'_>, _subset: &Utf8Path) {
        self.push(ReportEvent::SubsetRetained(
            region.hierarchical_name().to_string(),
        ));
    }
}
