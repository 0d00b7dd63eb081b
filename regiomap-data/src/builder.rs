//! [`RegionBuilder`] backed by Osmosis, the land clipping tools and the
//! local filesystem.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use regiomap_core::{
    BuildError, DEFAULT_BBOX_BUFFER, MapArtefact, MapRequest, PolygonDefect, RegionBuilder, RegionJob,
    SourceDefect, StagedOverlays, derive_bounding_box, parse_poly,
};

use crate::layout::{BuildLayout, LogKind, Toolchain};
use crate::osmosis::{MapWriterArgs, subset_args};
use crate::overlay::{LandOverlayStager, write_sea_overlay};
use crate::process::{CommandRunner, Invocation, execute, require_output};

/// Builds subsets and maps by invoking external tools through `R`.
///
/// In dry-run mode no tool is started: outputs are replaced by empty
/// placeholders, source checks are skipped and maps are not published.
#[derive(Debug)]
pub struct OsmosisBuilder<R> {
    layout: BuildLayout,
    toolchain: Toolchain,
    runner: R,
    dry_run: bool,
}

impl<R: CommandRunner> OsmosisBuilder<R> {
    /// Create a builder writing below `layout`.
    pub const fn new(layout: BuildLayout, toolchain: Toolchain, runner: R) -> Self {
        Self {
            layout,
            toolchain,
            runner,
            dry_run: false,
        }
    }

    /// Enable or disable dry-run mode.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The command runner.
    pub const fn runner(&self) -> &R {
        &self.runner
    }

    fn check_source(&self, source: &Utf8Path, artefact: &Utf8Path) -> Result<(), BuildError> {
        if self.dry_run {
            return Ok(());
        }
        let input = self.layout.source_path(source);
        let len = regiomap_fs::file_len(&input)
            .map_err(|err| BuildError::staging(&input, err))?;
        let defect = match len {
            None => SourceDefect::Missing,
            Some(0) => SourceDefect::Empty,
            Some(_) => return Ok(()),
        };
        Err(BuildError::SourceMissingOrEmpty {
            artefact: artefact.to_path_buf(),
            input,
            defect,
        })
    }

    fn existing_polygon(
        &self,
        region: &RegionJob<'_>,
        artefact: &Utf8Path,
    ) -> Result<Utf8PathBuf, BuildError> {
        let polygon = self.layout.polygon_path(region);
        let exists = regiomap_fs::file_is_file(&polygon)
            .map_err(|err| BuildError::staging(&polygon, err))?;
        if exists {
            Ok(polygon)
        } else {
            Err(BuildError::PolygonMissing {
                artefact: artefact.to_path_buf(),
                polygon,
            })
        }
    }

    fn run(&self, invocation: &Invocation, artefact: &Utf8Path) -> Result<(), BuildError> {
        execute(&self.runner, invocation, self.dry_run, artefact)?;
        if self.dry_run {
            Ok(())
        } else {
            require_output(invocation, artefact)
        }
    }
}

impl<R: CommandRunner> RegionBuilder for OsmosisBuilder<R> {
    fn build_subset(&self, region: &RegionJob<'_>) -> Result<Utf8PathBuf, BuildError> {
        let relative = self.layout.subset_relative(region);
        let target = self.layout.source_path(&relative);
        if regiomap_fs::file_is_file(&target).map_err(|err| BuildError::staging(&target, err))? {
            info!("the pbf file {relative} already exists, using the existing one");
            return Ok(relative);
        }

        let source = region.context().source();
        self.check_source(source, &relative)?;
        let polygon = self.existing_polygon(region, &relative)?;
        regiomap_fs::ensure_parent_dir(&target).map_err(|err| BuildError::staging(&target, err))?;

        let invocation = Invocation::new(
            &self.toolchain.osmosis,
            self.layout.log_path(region, LogKind::Subset),
            &target,
        )
        .args(subset_args(&self.layout.source_path(source), &polygon, &target));
        self.run(&invocation, &relative)?;
        Ok(relative)
    }

    fn stage_overlays(&self, region: &RegionJob<'_>) -> Result<StagedOverlays, BuildError> {
        let polygon = self.layout.polygon_path(region);
        let text = regiomap_fs::read_to_string(&polygon).map_err(|err| {
            if err.kind() == io::ErrorKind::NotFound {
                BuildError::PolygonMissing {
                    artefact: self.layout.map_relative(region),
                    polygon: polygon.clone(),
                }
            } else {
                BuildError::staging(&polygon, err)
            }
        })?;
        let malformed = |defect: PolygonDefect| BuildError::MalformedPolygonFile {
            path: polygon.clone(),
            defect,
        };
        let shape = parse_poly(text.lines()).map_err(|err| malformed(err.into()))?;
        let bounds =
            derive_bounding_box(&shape, DEFAULT_BBOX_BUFFER).map_err(|err| malformed(err.into()))?;

        info!("making sea polygon for {}", region.hierarchical_name());
        let sea = self.layout.sea_overlay(region);
        write_sea_overlay(&sea, &bounds)?;

        let land = LandOverlayStager::new(&self.layout, &self.toolchain, &self.runner, self.dry_run)
            .stage(region, &bounds, region.context().simplification())?;
        Ok(StagedOverlays { bounds, sea, land })
    }

    fn build_map(&self, request: &MapRequest<'_>) -> Result<MapArtefact, BuildError> {
        let region = &request.region;
        let node = region.node();
        let relative = self.layout.map_relative(region);
        self.check_source(request.source, &relative)?;
        let polygon = if request.area_filter {
            Some(self.existing_polygon(region, &relative)?)
        } else {
            None
        };

        let staged = self.layout.staged_map(region);
        regiomap_fs::ensure_parent_dir(&staged).map_err(|err| BuildError::staging(&staged, err))?;
        let source = self.layout.source_path(request.source);
        let args = MapWriterArgs {
            source: &source,
            polygon: polygon.as_deref(),
            sea: &request.overlays.sea,
            land: &request.overlays.land,
            map: &staged,
            zoom_interval_conf: region.context().zoom_interval_conf(),
            storage_type: node.storage_type(),
            start_zoom: node.start_zoom(),
            preferred_languages: node.preferred_languages(),
            bounds: request.overlays.bounds,
            start_position: node.start_position(),
        };
        let invocation = Invocation::new(
            &self.toolchain.osmosis,
            self.layout.log_path(region, LogKind::Map),
            &staged,
        )
        .args(args.to_args());
        self.run(&invocation, &relative)?;

        let published = self.layout.published_map(region);
        if self.dry_run {
            debug!("dry run, not moving {staged} to {published}");
            return Ok(MapArtefact::Staged(staged));
        }
        debug!("moving {staged} to {published}");
        regiomap_fs::relocate_file(&staged, &published).map_err(|source| {
            BuildError::Relocation {
                from: staged.clone(),
                to: published.clone(),
                source,
            }
        })?;
        Ok(MapArtefact::Published(published))
    }

    fn discard_subset(&self, subset: &Utf8Path) -> Result<bool, BuildError> {
        let path = self.layout.source_path(subset);
        regiomap_fs::remove_file(&path).map_err(|err| BuildError::staging(&path, err))
    }
}
