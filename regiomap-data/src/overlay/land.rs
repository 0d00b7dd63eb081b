//! Land overlay staging: clip the land polygons to a region, then convert the
//! clipped shapefile into an overlay document.
//!
//! The land polygons themselves may arrive zipped; [`unpack_land_archive`]
//! expands them once per run before any region is clipped.

use camino::Utf8PathBuf;
use log::{debug, info};
use regiomap_core::{BoundingBox, BuildError, RegionJob};
use zip::{ZipArchive, result::ZipResult};

use crate::layout::{BuildLayout, LAND_POLYGON_SHAPEFILE, LogKind, Toolchain};
use crate::process::{CommandRunner, Invocation, execute, require_output};

/// Produces the land overlay for one region at a time.
#[derive(Debug)]
pub struct LandOverlayStager<'a, R: ?Sized> {
    layout: &'a BuildLayout,
    toolchain: &'a Toolchain,
    runner: &'a R,
    dry_run: bool,
}

impl<'a, R: CommandRunner + ?Sized> LandOverlayStager<'a, R> {
    /// Stage overlays under `layout` using the tools in `toolchain`.
    #[must_use]
    pub const fn new(
        layout: &'a BuildLayout,
        toolchain: &'a Toolchain,
        runner: &'a R,
        dry_run: bool,
    ) -> Self {
        Self {
            layout,
            toolchain,
            runner,
            dry_run,
        }
    }

    /// Clip the land polygons to `bbox` and convert them, returning the
    /// overlay path. A positive `simplification` tolerance simplifies the
    /// clipped polygons.
    ///
    /// Only the first file written by the converter is returned; additional
    /// shards are not merged into maps.
    pub fn stage(
        &self,
        region: &RegionJob<'_>,
        bbox: &BoundingBox,
        simplification: f64,
    ) -> Result<Utf8PathBuf, BuildError> {
        info!("extracting land polygons for {}", region.hierarchical_name());
        let overlay = self.layout.land_overlay(region);
        let log = self.layout.log_path(region, LogKind::Land);
        let clip_dir = self.layout.land_clip_dir(region);
        let clipped = clip_dir.join(LAND_POLYGON_SHAPEFILE);

        let clip = Invocation::new(&self.toolchain.ogr2ogr, &log, &clipped)
            .args(clip_args(bbox, simplification))
            .args([clip_dir.to_string(), self.layout.land_polygons().to_string()]);
        execute(self.runner, &clip, self.dry_run, &overlay)?;

        let convert = Invocation::new(&self.toolchain.converter, &log, &overlay)
            .args(["-o".to_owned(), clip_dir.to_string(), clipped.to_string()]);
        execute(self.runner, &convert, self.dry_run, &overlay)?;
        if !self.dry_run {
            require_output(&convert, &overlay)?;
        }
        Ok(overlay)
    }
}

/// Unpack the land polygon archive into the PBF staging root.
///
/// Returns `false` when no archive is present, in which case polygons
/// unpacked by an earlier run are used as they are. Existing files are
/// overwritten.
///
/// # Errors
///
/// Fails when the archive cannot be read or an entry cannot be written.
pub fn unpack_land_archive(layout: &BuildLayout) -> ZipResult<bool> {
    let archive_path = layout.land_archive();
    if !regiomap_fs::file_is_file(&archive_path)? {
        debug!("no land polygon archive at {archive_path}, keeping existing polygons");
        return Ok(false);
    }
    info!("retrieving new land files from {archive_path}");
    let mut archive = ZipArchive::new(regiomap_fs::open_read(&archive_path)?)?;
    regiomap_fs::ensure_dir(&layout.pbf_staging)?;
    archive.extract(layout.pbf_staging.as_std_path())?;
    info!("retrieved {} land archive entries", archive.len());
    Ok(true)
}

fn clip_args(bbox: &BoundingBox, simplification: f64) -> Vec<String> {
    let mut args = vec!["-overwrite".to_owned(), "-skipfailures".to_owned()];
    if simplification > 0.0 {
        args.push("-simplify".to_owned());
        args.push(simplification.to_string());
    }
    args.push("-clipsrc".to_owned());
    args.extend(
        [bbox.lon_min, bbox.lat_min, bbox.lon_max, bbox.lat_max]
            .iter()
            .map(ToString::to_string),
    );
    args
}
