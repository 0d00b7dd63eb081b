//! Directory roots and external tools used by a build.
//!
//! Every intermediate path is derived from a region's hierarchical name so
//! that sibling and nested regions never share a file.

use camino::{Utf8Path, Utf8PathBuf};
use regiomap_core::RegionJob;

/// Directory of the land polygon archive expected under the PBF staging root.
///
/// The zipped archive, when present, sits next to it with a `.zip` suffix.
pub const LAND_POLYGON_ARCHIVE: &str = "land-polygons-split-4326";

/// Shapefile name produced by the land polygon archive and by clipping.
pub const LAND_POLYGON_SHAPEFILE: &str = "land_polygons.shp";

/// Roots for staged, published and diagnostic files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    /// Holds the source PBF, carved subsets and overlays.
    pub pbf_staging: Utf8PathBuf,
    /// Holds maps while they are being written.
    pub map_staging: Utf8PathBuf,
    /// Holds the `.poly` boundary files, mirroring the region hierarchy.
    pub polygons: Utf8PathBuf,
    /// Publication root for finished maps.
    pub map_target: Utf8PathBuf,
    /// Per-call logs of external tools.
    pub logs: Utf8PathBuf,
    /// Land polygon shapefile, defaulting to the archive under `pbf_staging`.
    pub land_polygons: Option<Utf8PathBuf>,
}

/// Log file suffix per kind of external call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogKind {
    /// Subset carving.
    Subset,
    /// Map writing.
    Map,
    /// Land overlay staging.
    Land,
}

impl LogKind {
    const fn extension(self) -> &'static str {
        match self {
            Self::Subset => "pbf.log",
            Self::Map => "map.log",
            Self::Land => "land.log",
        }
    }
}

impl BuildLayout {
    /// Land polygon shapefile clipped for every region.
    #[must_use]
    pub fn land_polygons(&self) -> Utf8PathBuf {
        self.land_polygons.clone().unwrap_or_else(|| {
            self.pbf_staging
                .join(LAND_POLYGON_ARCHIVE)
                .join(LAND_POLYGON_SHAPEFILE)
        })
    }

    /// Zipped land polygon archive unpacked at startup.
    #[must_use]
    pub fn land_archive(&self) -> Utf8PathBuf {
        self.pbf_staging.join(format!("{LAND_POLYGON_ARCHIVE}.zip"))
    }

    /// Absolute location of a source PBF given relative to the staging root.
    #[must_use]
    pub fn source_path(&self, source: &Utf8Path) -> Utf8PathBuf {
        self.pbf_staging.join(source)
    }

    /// Subset of `region`, relative to the PBF staging root.
    #[must_use]
    pub fn subset_relative(&self, region: &RegionJob<'_>) -> Utf8PathBuf {
        with_suffix(region.hierarchical_name(), "osm.pbf")
    }

    /// Boundary file of `region`.
    #[must_use]
    pub fn polygon_path(&self, region: &RegionJob<'_>) -> Utf8PathBuf {
        self.polygons
            .join(with_suffix(region.hierarchical_name(), "poly"))
    }

    /// Map of `region`, relative to the staging root.
    #[must_use]
    pub fn map_relative(&self, region: &RegionJob<'_>) -> Utf8PathBuf {
        with_suffix(region.hierarchical_name(), "map")
    }

    /// Location the map of `region` is written to.
    #[must_use]
    pub fn staged_map(&self, region: &RegionJob<'_>) -> Utf8PathBuf {
        self.map_staging.join(self.map_relative(region))
    }

    /// Location the map of `region` is published at.
    #[must_use]
    pub fn published_map(&self, region: &RegionJob<'_>) -> Utf8PathBuf {
        self.map_target
            .join(region.context().target_prefix())
            .join(format!("{}.map", region.name()))
    }

    /// Diagnostics log for one kind of external call on `region`.
    #[must_use]
    pub fn log_path(&self, region: &RegionJob<'_>, kind: LogKind) -> Utf8PathBuf {
        self.logs
            .join(with_suffix(region.hierarchical_name(), kind.extension()))
    }

    /// Sea overlay of `region`.
    #[must_use]
    pub fn sea_overlay(&self, region: &RegionJob<'_>) -> Utf8PathBuf {
        self.pbf_staging
            .join(format!("{}-sea.osm", region.flat_name()))
    }

    /// Directory receiving the clipped land polygons of `region`.
    #[must_use]
    pub fn land_clip_dir(&self, region: &RegionJob<'_>) -> Utf8PathBuf {
        self.pbf_staging.join(region.flat_name())
    }

    /// Land overlay of `region`, the first file written by the converter.
    #[must_use]
    pub fn land_overlay(&self, region: &RegionJob<'_>) -> Utf8PathBuf {
        self.pbf_staging.join(format!("{}.osm", region.flat_name()))
    }
}

fn with_suffix(path: Utf8PathBuf, suffix: &str) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{path}.{suffix}"))
}

/// External executables invoked during a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    /// Geodata engine with the map writer plugin.
    pub osmosis: Utf8PathBuf,
    /// Shapefile clipping engine.
    pub ogr2ogr: Utf8PathBuf,
    /// Shapefile to overlay converter.
    pub converter: Utf8PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            osmosis: Utf8PathBuf::from("osmosis"),
            ogr2ogr: Utf8PathBuf::from("ogr2ogr"),
            converter: Utf8PathBuf::from("shape2osm"),
        }
    }
}
