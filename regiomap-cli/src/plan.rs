//! Build plans: filesystem roots, tool locations, defaults and the region
//! tree, read from a JSON document.

use camino::{Utf8Path, Utf8PathBuf};
use regiomap_core::{
    BuildContext, DEFAULT_PREFERRED_LANGUAGES, DEFAULT_START_ZOOM, RegionDefaults, RegionNode,
    RegionSpec, resolve_regions,
};
use regiomap_data::{BuildLayout, Toolchain};
use serde::Deserialize;

use crate::CliError;

/// Plan document as written on disk.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Plan {
    /// Source PBF for the top-level regions, relative to `pbf_staging_path`
    /// unless absolute.
    pub(crate) initial_source_pbf: Utf8PathBuf,
    pub(crate) pbf_staging_path: Utf8PathBuf,
    pub(crate) map_staging_path: Utf8PathBuf,
    pub(crate) polygons_path: Utf8PathBuf,
    pub(crate) map_target_path: Utf8PathBuf,
    pub(crate) logging_path: Utf8PathBuf,
    /// Land polygon shapefile; defaults to the split archive below the PBF
    /// staging root.
    #[serde(default)]
    pub(crate) land_polygons: Option<Utf8PathBuf>,
    #[serde(default = "default_osmosis")]
    pub(crate) osmosis_path: Utf8PathBuf,
    #[serde(default = "default_ogr2ogr")]
    pub(crate) ogr2ogr_path: Utf8PathBuf,
    #[serde(default = "default_converter")]
    pub(crate) converter_path: Utf8PathBuf,
    #[serde(default = "default_start_zoom")]
    pub(crate) default_start_zoom: u8,
    #[serde(default = "default_preferred_languages")]
    pub(crate) default_preferred_languages: String,
    /// Douglas-Peucker tolerance in degrees applied while clipping land
    /// polygons; zero disables simplification.
    #[serde(default)]
    pub(crate) land_simplification: f64,
    #[serde(default)]
    pub(crate) zoom_interval_conf: Option<String>,
    #[serde(default)]
    pub(crate) regions: Vec<RegionSpec>,
}

fn default_osmosis() -> Utf8PathBuf {
    Toolchain::default().osmosis
}

fn default_ogr2ogr() -> Utf8PathBuf {
    Toolchain::default().ogr2ogr
}

fn default_converter() -> Utf8PathBuf {
    Toolchain::default().converter
}

const fn default_start_zoom() -> u8 {
    DEFAULT_START_ZOOM
}

fn default_preferred_languages() -> String {
    DEFAULT_PREFERRED_LANGUAGES.to_owned()
}

/// Everything a build needs, with defaults applied and the tree validated.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedPlan {
    pub(crate) layout: BuildLayout,
    pub(crate) toolchain: Toolchain,
    pub(crate) context: BuildContext,
    pub(crate) regions: Vec<RegionNode>,
}

impl Plan {
    /// Read and decode the plan at `path`.
    pub(crate) fn load(path: &Utf8Path) -> Result<Self, CliError> {
        let text = regiomap_fs::read_to_string(path).map_err(|source| CliError::ReadPlan {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CliError::ParsePlan {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Validate the plan loaded from `origin` and resolve region defaults.
    pub(crate) fn resolve(self, origin: &Utf8Path) -> Result<ResolvedPlan, CliError> {
        let tolerance = self.land_simplification;
        if !tolerance.is_finite() || tolerance < 0.0 {
            return Err(CliError::InvalidSimplification { value: tolerance });
        }
        let defaults = RegionDefaults {
            start_zoom: self.default_start_zoom,
            preferred_languages: self.default_preferred_languages,
        };
        let regions =
            resolve_regions(&self.regions, &defaults).map_err(|source| CliError::InvalidRegions {
                path: origin.to_path_buf(),
                source,
            })?;
        let context = BuildContext::root(self.initial_source_pbf)
            .with_zoom_interval_conf(self.zoom_interval_conf)
            .with_simplification(tolerance);
        Ok(ResolvedPlan {
            layout: BuildLayout {
                pbf_staging: self.pbf_staging_path,
                map_staging: self.map_staging_path,
                polygons: self.polygons_path,
                map_target: self.map_target_path,
                logs: self.logging_path,
                land_polygons: self.land_polygons,
            },
            toolchain: Toolchain {
                osmosis: self.osmosis_path,
                ogr2ogr: self.ogr2ogr_path,
                converter: self.converter_path,
            },
            context,
            regions,
        })
    }
}

/// Resolve every tool to an executable file, searching `PATH` for bare names.
pub(crate) fn locate_toolchain(toolchain: &Toolchain) -> Result<Toolchain, CliError> {
    Ok(Toolchain {
        osmosis: locate("osmosis_path", &toolchain.osmosis)?,
        ogr2ogr: locate("ogr2ogr_path", &toolchain.ogr2ogr)?,
        converter: locate("converter_path", &toolchain.converter)?,
    })
}

fn locate(field: &'static str, program: &Utf8Path) -> Result<Utf8PathBuf, CliError> {
    regiomap_fs::resolve_executable(program).ok_or_else(|| CliError::MissingExecutable {
        field,
        program: program.to_path_buf(),
    })
}
