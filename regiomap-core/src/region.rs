//! Region hierarchy model.
//!
//! A plan describes regions as [`RegionSpec`] values where every attribute is
//! optional. [`resolve_regions`] applies the documented defaults once and
//! validates the tree, producing immutable [`RegionNode`] values for the
//! traversal.

use std::{collections::HashSet, fmt};

use thiserror::Error;

/// Start zoom applied when neither the region nor the plan sets one.
pub const DEFAULT_START_ZOOM: u8 = 14;
/// Preferred languages applied when neither the region nor the plan sets them.
pub const DEFAULT_PREFERRED_LANGUAGES: &str = "en";

/// Storage strategy the map writer uses while building an artefact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum StorageType {
    /// Keep intermediate data in memory.
    #[default]
    Ram,
    /// Spill intermediate data to disk.
    Hd,
}

impl StorageType {
    /// Value understood by the map writer's `type=` option.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ram => "ram",
            Self::Hd => "hd",
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Initial map position stored in the artefact header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartPosition {
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

/// Plan-wide values inherited by regions that do not override them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionDefaults {
    /// Start zoom written to each map.
    pub start_zoom: u8,
    /// Comma-separated language preference written to each map.
    pub preferred_languages: String,
}

impl Default for RegionDefaults {
    fn default() -> Self {
        Self {
            start_zoom: DEFAULT_START_ZOOM,
            preferred_languages: DEFAULT_PREFERRED_LANGUAGES.to_owned(),
        }
    }
}

/// Unresolved region description as written in a plan.
///
/// # Examples
///
/// ```
/// use regiomap_core::{RegionDefaults, RegionSpec, resolve_regions};
///
/// # fn main() -> Result<(), regiomap_core::RegionConfigError> {
/// let europe = RegionSpec {
///     creates_data_subset: Some(true),
///     children: vec![RegionSpec::named("greece")],
///     ..RegionSpec::named("europe")
/// };
/// let regions = resolve_regions(&[europe], &RegionDefaults::default())?;
/// assert!(regions[0].creates_data_subset());
/// assert_eq!(regions[0].children()[0].start_zoom(), 14);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct RegionSpec {
    /// Region name, unique among its siblings.
    pub name: String,
    /// Carve a filtered PBF subset for this region (default `false`).
    pub creates_data_subset: Option<bool>,
    /// Build a map artefact for this region (default `true`).
    pub creates_map_artifact: Option<bool>,
    /// Open a new directory level in the published tree (default `true`).
    pub defines_hierarchy_level: Option<bool>,
    /// Map writer storage type (default `ram`).
    pub storage_type: Option<StorageType>,
    /// Start zoom override.
    pub start_zoom: Option<u8>,
    /// Start latitude; must be paired with `start_lon`.
    pub start_lat: Option<f64>,
    /// Start longitude; must be paired with `start_lat`.
    pub start_lon: Option<f64>,
    /// Preferred languages override.
    pub preferred_languages: Option<String>,
    /// Nested regions, processed in declaration order.
    pub children: Vec<RegionSpec>,
}

impl RegionSpec {
    /// Spec with the given name and every attribute left at its default.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    fn resolve_at(&self, parent: &str, defaults: &RegionDefaults) -> Result<RegionNode, RegionConfigError> {
        let path = qualify(parent, &self.name);
        validate_name(parent, &self.name)?;
        let start_position = match (self.start_lat, self.start_lon) {
            (Some(lat), Some(lon)) => {
                if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                    return Err(RegionConfigError::StartPositionOutOfRange { path, lat, lon });
                }
                Some(StartPosition { lat, lon })
            }
            (None, None) => None,
            _ => return Err(RegionConfigError::PartialStartPosition { path }),
        };
        let children = resolve_siblings(&self.children, &path, defaults)?;
        Ok(RegionNode {
            name: self.name.clone(),
            creates_data_subset: self.creates_data_subset.unwrap_or(false),
            creates_map_artifact: self.creates_map_artifact.unwrap_or(true),
            defines_hierarchy_level: self.defines_hierarchy_level.unwrap_or(true),
            storage_type: self.storage_type.unwrap_or_default(),
            start_zoom: self.start_zoom.unwrap_or(defaults.start_zoom),
            start_position,
            preferred_languages: self
                .preferred_languages
                .clone()
                .unwrap_or_else(|| defaults.preferred_languages.clone()),
            children,
        })
    }
}

/// A resolved, immutable region in the build hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct RegionNode {
    name: String,
    creates_data_subset: bool,
    creates_map_artifact: bool,
    defines_hierarchy_level: bool,
    storage_type: StorageType,
    start_zoom: u8,
    start_position: Option<StartPosition>,
    preferred_languages: String,
    children: Vec<RegionNode>,
}

impl RegionNode {
    /// Region name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether a filtered subset is carved for this region.
    #[must_use]
    pub const fn creates_data_subset(&self) -> bool {
        self.creates_data_subset
    }

    /// Whether a map artefact is built for this region.
    #[must_use]
    pub const fn creates_map_artifact(&self) -> bool {
        self.creates_map_artifact
    }

    /// Whether the region opens a new level in the published directory tree.
    #[must_use]
    pub const fn defines_hierarchy_level(&self) -> bool {
        self.defines_hierarchy_level
    }

    /// Storage type handed to the map writer.
    #[must_use]
    pub const fn storage_type(&self) -> StorageType {
        self.storage_type
    }

    /// Start zoom written to the map header.
    #[must_use]
    pub const fn start_zoom(&self) -> u8 {
        self.start_zoom
    }

    /// Optional start position written to the map header.
    #[must_use]
    pub const fn start_position(&self) -> Option<StartPosition> {
        self.start_position
    }

    /// Preferred languages written to the map header.
    #[must_use]
    pub fn preferred_languages(&self) -> &str {
        &self.preferred_languages
    }

    /// Child regions in processing order.
    #[must_use]
    pub fn children(&self) -> &[Self] {
        &self.children
    }
}

/// Problems detected while resolving a region tree.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionConfigError {
    /// A region has no name.
    #[error("region below {parent:?} has an empty name")]
    EmptyName {
        /// Hierarchical name of the parent, empty at the top level.
        parent: String,
    },
    /// A region name contains a path separator.
    #[error("region name {name:?} below {parent:?} must not contain '/'")]
    InvalidName {
        /// Hierarchical name of the parent.
        parent: String,
        /// The rejected name.
        name: String,
    },
    /// Two siblings share a name and would collide on disk.
    #[error("region {path:?} is declared more than once")]
    DuplicateSibling {
        /// Hierarchical name of the duplicate.
        path: String,
    },
    /// Only one of `start_lat` and `start_lon` was given.
    #[error("region {path:?} must set start_lat and start_lon together")]
    PartialStartPosition {
        /// Hierarchical name of the region.
        path: String,
    },
    /// The start position lies outside the world extent.
    #[error("region {path:?} start position ({lat}, {lon}) is outside the world extent")]
    StartPositionOutOfRange {
        /// Hierarchical name of the region.
        path: String,
        /// Configured latitude.
        lat: f64,
        /// Configured longitude.
        lon: f64,
    },
}

/// Resolve top-level region specs against the plan defaults.
pub fn resolve_regions(
    specs: &[RegionSpec],
    defaults: &RegionDefaults,
) -> Result<Vec<RegionNode>, RegionConfigError> {
    resolve_siblings(specs, "", defaults)
}

fn resolve_siblings(
    specs: &[RegionSpec],
    parent: &str,
    defaults: &RegionDefaults,
) -> Result<Vec<RegionNode>, RegionConfigError> {
    let mut seen = HashSet::new();
    specs
        .iter()
        .map(|spec| {
            if !seen.insert(spec.name.as_str()) {
                return Err(RegionConfigError::DuplicateSibling {
                    path: qualify(parent, &spec.name),
                });
            }
            spec.resolve_at(parent, defaults)
        })
        .collect()
}

fn validate_name(parent: &str, name: &str) -> Result<(), RegionConfigError> {
    if name.trim().is_empty() {
        return Err(RegionConfigError::EmptyName {
            parent: parent.to_owned(),
        });
    }
    if name.contains('/') {
        return Err(RegionConfigError::InvalidName {
            parent: parent.to_owned(),
            name: name.to_owned(),
        });
    }
    Ok(())
}

fn qualify(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_owned()
    } else {
        format!("{parent}/{name}")
    }
}
