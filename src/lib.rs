//! Facade crate for the regiomap build pipeline.
//!
//! This crate re-exports the core domain types together with the
//! Osmosis-backed builder that drives external tools.

#![forbid(unsafe_code)]

pub use regiomap_core::{
    BoundingBox, BuildContext, BuildError, BuildOutcome, BuildReporter, EngineFailure,
    LogReporter, MapArtefact, RegionBuilder, RegionConfigError, RegionDefaults, RegionNode,
    RegionPolygon, RegionSpec, derive_bounding_box, parse_poly, process_subtree, resolve_regions,
};

pub use regiomap_data::{
    BuildLayout, CommandRunner, OsmosisBuilder, SystemRunner, Toolchain, unpack_land_archive,
};
