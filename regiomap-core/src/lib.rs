//! Core domain types for the regiomap build pipeline.
//!
//! The crate models the region hierarchy, parses polygon filter files,
//! derives clamped bounding boxes and drives the depth-first traversal that
//! decides which subsets and map artefacts each region needs. External tools
//! live behind the [`RegionBuilder`] trait so the traversal stays free of I/O.
//!
//! Invariants:
//! - Region trees are immutable once resolved.
//! - Failures are scoped to the region that produced them; the traversal
//!   never aborts a run.

#![forbid(unsafe_code)]

pub mod bbox;
pub mod context;
pub mod error;
pub mod polygon;
pub mod region;
pub mod traversal;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use bbox::{BoundingBox, BoundingBoxError, DEFAULT_BBOX_BUFFER, derive_bounding_box};
pub use context::{BuildContext, RegionJob};
pub use error::{BuildError, EngineFailure, PolygonDefect, SourceDefect};
pub use polygon::{PolygonParseError, PolygonPart, RegionPolygon, parse_poly};
pub use region::{
    DEFAULT_PREFERRED_LANGUAGES, DEFAULT_START_ZOOM, RegionConfigError, RegionDefaults,
    RegionNode, RegionSpec, StartPosition, StorageType, resolve_regions,
};
pub use traversal::{
    BuildOutcome, BuildReporter, LogReporter, MapArtefact, MapRequest, RegionBuilder, Stage,
    StagedOverlays, process_subtree,
};
