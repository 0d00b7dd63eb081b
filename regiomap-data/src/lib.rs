//! Process and filesystem side of the regiomap build pipeline.
//!
//! Responsibilities:
//! - Construct Osmosis, clipping and conversion command lines.
//! - Write synthetic sea overlays, unpack land polygons and stage land overlays.
//! - Implement [`regiomap_core::RegionBuilder`] on top of a [`CommandRunner`].
//!
//! Boundaries:
//! - Traversal and failure policy live in `regiomap-core`.
//! - External tools are only reached through [`CommandRunner`].

#![forbid(unsafe_code)]

pub mod builder;
pub mod layout;
pub mod osmosis;
pub mod overlay;
pub mod process;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use builder::OsmosisBuilder;
pub use layout::{BuildLayout, LogKind, Toolchain};
pub use overlay::{LandOverlayStager, render_sea_overlay, unpack_land_archive, write_sea_overlay};
pub use process::{CommandRunner, Invocation, SystemRunner};
