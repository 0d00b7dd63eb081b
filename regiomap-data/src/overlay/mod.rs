//! Sea and land overlays merged into every map.

mod land;
mod sea;

pub use land::{LandOverlayStager, unpack_land_archive};
pub use sea::{SEA_TIMESTAMP, render_sea_overlay, write_sea_overlay};
