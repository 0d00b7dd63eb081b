//! Synthetic open-sea overlay covering a region's bounding rectangle.
//!
//! The map writer renders land on top of a sea polygon, so every map carries
//! one closed way spanning its bounds. Ids are fixed and far above real OSM
//! ids; each overlay is merged into a single map, so they never collide.

use camino::Utf8Path;
use regiomap_core::{BoundingBox, BuildError};

/// Sentinel timestamp stamped on every synthetic element.
pub const SEA_TIMESTAMP: &str = "1969-12-31T23:59:59Z";

const FIRST_NODE_ID: u64 = 32_951_459_320;
const WAY_ID: u64 = 32_951_623_372;
const SEA_TAGS: [(&str, &str); 3] = [("area", "yes"), ("layer", "-5"), ("natural", "sea")];

/// Render an OSM 0.6 document holding one sea polygon spanning `bbox`.
///
/// Corners run south-west, north-west, north-east, south-east and the way
/// returns to its first node.
#[must_use]
pub fn render_sea_overlay(bbox: &BoundingBox) -> String {
    let corners = [
        (bbox.lon_min, bbox.lat_min),
        (bbox.lon_min, bbox.lat_max),
        (bbox.lon_max, bbox.lat_max),
        (bbox.lon_max, bbox.lat_min),
    ];
    let mut xml = String::from("<?xml version='1.0' encoding='UTF-8'?>\n<osm version='0.6'>\n");
    for (id, (lon, lat)) in (FIRST_NODE_ID..).zip(corners) {
        xml.push_str(&format!(
            "  <node timestamp='{SEA_TIMESTAMP}' changeset='-1' id='{id}' version='1' lon='{lon}' lat='{lat}' />\n"
        ));
    }
    xml.push_str(&format!(
        "  <way timestamp='{SEA_TIMESTAMP}' changeset='-1' id='{WAY_ID}' version='1'>\n"
    ));
    let ring = (FIRST_NODE_ID..FIRST_NODE_ID + 4).chain(std::iter::once(FIRST_NODE_ID));
    for id in ring {
        xml.push_str(&format!("    <nd ref='{id}' />\n"));
    }
    for (key, value) in SEA_TAGS {
        xml.push_str(&format!("    <tag k='{key}' v='{value}' />\n"));
    }
    xml.push_str("  </way>\n</osm>\n");
    xml
}

/// Write the sea overlay for `bbox` to `path`, replacing any previous file.
pub fn write_sea_overlay(path: &Utf8Path, bbox: &BoundingBox) -> Result<(), BuildError> {
    regiomap_fs::write_file(path, &render_sea_overlay(bbox))
        .map_err(|source| BuildError::staging(path, source))
}
