//! Osmosis command lines for subset carving and map writing.

use camino::Utf8Path;
use regiomap_core::{BoundingBox, StartPosition, StorageType};

const POLYGON_FILTER_OPTIONS: [&str; 3] = [
    "completeWays=yes",
    "completeRelations=yes",
    "clipIncompleteEntities=false",
];

fn read_pbf(source: &Utf8Path) -> [String; 2] {
    ["--rb".to_owned(), source.to_string()]
}

fn polygon_filter(polygon: &Utf8Path) -> impl Iterator<Item = String> {
    std::iter::once("--bp".to_owned())
        .chain(POLYGON_FILTER_OPTIONS.iter().map(|option| (*option).to_owned()))
        .chain(std::iter::once(format!("file={polygon}")))
}

fn merge_overlay(overlay: &Utf8Path) -> [String; 4] {
    [
        "--rx".to_owned(),
        format!("file={overlay}"),
        "--sort".to_owned(),
        "--merge".to_owned(),
    ]
}

/// Arguments carving the subset of `source` inside `polygon` into `target`.
#[must_use]
pub fn subset_args(source: &Utf8Path, polygon: &Utf8Path, target: &Utf8Path) -> Vec<String> {
    let mut args: Vec<String> = read_pbf(source).into();
    args.extend(polygon_filter(polygon));
    args.extend([
        "--wb".to_owned(),
        "omitmetadata=false".to_owned(),
        "compress=deflate".to_owned(),
        format!("file={target}"),
    ]);
    args
}

/// Everything the map writer needs for one region.
#[derive(Debug, Clone, Copy)]
pub struct MapWriterArgs<'a> {
    /// Source PBF.
    pub source: &'a Utf8Path,
    /// Boundary filter, when the source must be clipped.
    pub polygon: Option<&'a Utf8Path>,
    /// Sea overlay document.
    pub sea: &'a Utf8Path,
    /// Land overlay document.
    pub land: &'a Utf8Path,
    /// Map file to write.
    pub map: &'a Utf8Path,
    /// Zoom interval configuration, omitted when absent.
    pub zoom_interval_conf: Option<&'a str>,
    /// Map writer storage.
    pub storage_type: StorageType,
    /// Initial zoom level.
    pub start_zoom: u8,
    /// Comma-separated language preference.
    pub preferred_languages: &'a str,
    /// Map bounds.
    pub bounds: BoundingBox,
    /// Initial map centre.
    pub start_position: Option<StartPosition>,
}

impl MapWriterArgs<'_> {
    /// Render the full argument list.
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = read_pbf(self.source).into();
        if let Some(polygon) = self.polygon {
            args.extend(polygon_filter(polygon));
        }
        args.extend(merge_overlay(self.sea));
        args.extend(merge_overlay(self.land));
        args.push("--mw".to_owned());
        args.push(format!("file={}", self.map));
        if let Some(conf) = self.zoom_interval_conf {
            args.push(format!("zoom-interval-conf={conf}"));
        }
        args.push(format!("type={}", self.storage_type));
        args.push(format!("map-start-zoom={}", self.start_zoom));
        args.push(format!("preferred-languages={}", self.preferred_languages));
        let BoundingBox {
            lon_min,
            lat_min,
            lon_max,
            lat_max,
        } = self.bounds;
        args.push(format!("bbox={lat_min},{lon_min},{lat_max},{lon_max}"));
        if let Some(StartPosition { lat, lon }) = self.start_position {
            args.push(format!("map-start-position={lat:.8},{lon:.8}"));
        }
        args
    }
}
