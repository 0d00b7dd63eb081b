//! Bounding boxes derived from region polygons.
//!
//! The outer rings are buffered, intersected with the world rectangle and
//! reduced to their axis-aligned bounds. Holes never move the outer bounds
//! and are ignored. The result never leaves `[-180, 180] × [-90, 90]`;
//! regions crossing the antimeridian are not wrapped.
//!
//! Ring validity is left to the geometry library. When buffering yields
//! nothing, as it does for self-intersecting or zero-area rings, the raw
//! bounds grown by the buffer distance are used instead.

use geo::{
    Area, BooleanOps, BoundingRect, Buffer, Coord, LineString, MultiPolygon, Polygon, Rect,
    orient::{Direction, Orient},
};
use thiserror::Error;

use crate::RegionPolygon;

/// Buffer in decimal degrees applied around region polygons.
pub const DEFAULT_BBOX_BUFFER: f64 = 0.1;

const LON_LIMIT: f64 = 180.0;
const LAT_LIMIT: f64 = 90.0;

/// Axis-aligned bounds in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Western edge.
    pub lon_min: f64,
    /// Southern edge.
    pub lat_min: f64,
    /// Eastern edge.
    pub lon_max: f64,
    /// Northern edge.
    pub lat_max: f64,
}

impl BoundingBox {
    /// The whole world.
    pub const WORLD: Self = Self {
        lon_min: -LON_LIMIT,
        lat_min: -LAT_LIMIT,
        lon_max: LON_LIMIT,
        lat_max: LAT_LIMIT,
    };

    /// Whether `other` lies within `self`, edges included.
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.lon_min <= other.lon_min
            && self.lat_min <= other.lat_min
            && self.lon_max >= other.lon_max
            && self.lat_max >= other.lat_max
    }

    /// Whether `other` lies within `self` without touching any edge.
    #[must_use]
    pub fn strictly_contains(&self, other: &Self) -> bool {
        self.lon_min < other.lon_min
            && self.lat_min < other.lat_min
            && self.lon_max > other.lon_max
            && self.lat_max > other.lat_max
    }

    #[expect(
        clippy::float_arithmetic,
        reason = "growing bounds offsets each edge by a distance"
    )]
    fn grown(self, distance: f64) -> Self {
        Self {
            lon_min: self.lon_min - distance,
            lat_min: self.lat_min - distance,
            lon_max: self.lon_max + distance,
            lat_max: self.lat_max + distance,
        }
    }

    fn overlaps_world(&self) -> bool {
        self.lon_min <= LON_LIMIT
            && self.lon_max >= -LON_LIMIT
            && self.lat_min <= LAT_LIMIT
            && self.lat_max >= -LAT_LIMIT
    }

    fn clamped(self) -> Self {
        Self {
            lon_min: self.lon_min.clamp(-LON_LIMIT, LON_LIMIT),
            lat_min: self.lat_min.clamp(-LAT_LIMIT, LAT_LIMIT),
            lon_max: self.lon_max.clamp(-LON_LIMIT, LON_LIMIT),
            lat_max: self.lat_max.clamp(-LAT_LIMIT, LAT_LIMIT),
        }
    }
}

impl From<Rect<f64>> for BoundingBox {
    fn from(rect: Rect<f64>) -> Self {
        let min = rect.min();
        let max = rect.max();
        Self {
            lon_min: min.x,
            lat_min: min.y,
            lon_max: max.x,
            lat_max: max.y,
        }
    }
}

impl From<BoundingBox> for Rect<f64> {
    fn from(bbox: BoundingBox) -> Self {
        Self::new(
            Coord {
                x: bbox.lon_min,
                y: bbox.lat_min,
            },
            Coord {
                x: bbox.lon_max,
                y: bbox.lat_max,
            },
        )
    }
}

/// Reasons a bounding box cannot be derived.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BoundingBoxError {
    /// The buffer distance is negative or not a number.
    #[error("buffer must be a finite, non-negative number of degrees, got {0}")]
    InvalidBuffer(f64),
    /// Nothing of the buffered polygon lies inside the world extent.
    #[error("polygon does not overlap the world extent")]
    Empty,
    /// A part's outer ring has fewer than three distinct vertices.
    #[error("part {part} has {vertices} distinct vertices, at least 3 are needed")]
    Degenerate {
        /// Zero-based index of the offending part.
        part: usize,
        /// Number of distinct vertices in its outer ring.
        vertices: usize,
    },
}

/// Derive the clamped bounding box of `polygon` after buffering by `buffer`
/// degrees.
///
/// # Examples
///
/// ```
/// use regiomap_core::{DEFAULT_BBOX_BUFFER, derive_bounding_box, parse_poly};
///
/// let text = "corner\n1\n175 85\n180 85\n180 90\n175 90\nEND\nEND\n";
/// let polygon = parse_poly(text.lines()).expect("valid polygon");
/// let bbox = derive_bounding_box(&polygon, DEFAULT_BBOX_BUFFER).expect("overlaps world");
/// assert!((bbox.lon_max - 180.0).abs() < 1e-6);
/// assert!((bbox.lat_max - 90.0).abs() < 1e-6);
/// assert!(bbox.lon_min < 175.0);
/// ```
pub fn derive_bounding_box(
    polygon: &RegionPolygon,
    buffer: f64,
) -> Result<BoundingBox, BoundingBoxError> {
    if !buffer.is_finite() || buffer < 0.0 {
        return Err(BoundingBoxError::InvalidBuffer(buffer));
    }
    let shape = outer_shape(polygon)?;
    let raw = BoundingBox::from(shape.bounding_rect().ok_or(BoundingBoxError::Empty)?);
    match buffered(&shape, buffer, &raw) {
        Some(buffered) => clip_to_world(&buffered),
        None => {
            let grown = raw.grown(buffer);
            if grown.overlaps_world() {
                Ok(grown.clamped())
            } else {
                Err(BoundingBoxError::Empty)
            }
        }
    }
}

fn outer_shape(polygon: &RegionPolygon) -> Result<MultiPolygon<f64>, BoundingBoxError> {
    if polygon.parts().is_empty() {
        return Err(BoundingBoxError::Degenerate {
            part: 0,
            vertices: 0,
        });
    }
    polygon
        .parts()
        .iter()
        .enumerate()
        .map(|(part, ring)| {
            let vertices = distinct_vertices(&ring.outer);
            if vertices < 3 {
                return Err(BoundingBoxError::Degenerate { part, vertices });
            }
            Ok(Polygon::new(LineString::new(ring.outer.clone()), Vec::new()))
        })
        .collect::<Result<Vec<_>, _>>()
        .map(|parts| MultiPolygon::new(parts).orient(Direction::Default))
}

fn distinct_vertices(ring: &[Coord<f64>]) -> usize {
    let mut vertices: Vec<(f64, f64)> = ring.iter().map(|coord| (coord.x, coord.y)).collect();
    vertices.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    vertices.dedup();
    vertices.len()
}

/// Buffer `shape`, or `None` when the result no longer covers `raw`.
fn buffered(
    shape: &MultiPolygon<f64>,
    buffer: f64,
    raw: &BoundingBox,
) -> Option<MultiPolygon<f64>> {
    if buffer <= 0.0 {
        return Some(shape.clone());
    }
    if shape.0.iter().any(|part| part.unsigned_area() <= 0.0) {
        return None;
    }
    let grown = shape.buffer(buffer);
    let bounds = BoundingBox::from(grown.bounding_rect()?);
    bounds.strictly_contains(raw).then_some(grown)
}

fn clip_to_world(shape: &MultiPolygon<f64>) -> Result<BoundingBox, BoundingBoxError> {
    let bounds = BoundingBox::from(shape.bounding_rect().ok_or(BoundingBoxError::Empty)?);
    if BoundingBox::WORLD.contains(&bounds) {
        return Ok(bounds);
    }
    let world = MultiPolygon::new(vec![Rect::from(BoundingBox::WORLD).to_polygon()]);
    let rect = shape
        .intersection(&world)
        .bounding_rect()
        .ok_or(BoundingBoxError::Empty)?;
    Ok(BoundingBox::from(rect).clamped())
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    reason = "test deltas require float maths"
)]
mod tests {
    use super::*;
    use crate::{PolygonPart, parse_poly};
    use rstest::rstest;

    fn rectangle(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> RegionPolygon {
        let outer = vec![
            Coord { x: lon_min, y: lat_min },
            Coord { x: lon_max, y: lat_min },
            Coord { x: lon_max, y: lat_max },
            Coord { x: lon_min, y: lat_max },
            Coord { x: lon_min, y: lat_min },
        ];
        RegionPolygon::from_parts(vec![PolygonPart {
            outer,
            holes: Vec::new(),
        }])
    }

    fn assert_within_world(bbox: &BoundingBox) {
        assert!(
            BoundingBox::WORLD.contains(bbox),
            "bbox {bbox:?} escapes the world extent"
        );
    }

    #[rstest]
    fn buffer_grows_interior_polygons() {
        let polygon = rectangle(20.0, 35.0, 28.0, 42.0);
        let bbox = derive_bounding_box(&polygon, DEFAULT_BBOX_BUFFER).expect("inside world");
        let unbuffered = BoundingBox {
            lon_min: 20.0,
            lat_min: 35.0,
            lon_max: 28.0,
            lat_max: 42.0,
        };
        assert!(bbox.strictly_contains(&unbuffered), "{bbox:?}");
        assert!((bbox.lon_min - 19.9).abs() < 1e-4, "{bbox:?}");
        assert!((bbox.lat_max - 42.1).abs() < 1e-4, "{bbox:?}");
    }

    #[rstest]
    fn zero_buffer_returns_polygon_bounds() {
        let polygon = rectangle(-5.0, 50.0, 2.0, 59.0);
        let bbox = derive_bounding_box(&polygon, 0.0).expect("inside world");
        assert_eq!(
            bbox,
            BoundingBox {
                lon_min: -5.0,
                lat_min: 50.0,
                lon_max: 2.0,
                lat_max: 59.0
            }
        );
    }

    #[rstest]
    #[case(rectangle(170.0, 10.0, 180.0, 20.0))]
    #[case(rectangle(-180.0, -90.0, -170.0, -80.0))]
    #[case(rectangle(-10.0, 85.0, 10.0, 90.0))]
    #[case(rectangle(-180.0, -90.0, 180.0, 90.0))]
    fn edge_polygons_are_clamped_to_world(#[case] polygon: RegionPolygon) {
        let bbox = derive_bounding_box(&polygon, DEFAULT_BBOX_BUFFER).expect("overlaps world");
        assert_within_world(&bbox);
    }

    #[rstest]
    fn antimeridian_polygon_keeps_eastern_edge() {
        let polygon = rectangle(170.0, 10.0, 180.0, 20.0);
        let bbox = derive_bounding_box(&polygon, DEFAULT_BBOX_BUFFER).expect("overlaps world");
        assert!((bbox.lon_max - 180.0).abs() < 1e-6, "{bbox:?}");
        assert!(bbox.lon_min < 170.0, "{bbox:?}");
    }

    #[rstest]
    fn polygons_outside_world_are_rejected() {
        let polygon = rectangle(200.0, 10.0, 210.0, 20.0);
        assert_eq!(
            derive_bounding_box(&polygon, DEFAULT_BBOX_BUFFER),
            Err(BoundingBoxError::Empty)
        );
    }

    #[rstest]
    #[case(-0.1)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn invalid_buffers_are_rejected(#[case] buffer: f64) {
        let polygon = rectangle(0.0, 0.0, 1.0, 1.0);
        let err = derive_bounding_box(&polygon, buffer).expect_err("invalid buffer");
        assert!(matches!(err, BoundingBoxError::InvalidBuffer(_)));
    }

    #[rstest]
    #[case("empty\n1\nEND\nEND\n", 0)]
    #[case("point\n1\n10 10\nEND\nEND\n", 1)]
    #[case("segment\n1\n10 10\n11 11\n10 10\nEND\nEND\n", 2)]
    fn rings_without_area_support_are_degenerate(#[case] text: &str, #[case] expected: usize) {
        let polygon = parse_poly(text.lines()).expect("parses");
        assert_eq!(
            derive_bounding_box(&polygon, DEFAULT_BBOX_BUFFER),
            Err(BoundingBoxError::Degenerate {
                part: 0,
                vertices: expected
            })
        );
    }

    #[rstest]
    fn self_intersecting_ring_falls_back_to_grown_bounds() {
        let text = "bowtie\n1\n0 -26.69\n0 0\n104.8 0\n133.69 35.47\nEND\nEND\n";
        let polygon = parse_poly(text.lines()).expect("parses");
        let bbox = derive_bounding_box(&polygon, DEFAULT_BBOX_BUFFER).expect("has bounds");
        let raw = BoundingBox {
            lon_min: 0.0,
            lat_min: -26.69,
            lon_max: 133.69,
            lat_max: 35.47,
        };
        assert!(bbox.strictly_contains(&raw), "{bbox:?}");
        assert_within_world(&bbox);
    }

    #[rstest]
    fn collinear_ring_is_grown_by_the_buffer() {
        let text = "line\n1\n0 0\n1 1\n2 2\nEND\nEND\n";
        let polygon = parse_poly(text.lines()).expect("parses");
        let bbox = derive_bounding_box(&polygon, DEFAULT_BBOX_BUFFER).expect("has bounds");
        assert!((bbox.lon_min + 0.1).abs() < 1e-9, "{bbox:?}");
        assert!((bbox.lat_max - 2.1).abs() < 1e-9, "{bbox:?}");
    }

    #[rstest]
    fn clockwise_rings_buffer_outwards() {
        let mut polygon = rectangle(0.0, 0.0, 4.0, 4.0);
        let parts = vec![PolygonPart {
            outer: polygon.parts()[0].outer.iter().rev().copied().collect(),
            holes: Vec::new(),
        }];
        polygon = RegionPolygon::from_parts(parts);
        let bbox = derive_bounding_box(&polygon, DEFAULT_BBOX_BUFFER).expect("inside world");
        assert!(bbox.lon_min < 0.0 && bbox.lat_max > 4.0, "{bbox:?}");
    }
}
