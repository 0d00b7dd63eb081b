//! Parser for Osmosis polygon filter files.
//!
//! The accepted dialect is line oriented. The first line is a header, the
//! second opens the first ring, `END` closes a ring and a second `END` outside
//! any ring terminates the document. Sections starting with `!` are holes of
//! the most recent part.
//!
//! Rings are returned exactly as written: closure and winding are left to the
//! geometry library.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use log::warn;
use thiserror::Error;

const END_MARKER: &str = "END";
const HOLE_PREFIX: char = '!';

/// One polygon part: an outer ring and its holes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonPart {
    /// Outer ring as `(lon, lat)` coordinates.
    pub outer: Vec<Coord<f64>>,
    /// Hole rings as `(lon, lat)` coordinates.
    pub holes: Vec<Vec<Coord<f64>>>,
}

impl PolygonPart {
    fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(
            LineString::new(self.outer.clone()),
            self.holes
                .iter()
                .map(|hole| LineString::new(hole.clone()))
                .collect(),
        )
    }
}

/// Multi-part region boundary read from a polygon filter file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegionPolygon {
    parts: Vec<PolygonPart>,
}

impl RegionPolygon {
    /// Build a polygon from already separated parts.
    #[must_use]
    pub const fn from_parts(parts: Vec<PolygonPart>) -> Self {
        Self { parts }
    }

    /// Parts in file order.
    #[must_use]
    pub fn parts(&self) -> &[PolygonPart] {
        &self.parts
    }

    /// Convert into a `geo` multi-polygon for geometric operations.
    #[must_use]
    pub fn to_multi_polygon(&self) -> MultiPolygon<f64> {
        MultiPolygon::new(self.parts.iter().map(PolygonPart::to_polygon).collect())
    }
}

/// Structural problems in a polygon filter file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolygonParseError {
    /// The document ended before any ring was opened.
    #[error("polygon file contains no rings")]
    Empty,
    /// Coordinates appeared while no ring was open.
    #[error("line {line}: coordinates outside of a ring")]
    MissingRingStart {
        /// Zero-based line index.
        line: usize,
    },
    /// A coordinate line did not hold exactly two finite numbers.
    #[error("line {line}: expected `<lon> <lat>`, found {content:?}")]
    InvalidCoordinate {
        /// Zero-based line index.
        line: usize,
        /// The offending line.
        content: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    Outside,
    Outer,
    Hole,
}

/// Parse the lines of a polygon filter file.
///
/// A top-level `END` ends the document even when more sections follow; any
/// such trailing lines are ignored and reported with a warning.
///
/// # Examples
///
/// ```
/// use regiomap_core::parse_poly;
///
/// let text = "greece\n1\n  20.0 35.0\n  28.0 35.0\n  28.0 42.0\nEND\nEND\n";
/// let polygon = parse_poly(text.lines()).expect("well-formed polygon");
/// assert_eq!(polygon.parts().len(), 1);
/// assert_eq!(polygon.parts()[0].outer.len(), 3);
/// ```
pub fn parse_poly<'a, I>(lines: I) -> Result<RegionPolygon, PolygonParseError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut parts: Vec<PolygonPart> = Vec::new();
    let mut cursor = Cursor::Outside;
    let mut lines = lines.into_iter().enumerate();
    let mut terminated = false;

    for (index, line) in lines.by_ref() {
        match index {
            0 => continue,
            1 => {
                parts.push(PolygonPart::default());
                cursor = Cursor::Outer;
                continue;
            }
            _ => {}
        }

        let is_end = line.trim() == END_MARKER;
        match cursor {
            Cursor::Outer | Cursor::Hole if is_end => cursor = Cursor::Outside,
            Cursor::Outer | Cursor::Hole => {
                let coordinate = parse_coordinate(index, line)?;
                current_ring(&mut parts, cursor)
                    .ok_or(PolygonParseError::MissingRingStart { line: index })?
                    .push(coordinate);
            }
            Cursor::Outside if is_end => {
                terminated = true;
                break;
            }
            Cursor::Outside if line.starts_with(HOLE_PREFIX) => {
                parts
                    .last_mut()
                    .ok_or(PolygonParseError::MissingRingStart { line: index })?
                    .holes
                    .push(Vec::new());
                cursor = Cursor::Hole;
            }
            Cursor::Outside => {
                parts.push(PolygonPart::default());
                cursor = Cursor::Outer;
            }
        }
    }

    if terminated {
        let ignored = lines.filter(|(_, line)| !line.trim().is_empty()).count();
        if ignored > 0 {
            warn!("polygon terminator followed by {ignored} further lines; they were ignored");
        }
    }

    if parts.is_empty() {
        return Err(PolygonParseError::Empty);
    }
    Ok(RegionPolygon { parts })
}

fn current_ring(parts: &mut [PolygonPart], cursor: Cursor) -> Option<&mut Vec<Coord<f64>>> {
    let part = parts.last_mut()?;
    match cursor {
        Cursor::Outer => Some(&mut part.outer),
        Cursor::Hole => part.holes.last_mut(),
        Cursor::Outside => None,
    }
}

fn parse_coordinate(index: usize, line: &str) -> Result<Coord<f64>, PolygonParseError> {
    let invalid = || PolygonParseError::InvalidCoordinate {
        line: index,
        content: line.to_owned(),
    };
    let mut fields = line.split_whitespace();
    let (Some(lon), Some(lat), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(invalid());
    };
    let x: f64 = lon.parse().map_err(|_| invalid())?;
    let y: f64 = lat.parse().map_err(|_| invalid())?;
    if !(x.is_finite() && y.is_finite()) {
        return Err(invalid());
    }
    Ok(Coord { x, y })
}
