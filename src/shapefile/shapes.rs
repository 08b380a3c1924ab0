//! `.shp` geometry records, decoded by the `shapefile` crate.
//!
//! Z and M values are dropped. Ring roles come from the reader, which marks
//! clockwise rings as exteriors and counter-clockwise ones as holes.

use ::shapefile::{PolygonRing, Shape, ShapeReader};
use std::io::Cursor;

use super::ShapefileError;
use crate::geometry::{self, Coord, Geometry};

/// Point types that carry a planar position.
trait Planar {
    fn coord(&self) -> Coord;
}

impl Planar for ::shapefile::Point {
    fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

impl Planar for ::shapefile::PointM {
    fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

impl Planar for ::shapefile::PointZ {
    fn coord(&self) -> Coord {
        Coord::new(self.x, self.y)
    }
}

/// Decode every record of a `.shp` file. Null shapes, and records with no
/// parts, come back as `None`.
pub fn read_geometries(shp: &[u8]) -> Result<Vec<Option<Geometry>>, ShapefileError> {
    let reader = ShapeReader::new(Cursor::new(shp))
        .map_err(|e| ShapefileError::Geometry(e.to_string()))?;
    let shapes = reader
        .read()
        .map_err(|e| ShapefileError::Geometry(e.to_string()))?;

    shapes.iter().map(shape_geometry).collect()
}

fn shape_geometry(shape: &Shape) -> Result<Option<Geometry>, ShapefileError> {
    let geometry = match shape {
        Shape::NullShape => None,
        Shape::Point(p) => Some(geometry::point(p.coord())),
        Shape::PointM(p) => Some(geometry::point(p.coord())),
        Shape::PointZ(p) => Some(geometry::point(p.coord())),
        Shape::Multipoint(m) => multi_point(m.points()),
        Shape::MultipointM(m) => multi_point(m.points()),
        Shape::MultipointZ(m) => multi_point(m.points()),
        Shape::Polyline(l) => lines(l.parts()),
        Shape::PolylineM(l) => lines(l.parts()),
        Shape::PolylineZ(l) => lines(l.parts()),
        Shape::Polygon(p) => polygons(p.rings()),
        Shape::PolygonM(p) => polygons(p.rings()),
        Shape::PolygonZ(p) => polygons(p.rings()),
        Shape::Multipatch(_) => return Err(ShapefileError::UnsupportedShape("Multipatch")),
    };
    Ok(geometry)
}

fn coords<P: Planar>(points: &[P]) -> Vec<Coord> {
    points.iter().map(Planar::coord).collect()
}

fn multi_point<P: Planar>(points: &[P]) -> Option<Geometry> {
    (!points.is_empty()).then(|| geometry::multi_point(coords(points)))
}

/// One part is a LineString, several a MultiLineString.
fn lines<P: Planar>(parts: &[Vec<P>]) -> Option<Geometry> {
    match parts {
        [] => None,
        [single] => Some(geometry::line_string(coords(single))),
        _ => Some(geometry::multi_line_string(
            parts.iter().map(|p| coords(p)).collect(),
        )),
    }
}

fn polygons<P: Planar>(rings: &[PolygonRing<P>]) -> Option<Geometry> {
    let mut outers = Vec::new();
    let mut holes = Vec::new();
    for ring in rings {
        match ring {
            PolygonRing::Outer(points) => outers.push(coords(points)),
            PolygonRing::Inner(points) => holes.push(coords(points)),
        }
    }
    assemble_polygons(outers, holes)
}

/// Group rings into polygons.
///
/// Each hole goes to the first exterior ring containing it; a hole contained
/// by none becomes a polygon of its own. A record without any exterior ring
/// (winding written backwards) keeps every ring as an exterior.
pub fn assemble_polygons(outers: Vec<Vec<Coord>>, holes: Vec<Vec<Coord>>) -> Option<Geometry> {
    let mut polygons: Vec<Vec<Vec<Coord>>> = if outers.is_empty() {
        holes.into_iter().map(|r| vec![r]).collect()
    } else {
        let mut polygons: Vec<Vec<Vec<Coord>>> = outers.into_iter().map(|r| vec![r]).collect();
        for hole in holes {
            let owner = hole
                .first()
                .and_then(|first| polygons.iter().position(|p| ring_contains(&p[0], *first)));
            match owner {
                Some(i) => polygons[i].push(hole),
                None => polygons.push(vec![hole]),
            }
        }
        polygons
    };

    match polygons.len() {
        0 => None,
        1 => Some(geometry::polygon(polygons.remove(0))),
        _ => Some(geometry::multi_polygon(polygons)),
    }
}

/// Even-odd ray casting.
fn ring_contains(ring: &[Coord], p: Coord) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for i in 0..ring.len() {
        let (a, b) = (ring[i], ring[j]);
        if (a.lat > p.lat) != (b.lat > p.lat)
            && p.lon < (b.lon - a.lon) * (p.lat - a.lat) / (b.lat - a.lat) + a.lon
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
