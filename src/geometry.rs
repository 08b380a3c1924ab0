//! Canonical GeoJSON data model.
//!
//! The output types are the `geojson` crate's, so a GeoJSON upload passes
//! through with its bounding boxes, foreign members and extra position
//! members intact. Converters for the other formats build two-dimensional
//! geometries through the helpers below. Positions are always written
//! `[longitude, latitude]`; formats that carry latitude first (GPX
//! attributes, CSV columns in any order) are reordered before a [`Coord`] is
//! built.

pub use geojson::{
    Feature, FeatureCollection, GeoJson, Geometry, JsonObject as Properties,
    Value as GeometryValue,
};

/// Names accepted in the `type` member of a bare geometry object.
pub const GEOMETRY_TYPES: [&str; 7] = [
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
];

/// A two-dimensional geographic position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coord {
    pub lon: f64,
    pub lat: f64,
}

impl Coord {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn position(self) -> Vec<f64> {
        vec![self.lon, self.lat]
    }
}

fn positions(coords: Vec<Coord>) -> Vec<Vec<f64>> {
    coords.into_iter().map(Coord::position).collect()
}

fn rings(rings: Vec<Vec<Coord>>) -> Vec<Vec<Vec<f64>>> {
    rings.into_iter().map(positions).collect()
}

pub fn point(coord: Coord) -> Geometry {
    Geometry::new(GeometryValue::Point(coord.position()))
}

pub fn multi_point(coords: Vec<Coord>) -> Geometry {
    Geometry::new(GeometryValue::MultiPoint(positions(coords)))
}

pub fn line_string(coords: Vec<Coord>) -> Geometry {
    Geometry::new(GeometryValue::LineString(positions(coords)))
}

pub fn multi_line_string(lines: Vec<Vec<Coord>>) -> Geometry {
    Geometry::new(GeometryValue::MultiLineString(rings(lines)))
}

/// First ring is the exterior, the rest are holes.
pub fn polygon(polygon: Vec<Vec<Coord>>) -> Geometry {
    Geometry::new(GeometryValue::Polygon(rings(polygon)))
}

pub fn multi_polygon(polygons: Vec<Vec<Vec<Coord>>>) -> Geometry {
    Geometry::new(GeometryValue::MultiPolygon(
        polygons.into_iter().map(rings).collect(),
    ))
}

/// A feature with no id, bounding box or foreign members.
///
/// `None` geometry serializes as `null`: a record without a shape.
pub fn feature(geometry: Option<Geometry>, properties: Properties) -> Feature {
    Feature {
        bbox: None,
        geometry,
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

/// Wraps features in discovery order. Nothing is reordered or dropped.
pub fn collection(features: Vec<Feature>) -> FeatureCollection {
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn type_name(geometry: &Geometry) -> &'static str {
    match geometry.value {
        GeometryValue::Point(_) => "Point",
        GeometryValue::MultiPoint(_) => "MultiPoint",
        GeometryValue::LineString(_) => "LineString",
        GeometryValue::MultiLineString(_) => "MultiLineString",
        GeometryValue::Polygon(_) => "Polygon",
        GeometryValue::MultiPolygon(_) => "MultiPolygon",
        GeometryValue::GeometryCollection(_) => "GeometryCollection",
    }
}
