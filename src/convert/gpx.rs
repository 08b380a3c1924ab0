use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::geometry::{self, Coord, Feature, Properties};
use crate::markup::{self, Element};

/// Convert a GPX document: waypoints, then tracks, then routes.
pub fn convert(bytes: &[u8]) -> Result<Vec<Feature>> {
    let doc = markup::parse(bytes)?;
    let gpx = &doc.root;
    let mut features = Vec::new();

    for wpt in gpx.all("wpt") {
        if let Some(coord) = point_coord(wpt) {
            features.push(geometry::feature(
                Some(geometry::point(coord)),
                name_property(wpt),
            ));
        }
    }

    for trk in gpx.all("trk") {
        let points = trk
            .all("trkseg")
            .iter()
            .flat_map(|seg| seg.all("trkpt"))
            .filter_map(point_coord);
        push_line(&mut features, trk, points.collect());
    }

    for rte in gpx.all("rte") {
        let points = rte.all("rtept").iter().filter_map(point_coord);
        push_line(&mut features, rte, points.collect());
    }

    debug!(
        waypoints = gpx.all("wpt").len(),
        tracks = gpx.all("trk").len(),
        routes = gpx.all("rte").len(),
        features = features.len(),
        "GPX records converted"
    );

    Ok(features)
}

fn push_line(features: &mut Vec<Feature>, record: &Element, points: Vec<Coord>) {
    if !points.is_empty() {
        features.push(geometry::feature(
            Some(geometry::line_string(points)),
            name_property(record),
        ));
    }
}

/// GPX stores position as `lat`/`lon` attributes, latitude first.
fn point_coord(point: &Element) -> Option<Coord> {
    let lat = point.attr("lat")?.trim().parse::<f64>().ok()?;
    let lon = point.attr("lon")?.trim().parse::<f64>().ok()?;
    (lat.is_finite() && lon.is_finite()).then(|| Coord::new(lon, lat))
}

fn name_property(record: &Element) -> Properties {
    let mut properties = Properties::new();
    if let Some(name) = record.child_text("name") {
        properties.insert("name".to_string(), Value::String(name.to_string()));
    }
    properties
}
