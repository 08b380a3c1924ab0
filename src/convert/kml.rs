use serde_json::Value;
use tracing::debug;

use crate::error::{ConversionError, Result};
use crate::geometry::{self, Coord, Feature, Geometry, Properties};
use crate::markup::{self, Element};
use crate::zip::{Archive, find_member_by_extension};

/// Convert a KMZ archive: the first `.kml` member is converted as KML.
pub async fn convert_kmz(archive: &dyn Archive) -> Result<Vec<Feature>> {
    let names = archive
        .member_names()
        .await
        .map_err(ConversionError::Archive)?;
    let member =
        find_member_by_extension(&names, "kml").ok_or(ConversionError::NoMarkupMemberInArchive)?;
    debug!(member, "reading KML from KMZ");

    let bytes = archive
        .read_member(member)
        .await
        .map_err(ConversionError::Archive)?;
    convert(&bytes)
}

/// Convert a KML document, one feature per geometry-bearing placemark.
pub fn convert(bytes: &[u8]) -> Result<Vec<Feature>> {
    let doc = markup::parse(bytes)?;
    let container = doc.root.child("Document").unwrap_or(&doc.root);

    let mut placemarks = Vec::new();
    collect_placemarks(container, &mut placemarks);

    let total = placemarks.len();
    let features: Vec<Feature> = placemarks.into_iter().filter_map(placemark_feature).collect();
    debug!(
        placemarks = total,
        features = features.len(),
        "KML placemarks converted"
    );

    Ok(features)
}

/// Depth-first through folders and nested documents, in document order.
fn collect_placemarks<'a>(element: &'a Element, out: &mut Vec<&'a Element>) {
    for (tag, child) in element.children() {
        if tag == "Placemark" {
            out.push(child);
        } else {
            collect_placemarks(child, out);
        }
    }
}

fn placemark_feature(placemark: &Element) -> Option<Feature> {
    let geometry = placemark_geometry(placemark)?;

    let mut properties = Properties::new();
    for key in ["name", "description"] {
        let text = placemark.child_text(key).unwrap_or_default();
        properties.insert(key.to_string(), Value::String(text.to_string()));
    }

    if let Some(extended) = placemark.child("ExtendedData") {
        let simple = extended
            .all("SchemaData")
            .iter()
            .flat_map(|schema| schema.all("SimpleData"))
            .map(|data| (data, data.text.as_str()));
        let typed = extended
            .all("Data")
            .iter()
            .map(|data| (data, data.child_text("value").unwrap_or_default()));

        for (data, value) in typed.chain(simple) {
            if let Some(name) = data.attr("name") {
                if !properties.contains_key(name) {
                    properties.insert(name.to_string(), Value::String(value.to_string()));
                }
            }
        }
    }

    Some(geometry::feature(Some(geometry), properties))
}

/// Polygon, then LineString, then Point. Inner boundaries and
/// MultiGeometry are not extracted.
fn placemark_geometry(placemark: &Element) -> Option<Geometry> {
    if let Some(polygon) = placemark.child("Polygon") {
        let ring = polygon.path(&["outerBoundaryIs", "LinearRing", "coordinates"])?;
        let ring = parse_coordinates(&ring.text);
        return (!ring.is_empty()).then(|| geometry::polygon(vec![ring]));
    }

    if let Some(line) = placemark.child("LineString") {
        let coords = parse_coordinates(line.child_text("coordinates")?);
        return (!coords.is_empty()).then(|| geometry::line_string(coords));
    }

    if let Some(point) = placemark.child("Point") {
        let coord = parse_coordinates(point.child_text("coordinates")?)
            .into_iter()
            .next()?;
        return Some(geometry::point(coord));
    }

    None
}

/// `lon,lat[,alt]` tuples separated by whitespace. Altitude is dropped and
/// tuples without two numbers are skipped.
fn parse_coordinates(text: &str) -> Vec<Coord> {
    text.split_whitespace()
        .filter_map(|tuple| {
            let mut parts = tuple.split(',').map(|p| p.trim().parse::<f64>());
            let lon = parts.next()?.ok()?;
            let lat = parts.next()?.ok()?;
            (lon.is_finite() && lat.is_finite()).then(|| Coord::new(lon, lat))
        })
        .collect()
}
