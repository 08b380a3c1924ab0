use serde_json::Value;

use crate::error::{ConversionError, Result};
use crate::geometry::{self, FeatureCollection, GEOMETRY_TYPES, GeoJson, Properties};

/// Validate a GeoJSON document and normalize it to a collection.
///
/// A `FeatureCollection` passes through as-is, bounding box and foreign
/// members included. A single `Feature` becomes a one-element collection,
/// and a bare geometry is wrapped in a property-less feature.
pub fn convert(bytes: &[u8]) -> Result<FeatureCollection> {
    let value: Value = serde_json::from_slice(bytes)?;

    let kind = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            ConversionError::InvalidGeoJsonShape(
                "expected an object with a string \"type\" member".to_string(),
            )
        })?
        .to_string();

    if kind != "FeatureCollection" && kind != "Feature" && !GEOMETRY_TYPES.contains(&kind.as_str())
    {
        return Err(ConversionError::InvalidGeoJsonShape(format!(
            "unsupported type \"{kind}\"; expected FeatureCollection, Feature or a geometry"
        )));
    }

    let document = GeoJson::from_json_value(value)
        .map_err(|e| ConversionError::InvalidGeoJsonShape(format!("malformed {kind}: {e}")))?;

    Ok(match document {
        GeoJson::FeatureCollection(collection) => collection,
        GeoJson::Feature(feature) => geometry::collection(vec![feature]),
        GeoJson::Geometry(geometry) => geometry::collection(vec![geometry::feature(
            Some(geometry),
            Properties::new(),
        )]),
    })
}
