use serde_json::Value;
use tracing::debug;

use crate::error::{ConversionError, Result};
use crate::geometry::{self, Coord, Feature, Properties};

/// Convert delimited text with latitude/longitude columns into points.
///
/// Rows with the wrong number of cells or non-numeric coordinates are
/// skipped; only a missing header, missing data or missing coordinate
/// columns fail the conversion.
pub fn convert(bytes: &[u8]) -> Result<Vec<Feature>> {
    let text = String::from_utf8_lossy(bytes);
    let text: &str = &text;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return Err(ConversionError::InsufficientRows);
    }

    let header: Vec<String> = lines[0]
        .split(',')
        .map(|h| h.trim().to_lowercase())
        .collect();
    let (lat_col, lon_col) = coordinate_columns(&header)?;

    let mut features = Vec::with_capacity(lines.len() - 1);
    for line in &lines[1..] {
        let cells: Vec<&str> = line.split(',').collect();
        if cells.len() != header.len() {
            continue;
        }
        let (Some(lat), Some(lon)) = (parse_number(cells[lat_col]), parse_number(cells[lon_col]))
        else {
            continue;
        };

        let properties: Properties = header
            .iter()
            .zip(&cells)
            .enumerate()
            .filter(|(i, _)| *i != lat_col && *i != lon_col)
            .map(|(_, (name, cell))| (name.clone(), Value::String(cell.trim().to_string())))
            .collect();

        features.push(geometry::feature(
            Some(geometry::point(Coord::new(lon, lat))),
            properties,
        ));
    }

    debug!(
        rows = lines.len() - 1,
        features = features.len(),
        "CSV rows converted"
    );

    Ok(features)
}

fn coordinate_columns(header: &[String]) -> Result<(usize, usize)> {
    let lat = header.iter().position(|h| h.contains("lat") || h == "y");
    let lon = header
        .iter()
        .position(|h| h.contains("lon") || h.contains("lng") || h == "x");

    match (lat, lon) {
        (Some(lat), Some(lon)) => Ok((lat, lon)),
        (None, Some(_)) => Err(ConversionError::MissingCoordinateColumns {
            missing: "latitude",
        }),
        (Some(_), None) => Err(ConversionError::MissingCoordinateColumns {
            missing: "longitude",
        }),
        (None, None) => Err(ConversionError::MissingCoordinateColumns {
            missing: "latitude or longitude",
        }),
    }
}

fn parse_number(cell: &str) -> Option<f64> {
    cell.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
