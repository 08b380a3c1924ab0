//! Shapefile decoding.
//!
//! Geometry records (`.shp`) and attribute rows (`.dbf`) are decoded
//! independently, then paired by position: record `i` gets row `i`.

mod shapes;
mod table;

pub use shapes::{assemble_polygons, read_geometries};
pub use table::read_rows;

use thiserror::Error;

use crate::geometry::{self, Feature, Properties};

#[derive(Error, Debug)]
pub enum ShapefileError {
    #[error("malformed geometry records: {0}")]
    Geometry(String),

    #[error("malformed attribute table: {0}")]
    Table(String),

    #[error("attribute row {row} has no value for field {field}")]
    MissingField { row: usize, field: String },

    #[error("{0} records are not supported")]
    UnsupportedShape(&'static str),

    #[error("{shapes} geometry records but {rows} attribute rows")]
    RecordCountMismatch { shapes: usize, rows: usize },
}

/// Decode a shapefile into features, one per geometry record.
///
/// Without an attribute table every feature gets empty properties.
pub fn read_features(shp: &[u8], dbf: Option<&[u8]>) -> Result<Vec<Feature>, ShapefileError> {
    let geometries = read_geometries(shp)?;

    let rows = match dbf {
        Some(table) => {
            let rows = read_rows(table)?;
            if rows.len() != geometries.len() {
                return Err(ShapefileError::RecordCountMismatch {
                    shapes: geometries.len(),
                    rows: rows.len(),
                });
            }
            rows
        }
        None => vec![Properties::new(); geometries.len()],
    };

    Ok(geometries
        .into_iter()
        .zip(rows)
        .map(|(geometry, properties)| geometry::feature(geometry, properties))
        .collect())
}
