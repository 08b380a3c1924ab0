use thiserror::Error;

use crate::format::Format;
use crate::markup::MarkupError;
use crate::shapefile::ShapefileError;

/// Why a conversion request failed.
///
/// Every variant is terminal for the request. The HTTP layer is the only
/// place that turns one of these into a wire response; its `Display` text
/// is what the caller sees.
#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Missing required field: {field}")]
    MissingInput { field: &'static str },

    #[error("File content must be a data URL of the form '<prefix>,<base64 payload>'")]
    MalformedTransportEncoding,

    #[error("File content is not valid base64: {0}")]
    Base64DecodeFailure(#[from] base64::DecodeError),

    #[error(
        "Unsupported file format '{extension}'. Supported formats: {}",
        Format::supported_list()
    )]
    UnsupportedFormat { extension: String },

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid GeoJSON: {0}")]
    InvalidGeoJsonShape(String),

    #[error("Invalid XML: {0}")]
    Markup(#[from] MarkupError),

    #[error("No .kml file found in KMZ archive")]
    NoMarkupMemberInArchive,

    #[error("No .shp file found in ZIP archive")]
    NoGeometryRecordFileInArchive,

    #[error("CSV file must contain a header row and at least one data row")]
    InsufficientRows,

    #[error("CSV file has no {missing} column")]
    MissingCoordinateColumns { missing: &'static str },

    #[error("Failed to decode shapefile: {0}")]
    GeometryRecordDecodeFailure(#[from] ShapefileError),

    #[error("Failed to read archive: {0:#}")]
    Archive(anyhow::Error),

    #[error("Failed to read input: {0:#}")]
    Source(anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ConversionError>;
