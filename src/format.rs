use std::fmt;

use crate::error::{ConversionError, Result};

/// Input families the dispatcher knows how to convert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    GeoJson,
    Kml,
    Kmz,
    Gpx,
    Csv,
    Shapefile,
}

impl Format {
    pub const ALL: [Format; 6] = [
        Format::GeoJson,
        Format::Kml,
        Format::Kmz,
        Format::Gpx,
        Format::Csv,
        Format::Shapefile,
    ];

    /// Select the format from the extension of a declared file name.
    ///
    /// The extension is everything after the last `.` of the lower-cased name.
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let lower = file_name.to_lowercase();
        let extension = lower.rsplit_once('.').map(|(_, ext)| ext).unwrap_or("");
        Self::from_extension(extension).ok_or_else(|| ConversionError::UnsupportedFormat {
            extension: extension.to_string(),
        })
    }

    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.extensions().iter().any(|e| *e == extension))
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Format::GeoJson => &["geojson", "json"],
            Format::Kml => &["kml"],
            Format::Kmz => &["kmz"],
            Format::Gpx => &["gpx"],
            Format::Csv => &["csv"],
            Format::Shapefile => &["zip"],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Format::GeoJson => "GeoJSON",
            Format::Kml => "KML",
            Format::Kmz => "KMZ",
            Format::Gpx => "GPX",
            Format::Csv => "CSV",
            Format::Shapefile => "Shapefile",
        }
    }

    /// User-facing enumeration of every supported format.
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exts = self
            .extensions()
            .iter()
            .map(|e| format!(".{e}"))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{} ({})", self.label(), exts)
    }
}
