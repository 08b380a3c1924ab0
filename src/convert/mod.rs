//! Format converters and the dispatcher that selects between them.
//!
//! Each converter turns one input family into an ordered list of
//! [`Feature`]s; [`assemble`] wraps that list into the canonical
//! [`FeatureCollection`] regardless of which converter produced it. GeoJSON
//! is the exception: a collection upload is returned as it arrived.

mod geojson;
mod gpx;
mod kml;
mod shapefile;
mod tabular;

use std::sync::Arc;
use tracing::debug;

use crate::error::{ConversionError, Result};
use crate::format::Format;
use crate::geometry::{self, Feature, FeatureCollection};
use crate::io::{MemoryReader, ReadAt};
use crate::transport;
use crate::zip::ZipArchive;

/// A converted upload and the format it was read as.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub format: Format,
    pub collection: FeatureCollection,
}

/// Convert an upload as it arrives over the wire.
///
/// `file_content` is a data URL. The declared MIME type is informational;
/// the converter is chosen from the file name's extension alone.
pub async fn convert(
    file_name: Option<&str>,
    file_content: Option<&str>,
    file_type: Option<&str>,
) -> Result<Conversion> {
    let file_name = required("fileName", file_name)?;
    let file_content = required("fileContent", file_content)?;

    let format = Format::from_file_name(file_name)?;
    debug!(file_name, file_type, format = format.label(), "dispatching upload");

    let bytes = transport::decode_data_url(file_content)?;
    let collection = convert_source(format, Arc::new(MemoryReader::new(bytes))).await?;
    Ok(Conversion { format, collection })
}

/// Convert already-decoded file contents.
pub async fn convert_bytes(file_name: &str, bytes: Vec<u8>) -> Result<FeatureCollection> {
    let format = Format::from_file_name(file_name)?;
    convert_source(format, Arc::new(MemoryReader::new(bytes))).await
}

/// Convert from any byte source.
///
/// Archive formats read only the members they need; every other format
/// reads the whole source.
pub async fn convert_source(format: Format, reader: Arc<dyn ReadAt>) -> Result<FeatureCollection> {
    debug!(format = format.label(), bytes = reader.size(), "converting");

    let features = match format {
        Format::GeoJson => return geojson::convert(&read_source(reader.as_ref()).await?),
        Format::Kmz => kml::convert_kmz(&ZipArchive::new(reader)).await?,
        Format::Shapefile => shapefile::convert(&ZipArchive::new(reader)).await?,
        Format::Kml => kml::convert(&read_source(reader.as_ref()).await?)?,
        Format::Gpx => gpx::convert(&read_source(reader.as_ref()).await?)?,
        Format::Csv => tabular::convert(&read_source(reader.as_ref()).await?)?,
    };

    Ok(assemble(features))
}

/// Wrap converted features, in discovery order, as the canonical output.
pub fn assemble(features: Vec<Feature>) -> FeatureCollection {
    geometry::collection(features)
}

fn required<'a>(field: &'static str, value: Option<&'a str>) -> Result<&'a str> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ConversionError::MissingInput { field }),
    }
}

async fn read_source(reader: &dyn ReadAt) -> Result<Vec<u8>> {
    reader.read_all().await.map_err(ConversionError::Source)
}
