//! # geoingest
//!
//! Turns geospatial uploads into one canonical GeoJSON `FeatureCollection`.
//!
//! Supported inputs are GeoJSON, KML, KMZ, GPX, CSV with coordinate columns,
//! and zipped Esri shapefiles. Inputs are read through [`ReadAt`], so the same
//! converters work on an in-memory upload, a local file, or a remote file
//! fetched piecewise with HTTP Range requests. Archive formats only read the
//! ZIP members they need.
//!
//! ## Example
//!
//! ```no_run
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let csv = b"lat,lon,name\n40.7,-74.0,NYC\n".to_vec();
//!     let collection = geoingest::convert_bytes("cities.csv", csv).await?;
//!     println!("{}", serde_json::to_string(&collection)?);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod convert;
pub mod error;
pub mod format;
pub mod geometry;
pub mod io;
pub mod markup;
pub mod server;
pub mod shapefile;
pub mod transport;
pub mod zip;

pub use cli::Cli;
pub use convert::{Conversion, assemble, convert, convert_bytes, convert_source};
pub use error::{ConversionError, Result};
pub use format::Format;
pub use geometry::{Coord, Feature, FeatureCollection, Geometry, GeometryValue, Properties};
pub use io::{HttpRangeReader, LocalFileReader, MemoryReader, ReadAt};
pub use zip::{Archive, ZipArchive, ZipFileEntry};
