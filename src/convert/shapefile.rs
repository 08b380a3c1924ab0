use tracing::debug;

use crate::error::{ConversionError, Result};
use crate::geometry::Feature;
use crate::shapefile;
use crate::zip::{Archive, find_member_by_extension};

/// Convert a zipped shapefile.
///
/// The `.shp` member is required. The attribute table is the `.dbf` with the
/// same stem, falling back to the first `.dbf`; without one, features carry
/// empty properties.
pub async fn convert(archive: &dyn Archive) -> Result<Vec<Feature>> {
    let names = archive
        .member_names()
        .await
        .map_err(ConversionError::Archive)?;

    let shp_name = find_member_by_extension(&names, "shp")
        .ok_or(ConversionError::NoGeometryRecordFileInArchive)?;
    let dbf_name = companion_table(&names, shp_name);
    debug!(shp = shp_name, dbf = dbf_name, "shapefile members located");

    let shp = archive
        .read_member(shp_name)
        .await
        .map_err(ConversionError::Archive)?;
    let dbf = match dbf_name {
        Some(name) => Some(
            archive
                .read_member(name)
                .await
                .map_err(ConversionError::Archive)?,
        ),
        None => None,
    };

    Ok(shapefile::read_features(&shp, dbf.as_deref())?)
}

fn companion_table<'a>(names: &'a [String], shp_name: &str) -> Option<&'a str> {
    // The extension matched case-insensitively, so the last four bytes are ASCII
    let stem = shp_name[..shp_name.len() - 4].to_ascii_lowercase();
    let wanted = format!("{stem}.dbf");

    names
        .iter()
        .find(|n| n.to_ascii_lowercase() == wanted)
        .map(String::as_str)
        .or_else(|| find_member_by_extension(names, "dbf"))
}
