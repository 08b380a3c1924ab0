use async_trait::async_trait;
use flate2::Crc;
use flate2::read::DeflateDecoder;
use std::io::Read;
use std::sync::Arc;
use tracing::debug;

use crate::io::ReadAt;
use anyhow::{Context, Result, anyhow, bail};

use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Upper bound on the output buffer reserved per compressed byte.
const MAX_RESERVE_RATIO: u64 = 8;

/// Named-member access to an archive container.
///
/// The KMZ and Shapefile converters only ever need these two operations,
/// so they take `&dyn Archive` rather than a concrete ZIP reader.
#[async_trait]
pub trait Archive: Send + Sync {
    /// Names of all file members, in archive order. Directories and macOS
    /// resource forks are omitted.
    async fn member_names(&self) -> Result<Vec<String>>;

    /// Read and decompress one member by its exact name.
    async fn read_member(&self, name: &str) -> Result<Vec<u8>>;
}

/// ZIP archive over any random-access source
pub struct ZipArchive<R: ReadAt + ?Sized> {
    parser: ZipParser<R>,
}

impl<R: ReadAt + ?Sized> ZipArchive<R> {
    pub fn new(reader: Arc<R>) -> Self {
        Self {
            parser: ZipParser::new(reader),
        }
    }

    /// List all entries in the archive, directories included
    pub async fn list_files(&self) -> Result<Vec<ZipFileEntry>> {
        self.parser.list_files().await
    }

    /// Extract an entry's data to memory, verifying size and CRC-32
    pub async fn extract_to_memory(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        if entry.is_encrypted() {
            bail!("{} is encrypted", entry.file_name);
        }

        let data_offset = self.parser.get_data_offset(entry).await?;
        let source_size = self.parser.reader().size();
        match data_offset.checked_add(entry.compressed_size) {
            Some(end) if end <= source_size => {}
            _ => bail!(
                "{} claims {} compressed bytes at offset {}, past the end of a {} byte archive",
                entry.file_name,
                entry.compressed_size,
                data_offset,
                source_size
            ),
        }

        let mut raw = vec![0u8; usize::try_from(entry.compressed_size)?];
        self.parser
            .reader()
            .read_exact_at(data_offset, &mut raw)
            .await
            .with_context(|| format!("Cannot read data of {}", entry.file_name))?;

        let data = match entry.compression_method {
            CompressionMethod::Stored => raw,
            CompressionMethod::Deflate => {
                // Stop one byte past the declared size so an overrun is caught
                let reserve = entry
                    .uncompressed_size
                    .min((raw.len() as u64).saturating_mul(MAX_RESERVE_RATIO));
                let mut out = Vec::with_capacity(usize::try_from(reserve)?);
                DeflateDecoder::new(raw.as_slice())
                    .take(entry.uncompressed_size.saturating_add(1))
                    .read_to_end(&mut out)
                    .with_context(|| format!("Cannot inflate {}", entry.file_name))?;
                out
            }
            CompressionMethod::Unknown(method) => {
                bail!(
                    "Unsupported compression method {} for {} (only STORED and DEFLATE are supported)",
                    method,
                    entry.file_name
                );
            }
        };

        if data.len() as u64 != entry.uncompressed_size {
            bail!(
                "{} decompressed to {} bytes, expected {}",
                entry.file_name,
                data.len(),
                entry.uncompressed_size
            );
        }

        let mut crc = Crc::new();
        crc.update(&data);
        if crc.sum() != entry.crc32 {
            bail!(
                "CRC-32 mismatch for {}: computed {:08x}, expected {:08x}",
                entry.file_name,
                crc.sum(),
                entry.crc32
            );
        }

        debug!(
            member = %entry.file_name,
            method = entry.compression_method.as_u16(),
            bytes = data.len(),
            "archive member extracted"
        );

        Ok(data)
    }
}

#[async_trait]
impl<R: ReadAt + ?Sized> Archive for ZipArchive<R> {
    async fn member_names(&self) -> Result<Vec<String>> {
        Ok(self
            .list_files()
            .await?
            .into_iter()
            .filter(|e| !e.is_directory && !e.is_resource_fork())
            .map(|e| e.file_name)
            .collect())
    }

    async fn read_member(&self, name: &str) -> Result<Vec<u8>> {
        let entries = self.list_files().await?;
        let entry = entries
            .iter()
            .find(|e| e.file_name == name)
            .ok_or_else(|| anyhow!("No member named {} in archive", name))?;
        self.extract_to_memory(entry).await
    }
}

/// First member whose name ends with `.{extension}`, ignoring case.
///
/// macOS resource forks (`__MACOSX/._x.shp`) share the extension of the real
/// file but hold no geodata, so they never match.
pub fn find_member_by_extension<'a>(names: &'a [String], extension: &str) -> Option<&'a str> {
    let suffix = format!(".{}", extension.to_ascii_lowercase());
    names
        .iter()
        .filter(|n| !n.starts_with("__MACOSX/"))
        .find(|n| n.to_ascii_lowercase().ends_with(&suffix))
        .map(String::as_str)
}
