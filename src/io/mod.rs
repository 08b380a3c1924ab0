//! Random-access byte sources.
//!
//! Every input the pipeline touches goes through [`ReadAt`]: decoded request
//! payloads live in a [`MemoryReader`], the CLI opens a [`LocalFileReader`] or an
//! [`HttpRangeReader`]. Archive-packaged formats read only the ranges they need;
//! everything else calls [`ReadAt::read_all`].

mod http;
mod local;
mod memory;

pub use http::HttpRangeReader;
pub use local::LocalFileReader;
pub use memory::MemoryReader;

use anyhow::{Result, bail};
use async_trait::async_trait;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Read data at the specified offset into the buffer
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;

    /// Fill `buf` completely, failing if the source ends first.
    async fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read_at(offset + filled as u64, &mut buf[filled..]).await?;
            if n == 0 {
                bail!(
                    "Unexpected end of data at offset {} ({} of {} bytes read)",
                    offset,
                    filled,
                    buf.len()
                );
            }
            filled += n;
        }
        Ok(())
    }

    /// Read the whole source into memory.
    async fn read_all(&self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; usize::try_from(self.size())?];
        self.read_exact_at(0, &mut buf).await?;
        Ok(buf)
    }
}
