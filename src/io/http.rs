use async_trait::async_trait;
use reqwest::header::{ACCEPT_RANGES, CONTENT_LENGTH, RANGE};
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

use super::ReadAt;
use anyhow::{Context, Result, bail};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRY: u32 = 10;

/// Remote file read piecewise with HTTP Range requests.
///
/// Opening the reader issues one `HEAD` to learn the size and confirm the
/// server honours `Range`; every [`ReadAt::read_at`] is then a ranged `GET`.
pub struct HttpRangeReader {
    client: Client,
    url: String,
    size: u64,
    transferred_bytes: AtomicU64,
}

impl HttpRangeReader {
    pub async fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        let resp = client
            .head(&url)
            .send()
            .await
            .with_context(|| format!("Cannot reach {}", url))?;
        if !resp.status().is_success() {
            bail!("HEAD {} failed with status {}", url, resp.status());
        }

        let headers = resp.headers();
        let ranged = headers
            .get(ACCEPT_RANGES)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("bytes"));
        if !ranged {
            bail!("{} does not accept Range requests", url);
        }

        let size: u64 = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse().ok())
            .with_context(|| format!("{} did not report a Content-Length", url))?;

        debug!(%url, size, "remote source opened");

        Ok(Self {
            client,
            url,
            size,
            transferred_bytes: AtomicU64::new(0),
        })
    }

    /// Bytes received from the network so far.
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// One ranged GET for `start..=end`, retried on timeouts and refused
    /// connections. The server may return fewer bytes than asked for.
    async fn fetch_range(&self, start: u64, end: u64) -> Result<Vec<u8>> {
        let range = format!("bytes={}-{}", start, end);
        let mut attempt = 0;

        loop {
            match self.client.get(&self.url).header(RANGE, &range).send().await {
                Ok(resp) => {
                    if resp.status() != StatusCode::PARTIAL_CONTENT {
                        bail!("GET {} ({}) failed with status {}", self.url, range, resp.status());
                    }
                    return Ok(resp.bytes().await?.to_vec());
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    attempt += 1;
                    if attempt >= MAX_RETRY {
                        bail!("Giving up on {} after {} attempts: {}", range, attempt, e);
                    }
                    warn!(attempt, max_retry = MAX_RETRY, error = %e, "range request failed, retrying");
                    tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl ReadAt for HttpRangeReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || offset >= self.size {
            return Ok(0);
        }

        let end = (offset + buf.len() as u64 - 1).min(self.size - 1);
        let wanted = (end - offset + 1) as usize;
        let mut received = 0;

        while received < wanted {
            let chunk = self.fetch_range(offset + received as u64, end).await?;
            if chunk.is_empty() {
                bail!("{} returned an empty range at offset {}", self.url, offset + received as u64);
            }
            let n = chunk.len().min(wanted - received);
            buf[received..received + n].copy_from_slice(&chunk[..n]);
            received += n;
            self.transferred_bytes.fetch_add(n as u64, Ordering::Relaxed);
        }

        Ok(received)
    }

    fn size(&self) -> u64 {
        self.size
    }
}
