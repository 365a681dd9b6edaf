//! Streaming download of the remote provider catalog.

use std::io::Read;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;

use crate::catalog::{CatalogNotice, CatalogStatusSink, ProviderCatalog};
use crate::catalog_cache::CatalogCacheStore;

pub const DEFAULT_CATALOG_REQUEST_TIMEOUT_MS: u64 = 60_000;
pub const DOWNLOAD_BLOCK_SIZE: usize = 8_192;

#[derive(Debug, Error)]
pub enum CatalogFetchError {
    #[error("failed to build catalog HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("'{url}' responded with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("failed to read catalog body from '{url}': {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid catalog JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CatalogFetchError {
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse(_))
    }
}

/// Receives download progress. `total_bytes` is zero when the server sent no length.
pub trait DownloadProgress {
    fn start(&mut self, total_bytes: u64);
    fn advance(&mut self, bytes: u64);
    fn finish(&mut self);
}

#[derive(Debug, Default)]
pub struct NoopDownloadProgress;

impl DownloadProgress for NoopDownloadProgress {
    fn start(&mut self, _total_bytes: u64) {}
    fn advance(&mut self, _bytes: u64) {}
    fn finish(&mut self) {}
}

#[derive(Debug, Default)]
/// Progress bar on stderr; a byte-counting spinner when the length is unknown.
pub struct TerminalDownloadProgress {
    bar: Option<ProgressBar>,
}

impl DownloadProgress for TerminalDownloadProgress {
    fn start(&mut self, total_bytes: u64) {
        let bar = if total_bytes > 0 {
            let bar = ProgressBar::new(total_bytes);
            bar.set_style(
                ProgressStyle::with_template(
                    "{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            bar
        } else {
            let bar = ProgressBar::new_spinner();
            bar.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg} {bytes}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            bar
        };
        bar.set_message("Downloading");
        self.bar = Some(bar);
    }

    fn advance(&mut self, bytes: u64) {
        if let Some(bar) = &self.bar {
            bar.inc(bytes);
        }
    }

    fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

/// Reads `reader` to the end in fixed-size blocks, reporting each non-empty block.
pub fn read_body_with_progress<R: Read>(
    mut reader: R,
    total_bytes: u64,
    progress: &mut dyn DownloadProgress,
) -> std::io::Result<Vec<u8>> {
    let mut body = Vec::with_capacity(usize::try_from(total_bytes).unwrap_or(0));
    let mut block = vec![0_u8; DOWNLOAD_BLOCK_SIZE];
    progress.start(total_bytes);
    loop {
        let read = match reader.read(&mut block) {
            Ok(0) => break,
            Ok(read) => read,
            Err(error) if error.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(error) => {
                progress.finish();
                return Err(error);
            }
        };
        body.extend_from_slice(&block[..read]);
        progress.advance(read as u64);
    }
    progress.finish();
    Ok(body)
}

/// One GET against `url`, decoded as a catalog object. No retries.
pub fn fetch_catalog_document(
    url: &str,
    request_timeout_ms: u64,
    progress: &mut dyn DownloadProgress,
) -> Result<ProviderCatalog, CatalogFetchError> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_millis(request_timeout_ms.max(1)))
        .build()
        .map_err(CatalogFetchError::Client)?;
    let response = client
        .get(url)
        .send()
        .map_err(|source| CatalogFetchError::Transport {
            url: url.to_string(),
            source,
        })?;
    if !response.status().is_success() {
        return Err(CatalogFetchError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    let total_bytes = response.content_length().unwrap_or(0);
    let body = read_body_with_progress(response, total_bytes, progress).map_err(|source| {
        CatalogFetchError::Body {
            url: url.to_string(),
            source,
        }
    })?;
    Ok(ProviderCatalog::parse(&body)?)
}

/// Fetches the catalog and persists it to `store`. Failures go to `status` and become `None`.
pub fn fetch_provider_catalog(
    url: &str,
    request_timeout_ms: u64,
    store: &CatalogCacheStore,
    progress: &mut dyn DownloadProgress,
    status: &mut dyn CatalogStatusSink,
) -> Option<ProviderCatalog> {
    match fetch_catalog_document(url, request_timeout_ms, progress) {
        Ok(catalog) => {
            if let Err(error) = store.write(&catalog) {
                tracing::warn!("provider cache not updated: {error:#}");
            }
            tracing::info!(url, entries = catalog.len(), "provider catalog refreshed");
            Some(catalog)
        }
        Err(error) if error.is_parse() => {
            tracing::debug!(url, %error, "provider catalog decode failed");
            status.notify(&CatalogNotice::InvalidCatalogJson);
            None
        }
        Err(error) => {
            status.notify(&CatalogNotice::FetchFailed(error.to_string()));
            None
        }
    }
}
