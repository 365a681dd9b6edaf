//! Provider catalog document and the cache-first loading flow.
//!
//! The catalog is the raw remote JSON object mapping model names to property
//! records. It is cached verbatim on disk and refreshed from the network when
//! the cache is missing, expired, or unreadable.

use std::path::PathBuf;
use std::time::Duration;

use crew_core::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::catalog_cache::{CatalogCacheLookup, CatalogCacheStore, PROVIDER_CACHE_TTL};
use crate::catalog_fetch::{
    fetch_provider_catalog, DownloadProgress, DEFAULT_CATALOG_REQUEST_TIMEOUT_MS,
};
use crate::provider_defaults::PROVIDER_CATALOG_URL;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
/// Remote catalog keyed by model name, in document order.
pub struct ProviderCatalog(Map<String, Value>);

impl ProviderCatalog {
    /// Parses a catalog document. Anything other than a JSON object is rejected.
    pub fn parse(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Wraps an already-decoded JSON value when it is an object.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(model, properties)| (model.as_str(), properties))
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Where and how the provider catalog is resolved.
pub struct ProviderCatalogLoadOptions {
    pub cache_path: PathBuf,
    pub catalog_url: String,
    pub cache_ttl: Duration,
    pub request_timeout_ms: u64,
}

impl ProviderCatalogLoadOptions {
    pub fn with_cache_path(cache_path: PathBuf) -> Self {
        Self {
            cache_path,
            catalog_url: PROVIDER_CATALOG_URL.to_string(),
            cache_ttl: PROVIDER_CACHE_TTL,
            request_timeout_ms: DEFAULT_CATALOG_REQUEST_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// User-facing status produced while resolving the catalog.
pub enum CatalogNotice {
    CacheCorrupted,
    CacheUnavailable,
    InvalidCatalogJson,
    FetchFailed(String),
}

impl CatalogNotice {
    pub fn message(&self) -> String {
        match self {
            Self::CacheCorrupted => {
                "Cache is corrupted. Fetching provider data from the web...".to_string()
            }
            Self::CacheUnavailable => {
                "Cache expired or not found. Fetching provider data from the web...".to_string()
            }
            Self::InvalidCatalogJson => {
                "Error parsing provider data. Invalid JSON format.".to_string()
            }
            Self::FetchFailed(error) => format!("Error fetching provider data: {error}"),
        }
    }
}

/// Receives catalog status notices; the wizard routes them to its terminal.
pub trait CatalogStatusSink {
    fn notify(&mut self, notice: &CatalogNotice);
}

impl<F> CatalogStatusSink for F
where
    F: FnMut(&CatalogNotice),
{
    fn notify(&mut self, notice: &CatalogNotice) {
        self(notice)
    }
}

/// Returns the cached catalog while it is fresh, otherwise fetches and re-caches it.
///
/// Never fails: every cache or network problem is reported to `status` and
/// collapses into `None`.
pub fn load_provider_catalog(
    options: &ProviderCatalogLoadOptions,
    clock: &dyn Clock,
    progress: &mut dyn DownloadProgress,
    status: &mut dyn CatalogStatusSink,
) -> Option<ProviderCatalog> {
    let store = CatalogCacheStore::new(options.cache_path.clone(), options.cache_ttl);
    match store.load_at(clock.now()) {
        CatalogCacheLookup::Fresh(catalog) => {
            tracing::debug!(
                path = %store.path().display(),
                entries = catalog.len(),
                "provider catalog cache hit"
            );
            return Some(catalog);
        }
        CatalogCacheLookup::Corrupted { reason } => {
            tracing::debug!(path = %store.path().display(), %reason, "provider catalog cache corrupted");
            status.notify(&CatalogNotice::CacheCorrupted);
        }
        CatalogCacheLookup::Expired { age } => {
            tracing::debug!(
                path = %store.path().display(),
                age_secs = age.as_secs(),
                "provider catalog cache expired"
            );
            status.notify(&CatalogNotice::CacheUnavailable);
        }
        CatalogCacheLookup::Missing => status.notify(&CatalogNotice::CacheUnavailable),
    }

    fetch_provider_catalog(
        &options.catalog_url,
        options.request_timeout_ms,
        &store,
        progress,
        status,
    )
}
