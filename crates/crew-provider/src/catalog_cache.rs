//! On-disk cache for the provider catalog with mtime-based expiry.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result};
use crew_core::{elapsed_between, write_text_atomic};

use crate::catalog::ProviderCatalog;

pub const PROVIDER_CACHE_DIR_NAME: &str = ".crewai";
pub const PROVIDER_CACHE_FILE_NAME: &str = "provider_cache.json";
pub const PROVIDER_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// `<home>/.crewai/provider_cache.json`, or a working-directory relative path
/// when no home directory can be resolved.
pub fn default_provider_cache_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(PROVIDER_CACHE_DIR_NAME)
        .join(PROVIDER_CACHE_FILE_NAME)
}

#[derive(Debug, Clone, PartialEq)]
/// Outcome of a cache lookup. Only `Fresh` is usable; the rest mean "refresh".
pub enum CatalogCacheLookup {
    Fresh(ProviderCatalog),
    Missing,
    Expired { age: Duration },
    Corrupted { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogCacheStore {
    path: PathBuf,
    ttl: Duration,
}

impl CatalogCacheStore {
    pub fn new(path: PathBuf, ttl: Duration) -> Self {
        Self { path, ttl }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Age is checked before content, so an expired file is never parsed.
    pub fn load_at(&self, now: SystemTime) -> CatalogCacheLookup {
        let metadata = match std::fs::metadata(&self.path) {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return CatalogCacheLookup::Missing,
        };
        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(error) => {
                tracing::debug!(
                    path = %self.path.display(),
                    %error,
                    "provider cache mtime unavailable"
                );
                return CatalogCacheLookup::Missing;
            }
        };

        let age = elapsed_between(modified, now);
        if age >= self.ttl {
            return CatalogCacheLookup::Expired { age };
        }

        let payload = match std::fs::read(&self.path) {
            Ok(payload) => payload,
            Err(error) => {
                return CatalogCacheLookup::Corrupted {
                    reason: format!("failed to read {}: {error}", self.path.display()),
                }
            }
        };
        match ProviderCatalog::parse(&payload) {
            Ok(catalog) if catalog.is_empty() => CatalogCacheLookup::Corrupted {
                reason: "cache holds an empty catalog".to_string(),
            },
            Ok(catalog) => CatalogCacheLookup::Fresh(catalog),
            Err(error) => CatalogCacheLookup::Corrupted {
                reason: error.to_string(),
            },
        }
    }

    pub fn write(&self, catalog: &ProviderCatalog) -> Result<()> {
        let payload = catalog
            .to_json_string()
            .context("failed to serialize provider catalog")?;
        write_text_atomic(&self.path, &payload)
            .with_context(|| format!("failed to persist provider cache {}", self.path.display()))
    }
}
