use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use crew_provider::{
    default_provider_cache_path, ProviderCatalogLoadOptions, DEFAULT_CATALOG_REQUEST_TIMEOUT_MS,
    DEFAULT_OLLAMA_EXECUTABLE, OLLAMA_LIST_TIMEOUT_MS, PROVIDER_CATALOG_URL,
};

use crate::CliOutputFormat;

const PROVIDER_CACHE_TTL_HOURS: u64 = 24;
const LOCAL_MODELS_TTL_SECS: u64 = 60;
const SECONDS_PER_HOUR: u64 = 60 * 60;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_non_empty_string(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("value must not be empty".to_string());
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Parser)]
#[command(
    name = "crew-setup",
    about = "Interactive provider and model selection for crew projects",
    version
)]
pub struct Cli {
    #[arg(
        long = "provider-cache",
        env = "CREW_PROVIDER_CACHE",
        help = "Provider catalog cache file. Defaults to ~/.crewai/provider_cache.json"
    )]
    pub provider_cache: Option<PathBuf>,

    #[arg(
        long = "provider-catalog-url",
        env = "CREW_PROVIDER_CATALOG_URL",
        default_value = PROVIDER_CATALOG_URL,
        value_parser = parse_non_empty_string,
        help = "URL of the remote provider catalog JSON document"
    )]
    pub provider_catalog_url: String,

    #[arg(
        long = "provider-cache-ttl-hours",
        env = "CREW_PROVIDER_CACHE_TTL_HOURS",
        default_value_t = PROVIDER_CACHE_TTL_HOURS,
        value_parser = parse_positive_u64,
        help = "Hours a cached provider catalog stays fresh"
    )]
    pub provider_cache_ttl_hours: u64,

    #[arg(
        long = "catalog-request-timeout-ms",
        env = "CREW_CATALOG_REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_CATALOG_REQUEST_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "Timeout in milliseconds for the provider catalog download"
    )]
    pub catalog_request_timeout_ms: u64,

    #[arg(
        long = "ollama-cli",
        env = "CREW_OLLAMA_CLI",
        default_value = DEFAULT_OLLAMA_EXECUTABLE,
        value_parser = parse_non_empty_string,
        help = "Ollama executable used to list locally installed models"
    )]
    pub ollama_cli: String,

    #[arg(
        long = "ollama-timeout-ms",
        env = "CREW_OLLAMA_TIMEOUT_MS",
        default_value_t = OLLAMA_LIST_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "Timeout in milliseconds for each local model listing attempt"
    )]
    pub ollama_timeout_ms: u64,

    #[arg(
        long = "local-models-ttl-secs",
        env = "CREW_LOCAL_MODELS_TTL_SECS",
        default_value_t = LOCAL_MODELS_TTL_SECS,
        value_parser = parse_positive_u64,
        help = "Seconds a non-empty local model listing is reused"
    )]
    pub local_models_ttl_secs: u64,

    #[arg(
        long,
        env = "CREW_OUTPUT",
        value_enum,
        default_value_t = CliOutputFormat::Text,
        help = "Format of the final selection report"
    )]
    pub output: CliOutputFormat,
}

impl Cli {
    pub fn resolved_provider_cache(&self) -> PathBuf {
        self.provider_cache
            .clone()
            .unwrap_or_else(default_provider_cache_path)
    }

    pub fn provider_cache_ttl(&self) -> Duration {
        Duration::from_secs(
            self.provider_cache_ttl_hours
                .saturating_mul(SECONDS_PER_HOUR),
        )
    }

    pub fn local_models_ttl(&self) -> Duration {
        Duration::from_secs(self.local_models_ttl_secs)
    }

    pub fn catalog_load_options(&self) -> ProviderCatalogLoadOptions {
        ProviderCatalogLoadOptions {
            cache_path: self.resolved_provider_cache(),
            catalog_url: self.provider_catalog_url.clone(),
            cache_ttl: self.provider_cache_ttl(),
            request_timeout_ms: self.catalog_request_timeout_ms,
        }
    }
}
