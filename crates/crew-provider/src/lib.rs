//! Provider catalog, cache, and local model discovery for the crew setup flow.
//!
//! Resolves the remote provider catalog through a time-bounded on-disk cache,
//! groups catalog models by provider, and enumerates models served by a local
//! Ollama daemon.

mod catalog;
mod catalog_cache;
mod catalog_fetch;
mod cli_executable;
mod local_models;
mod provider_defaults;
mod provider_index;

pub use catalog::*;
pub use catalog_cache::*;
pub use catalog_fetch::*;
pub use cli_executable::resolve_executable;
pub use local_models::*;
pub use provider_defaults::*;
pub use provider_index::*;
