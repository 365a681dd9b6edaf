//! Groups catalog models under their normalized provider tag.

use std::collections::HashMap;

use serde_json::Value;

use crate::catalog::ProviderCatalog;

/// Catalog property holding the provider tag.
pub const PROVIDER_TAG_FIELD: &str = "litellm_provider";

const EXCLUDED_PROVIDER_TAG: &str = "other";
const EXCLUDED_PROVIDER_SUBSTRING: &str = "http";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Provider name to model names, both in catalog order.
pub struct ProviderIndex {
    providers: Vec<String>,
    models: HashMap<String, Vec<String>>,
}

impl ProviderIndex {
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Provider keys in first-seen order.
    pub fn providers(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(String::as_str)
    }

    pub fn models_for(&self, provider: &str) -> &[String] {
        self.models
            .get(provider)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn push(&mut self, provider: String, model: &str) {
        match self.models.get_mut(&provider) {
            Some(models) => models.push(model.to_string()),
            None => {
                self.providers.push(provider.clone());
                self.models.insert(provider, vec![model.to_string()]);
            }
        }
    }
}

/// Trims and lower-cases a raw provider tag, returning `None` for tags that
/// must not appear in the index: empty, `other`, or containing `http`.
pub fn normalize_provider_tag(raw: &str) -> Option<String> {
    let normalized = raw.trim().to_lowercase();
    if normalized.is_empty()
        || normalized == EXCLUDED_PROVIDER_TAG
        || normalized.contains(EXCLUDED_PROVIDER_SUBSTRING)
    {
        return None;
    }
    Some(normalized)
}

fn provider_tag(properties: &Value) -> &str {
    properties
        .get(PROVIDER_TAG_FIELD)
        .and_then(Value::as_str)
        .unwrap_or_default()
}

/// Builds the provider index. Duplicate model names within a provider are kept.
pub fn build_provider_index(catalog: &ProviderCatalog) -> ProviderIndex {
    let mut index = ProviderIndex::default();
    let mut skipped = 0_usize;
    for (model, properties) in catalog.iter() {
        match normalize_provider_tag(provider_tag(properties)) {
            Some(provider) => index.push(provider, model),
            None => skipped += 1,
        }
    }
    tracing::debug!(
        providers = index.len(),
        skipped,
        "built provider index from catalog"
    );
    index
}
