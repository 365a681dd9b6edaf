#![no_main]

use crew_provider::{build_provider_index, ProviderCatalog};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(catalog) = ProviderCatalog::parse(data) else {
        return;
    };
    let index = build_provider_index(&catalog);
    let mut indexed_models = 0;
    for provider in index.providers() {
        assert!(!provider.is_empty());
        assert_ne!(provider, "other");
        assert!(!provider.contains("http"));
        indexed_models += index.models_for(provider).len();
    }
    assert!(indexed_models <= catalog.len());
});
