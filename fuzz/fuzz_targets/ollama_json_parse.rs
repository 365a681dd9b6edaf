#![no_main]

use crew_provider::parse_structured_model_list;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    if let Ok(models) = parse_structured_model_list(&raw) {
        assert!(models.iter().all(|model| !model.is_empty()));
    }
});
