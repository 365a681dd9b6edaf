#![no_main]

use crew_provider::parse_plain_model_table;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let raw = String::from_utf8_lossy(data);
    for model in parse_plain_model_table(&raw) {
        assert!(!model.is_empty());
        assert!(!model.chars().any(char::is_whitespace));
        let upper = model.to_uppercase();
        assert!(!["NAME", "ID", "SIZE"].iter().any(|keyword| upper.contains(keyword)));
    }
});
