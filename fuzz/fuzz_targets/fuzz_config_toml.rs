//! Fuzz target for `infraguard.toml` parsing and resolution.
//!
//! Run with:
//! ```bash
//! cargo +nightly fuzz run fuzz_config_toml
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data)
        && let Ok(cfg) = infraguard_settings::parse_config_toml(text)
    {
        let _ = infraguard_settings::resolve_config(cfg, infraguard_settings::Overrides::default());
    }
});
