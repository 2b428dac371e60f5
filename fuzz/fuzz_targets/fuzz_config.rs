#![no_main]

//! Fuzz target for configuration parsing and workspace validation.
//!
//! Arbitrary documents, plain and base64-encoded, must either load or fail
//! with a `ConfigError`; a built registry must resolve every configured id
//! and name back to its own entry.
//!
//! ```bash
//! cargo fuzz run fuzz_config
//! ```

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use data_proxy::config::{load_config_base64, load_config_str};
use data_proxy::forwarder::ForwarderConfig;
use data_proxy::registry::WorkspaceRegistry;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        let _ = load_config_base64(&STANDARD.encode(data));
        return;
    };

    let Ok(config) = load_config_str(text) else {
        return;
    };

    let _ = config.listen_addr();
    let _ = ForwarderConfig::from_backend(&config.backend);

    let Ok(registry) = WorkspaceRegistry::build(&config.workspaces) else {
        return;
    };
    for entry in &config.workspaces {
        let by_id = registry.resolve(&entry.id).map(|w| w.id());
        assert_eq!(by_id, Some(entry.id.as_str()));
        if !entry.name.is_empty() {
            assert!(registry.resolve(&entry.name).is_some());
        }
    }
});
