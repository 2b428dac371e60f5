//! Startup path: config document → registry → forwarder settings.

use std::path::PathBuf;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use data_proxy::config::{ConfigError, load_from_sources};
use data_proxy::forwarder::ForwarderConfig;
use data_proxy::registry::WorkspaceRegistry;
use uuid::Uuid;

/// Temp file removed on drop.
struct TempConfig(PathBuf);

impl TempConfig {
    fn new(contents: &str) -> Self {
        let path = std::env::temp_dir().join(format!("data-proxy-{}.yaml", Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        Self(path)
    }
}

impl Drop for TempConfig {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn document(ids: &[String]) -> String {
    let mut doc = String::from(
        "listen_port: 4100\nbackend:\n  timeout: 30s\nworkspaces:\n",
    );
    for (i, id) in ids.iter().enumerate() {
        doc.push_str(&format!(
            "  - id: {id}\n    name: team-{i}\n    secret: c2VjcmV0\n"
        ));
    }
    doc
}

#[test]
fn test_file_and_env_sources_agree() {
    let ids: Vec<String> = (0..5).map(|_| Uuid::new_v4().to_string()).collect();
    let doc = document(&ids);
    let file = TempConfig::new(&doc);
    let encoded = STANDARD.encode(&doc);

    let from_file = load_from_sources(Some(&file.0), None).unwrap();
    let from_env = load_from_sources(None, Some(&encoded)).unwrap();
    assert_eq!(from_file, from_env);

    // A path wins over the encoded value.
    let from_both = load_from_sources(Some(&file.0), Some("not base64")).unwrap();
    assert_eq!(from_both, from_file);

    assert_eq!(from_file.listen_addr(), "0.0.0.0:4100");

    let registry = WorkspaceRegistry::build(&from_file.workspaces).unwrap();
    assert_eq!(registry.len(), 5);
    assert_eq!(registry.named_len(), 5);
    for (i, id) in ids.iter().enumerate() {
        assert_eq!(registry.resolve(id).map(|w| w.id()), Some(id.as_str()));
        assert_eq!(
            registry.resolve(&format!("team-{i}")).map(|w| w.id()),
            Some(id.as_str())
        );
    }

    let forwarder = ForwarderConfig::from_backend(&from_file.backend).unwrap();
    assert_eq!(forwarder.timeout, Some(Duration::from_secs(30)));
    assert_eq!(
        forwarder.endpoint(&ids[0]),
        format!(
            "https://{}.ods.opinsights.azure.com/api/logs?api-version=2016-04-01",
            ids[0]
        )
    );
}

#[test]
fn test_uppercase_id_is_rejected_at_startup() {
    let id = Uuid::new_v4().to_string().to_uppercase();
    let file = TempConfig::new(&document(std::slice::from_ref(&id)));

    let config = load_from_sources(Some(&file.0), None).unwrap();
    let err = WorkspaceRegistry::build(&config.workspaces).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidWorkspaceId { .. }));
    assert_eq!(err.to_string(), format!("{id} is not a valid workspace ID"));
}

#[test]
fn test_duplicate_name_is_rejected_at_startup() {
    let doc = format!(
        "workspaces:\n  - id: {}\n    name: shared\n    secret: a\n  - id: {}\n    name: shared\n    secret: b\n",
        Uuid::new_v4(),
        Uuid::new_v4()
    );
    let config = load_from_sources(None, Some(&STANDARD.encode(doc))).unwrap();
    let err = WorkspaceRegistry::build(&config.workspaces).unwrap_err();
    assert_eq!(err.to_string(), "found duplicate workspace name (shared)");
}

#[test]
fn test_no_source_is_an_error() {
    let err = load_from_sources(None, Some("   ")).unwrap_err();
    assert!(matches!(err, ConfigError::NoConfigSource { .. }));
}
