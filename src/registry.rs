//! Workspace registry.
//!
//! Maps workspace ids and their optional display names to credentials. The
//! registry is built once from validated configuration and is read-only for
//! the life of the process, so it is shared across request tasks behind an
//! `Arc` with no locking.
//!
//! Ids and names share one string namespace: both are accepted in the same
//! URL segment, and a name may itself look like a UUID.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::config::{ConfigError, WorkspaceEntry};

static WORKSPACE_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$")
        .expect("valid regex")
});

/// Returns `true` if `token` has the canonical lowercase UUID shape.
pub fn is_workspace_id(token: &str) -> bool {
    WORKSPACE_ID_PATTERN.is_match(token)
}

/// A log destination and the key used to sign requests for it.
#[derive(Clone, PartialEq, Eq)]
pub struct Workspace {
    id: String,
    name: Option<String>,
    secret: String,
}

impl Workspace {
    /// Canonical workspace id (lowercase UUID).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Optional alias.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Base64-encoded shared key.
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Workspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workspace")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Immutable id and name indices over one set of workspaces.
#[derive(Debug)]
pub struct WorkspaceRegistry {
    by_id: HashMap<String, Arc<Workspace>>,
    by_name: HashMap<String, Arc<Workspace>>,
}

impl WorkspaceRegistry {
    /// Validate `entries` in order and build both indices.
    ///
    /// The first invalid entry aborts construction; nothing partially built
    /// escapes.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NoWorkspaces`] for an empty list
    /// - [`ConfigError::MissingWorkspaceId`], [`ConfigError::InvalidWorkspaceId`],
    ///   [`ConfigError::DuplicateWorkspaceId`], [`ConfigError::MissingSecret`],
    ///   [`ConfigError::DuplicateWorkspaceName`] for the first bad entry
    pub fn build(entries: &[WorkspaceEntry]) -> Result<Self, ConfigError> {
        if entries.is_empty() {
            return Err(ConfigError::NoWorkspaces);
        }

        let mut by_id: HashMap<String, Arc<Workspace>> = HashMap::with_capacity(entries.len());
        let mut by_name: HashMap<String, Arc<Workspace>> = HashMap::new();

        for entry in entries {
            if entry.id.is_empty() {
                return Err(ConfigError::MissingWorkspaceId {
                    entry: entry.to_string(),
                });
            }
            if !is_workspace_id(&entry.id) {
                return Err(ConfigError::InvalidWorkspaceId {
                    id: entry.id.clone(),
                });
            }
            if by_id.contains_key(&entry.id) {
                return Err(ConfigError::DuplicateWorkspaceId {
                    id: entry.id.clone(),
                });
            }
            if entry.secret.is_empty() {
                return Err(ConfigError::MissingSecret {
                    id: entry.id.clone(),
                });
            }

            let workspace = Arc::new(Workspace {
                id: entry.id.clone(),
                name: (!entry.name.is_empty()).then(|| entry.name.clone()),
                secret: entry.secret.clone(),
            });
            by_id.insert(entry.id.clone(), Arc::clone(&workspace));

            if let Some(name) = workspace.name() {
                if by_name.contains_key(name) {
                    return Err(ConfigError::DuplicateWorkspaceName {
                        name: name.to_string(),
                    });
                }
                by_name.insert(name.to_string(), Arc::clone(&workspace));
            }
        }

        Ok(Self { by_id, by_name })
    }

    /// Resolve a URL token to a workspace.
    ///
    /// UUID-shaped tokens are tried as ids first and then as names. Any other
    /// token can only be a name.
    pub fn resolve(&self, token: &str) -> Option<&Workspace> {
        if is_workspace_id(token) {
            if let Some(workspace) = self.by_id.get(token) {
                return Some(workspace);
            }
        }
        self.by_name.get(token).map(|w| w.as_ref())
    }

    /// Number of configured workspaces.
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Number of workspaces that carry a name.
    pub fn named_len(&self) -> usize {
        self.by_name.len()
    }
}
