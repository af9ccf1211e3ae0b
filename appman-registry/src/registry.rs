//! Application registry keyed by app name
//!
//! Provides install, uninstall, assign, revoke and list operations over
//! an in-memory map of application records. Failures are soft: an
//! invalid or inapplicable operation leaves the registry unchanged and
//! reports a [`RegistryOutcome`] instead of returning an error.

use crate::audit::{self, AuditEvent, AuditSink, NullAuditSink};
use appman_api::App;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Registry of installed applications
///
/// The registry exclusively owns every [`App`] record it holds; records
/// are created on install and dropped on uninstall. The map is ordered
/// so enumeration is deterministic (ascending app name).
pub struct AppRegistry {
    apps: BTreeMap<String, App>,
    audit: Arc<dyn AuditSink>,
}

impl AppRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            apps: BTreeMap::new(),
            audit: Arc::new(NullAuditSink),
        }
    }

    /// Create a registry that records events to the given audit sink
    pub fn with_audit(audit: Arc<dyn AuditSink>) -> Self {
        Self {
            apps: BTreeMap::new(),
            audit,
        }
    }

    /// Install an application under `name` with an empty permission list.
    ///
    /// An empty name is rejected, and installing an already-installed
    /// app leaves the existing record and its permissions untouched.
    pub fn install(&mut self, name: &str) -> RegistryOutcome {
        if name.is_empty() {
            tracing::warn!("install rejected: empty app name");
            return self.reject(name, RegistryOutcome::InvalidInput);
        }
        if self.apps.contains_key(name) {
            tracing::warn!(app = %name, "install rejected: app already exists");
            return self.reject(name, RegistryOutcome::AlreadyExists);
        }

        self.apps.insert(name.to_string(), App::new(name));
        tracing::info!(app = %name, "app installed");
        self.record(audit::app_installed(name, self.apps.len()));
        RegistryOutcome::Success
    }

    /// Uninstall the application under `name`, discarding its record and
    /// every permission granted to it.
    pub fn uninstall(&mut self, name: &str) -> RegistryOutcome {
        if self.apps.remove(name).is_none() {
            tracing::warn!(app = %name, "uninstall rejected: app not found");
            return self.reject(name, RegistryOutcome::NotFound);
        }

        tracing::info!(app = %name, "app uninstalled");
        self.record(audit::app_uninstalled(name, self.apps.len()));
        RegistryOutcome::Success
    }

    /// Grant `permission` to the named application.
    ///
    /// Grants are appended in order and never deduplicated: assigning
    /// the same permission twice records it twice.
    pub fn assign_permission(&mut self, name: &str, permission: &str) -> RegistryOutcome {
        if permission.is_empty() {
            tracing::warn!(app = %name, "assign rejected: empty permission");
            return self.reject(name, RegistryOutcome::InvalidInput);
        }

        match self.apps.get_mut(name) {
            Some(app) => {
                app.add_permission(permission);
                tracing::info!(app = %name, permission = %permission, "permission assigned");
                self.record(audit::permission_assigned(name, permission));
                RegistryOutcome::Success
            }
            None => {
                tracing::warn!(app = %name, "assign rejected: app not found");
                self.reject(name, RegistryOutcome::NotFound)
            }
        }
    }

    /// Revoke every occurrence of `permission` from the named application.
    ///
    /// Revoking a permission the app never held succeeds without effect;
    /// an empty permission string simply matches nothing.
    pub fn revoke_permission(&mut self, name: &str, permission: &str) -> RegistryOutcome {
        match self.apps.get_mut(name) {
            Some(app) => {
                app.remove_permission(permission);
                tracing::info!(app = %name, permission = %permission, "permission revoked");
                self.record(audit::permission_revoked(name, permission));
                RegistryOutcome::Success
            }
            None => {
                tracing::warn!(app = %name, "revoke rejected: app not found");
                self.reject(name, RegistryOutcome::NotFound)
            }
        }
    }

    /// Names of all installed applications, in ascending name order
    pub fn list_installed_apps(&self) -> Vec<String> {
        self.apps.keys().cloned().collect()
    }

    /// Permissions granted to the named application, in assignment order.
    ///
    /// Unknown names yield an empty list, never an error.
    pub fn list_app_permissions(&self, name: &str) -> Vec<String> {
        self.apps
            .get(name)
            .map(|app| app.permissions().to_vec())
            .unwrap_or_default()
    }

    /// Check if an application is installed
    pub fn contains(&self, name: &str) -> bool {
        self.apps.contains_key(name)
    }

    /// Borrow the record of an installed application
    pub fn get(&self, name: &str) -> Option<&App> {
        self.apps.get(name)
    }

    /// Number of installed applications
    pub fn len(&self) -> usize {
        self.apps.len()
    }

    /// Check if the registry has no installed applications
    pub fn is_empty(&self) -> bool {
        self.apps.is_empty()
    }

    fn reject(&self, name: &str, outcome: RegistryOutcome) -> RegistryOutcome {
        self.record(audit::operation_rejected(name, outcome));
        outcome
    }

    // Audit failures must not surface through registry operations.
    fn record(&self, event: AuditEvent) {
        if let Err(err) = self.audit.record(event) {
            tracing::warn!(error = %err, "failed to record audit event");
        }
    }
}

impl Default for AppRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AppRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppRegistry")
            .field("installed", &self.apps.len())
            .finish_non_exhaustive()
    }
}

/// Status of a registry operation
///
/// Failures never panic and never leave partial state; the outcome
/// reports why nothing changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryOutcome {
    /// Operation applied
    Success,
    /// Empty app name on install, or empty permission on assign
    InvalidInput,
    /// Install target is already present
    AlreadyExists,
    /// No application installed under the given name
    NotFound,
}

impl RegistryOutcome {
    /// Whether the operation was accepted
    pub fn is_success(self) -> bool {
        matches!(self, RegistryOutcome::Success)
    }
}
