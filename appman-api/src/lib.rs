//! appman-api: Shared types for the appman application registry
//!
//! This crate defines the application record owned by the registry.
//! Permissions are opaque string labels; the registry decides which
//! operations on them are valid.

use serde::{Deserialize, Serialize};

/// An installed application and the permissions granted to it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct App {
    /// Application name (unique key within a registry)
    name: String,

    /// Granted permissions, in assignment order
    #[serde(default)]
    permissions: Vec<String>,
}

impl App {
    /// Create a new application record with no permissions
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: Vec::new(),
        }
    }

    /// Add a granted permission (builder style)
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    /// Application name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Granted permissions, in assignment order
    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }

    /// Append a permission to the grant list.
    ///
    /// Every grant is recorded as-is: assigning the same permission twice
    /// leaves two entries in the list.
    pub fn add_permission(&mut self, permission: impl Into<String>) {
        self.permissions.push(permission.into());
    }

    /// Remove every occurrence of `permission` from the grant list.
    ///
    /// Removing a permission that was never granted is a no-op.
    pub fn remove_permission(&mut self, permission: &str) {
        self.permissions.retain(|p| p != permission);
    }

    /// Number of granted permissions (duplicates counted)
    pub fn permission_count(&self) -> usize {
        self.permissions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_app_has_no_permissions() {
        let app = App::new("camera-tool");
        assert_eq!(app.name(), "camera-tool");
        assert!(app.permissions().is_empty());
    }

    #[test]
    fn test_add_permission_preserves_order() {
        let mut app = App::new("recorder");
        app.add_permission("Camera");
        app.add_permission("Microphone");

        assert_eq!(app.permissions(), ["Camera", "Microphone"]);
    }

    #[test]
    fn test_add_permission_keeps_duplicates() {
        let mut app = App::new("recorder");
        app.add_permission("Camera");
        app.add_permission("Camera");

        assert_eq!(app.permission_count(), 2);
    }

    #[test]
    fn test_remove_permission_drops_all_occurrences() {
        let mut app = App::new("recorder")
            .with_permission("Camera")
            .with_permission("Microphone")
            .with_permission("Camera");

        app.remove_permission("Camera");

        assert_eq!(app.permissions(), ["Microphone"]);
    }

    #[test]
    fn test_remove_absent_permission_is_noop() {
        let mut app = App::new("recorder").with_permission("Camera");
        app.remove_permission("Location");

        assert_eq!(app.permissions(), ["Camera"]);
    }
}
