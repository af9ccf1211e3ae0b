//! Audit trail for registry events
//!
//! Provides a trait-based audit system so hosts can route registry
//! events (installs, uninstalls, permission changes, rejections) to
//! their preferred destination.

use crate::registry::RegistryOutcome;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};
use thiserror::Error;

/// Event timestamp, seconds since the Unix epoch
pub type Timestamp = u64;

fn now_unix() -> Timestamp {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Audit event describing one registry operation
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Timestamp of the event
    pub timestamp: Timestamp,
    /// Type of event
    pub event_type: AuditEventType,
    /// Application name the operation targeted
    pub app: String,
    /// Additional details
    pub details: AuditDetails,
}

impl AuditEvent {
    /// Create a new audit event
    pub fn new(event_type: AuditEventType, app: impl Into<String>, details: AuditDetails) -> Self {
        Self {
            timestamp: now_unix(),
            event_type,
            app: app.into(),
            details,
        }
    }
}

/// Type of audit event
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// An application was installed
    AppInstalled,
    /// An application was uninstalled
    AppUninstalled,
    /// A permission was granted to an application
    PermissionAssigned,
    /// A permission was revoked from an application
    PermissionRevoked,
    /// An operation was rejected and left the registry unchanged
    OperationRejected,
}

/// Details about the audit event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum AuditDetails {
    /// Install/uninstall details
    Lifecycle {
        /// Number of installed applications after the operation
        installed: usize,
    },
    /// Permission grant/revoke details
    Permission { permission: String },
    /// Why a rejected operation was refused
    Rejection { outcome: RegistryOutcome },
}

/// Error type for audit operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to write audit log: {0}")]
    WriteError(#[from] std::io::Error),

    #[error("failed to serialize audit event: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Trait for audit event sinks
///
/// Hosts implement this trait to customize where audit events are sent.
pub trait AuditSink: Send + Sync {
    /// Record an audit event
    fn record(&self, event: AuditEvent) -> Result<(), AuditError>;

    /// Flush any buffered events
    fn flush(&self) -> Result<(), AuditError>;

    /// Check if the sink is healthy/available
    fn is_healthy(&self) -> bool {
        true
    }
}

// ============================================================================
// File-based Audit Sink
// ============================================================================

/// File-based audit sink (JSONL format)
///
/// Appends one JSON object per line to the log file.
pub struct FileAuditSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileAuditSink {
    /// Create a new file audit sink, creating parent directories if needed
    pub fn new(path: impl AsRef<Path>) -> Result<Self, AuditError> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Get the log file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        let json = serde_json::to_string(&event)?;
        let mut writer = self.writer.lock().unwrap();
        writeln!(writer, "{}", json)?;
        Ok(())
    }

    fn flush(&self) -> Result<(), AuditError> {
        let mut writer = self.writer.lock().unwrap();
        writer.flush()?;
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.path.parent().map(|p| p.exists()).unwrap_or(true)
    }
}

impl fmt::Debug for FileAuditSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileAuditSink")
            .field("path", &self.path)
            .finish()
    }
}

// ============================================================================
// In-Memory Audit Sink
// ============================================================================

/// In-memory audit sink for testing or session-only inspection
///
/// Keeps at most `max_events` events, evicting the oldest first.
pub struct MemoryAuditSink {
    events: RwLock<VecDeque<AuditEvent>>,
    max_events: usize,
}

impl MemoryAuditSink {
    /// Create a new memory sink with default capacity (1000 events)
    pub fn new() -> Self {
        Self::with_capacity(1000)
    }

    /// Create a new memory sink with specified capacity (at least one event)
    pub fn with_capacity(max_events: usize) -> Self {
        Self {
            events: RwLock::new(VecDeque::new()),
            max_events: max_events.max(1),
        }
    }

    /// Get all recorded events, oldest first
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.read().unwrap().iter().cloned().collect()
    }

    /// Get event count
    pub fn count(&self) -> usize {
        self.events.read().unwrap().len()
    }

    /// Clear all events
    pub fn clear(&self) {
        self.events.write().unwrap().clear();
    }

    /// Find events by type
    pub fn find_by_type(&self, event_type: AuditEventType) -> Vec<AuditEvent> {
        self.events
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Find events by application name
    pub fn find_by_app(&self, app: &str) -> Vec<AuditEvent> {
        self.events
            .read()
            .unwrap()
            .iter()
            .filter(|e| e.app == app)
            .cloned()
            .collect()
    }
}

impl Default for MemoryAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        let mut events = self.events.write().unwrap();
        while events.len() >= self.max_events {
            let _ = events.pop_front();
        }
        events.push_back(event);
        Ok(())
    }

    fn flush(&self) -> Result<(), AuditError> {
        Ok(())
    }
}

impl fmt::Debug for MemoryAuditSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryAuditSink")
            .field("count", &self.count())
            .field("max_events", &self.max_events)
            .finish()
    }
}

/// Null audit sink (discards all events)
#[derive(Debug, Default)]
pub struct NullAuditSink;

impl NullAuditSink {
    pub fn new() -> Self {
        Self
    }
}

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) -> Result<(), AuditError> {
        Ok(())
    }

    fn flush(&self) -> Result<(), AuditError> {
        Ok(())
    }
}

/// Composite audit sink that writes to multiple sinks
pub struct CompositeAuditSink {
    sinks: Vec<Box<dyn AuditSink>>,
}

impl CompositeAuditSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with_sink(mut self, sink: impl AuditSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }
}

impl Default for CompositeAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditSink for CompositeAuditSink {
    fn record(&self, event: AuditEvent) -> Result<(), AuditError> {
        for sink in &self.sinks {
            sink.record(event.clone())?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), AuditError> {
        for sink in &self.sinks {
            sink.flush()?;
        }
        Ok(())
    }

    fn is_healthy(&self) -> bool {
        self.sinks.iter().all(|s| s.is_healthy())
    }
}

impl fmt::Debug for CompositeAuditSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeAuditSink")
            .field("sink_count", &self.sinks.len())
            .finish()
    }
}

// ============================================================================
// Helper functions
// ============================================================================

/// Create an audit event for an app install
pub fn app_installed(app: &str, installed: usize) -> AuditEvent {
    AuditEvent::new(
        AuditEventType::AppInstalled,
        app,
        AuditDetails::Lifecycle { installed },
    )
}

/// Create an audit event for an app uninstall
pub fn app_uninstalled(app: &str, installed: usize) -> AuditEvent {
    AuditEvent::new(
        AuditEventType::AppUninstalled,
        app,
        AuditDetails::Lifecycle { installed },
    )
}

/// Create an audit event for a permission grant
pub fn permission_assigned(app: &str, permission: &str) -> AuditEvent {
    AuditEvent::new(
        AuditEventType::PermissionAssigned,
        app,
        AuditDetails::Permission {
            permission: permission.to_string(),
        },
    )
}

/// Create an audit event for a permission revocation
pub fn permission_revoked(app: &str, permission: &str) -> AuditEvent {
    AuditEvent::new(
        AuditEventType::PermissionRevoked,
        app,
        AuditDetails::Permission {
            permission: permission.to_string(),
        },
    )
}

/// Create an audit event for a rejected operation
pub fn operation_rejected(app: &str, outcome: RegistryOutcome) -> AuditEvent {
    AuditEvent::new(
        AuditEventType::OperationRejected,
        app,
        AuditDetails::Rejection { outcome },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink() {
        let sink = MemoryAuditSink::new();

        sink.record(app_installed("WhatsApp", 1)).unwrap();
        sink.record(permission_assigned("WhatsApp", "Camera")).unwrap();

        assert_eq!(sink.count(), 2);
        let events = sink.find_by_type(AuditEventType::AppInstalled);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].app, "WhatsApp");
    }

    #[test]
    fn test_memory_sink_find_by_app() {
        let sink = MemoryAuditSink::new();

        sink.record(app_installed("WhatsApp", 1)).unwrap();
        sink.record(app_installed("Spotify", 2)).unwrap();
        sink.record(permission_assigned("Spotify", "Microphone"))
            .unwrap();

        assert_eq!(sink.find_by_app("Spotify").len(), 2);
        assert_eq!(sink.find_by_app("WhatsApp").len(), 1);
    }

    #[test]
    fn test_memory_sink_eviction() {
        let sink = MemoryAuditSink::with_capacity(2);

        for i in 0..3 {
            sink.record(app_installed(&format!("app-{}", i), i + 1))
                .unwrap();
        }

        assert_eq!(sink.count(), 2);
        let events = sink.events();
        assert_eq!(events[0].app, "app-1");
        assert_eq!(events[1].app, "app-2");
    }

    #[test]
    fn test_null_sink() {
        let sink = NullAuditSink::new();

        assert!(sink.record(app_installed("WhatsApp", 1)).is_ok());
        assert!(sink.flush().is_ok());
    }

    #[test]
    fn test_composite_sink() {
        let sink = CompositeAuditSink::new()
            .with_sink(MemoryAuditSink::new())
            .with_sink(NullAuditSink::new());

        sink.record(permission_revoked("WhatsApp", "Camera")).unwrap();
        sink.flush().unwrap();
        assert!(sink.is_healthy());
    }

    #[test]
    fn test_event_serialization() {
        let event = permission_assigned("WhatsApp", "Camera");

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("permission_assigned"));
        assert!(json.contains("WhatsApp"));
        assert!(json.contains("Camera"));
    }

    #[test]
    fn test_rejection_serialization() {
        let event = operation_rejected("", RegistryOutcome::InvalidInput);

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("operation_rejected"));
        assert!(json.contains("invalid_input"));
    }

    #[test]
    fn test_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");

        let sink = FileAuditSink::new(&path).unwrap();
        sink.record(app_installed("WhatsApp", 1)).unwrap();
        sink.record(app_uninstalled("WhatsApp", 0)).unwrap();
        sink.flush().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        for line in content.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert_eq!(value["app"], "WhatsApp");
        }
    }
}
