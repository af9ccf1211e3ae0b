//! appman-registry: In-memory application registry
//!
//! This crate provides the registry that tracks installed applications
//! and the permissions granted to each, plus an audit layer for
//! recording registry events.

pub mod audit;
pub mod registry;

pub use appman_api::App;
pub use audit::{AuditDetails, AuditError, AuditEvent, AuditEventType, AuditSink};
pub use audit::{CompositeAuditSink, FileAuditSink, MemoryAuditSink, NullAuditSink};
pub use registry::{AppRegistry, RegistryOutcome};
