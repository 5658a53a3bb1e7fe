//! Port infrastructure
//!
//! The claims engine talks to every collaborator (vehicle registry, inventory,
//! work orders, notifications, archival) through a port trait. Ports share the
//! `PortError` taxonomy so the engine can map collaborator failures onto its
//! own error surface uniformly, and so advisory effects can log any failure
//! the same way regardless of which collaborator produced it.

use std::fmt;
use thiserror::Error;

/// Error type for port operations
#[derive(Debug, Error)]
pub enum PortError {
    /// The requested entity was not found
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// A validation error occurred
    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    /// The operation conflicts with existing data
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Authentication or authorization failed
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Connection to the underlying system failed
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An internal error occurred
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Creates a Validation error with field information
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Creates a Conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    /// Creates an Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        PortError::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if this error indicates the entity was not found
    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    /// Returns true if this error indicates a transient collaborator failure
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. })
    }
}

/// Marker trait for all domain ports
///
/// All port traits extend this marker so implementations are thread-safe
/// and usable in async contexts.
pub trait DomainPort: Send + Sync + 'static {}
