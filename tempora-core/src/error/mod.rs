//! Core error types for Tempora

use thiserror::Error;

use crate::types::{NodeId, NodeKind};

/// Main error type for Tempora operations
#[derive(Error, Debug)]
pub enum TemporaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown document: {0}")]
    UnknownDocument(String),

    #[error("Unknown node: {0}")]
    UnknownNode(String),

    #[error("Unknown namespace prefix: {0}")]
    UnknownNamespacePrefix(String),

    #[error("Ambiguous namespace prefix '{prefix}': {bindings} bindings")]
    AmbiguousNamespacePrefix { prefix: String, bindings: usize },

    #[error("Invalid position {position} among {siblings} sibling(s)")]
    InvalidPosition { position: i64, siblings: usize },

    #[error("Cycle detected: node {node} cannot be moved under {target}")]
    CycleDetected { node: NodeId, target: NodeId },

    #[error("Not an element: node {0} is {1}")]
    NotAnElement(NodeId, NodeKind),

    #[error("Inconsistent ordering state: {0}")]
    InconsistentOrderingState(String),
}

/// Result type alias for Tempora operations
pub type TemporaResult<T> = Result<T, TemporaError>;

impl TemporaError {
    /// Errors caused by the caller's request rather than the store
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            TemporaError::InvalidInput(_)
                | TemporaError::UnknownDocument(_)
                | TemporaError::UnknownNode(_)
                | TemporaError::UnknownNamespacePrefix(_)
                | TemporaError::AmbiguousNamespacePrefix { .. }
                | TemporaError::InvalidPosition { .. }
                | TemporaError::CycleDetected { .. }
                | TemporaError::NotAnElement(..)
        )
    }
}

// Conversion implementations for common error types
impl From<serde_json::Error> for TemporaError {
    fn from(err: serde_json::Error) -> Self {
        TemporaError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for TemporaError {
    fn from(err: anyhow::Error) -> Self {
        TemporaError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let io_error = TemporaError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        assert!(format!("{}", io_error).contains("IO error"));

        let db_error = TemporaError::Database("disk I/O error".to_string());
        assert_eq!(format!("{}", db_error), "Database error: disk I/O error");

        let unknown = TemporaError::UnknownDocument("catalog".to_string());
        assert_eq!(format!("{}", unknown), "Unknown document: catalog");

        let ambiguous = TemporaError::AmbiguousNamespacePrefix {
            prefix: "x".to_string(),
            bindings: 2,
        };
        assert_eq!(format!("{}", ambiguous), "Ambiguous namespace prefix 'x': 2 bindings");

        let position = TemporaError::InvalidPosition {
            position: 0,
            siblings: 3,
        };
        assert_eq!(format!("{}", position), "Invalid position 0 among 3 sibling(s)");

        let cycle = TemporaError::CycleDetected {
            node: NodeId(4),
            target: NodeId(9),
        };
        assert_eq!(
            format!("{}", cycle),
            "Cycle detected: node 4 cannot be moved under 9"
        );

        let not_element = TemporaError::NotAnElement(NodeId(7), NodeKind::Text);
        assert_eq!(format!("{}", not_element), "Not an element: node 7 is text");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let err: TemporaError = io_err.into();

        match err {
            TemporaError::Io(e) => assert_eq!(e.kind(), io::ErrorKind::PermissionDenied),
            _ => panic!("Expected Io error variant"),
        }
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let parse_result: Result<serde_json::Value, serde_json::Error> =
            serde_json::from_str("{invalid json}");
        let err: TemporaError = parse_result.unwrap_err().into();

        match err {
            TemporaError::Serialization(msg) => assert!(msg.contains("key must be a string")),
            _ => panic!("Expected Serialization error variant"),
        }
    }

    #[test]
    fn test_user_error_classification() {
        assert!(TemporaError::InvalidPosition {
            position: 0,
            siblings: 0
        }
        .is_user_error());
        assert!(!TemporaError::Database("locked".to_string()).is_user_error());
        assert!(!TemporaError::InconsistentOrderingState("missing".to_string()).is_user_error());
    }
}
