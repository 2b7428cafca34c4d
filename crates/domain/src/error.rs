//! Error classification shared by every layer.

use serde::{Deserialize, Serialize};

/// Coarse category of a failure, used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The shipment or segment does not exist.
    NotFound,

    /// The request clashes with existing state (duplicate, stale version).
    Conflict,

    /// The state machine does not allow the requested transition.
    InvalidTransition,

    /// The input itself is malformed.
    Validation,

    /// An external collaborator failed.
    ExternalCollaborator,

    /// Storage or serialization fault.
    Internal,
}

impl ErrorKind {
    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "NOT_FOUND",
            ErrorKind::Conflict => "CONFLICT",
            ErrorKind::InvalidTransition => "INVALID_TRANSITION",
            ErrorKind::Validation => "VALIDATION",
            ErrorKind::ExternalCollaborator => "EXTERNAL_COLLABORATOR",
            ErrorKind::Internal => "INTERNAL",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
