// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Error taxonomy for session synchronization.
//!
//! There are exactly three kinds of failure. Concurrent conductor writes
//! are merged field by field and never reported, so there is no conflict
//! kind.

use thiserror::Error;

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors raised by the store, controller, mirror and lobby
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The session code does not resolve to a document
    #[error("Session not found: {0}")]
    NotFound(String),

    /// Connectivity failure while subscribing or writing
    #[error("Transport error: {0}")]
    Transport(String),

    /// A value was rejected before it could reach session state
    #[error("Invalid value: {0}")]
    Validation(String),
}

impl SessionError {
    /// Check if this error is a missing-session error
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound(_))
    }

    /// Check if this error is a connectivity error
    pub fn is_transport(&self) -> bool {
        matches!(self, SessionError::Transport(_))
    }
}
