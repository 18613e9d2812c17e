// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session data model.
//!
//! This module provides:
//! - Session codes and validated tempo values
//! - The replicated session document and its partial-update patches
//! - Client roles
//! - Display views derived from session state
//! - Lobby operations for creating and joining sessions

pub mod code;
pub mod document;
pub mod lobby;
pub mod view;

pub use code::{Bpm, SessionCode, CODE_LENGTH};
pub use document::{SessionDocument, SessionPatch};
pub use lobby::{create_session, join_session};
pub use view::SessionView;

use std::fmt;

/// Role of this client in a session
///
/// Exactly one role is active per client. Roles are never replicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Local practice with no replication
    Solo,
    /// Drives a shared session and writes its document
    Conductor,
    /// Mirrors a shared session read-only
    Participant,
}

impl Default for Role {
    fn default() -> Self {
        Role::Solo
    }
}

impl Role {
    /// Check if this role writes to the session document
    pub fn replicates(&self) -> bool {
        matches!(self, Role::Conductor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Solo => write!(f, "solo"),
            Role::Conductor => write!(f, "conductor"),
            Role::Participant => write!(f, "participant"),
        }
    }
}
