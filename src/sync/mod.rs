// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session state holders.
//!
//! This module provides:
//! - The local controller that owns playback state on solo and conductor
//!   clients and replicates conductor changes
//! - The read-only mirror that follows a session on participant clients

pub mod controller;
pub mod mirror;

pub use controller::{LocalSessionController, PlaybackState};
pub use mirror::{MirrorState, RemoteSessionMirror};
