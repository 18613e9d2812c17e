// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Play-along session synchronization.
//!
//! One conductor drives a shared practice session (tempo, chord,
//! progression) while participants mirror it read-only; solo mode runs
//! the same controller and metronome with no replication.
//!
//! - [`progression`]: chord advance and lookahead
//! - [`store`]: replicated session document store
//! - [`sync`]: local controller and remote mirror
//! - [`timing`]: beat timer driving chord changes
//! - [`session`]: data model, views, lobby
//! - [`catalog`]: chord and progression tables
//! - [`config`]: YAML configuration

pub mod catalog;
pub mod config;
pub mod error;
pub mod progression;
pub mod session;
pub mod store;
pub mod sync;
pub mod timing;

pub use error::{Result, SessionError};
