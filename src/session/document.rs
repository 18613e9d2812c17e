// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! The replicated session document and merge-write patches.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Bpm;
use crate::catalog::Progression;
use crate::error::{Result, SessionError};

/// Full state of one practice session as stored by the document service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDocument {
    /// Tempo
    pub bpm: Bpm,
    /// Whether the conductor is playing
    pub is_playing: bool,
    /// Embedded copy of the active progression
    pub current_progression: Progression,
    /// Index into `current_progression.chords`
    pub current_chord_index: usize,
    /// Opaque participant ids
    #[serde(default)]
    pub participants: BTreeSet<String>,
    /// When the session was created
    pub created_at: DateTime<Utc>,
    /// When the document was last merge-written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl SessionDocument {
    /// Initial snapshot for a new session: stopped, first chord
    pub fn new(bpm: Bpm, progression: Progression, created_at: DateTime<Utc>) -> Self {
        Self {
            bpm,
            is_playing: false,
            current_progression: progression,
            current_chord_index: 0,
            participants: BTreeSet::new(),
            created_at,
            last_updated: None,
        }
    }

    /// Chord id at the current index
    pub fn current_chord(&self) -> Option<&str> {
        self.current_progression.chord_at(self.current_chord_index)
    }

    /// Convert to a document field map
    pub fn to_fields(&self) -> Result<Map<String, Value>> {
        to_field_map(self)
    }

    /// Rebuild a document from a field map
    pub fn from_fields(fields: &Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(fields.clone()))
            .map_err(|e| SessionError::Transport(format!("Malformed session document: {}", e)))
    }
}

/// Partial update applied field by field to a session document
///
/// Only fields that are set are written. Fields left unset keep whatever
/// value the document already holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPatch {
    /// New tempo
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bpm: Option<Bpm>,
    /// New playing flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_playing: Option<bool>,
    /// New progression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_progression: Option<Progression>,
    /// New chord index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_chord_index: Option<usize>,
    /// Write timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl SessionPatch {
    /// Patch setting the tempo
    pub fn bpm(bpm: Bpm) -> Self {
        Self { bpm: Some(bpm), ..Default::default() }
    }

    /// Patch setting the playing flag
    pub fn playing(is_playing: bool) -> Self {
        Self { is_playing: Some(is_playing), ..Default::default() }
    }

    /// Patch setting the chord index
    pub fn chord_index(index: usize) -> Self {
        Self { current_chord_index: Some(index), ..Default::default() }
    }

    /// Patch replacing the progression and rewinding to its first chord
    pub fn progression(progression: Progression) -> Self {
        Self {
            current_progression: Some(progression),
            current_chord_index: Some(0),
            ..Default::default()
        }
    }

    /// Stamp the write time
    pub fn stamped(mut self, at: DateTime<Utc>) -> Self {
        self.last_updated = Some(at);
        self
    }

    /// Check if no field is set
    pub fn is_empty(&self) -> bool {
        self.bpm.is_none()
            && self.is_playing.is_none()
            && self.current_progression.is_none()
            && self.current_chord_index.is_none()
            && self.last_updated.is_none()
    }

    /// Convert to a field map holding only the set fields
    pub fn to_fields(&self) -> Result<Map<String, Value>> {
        to_field_map(self)
    }
}

fn to_field_map<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(other) => Err(SessionError::Transport(format!(
            "Session fields must encode as an object, got {}",
            other
        ))),
        Err(e) => Err(SessionError::Transport(format!("Failed to encode session fields: {}", e))),
    }
}
