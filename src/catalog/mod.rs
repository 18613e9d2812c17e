// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord and progression catalog.
//!
//! The catalog is a read-only lookup table keyed by id. Sessions embed a
//! copy of a progression, and progressions refer to chords by id only, so
//! a chord id missing from the catalog is shown verbatim instead of
//! failing.

pub mod builtin;

use std::fmt;

use serde::{Deserialize, Serialize};

/// A chord with its display and theory data
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chord {
    /// Catalog id (e.g., "am", "cmaj7")
    pub id: String,
    /// Short display name (e.g., "Am")
    pub name: String,
    /// Long display name
    #[serde(default)]
    pub full_name: String,
    /// Chord tones
    #[serde(default)]
    pub notes: Vec<String>,
    /// Root note
    #[serde(default)]
    pub root: String,
    /// Chord quality (e.g., "minor", "dominant7")
    #[serde(default)]
    pub quality: String,
    /// Interval labels relative to the root
    #[serde(default)]
    pub intervals: Vec<String>,
    /// Notes of the associated scale
    #[serde(default)]
    pub scale_notes: Vec<String>,
    /// Name of the associated scale
    #[serde(default)]
    pub scale_type: String,
}

/// An ordered sequence of chord ids played at a tempo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    /// Catalog id
    pub id: String,
    /// Display name
    pub name: String,
    /// Chord ids in playback order
    pub chords: Vec<String>,
    /// Key label (e.g., "G major")
    pub key: String,
    /// Suggested tempo. Informational only, the session BPM is authoritative.
    pub tempo: u32,
    /// Whether playback wraps to the first chord after the last
    #[serde(rename = "loop")]
    pub looping: bool,
}

/// Id shared by every user-built progression
pub const CUSTOM_PROGRESSION_ID: &str = "custom";

/// Tempo suggested for user-built progressions
const CUSTOM_TEMPO: u32 = 120;

impl Progression {
    /// Build a looping progression from chords picked at runtime
    ///
    /// Custom progressions are never added to the catalog. They reach a
    /// session only as the embedded copy loaded through the controller.
    pub fn custom(name: impl Into<String>, chords: Vec<String>) -> Self {
        Self {
            id: CUSTOM_PROGRESSION_ID.to_string(),
            name: name.into(),
            chords,
            key: "Custom".to_string(),
            tempo: CUSTOM_TEMPO,
            looping: true,
        }
    }

    /// Number of chords
    pub fn len(&self) -> usize {
        self.chords.len()
    }

    /// Check if the progression has no chords
    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }

    /// Chord id at an index
    pub fn chord_at(&self, index: usize) -> Option<&str> {
        self.chords.get(index).map(String::as_str)
    }
}

/// Display label for a chord id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordLabel<'a> {
    /// The id resolved to a catalog entry
    Known(&'a Chord),
    /// The id is not in the catalog
    Unknown(&'a str),
}

impl<'a> ChordLabel<'a> {
    /// Short name, or the raw id when unknown
    pub fn name(&self) -> &'a str {
        match self {
            ChordLabel::Known(chord) => &chord.name,
            ChordLabel::Unknown(id) => id,
        }
    }

    /// Structured chord data, if any
    pub fn chord(&self) -> Option<&'a Chord> {
        match self {
            ChordLabel::Known(chord) => Some(chord),
            ChordLabel::Unknown(_) => None,
        }
    }
}

impl fmt::Display for ChordLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lookup tables for chords and progressions
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    chords: Vec<Chord>,
    progressions: Vec<Progression>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Create the catalog with the built-in chords and progressions
    pub fn builtin() -> Self {
        Self {
            chords: builtin::chords(),
            progressions: builtin::progressions(),
        }
    }

    /// Add a chord, replacing any entry with the same id
    pub fn add_chord(&mut self, chord: Chord) {
        match self.chords.iter_mut().find(|c| c.id == chord.id) {
            Some(existing) => *existing = chord,
            None => self.chords.push(chord),
        }
    }

    /// Add a progression, replacing any entry with the same id
    pub fn add_progression(&mut self, progression: Progression) {
        match self.progressions.iter_mut().find(|p| p.id == progression.id) {
            Some(existing) => *existing = progression,
            None => self.progressions.push(progression),
        }
    }

    /// Look up a chord by id
    pub fn chord(&self, id: &str) -> Option<&Chord> {
        self.chords.iter().find(|c| c.id == id)
    }

    /// Look up a progression by id
    pub fn progression(&self, id: &str) -> Option<&Progression> {
        self.progressions.iter().find(|p| p.id == id)
    }

    /// Resolve a chord id to a display label
    pub fn label<'a>(&'a self, id: &'a str) -> ChordLabel<'a> {
        match self.chord(id) {
            Some(chord) => ChordLabel::Known(chord),
            None => ChordLabel::Unknown(id),
        }
    }

    /// All chords
    pub fn chords(&self) -> &[Chord] {
        &self.chords
    }

    /// All progressions
    pub fn progressions(&self) -> &[Progression] {
        &self.progressions
    }
}
