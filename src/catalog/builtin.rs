// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Built-in chord and progression tables.

use super::{Chord, Progression};

/// Id of the progression new sessions start with
pub const DEFAULT_PROGRESSION: &str = "turnaround";

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[allow(clippy::too_many_arguments)]
fn chord(
    id: &str,
    name: &str,
    full_name: &str,
    notes: &[&str],
    quality: &str,
    intervals: &[&str],
    scale_notes: &[&str],
    scale_type: &str,
) -> Chord {
    Chord {
        id: id.to_string(),
        name: name.to_string(),
        full_name: full_name.to_string(),
        notes: strings(notes),
        root: notes.first().map(|n| n.to_string()).unwrap_or_default(),
        quality: quality.to_string(),
        intervals: strings(intervals),
        scale_notes: strings(scale_notes),
        scale_type: scale_type.to_string(),
    }
}

/// Built-in chords
pub fn chords() -> Vec<Chord> {
    vec![
        chord(
            "am", "Am", "La menor",
            &["A", "C", "E"], "minor", &["1", "b3", "5"],
            &["A", "B", "C", "D", "E", "F", "G", "A"], "Natural Minor",
        ),
        chord(
            "d7", "D7", "Ré dominante 7",
            &["D", "F#", "A", "C"], "dominant7", &["1", "3", "5", "b7"],
            &["D", "E", "F#", "G", "A", "B", "C", "D"], "Major",
        ),
        chord(
            "g", "G", "Sol maior",
            &["G", "B", "D"], "major", &["1", "3", "5"],
            &["G", "A", "B", "C", "D", "E", "F#", "G"], "Major",
        ),
        chord(
            "dm7", "Dm7", "Ré menor 7",
            &["D", "F", "A", "C"], "minor7", &["1", "b3", "5", "b7"],
            &["D", "E", "F", "G", "A", "B", "C", "D"], "Natural Minor",
        ),
        chord(
            "g7", "G7", "Sol dominante 7",
            &["G", "B", "D", "F"], "dominant7", &["1", "3", "5", "b7"],
            &["G", "A", "B", "C", "D", "E", "F", "G"], "Major",
        ),
        chord(
            "cmaj7", "Cmaj7", "Dó maior 7",
            &["C", "E", "G", "B"], "major7", &["1", "3", "5", "7"],
            &["C", "D", "E", "F", "G", "A", "B", "C"], "Major",
        ),
        chord(
            "c7", "C7", "Dó dominante 7",
            &["C", "E", "G", "Bb"], "dominant7", &["1", "3", "5", "b7"],
            &["C", "D", "E", "F", "G", "A", "Bb", "C"], "Major",
        ),
        chord(
            "f7", "F7", "Fá dominante 7",
            &["F", "A", "C", "Eb"], "dominant7", &["1", "3", "5", "b7"],
            &["F", "G", "A", "Bb", "C", "D", "Eb", "F"], "Major",
        ),
    ]
}

/// Built-in progressions
pub fn progressions() -> Vec<Progression> {
    vec![
        Progression {
            id: DEFAULT_PROGRESSION.to_string(),
            name: "Turnaround Clássico".to_string(),
            chords: strings(&["am", "d7", "g", "d7"]),
            key: "G major".to_string(),
            tempo: 120,
            looping: true,
        },
        Progression {
            id: "ii-v-i".to_string(),
            name: "II-V-I".to_string(),
            chords: strings(&["dm7", "g7", "cmaj7"]),
            key: "C major".to_string(),
            tempo: 140,
            looping: true,
        },
        Progression {
            id: "blues-basic".to_string(),
            name: "Blues Básico".to_string(),
            chords: strings(&["c7", "c7", "f7", "f7", "c7", "c7", "g7", "f7", "c7", "g7"]),
            key: "C major".to_string(),
            tempo: 100,
            looping: true,
        },
    ]
}
