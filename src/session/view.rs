// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Display-ready view of session state.

use super::{Bpm, SessionDocument};
use crate::catalog::Progression;
use crate::progression;

/// What a play-along screen shows, derived from session state
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    /// Progression display name
    pub progression_name: String,
    /// Progression key label
    pub key: String,
    /// Tempo
    pub bpm: Bpm,
    /// Whether playback is running
    pub is_playing: bool,
    /// Current chord index
    pub chord_index: usize,
    /// Chord id at the current index
    pub current_chord: Option<String>,
    /// Chord id shown as upcoming, `None` at the end of a non-looping progression
    pub next_chord: Option<String>,
    /// Fraction of the progression reached, in [0, 1]
    pub progress_fraction: f64,
}

impl SessionView {
    /// Derive a view from playback fields
    pub fn derive(bpm: Bpm, is_playing: bool, progression: &Progression, index: usize) -> Self {
        let length = progression.len();
        let next_chord = progression::lookahead(index, length, progression.looping)
            .and_then(|next| progression.chord_at(next))
            .map(str::to_string);
        let progress_fraction = if index < length {
            progression::progress_fraction(index, length)
        } else {
            0.0
        };

        Self {
            progression_name: progression.name.clone(),
            key: progression.key.clone(),
            bpm,
            is_playing,
            chord_index: index,
            current_chord: progression.chord_at(index).map(str::to_string),
            next_chord,
            progress_fraction,
        }
    }

    /// Derive a view from a replicated snapshot
    pub fn from_document(document: &SessionDocument) -> Self {
        Self::derive(
            document.bpm,
            document.is_playing,
            &document.current_progression,
            document.current_chord_index,
        )
    }

    /// Progress as a percentage for progress bars
    pub fn progress_percent(&self) -> f64 {
        self.progress_fraction * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;

    fn ii_v_i(looping: bool) -> Progression {
        let mut progression = Catalog::builtin().progression("ii-v-i").unwrap().clone();
        progression.looping = looping;
        progression
    }

    #[test]
    fn test_view_in_the_middle() {
        let view = SessionView::derive(Bpm::DEFAULT, true, &ii_v_i(true), 1);
        assert_eq!(view.current_chord.as_deref(), Some("g7"));
        assert_eq!(view.next_chord.as_deref(), Some("cmaj7"));
        assert!((view.progress_fraction - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(view.progression_name, "II-V-I");
    }

    #[test]
    fn test_view_at_the_end() {
        let looping = SessionView::derive(Bpm::DEFAULT, true, &ii_v_i(true), 2);
        assert_eq!(looping.next_chord.as_deref(), Some("dm7"));
        assert_eq!(looping.progress_fraction, 1.0);
        assert_eq!(looping.progress_percent(), 100.0);

        let held = SessionView::derive(Bpm::DEFAULT, true, &ii_v_i(false), 2);
        assert_eq!(held.current_chord.as_deref(), Some("cmaj7"));
        assert_eq!(held.next_chord, None);
    }

    #[test]
    fn test_view_with_index_out_of_range() {
        let view = SessionView::derive(Bpm::DEFAULT, false, &ii_v_i(false), 7);
        assert_eq!(view.current_chord, None);
        assert_eq!(view.next_chord, None);
        assert_eq!(view.progress_fraction, 0.0);
    }
}
