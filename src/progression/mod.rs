// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Chord-index advance and lookahead for progressions.
//!
//! These are pure functions with no hidden state. `advance` is what the
//! metronome uses to move playback; `lookahead` is what displays use to
//! show the upcoming chord. They differ at the last chord of a
//! non-looping progression: playback holds on the final index while the
//! display shows that there is no next chord.

/// Compute the index playback moves to on the next beat.
///
/// At the end of a looping progression this wraps to 0. At the end of a
/// non-looping progression the index holds; playback keeps running.
pub fn advance(index: usize, length: usize, looping: bool) -> usize {
    if index + 1 < length {
        index + 1
    } else if looping {
        0
    } else {
        index
    }
}

/// Compute the index of the chord shown as "next", if any.
pub fn lookahead(index: usize, length: usize, looping: bool) -> Option<usize> {
    if index + 1 < length {
        Some(index + 1)
    } else if looping && length > 0 {
        Some(0)
    } else {
        None
    }
}

/// Fraction of the progression reached, counting the current chord.
///
/// Returns `(index + 1) / length`, or 0.0 for an empty progression.
pub fn progress_fraction(index: usize, length: usize) -> f64 {
    if length == 0 {
        return 0.0;
    }
    ((index + 1) as f64 / length as f64).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_moves_forward_before_the_end() {
        for length in 2..12 {
            for index in 0..length - 1 {
                assert_eq!(advance(index, length, true), index + 1);
                assert_eq!(advance(index, length, false), index + 1);
            }
        }
    }

    #[test]
    fn test_advance_wraps_when_looping() {
        assert_eq!(advance(3, 4, true), 0);
        assert_eq!(advance(0, 1, true), 0);
    }

    #[test]
    fn test_advance_holds_at_terminal_index() {
        let mut index = 2;
        for _ in 0..5 {
            index = advance(index, 3, false);
            assert_eq!(index, 2);
        }
    }

    #[test]
    fn test_lookahead_terminal_case() {
        assert_eq!(lookahead(2, 3, false), None);
        assert_eq!(lookahead(2, 3, true), Some(0));
        assert_eq!(lookahead(0, 3, false), Some(1));
        assert_eq!(lookahead(0, 0, true), None);
    }

    #[test]
    fn test_lookahead_differs_from_advance_only_at_the_end() {
        // Playback holds while the display reports no next chord
        assert_eq!(advance(4, 5, false), 4);
        assert_eq!(lookahead(4, 5, false), None);

        for index in 0..4 {
            assert_eq!(lookahead(index, 5, false), Some(advance(index, 5, false)));
        }
    }

    #[test]
    fn test_progress_fraction() {
        assert_eq!(progress_fraction(3, 4), 1.0);
        assert_eq!(progress_fraction(0, 4), 0.25);
        assert!((progress_fraction(0, 3) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(progress_fraction(9, 10), 1.0);
        assert_eq!(progress_fraction(0, 0), 0.0);
    }
}
