// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Timing module.
//!
//! This module provides the beat timer that advances chords during
//! playback on solo and conductor clients.

pub mod metronome;

pub use metronome::{advance_once, beat_period, MetronomeScheduler};
