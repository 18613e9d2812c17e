// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session codes and tempo values.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};

/// Number of characters in a session code
pub const CODE_LENGTH: usize = 4;

const CODE_ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Short code identifying a session document
///
/// Generated codes are four uppercase letters. Codes are not checked for
/// uniqueness against existing sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionCode(String);

impl SessionCode {
    /// Generate a random code
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..CODE_LENGTH)
            .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
            .collect();
        Self(code)
    }

    /// Normalize a code typed by a user
    ///
    /// Input is trimmed and upper-cased. Only the length is checked.
    pub fn parse(input: &str) -> Result<Self> {
        let code = input.trim().to_uppercase();
        if code.is_empty() {
            return Err(SessionError::Validation("Enter a session code".to_string()));
        }
        if code.chars().count() != CODE_LENGTH {
            return Err(SessionError::Validation(format!(
                "Session code must be {} characters: {:?}",
                CODE_LENGTH, code
            )));
        }
        Ok(Self(code))
    }

    /// The code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for SessionCode {
    type Error = SessionError;

    fn try_from(value: String) -> Result<Self> {
        SessionCode::parse(&value)
    }
}

impl From<SessionCode> for String {
    fn from(code: SessionCode) -> String {
        code.0
    }
}

impl fmt::Display for SessionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Tempo in beats per minute, always within [`Bpm::MIN`, `Bpm::MAX`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Bpm(u32);

impl Bpm {
    /// Slowest accepted tempo
    pub const MIN: u32 = 60;
    /// Fastest accepted tempo
    pub const MAX: u32 = 200;
    /// Tempo of a freshly created session
    pub const DEFAULT: Bpm = Bpm(120);

    /// Create a tempo, rejecting values outside the valid range
    pub fn new(bpm: u32) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&bpm) {
            Ok(Self(bpm))
        } else {
            Err(SessionError::Validation(format!(
                "BPM {} outside {}-{}",
                bpm,
                Self::MIN,
                Self::MAX
            )))
        }
    }

    /// Create a tempo, clamping into the valid range
    pub fn clamped(bpm: u32) -> Self {
        Self(bpm.clamp(Self::MIN, Self::MAX))
    }

    /// The tempo value
    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Bpm {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u32> for Bpm {
    type Error = SessionError;

    fn try_from(value: u32) -> Result<Self> {
        Bpm::new(value)
    }
}

impl From<Bpm> for u32 {
    fn from(bpm: Bpm) -> u32 {
        bpm.0
    }
}

impl fmt::Display for Bpm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
