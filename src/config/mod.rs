// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Configuration system for the play-along client.
//!
//! This module provides data structures for loading session defaults,
//! synchronization policy, and catalog additions from YAML.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::catalog::builtin::DEFAULT_PROGRESSION;
use crate::catalog::{Catalog, Chord, Progression};
use crate::session::Bpm;

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AppConfig {
    /// Defaults for new sessions
    #[serde(default)]
    pub session: SessionConfig,
    /// Replication settings
    #[serde(default)]
    pub sync: SyncConfig,
    /// Entries added to the built-in catalog
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Log filter used when `RUST_LOG` is not set (e.g., "info", "playalong=debug")
    #[serde(default)]
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&contents)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Build the catalog: built-in tables plus configured entries
    pub fn catalog(&self) -> Catalog {
        let mut catalog = Catalog::builtin();
        for chord in &self.catalog.chords {
            catalog.add_chord(chord.clone());
        }
        for progression in &self.catalog.progressions {
            catalog.add_progression(progression.clone());
        }
        catalog
    }

    /// Validated default tempo
    pub fn default_bpm(&self) -> Result<Bpm> {
        Bpm::new(self.session.default_bpm).map_err(|e| anyhow!("session.default_bpm: {}", e))
    }

    /// Resolve the default progression in `catalog`
    pub fn default_progression(&self, catalog: &Catalog) -> Result<Progression> {
        let id = &self.session.default_progression;
        let progression = catalog
            .progression(id)
            .ok_or_else(|| anyhow!("Unknown default progression: {}", id))?;
        if progression.is_empty() {
            return Err(anyhow!("Default progression {} has no chords", id));
        }
        Ok(progression.clone())
    }
}

/// Defaults applied to new sessions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Tempo in BPM (60-200)
    #[serde(default = "default_bpm")]
    pub default_bpm: u32,
    /// Progression id loaded on creation
    #[serde(default = "default_progression")]
    pub default_progression: String,
}

fn default_bpm() -> u32 {
    Bpm::DEFAULT.get()
}
fn default_progression() -> String {
    DEFAULT_PROGRESSION.to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_bpm: default_bpm(),
            default_progression: default_progression(),
        }
    }
}

/// Replication settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SyncConfig {
    /// Reconnection policy for participant mirrors
    #[serde(default)]
    pub retry: RetryPolicy,
}

/// Reconnection policy after a subscription loses its connection
///
/// The default makes no attempts: recovery is left to the caller.
/// Missing sessions are never retried.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RetryPolicy {
    /// Reconnection attempts after consecutive transport failures
    #[serde(default)]
    pub max_attempts: u32,
    /// Delay before each attempt in milliseconds
    #[serde(default)]
    pub backoff_ms: u64,
}

impl RetryPolicy {
    /// Never reconnect automatically
    pub fn none() -> Self {
        Self::default()
    }

    /// Reconnect up to `max_attempts` times, waiting `backoff` before each
    pub fn attempts(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff_ms: backoff.as_millis() as u64,
        }
    }

    /// Check if another attempt is allowed after `attempts_made`
    pub fn allows(&self, attempts_made: u32) -> bool {
        attempts_made < self.max_attempts
    }

    /// Delay before an attempt
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Catalog additions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct CatalogConfig {
    /// Extra or replacement chords
    #[serde(default)]
    pub chords: Vec<Chord>,
    /// Extra or replacement progressions
    #[serde(default)]
    pub progressions: Vec<Progression>,
}
