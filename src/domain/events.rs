//! Domain Events
//!
//! Event definitions for Event Sourcing.
//! Events are immutable facts that have happened in the system.

use serde::{Deserialize, Serialize};

/// Outcome of one play session
///
/// `seq` is assigned by the producer before persistence and never reused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvent {
    /// Strictly increasing sequence number (starts at 1)
    pub seq: i64,

    /// Scene the session was played in
    pub scene_id: String,

    /// Normalized session outcome
    pub result_z: f64,

    /// Session duration
    pub time_t: f64,

    /// Number of attempts (positive)
    pub attempts: u32,

    /// RNG seed associated with the session
    pub seed: i64,

    #[serde(default)]
    pub config_version: String,

    #[serde(default)]
    pub content_version: String,

    #[serde(default)]
    pub rules_version: String,
}

impl SessionEvent {
    /// Create an event with a neutral outcome and empty version tags
    pub fn new(seq: i64, scene_id: impl Into<String>) -> Self {
        Self {
            seq,
            scene_id: scene_id.into(),
            result_z: 0.0,
            time_t: 0.0,
            attempts: 1,
            seed: 0,
            config_version: String::new(),
            content_version: String::new(),
            rules_version: String::new(),
        }
    }

    /// Set the session outcome
    pub fn with_outcome(mut self, result_z: f64, time_t: f64, attempts: u32) -> Self {
        self.result_z = result_z;
        self.time_t = time_t;
        self.attempts = attempts;
        self
    }

    /// Set the session seed
    pub fn with_seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the provenance version tags
    pub fn with_versions(
        mut self,
        config_version: impl Into<String>,
        content_version: impl Into<String>,
        rules_version: impl Into<String>,
    ) -> Self {
        self.config_version = config_version.into();
        self.content_version = content_version.into();
        self.rules_version = rules_version.into();
        self
    }

    /// Skill increment contributed by this session
    pub fn delta_skill(&self) -> f64 {
        self.result_z * 0.05 + f64::from(self.attempts) * 0.0005
    }
}
