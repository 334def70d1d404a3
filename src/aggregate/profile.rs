//! Profile Aggregate
//!
//! Learner profile derived by folding session events.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{SessionEvent, PROFILE_ID};

use super::Aggregate;

/// Initial value of every bounded scalar
const DEFAULT_SCALAR: f64 = 0.5;

/// Number of preference keys created by `create_default`
pub const PREFERENCE_KEYS: usize = 20;

/// Profile Aggregate
///
/// Every scalar stays in [0, 1] and every preference in [-1, 1] after each
/// `apply`. A payload missing a field takes the `create_default` value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileState {
    profile_id: String,

    skill_level: f64,

    /// Recomputed from each event, not accumulated
    fatigue: f64,

    accuracy: f64,

    reaction_time: f64,

    last_scene_id: String,

    /// Fixed key set; `apply` never adds or removes keys
    npc_preferences: BTreeMap<String, f64>,

    config_version: String,

    content_version: String,

    rules_version: String,

    seed: i64,
}

impl Default for ProfileState {
    fn default() -> Self {
        Self::create_default()
    }
}

impl ProfileState {
    /// Create the state of a profile with no applied events
    pub fn create_default() -> Self {
        let npc_preferences = (0..PREFERENCE_KEYS)
            .map(|i| (format!("npc_pref_{i}"), 0.1 * (i % 5) as f64))
            .collect();

        Self {
            profile_id: PROFILE_ID.to_string(),
            skill_level: DEFAULT_SCALAR,
            fatigue: DEFAULT_SCALAR,
            accuracy: DEFAULT_SCALAR,
            reaction_time: DEFAULT_SCALAR,
            last_scene_id: String::new(),
            npc_preferences,
            config_version: String::new(),
            content_version: String::new(),
            rules_version: String::new(),
            seed: 0,
        }
    }

    /// Serialize to the stored payload form
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse a stored payload
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    // =========================================================================
    // Getters
    // =========================================================================

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn skill_level(&self) -> f64 {
        self.skill_level
    }

    pub fn fatigue(&self) -> f64 {
        self.fatigue
    }

    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    pub fn reaction_time(&self) -> f64 {
        self.reaction_time
    }

    pub fn last_scene_id(&self) -> &str {
        &self.last_scene_id
    }

    pub fn npc_preferences(&self) -> &BTreeMap<String, f64> {
        &self.npc_preferences
    }

    pub fn config_version(&self) -> &str {
        &self.config_version
    }

    pub fn content_version(&self) -> &str {
        &self.content_version
    }

    pub fn rules_version(&self) -> &str {
        &self.rules_version
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }
}

impl Aggregate for ProfileState {
    type Event = SessionEvent;

    fn aggregate_type() -> &'static str {
        "Profile"
    }

    fn id(&self) -> &str {
        &self.profile_id
    }

    fn apply(mut self, event: &SessionEvent) -> Self {
        let attempts = f64::from(event.attempts);

        self.skill_level = clamp01(self.skill_level + event.delta_skill());
        self.fatigue = clamp01(0.5 - event.result_z * 0.1 + attempts * 0.01);
        self.accuracy = clamp01(self.accuracy + event.result_z * 0.02 - attempts * 0.005);
        self.reaction_time = clamp01(self.reaction_time + event.time_t * 0.001 - event.result_z * 0.01);

        self.last_scene_id.clone_from(&event.scene_id);
        self.config_version.clone_from(&event.config_version);
        self.content_version.clone_from(&event.content_version);
        self.rules_version.clone_from(&event.rules_version);
        self.seed = event.seed;

        let shift = (event.result_z - 0.5) * 0.01;
        for value in self.npc_preferences.values_mut() {
            *value = clamp(*value + shift, -1.0, 1.0);
        }

        self
    }
}

/// Clamp into [0, 1]
pub fn clamp01(value: f64) -> f64 {
    clamp(value, 0.0, 1.0)
}

/// Clamp into [lo, hi]; NaN collapses to `lo`
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    value.max(lo).min(hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn sample_event() -> SessionEvent {
        SessionEvent::new(1, "a")
            .with_outcome(1.0, 0.0, 1)
            .with_seed(7)
            .with_versions("v1", "", "")
    }

    fn assert_bounded(state: &ProfileState) {
        for scalar in [
            state.skill_level(),
            state.fatigue(),
            state.accuracy(),
            state.reaction_time(),
        ] {
            assert!((0.0..=1.0).contains(&scalar), "scalar out of bounds: {scalar}");
        }
        for (key, value) in state.npc_preferences() {
            assert!((-1.0..=1.0).contains(value), "{key} out of bounds: {value}");
        }
    }

    #[test]
    fn test_create_default() {
        let state = ProfileState::create_default();

        assert_eq!(state.profile_id(), PROFILE_ID);
        assert_eq!(state.skill_level(), 0.5);
        assert_eq!(state.fatigue(), 0.5);
        assert_eq!(state.accuracy(), 0.5);
        assert_eq!(state.reaction_time(), 0.5);
        assert_eq!(state.npc_preferences().len(), PREFERENCE_KEYS);
        assert_eq!(state.npc_preferences()["npc_pref_0"], 0.0);
        assert!((state.npc_preferences()["npc_pref_3"] - 0.3).abs() < EPS);
        assert!((state.npc_preferences()["npc_pref_9"] - 0.4).abs() < EPS);
        assert_eq!(ProfileState::default(), state);
    }

    #[test]
    fn test_apply_single_event() {
        let state = ProfileState::create_default().apply(&sample_event());

        assert!((state.accuracy() - 0.515).abs() < EPS);
        assert!((state.fatigue() - 0.41).abs() < EPS);
        assert!((state.skill_level() - 0.5505).abs() < EPS);
        assert!((state.reaction_time() - 0.49).abs() < EPS);
        assert_eq!(state.last_scene_id(), "a");
        assert_eq!(state.config_version(), "v1");
        assert_eq!(state.seed(), 7);
        assert!((state.npc_preferences()["npc_pref_1"] - 0.105).abs() < EPS);
    }

    #[test]
    fn test_apply_is_deterministic() {
        let base = ProfileState::create_default();
        let event = sample_event().with_outcome(0.37, 44.0, 3);

        assert_eq!(base.clone().apply(&event), base.apply(&event));
    }

    #[test]
    fn test_fatigue_ignores_prior_state() {
        let event = SessionEvent::new(2, "b").with_outcome(0.2, 10.0, 4);
        let fresh = ProfileState::create_default();
        let worn = ProfileState::create_default()
            .apply(&SessionEvent::new(1, "a").with_outcome(0.9, 80.0, 5));

        assert_eq!(fresh.apply(&event).fatigue(), worn.apply(&event).fatigue());
    }

    #[test]
    fn test_extreme_events_stay_bounded() {
        let extremes = [
            (50.0, 0.0, 1),
            (-50.0, 1_000.0, 5),
            (0.0, -1_000.0, 1_000),
            (f64::NAN, f64::NAN, 1),
            (1.0, 90.0, u32::MAX),
        ];

        let mut state = ProfileState::create_default();
        for (i, (result_z, time_t, attempts)) in extremes.into_iter().enumerate() {
            for repeat in 0..200 {
                let seq = (i * 200 + repeat + 1) as i64;
                state = state.apply(&SessionEvent::new(seq, "x").with_outcome(result_z, time_t, attempts));
                assert_bounded(&state);
            }
        }
        assert_eq!(state.npc_preferences().len(), PREFERENCE_KEYS);
    }

    #[test]
    fn test_fold_matches_sequential_apply() {
        let events: Vec<SessionEvent> = (1..=5)
            .map(|seq| SessionEvent::new(seq, "s").with_outcome(0.1 * seq as f64, 5.0, 2))
            .collect();

        let mut expected = ProfileState::create_default();
        for event in &events {
            expected = expected.apply(event);
        }

        assert_eq!(ProfileState::create_default().fold(&events), expected);
    }

    #[test]
    fn test_json_roundtrip_is_exact() {
        let state = ProfileState::create_default()
            .apply(&SessionEvent::new(1, "a").with_outcome(0.123_456_789, 33.3, 2))
            .apply(&SessionEvent::new(2, "b").with_outcome(0.987_654_321, 1.7, 5));

        let json = state.to_json().unwrap();
        assert_eq!(ProfileState::from_json(&json).unwrap(), state);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let state = ProfileState::from_json(r#"{"skill_level":0.9,"unknown":1}"#).unwrap();

        assert_eq!(state.skill_level(), 0.9);
        assert_eq!(state.fatigue(), 0.5);
        assert_eq!(state.npc_preferences().len(), PREFERENCE_KEYS);
        assert_eq!(state.profile_id(), PROFILE_ID);
    }
}
