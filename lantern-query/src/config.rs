//! Query and scoring configuration with sensible defaults.
//!
//! [`QueryConfig`] controls dispatch behaviour (initial listing, timeouts,
//! provider restrictions). [`ScoringConfig`] carries the empirical ranking
//! constants; they are tuning values, so they are kept configurable rather
//! than hard-coded.

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Ranking constants used by the scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Usage older than this many days no longer adds to the score.
    pub usage_decay_days: u32,
    /// Discount applied per field of match depth (label = depth 0).
    pub field_penalty_step: f64,
    /// Lowest multiplier a deep field match can be discounted to.
    pub field_penalty_floor: f64,
    /// Score given to `AlwaysTop` entries the provider left unscored.
    pub always_top_score: f64,
    /// Score given to `AlwaysBottom` entries the provider left unscored.
    pub always_bottom_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            usage_decay_days: 10,
            field_penalty_step: 0.10,
            field_penalty_floor: 0.70,
            always_top_score: 1000.0,
            always_bottom_score: 1.0,
        }
    }
}

impl ScoringConfig {
    /// Validates the constants.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.usage_decay_days == 0 {
            return Err(QueryError::Config(
                "usage_decay_days must be greater than 0".into(),
            ));
        }
        if !self.field_penalty_step.is_finite() || self.field_penalty_step < 0.0 {
            return Err(QueryError::Config(
                "field_penalty_step must be a non-negative number".into(),
            ));
        }
        if !(self.field_penalty_floor > 0.0 && self.field_penalty_floor <= 1.0) {
            return Err(QueryError::Config(
                "field_penalty_floor must be in (0, 1]".into(),
            ));
        }
        if !(self.always_top_score > 0.0 && self.always_bottom_score > 0.0) {
            return Err(QueryError::Config(
                "always_top_score and always_bottom_score must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for the query dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Show a usage-ranked listing from `initial_provider` when the query is empty.
    pub show_initial_entries: bool,
    /// Provider whose entries make up the initial listing.
    pub initial_provider: String,
    /// Rank entries with history by open-window count (window tracker required).
    pub context_aware_history: bool,
    /// Offer completions from previously activated queries.
    pub typeahead: bool,
    /// Per-provider call timeout in milliseconds.
    pub provider_timeout_ms: u64,
    /// Restrict every query to these providers, bypassing prefix routing.
    pub allow_list: Option<Vec<String>>,
    /// Ranking constants.
    pub scoring: ScoringConfig,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            show_initial_entries: true,
            initial_provider: "applications".into(),
            context_aware_history: false,
            typeahead: false,
            provider_timeout_ms: 3_000,
            allow_list: None,
            scoring: ScoringConfig::default(),
        }
    }
}

impl QueryConfig {
    /// Rejects settings the dispatcher cannot run with.
    ///
    /// Checks:
    /// - `provider_timeout_ms` must be greater than 0
    /// - `allow_list`, when present, must not be empty
    /// - `initial_provider` must be named when the initial listing is on
    /// - the scoring constants (see [`ScoringConfig::validate`])
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.provider_timeout_ms == 0 {
            return Err(QueryError::Config(
                "provider_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.allow_list.as_ref().is_some_and(Vec::is_empty) {
            return Err(QueryError::Config(
                "allow_list must name at least one provider".into(),
            ));
        }
        if self.show_initial_entries && self.initial_provider.trim().is_empty() {
            return Err(QueryError::Config(
                "initial_provider is required when show_initial_entries is on".into(),
            ));
        }
        self.scoring.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = QueryConfig::default();
        assert!(config.show_initial_entries);
        assert_eq!(config.initial_provider, "applications");
        assert!(!config.context_aware_history);
        assert_eq!(config.provider_timeout_ms, 3_000);
        assert!(config.allow_list.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn default_scoring_constants() {
        let scoring = ScoringConfig::default();
        assert_eq!(scoring.usage_decay_days, 10);
        assert!((scoring.field_penalty_step - 0.10).abs() < f64::EPSILON);
        assert!((scoring.field_penalty_floor - 0.70).abs() < f64::EPSILON);
        assert!((scoring.always_top_score - 1000.0).abs() < f64::EPSILON);
        assert!((scoring.always_bottom_score - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = QueryConfig {
            provider_timeout_ms: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("provider_timeout_ms"));
    }

    #[test]
    fn empty_allow_list_rejected() {
        let config = QueryConfig {
            allow_list: Some(vec![]),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("allow_list"));
    }

    #[test]
    fn blank_initial_provider_rejected_only_when_listing_enabled() {
        let mut config = QueryConfig {
            initial_provider: "  ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
        config.show_initial_entries = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn floor_out_of_range_rejected() {
        let config = QueryConfig {
            scoring: ScoringConfig {
                field_penalty_floor: 1.5,
                ..Default::default()
            },
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("field_penalty_floor"));
    }

    #[test]
    fn zero_decay_days_rejected() {
        let scoring = ScoringConfig {
            usage_decay_days: 0,
            ..Default::default()
        };
        assert!(scoring.validate().is_err());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: QueryConfig =
            serde_json::from_str(r#"{"typeahead": true, "scoring": {"usage_decay_days": 14}}"#)
                .expect("deserialize");
        assert!(config.typeahead);
        assert_eq!(config.scoring.usage_decay_days, 14);
        assert!((config.scoring.field_penalty_floor - 0.70).abs() < f64::EPSILON);
        assert!(config.show_initial_entries);
    }
}
