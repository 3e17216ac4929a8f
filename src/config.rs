//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every numeric threshold the engine consumes lives in one injectable
//! `ScoringPolicy` so algorithms stay tunable and testable independently
//! of the code that applies them.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub engine: EngineConfig,
    #[serde(default)]
    pub scoring: ScoringPolicy,
    pub dashboard: DashboardConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EngineConfig {
    pub name: String,
    pub sync_interval_secs: u64,
    /// JSON file holding per-match model/odds snapshots.
    pub snapshot_path: String,
    /// JSON file holding entry/closing odds ticks.
    pub odds_path: String,
    /// Where the recomputed market catalog is persisted.
    pub catalog_path: String,
    /// Optional league filter applied to produced CLV records.
    #[serde(default)]
    pub league_filter: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

/// Scoring policy — every probability/edge threshold and default
/// confidence constant used by the engine, in one place.
///
/// Defaults reflect production tuning; individual fields can be
/// overridden from the `[scoring]` TOML table.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScoringPolicy {
    /// Confidence assumed for a single-model input with no confidence signal.
    pub default_model_confidence: f64,
    /// Fixed confidence for externally computed secondary-market probabilities.
    pub external_market_confidence: f64,

    /// Minimum leg probability per market family.
    pub dnb_min_prob: f64,
    pub totals_under_min_prob: f64,
    pub totals_over_min_prob: f64,
    pub btts_min_prob: f64,
    pub double_chance_min_prob: f64,
    pub win_to_nil_min_prob: f64,
    /// Qualifying legs kept per match (top-N by probability).
    pub max_legs_per_match: usize,
    /// Matches whose best leg feeds the cross-match combination pool.
    pub cross_match_pool: usize,

    /// 2-leg combined probability for the `high` confidence tier.
    pub two_leg_high_prob: f64,
    /// Combined probability floor for the `medium` tier (any leg count).
    pub tier_medium_prob: f64,

    /// Inclusive lower bound of the `low` risk tier.
    pub risk_low_prob: f64,
    /// Inclusive lower bound of the `medium` risk tier.
    pub risk_medium_prob: f64,

    /// Minimum candidate edge for tradability.
    pub edge_floor: f64,
    /// Minimum combined probability for tradability.
    pub prob_floor: f64,

    /// Default correlation-penalty strategy: penalty share of combined
    /// probability per pairwise shared tag across legs.
    pub penalty_per_overlap: f64,

    /// Kelly multiplier applied to the raw fraction (0.5 = half-Kelly).
    pub kelly_multiplier: f64,
    /// Absolute stake ceiling as a fraction of bankroll.
    pub max_stake_pct: f64,
    /// Confidence score at or above which a CLV record counts as high
    /// confidence.
    pub high_confidence_score: f64,

    /// Totals line at or below which the `GOALS_LOW` tag applies.
    pub goals_low_line: f64,
    /// Totals line at or above which the `GOALS_HIGH` tag applies.
    pub goals_high_line: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            default_model_confidence: 0.5,
            external_market_confidence: 0.7,

            dnb_min_prob: 0.55,
            totals_under_min_prob: 0.55,
            totals_over_min_prob: 0.55,
            btts_min_prob: 0.55,
            double_chance_min_prob: 0.55,
            win_to_nil_min_prob: 0.35,
            max_legs_per_match: 3,
            cross_match_pool: 6,

            two_leg_high_prob: 0.35,
            tier_medium_prob: 0.20,

            risk_low_prob: 0.20,
            risk_medium_prob: 0.10,

            edge_floor: 0.05,
            prob_floor: 0.10,

            penalty_per_overlap: 0.03,

            kelly_multiplier: 0.5,
            max_stake_pct: 0.05,
            high_confidence_score: 70.0,

            goals_low_line: 1.5,
            goals_high_line: 2.5,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
