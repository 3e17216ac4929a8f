//! Closing-line-value engine.
//!
//! Converts an entry/closing odds pair into CLV%, expected value%, a
//! 0–100 confidence score, and a Kelly-derived stake recommendation.
//! Pure and synchronous; unusable odds yield an explicit not-computable
//! `None` rather than a NaN that propagates downstream.

use tracing::debug;

use crate::config::ScoringPolicy;
use crate::types::{ClvRecord, OutcomeCode, Window};

/// Computed CLV metrics for one odds movement.
#[derive(Debug, Clone, Copy)]
pub struct ClvMetrics {
    pub entry_implied_prob: f64,
    pub close_implied_prob: f64,
    /// Percentage change between the two implied probabilities.
    pub clv_pct: f64,
    /// Expected value % treating the closing probability as ground truth.
    pub ev_percent: f64,
    /// 0–100, monotone in `ev_percent`, saturating at the bounds.
    pub confidence_score: f64,
    /// Raw Kelly fraction, clamped to [0, 1].
    pub kelly_fraction: f64,
    /// Fractional-Kelly stake, capped at the bankroll ceiling.
    pub recommended_stake: f64,
}

/// Evaluates closing line value and stake sizing.
pub struct ClvEngine {
    policy: ScoringPolicy,
}

impl ClvEngine {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    /// Access the scoring policy.
    pub fn policy(&self) -> &ScoringPolicy {
        &self.policy
    }

    /// Evaluate an entry-vs-closing odds pair.
    ///
    /// `supplied_clv_pct` carries an upstream-precomputed CLV% through
    /// unchanged; when absent it is recomputed with the identical
    /// formula. Returns `None` when either odds is non-positive.
    pub fn evaluate(
        &self,
        entry_odds: f64,
        close_odds: f64,
        supplied_clv_pct: Option<f64>,
    ) -> Option<ClvMetrics> {
        if entry_odds <= 0.0 || close_odds <= 0.0 {
            debug!(entry_odds, close_odds, "CLV not computable for non-positive odds");
            return None;
        }

        let entry_implied_prob = 1.0 / entry_odds;
        let close_implied_prob = 1.0 / close_odds;

        let clv_pct = supplied_clv_pct
            .unwrap_or((close_implied_prob / entry_implied_prob - 1.0) * 100.0);
        let ev_percent = (close_implied_prob * entry_odds - 1.0) * 100.0;

        // Linear map saturating at the bounds; crosses the high-confidence
        // cutoff (70) at +8% EV.
        let confidence_score = (50.0 + 2.5 * ev_percent).clamp(0.0, 100.0);

        // Kelly needs a positive net payout; at or below even odds the
        // fraction is zero by definition.
        let kelly_fraction = if entry_odds > 1.0 {
            (close_implied_prob - (1.0 - close_implied_prob) / (entry_odds - 1.0)).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let recommended_stake =
            (self.policy.kelly_multiplier * kelly_fraction).min(self.policy.max_stake_pct);

        Some(ClvMetrics {
            entry_implied_prob,
            close_implied_prob,
            clv_pct,
            ev_percent,
            confidence_score,
            kelly_fraction,
            recommended_stake,
        })
    }

    /// Whether a metric set clears the documented high-confidence cutoff.
    pub fn is_high_confidence(&self, metrics: &ClvMetrics) -> bool {
        metrics.confidence_score >= self.policy.high_confidence_score
    }

    /// Build a full CLV record for one tracked outcome, or `None` when
    /// the odds pair is not computable.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &self,
        match_id: &str,
        league: &str,
        outcome: OutcomeCode,
        window: Window,
        entry_odds: f64,
        close_odds: f64,
        supplied_clv_pct: Option<f64>,
    ) -> Option<ClvRecord> {
        let m = self.evaluate(entry_odds, close_odds, supplied_clv_pct)?;
        Some(ClvRecord {
            match_id: match_id.to_string(),
            league: league.to_string(),
            outcome,
            window,
            entry_odds,
            close_odds,
            clv_pct: m.clv_pct,
            ev_percent: m.ev_percent,
            confidence_score: m.confidence_score,
            kelly_fraction: m.kelly_fraction,
            recommended_stake: m.recommended_stake,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
