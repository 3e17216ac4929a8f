//! Parlay quality classification.
//!
//! Applies the correlation penalty, computes candidate-level edge against
//! composite quoted odds, and stamps tradability flags and a risk level.
//! The penalty curve is a pluggable strategy; only its bounds are fixed:
//! it grows with correlation-tag overlap across legs and must leave
//! `adjusted_prob = combined_prob - penalty` inside `(0, combined_prob]`.

use tracing::debug;

use crate::config::ScoringPolicy;
use crate::markets::{correlation_tags, edge, implied_prob, risk_level};
use crate::types::{ParlayCandidate, QualityFlags, RiskLevel};

// ---------------------------------------------------------------------------
// Penalty strategy
// ---------------------------------------------------------------------------

/// Correlation-penalty strategy.
///
/// Contract: the returned penalty is non-negative, monotonically
/// non-decreasing in the degree of tag overlap across the candidate's
/// legs, and strictly less than `combined_prob`.
pub trait CorrelationPenalty: Send + Sync {
    fn penalty(&self, candidate: &ParlayCandidate, policy: &ScoringPolicy) -> f64;
}

/// Default strategy: every pairwise shared correlation tag across legs
/// costs `penalty_per_overlap` of the combined probability, capped at
/// half of it so the adjusted probability stays positive.
pub struct TagOverlapPenalty;

impl TagOverlapPenalty {
    /// Count pairwise shared tags across the candidate's legs.
    pub fn overlap_count(candidate: &ParlayCandidate, policy: &ScoringPolicy) -> usize {
        let tag_sets: Vec<_> = candidate
            .legs
            .iter()
            .map(|leg| correlation_tags(&leg.key, policy))
            .collect();

        let mut overlaps = 0;
        for i in 0..tag_sets.len() {
            for j in (i + 1)..tag_sets.len() {
                overlaps += tag_sets[i].intersection(&tag_sets[j]).count();
            }
        }
        overlaps
    }
}

impl CorrelationPenalty for TagOverlapPenalty {
    fn penalty(&self, candidate: &ParlayCandidate, policy: &ScoringPolicy) -> f64 {
        let overlaps = Self::overlap_count(candidate, policy) as f64;
        let raw = overlaps * policy.penalty_per_overlap * candidate.combined_prob;
        raw.min(0.5 * candidate.combined_prob)
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Classifies combined candidates for tradability.
pub struct QualityClassifier {
    policy: ScoringPolicy,
    penalty: Box<dyn CorrelationPenalty>,
}

impl QualityClassifier {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self {
            policy,
            penalty: Box::new(TagOverlapPenalty),
        }
    }

    /// Swap in a different penalty strategy.
    pub fn with_penalty(policy: ScoringPolicy, penalty: Box<dyn CorrelationPenalty>) -> Self {
        Self { policy, penalty }
    }

    /// Apply penalty, candidate-level edge, and tradability flags.
    ///
    /// `composite_odds` is the product of the quoted bookmaker odds for
    /// the candidate's legs; `None` when any leg is unquoted, in which
    /// case the edge is 0 and the candidate cannot clear the edge floor.
    pub fn classify(
        &self,
        mut candidate: ParlayCandidate,
        composite_odds: Option<f64>,
    ) -> ParlayCandidate {
        let penalty = self.penalty.penalty(&candidate, &self.policy);
        candidate.correlation_penalty = penalty;
        candidate.adjusted_prob = candidate.combined_prob - penalty;

        let quoted = composite_odds.map(implied_prob).unwrap_or(0.0);
        candidate.edge_pct = edge(candidate.adjusted_prob, quoted);

        let has_low_edge = candidate.edge_pct < self.policy.edge_floor;
        let has_low_probability = candidate.combined_prob < self.policy.prob_floor;
        let mut risk = risk_level(candidate.adjusted_prob, &self.policy);
        if has_low_edge && has_low_probability {
            risk = RiskLevel::VeryHigh;
        }

        candidate.flags = QualityFlags {
            is_tradable: !has_low_edge && !has_low_probability,
            has_low_edge,
            has_low_probability,
            risk_level: risk,
        };

        debug!(
            id = %candidate.id,
            penalty = format!("{:.4}", penalty),
            adjusted = format!("{:.4}", candidate.adjusted_prob),
            edge = format!("{:.2}%", candidate.edge_pct * 100.0),
            tradable = candidate.flags.is_tradable,
            "Candidate classified"
        );

        candidate
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
