//! Consensus blending.
//!
//! Merges up to two independent models' (probability, confidence) pairs
//! for one outcome into a single consensus probability, confidence, and
//! model-agreement score. Degrades through a fallback chain when inputs
//! are missing — blending never fails.

use tracing::debug;

use crate::config::ScoringPolicy;
use crate::types::{Consensus, ModelOutput, OutcomeCode};

/// One model's view of a single outcome.
#[derive(Debug, Clone, Copy)]
pub struct ModelSignal {
    pub prob: f64,
    /// Self-reported confidence (0–1). `None` for sources without a
    /// confidence signal; the policy default applies.
    pub confidence: Option<f64>,
}

impl ModelSignal {
    pub fn new(prob: f64, confidence: f64) -> Self {
        Self { prob, confidence: Some(confidence) }
    }
}

/// Blends model outputs into consensus estimates.
pub struct ConsensusBlender {
    policy: ScoringPolicy,
}

impl ConsensusBlender {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self { policy }
    }

    /// Blend up to two model signals for the same outcome.
    ///
    /// - Both absent → all-zero consensus.
    /// - One present → that probability/confidence, agreement 1.0.
    /// - Both present → confidence-weighted average probability, mean
    ///   confidence, agreement = 1 − |p1 − p2|.
    pub fn blend(&self, a: Option<ModelSignal>, b: Option<ModelSignal>) -> Consensus {
        match (a, b) {
            (None, None) => Consensus { prob: 0.0, confidence: 0.0, agreement: 0.0 },
            (Some(s), None) | (None, Some(s)) => Consensus {
                prob: s.prob,
                confidence: self.confidence_of(s),
                agreement: 1.0,
            },
            (Some(s1), Some(s2)) => {
                let c1 = self.confidence_of(s1);
                let c2 = self.confidence_of(s2);
                let total = c1 + c2;
                // Equal weights when neither model reports any confidence.
                let (w1, w2) = if total > 0.0 {
                    (c1 / total, c2 / total)
                } else {
                    (0.5, 0.5)
                };
                let prob = w1 * s1.prob + w2 * s2.prob;
                let agreement = 1.0 - (s1.prob - s2.prob).abs();
                debug!(
                    p1 = format!("{:.3}", s1.prob),
                    p2 = format!("{:.3}", s2.prob),
                    w1 = format!("{:.2}", w1),
                    consensus = format!("{:.3}", prob),
                    agreement = format!("{:.2}", agreement),
                    "Blended two model signals"
                );
                Consensus {
                    prob,
                    confidence: (c1 + c2) / 2.0,
                    agreement,
                }
            }
        }
    }

    /// Consensus for an externally computed aggregate-market probability
    /// (secondary feed: DNB/BTTS/TOTALS/DOUBLE_CHANCE/WIN_TO_NIL).
    /// No per-model confidence exists, so the fixed external confidence
    /// applies and there is no second opinion to disagree with.
    pub fn external(&self, prob: f64) -> Consensus {
        Consensus {
            prob,
            confidence: self.policy.external_market_confidence,
            agreement: 1.0,
        }
    }

    /// Blend the two models' 1X2 probabilities for a given outcome.
    pub fn blend_outcome(
        &self,
        v1: Option<&ModelOutput>,
        v2: Option<&ModelOutput>,
        outcome: OutcomeCode,
    ) -> Consensus {
        let signal = |m: &ModelOutput| ModelSignal {
            prob: m.probs.get(outcome),
            confidence: m.confidence,
        };
        self.blend(v1.map(signal), v2.map(signal))
    }

    fn confidence_of(&self, s: ModelSignal) -> f64 {
        s.confidence.unwrap_or(self.policy.default_model_confidence)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
