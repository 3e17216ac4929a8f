//! Parlay combination.
//!
//! Enumerates all 2- and 3-leg subsets of a qualifying leg list, rejects
//! contradictory subsets, and computes the combined probability and fair
//! odds for the survivors.
//!
//! Combined probability multiplies leg probabilities under an
//! independence assumption; legs are not guaranteed statistically
//! independent, so every candidate carries `independence_assumed = true`
//! rather than presenting the figure as exact.

use tracing::debug;
use uuid::Uuid;

use crate::config::ScoringPolicy;
use crate::markets::risk_level;
use crate::types::{ConfidenceTier, ParlayCandidate, ParlayLeg, ParlayScope, QualityFlags};

/// Two legs contradict when they share a market type and line but back
/// different sides (e.g. over 2.5 and under 2.5).
pub fn contradicts(a: &ParlayLeg, b: &ParlayLeg) -> bool {
    a.key.market == b.key.market && a.key.line == b.key.line && a.key.side != b.key.side
}

/// Confidence tier for a candidate. Three-leg candidates never reach
/// `high`: the extra leg compounds risk regardless of raw probability.
pub fn confidence_tier(leg_count: usize, combined_prob: f64, policy: &ScoringPolicy) -> ConfidenceTier {
    if leg_count == 2 && combined_prob >= policy.two_leg_high_prob {
        ConfidenceTier::High
    } else if combined_prob >= policy.tier_medium_prob {
        ConfidenceTier::Medium
    } else {
        ConfidenceTier::Low
    }
}

/// Build all contradiction-free 2- and 3-leg candidates from a leg list.
///
/// Output candidates carry fair odds and a confidence tier; quality
/// classification (penalty, edge, tradability) happens downstream.
pub fn combine(legs: &[ParlayLeg], scope: ParlayScope, policy: &ScoringPolicy) -> Vec<ParlayCandidate> {
    let mut candidates = Vec::new();

    for i in 0..legs.len() {
        for j in (i + 1)..legs.len() {
            if let Some(c) = build(&[&legs[i], &legs[j]], scope, policy) {
                candidates.push(c);
            }
            for k in (j + 1)..legs.len() {
                if let Some(c) = build(&[&legs[i], &legs[j], &legs[k]], scope, policy) {
                    candidates.push(c);
                }
            }
        }
    }

    debug!(
        legs = legs.len(),
        candidates = candidates.len(),
        scope = ?scope,
        "Parlay combination complete"
    );

    candidates
}

fn build(subset: &[&ParlayLeg], scope: ParlayScope, policy: &ScoringPolicy) -> Option<ParlayCandidate> {
    for i in 0..subset.len() {
        for j in (i + 1)..subset.len() {
            if contradicts(subset[i], subset[j]) {
                return None;
            }
        }
    }

    let combined_prob: f64 = subset.iter().map(|l| l.probability).product();
    if combined_prob <= 0.0 {
        return None;
    }
    let fair_odds = 1.0 / combined_prob;

    let legs: Vec<ParlayLeg> = subset
        .iter()
        .enumerate()
        .map(|(order, leg)| ParlayLeg { order, ..(*leg).clone() })
        .collect();

    Some(ParlayCandidate {
        id: Uuid::new_v4(),
        scope,
        combined_prob,
        correlation_penalty: 0.0,
        adjusted_prob: combined_prob,
        implied_odds: fair_odds,
        edge_pct: 0.0,
        confidence_tier: confidence_tier(legs.len(), combined_prob, policy),
        flags: QualityFlags {
            is_tradable: false,
            has_low_edge: false,
            has_low_probability: combined_prob < policy.prob_floor,
            risk_level: risk_level(combined_prob, policy),
        },
        independence_assumed: true,
        legs,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MarketKey, MarketSide, MarketType};

    fn leg(match_id: &str, key: MarketKey, prob: f64) -> ParlayLeg {
        ParlayLeg {
            match_id: match_id.to_string(),
            key,
            probability: prob,
            odds: 1.0 / prob,
            edge: 0.05,
            order: 0,
        }
    }

    fn policy() -> ScoringPolicy {
        ScoringPolicy::default()
    }

    #[test]
    fn test_two_legs_multiply() {
        let legs = vec![
            leg("m1", MarketKey::new(MarketType::Dnb, MarketSide::Home), 0.6),
            leg("m1", MarketKey::with_line(MarketType::Totals, MarketSide::Under, 3.5), 0.6),
        ];
        let out = combine(&legs, ParlayScope::SingleMatch, &policy());
        assert_eq!(out.len(), 1);
        assert!((out[0].combined_prob - 0.36).abs() < 1e-12);
        assert!((out[0].implied_odds - 2.7777777777).abs() < 1e-6);
        assert!(out[0].independence_assumed);
    }

    #[test]
    fn test_three_legs_enumerated() {
        let legs = vec![
            leg("m1", MarketKey::new(MarketType::Dnb, MarketSide::Home), 0.60),
            leg("m1", MarketKey::with_line(MarketType::Totals, MarketSide::Under, 3.5), 0.62),
            leg("m1", MarketKey::new(MarketType::Btts, MarketSide::No), 0.58),
        ];
        let out = combine(&legs, ParlayScope::SingleMatch, &policy());
        // 3 pairs + 1 triple
        assert_eq!(out.len(), 4);
        let triple = out.iter().find(|c| c.legs.len() == 3).unwrap();
        assert!((triple.combined_prob - 0.60 * 0.62 * 0.58).abs() < 1e-12);
    }

    #[test]
    fn test_contradictory_pair_rejected() {
        let legs = vec![
            leg("m1", MarketKey::with_line(MarketType::Totals, MarketSide::Over, 2.5), 0.6),
            leg("m1", MarketKey::with_line(MarketType::Totals, MarketSide::Under, 2.5), 0.6),
        ];
        let out = combine(&legs, ParlayScope::SingleMatch, &policy());
        assert!(out.is_empty());
    }

    #[test]
    fn test_same_market_different_lines_allowed() {
        let legs = vec![
            leg("m1", MarketKey::with_line(MarketType::Totals, MarketSide::Over, 1.5), 0.7),
            leg("m1", MarketKey::with_line(MarketType::Totals, MarketSide::Under, 4.5), 0.8),
        ];
        let out = combine(&legs, ParlayScope::SingleMatch, &policy());
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_no_candidate_contains_opposing_legs() {
        let legs = vec![
            leg("m1", MarketKey::new(MarketType::Btts, MarketSide::Yes), 0.58),
            leg("m1", MarketKey::new(MarketType::Btts, MarketSide::No), 0.57),
            leg("m1", MarketKey::new(MarketType::Dnb, MarketSide::Home), 0.60),
            leg("m1", MarketKey::with_line(MarketType::Totals, MarketSide::Under, 3.5), 0.65),
        ];
        let out = combine(&legs, ParlayScope::SingleMatch, &policy());
        for candidate in &out {
            for i in 0..candidate.legs.len() {
                for j in (i + 1)..candidate.legs.len() {
                    assert!(!contradicts(&candidate.legs[i], &candidate.legs[j]));
                }
            }
        }
        // The BTTS yes/no pair must be absent, everything else combines.
        assert!(!out.is_empty());
    }

    #[test]
    fn test_two_leg_tiering() {
        let p = policy();
        assert_eq!(confidence_tier(2, 0.36, &p), ConfidenceTier::High);
        assert_eq!(confidence_tier(2, 0.35, &p), ConfidenceTier::High);
        assert_eq!(confidence_tier(2, 0.30, &p), ConfidenceTier::Medium);
        assert_eq!(confidence_tier(2, 0.19, &p), ConfidenceTier::Low);
    }

    #[test]
    fn test_three_leg_never_high() {
        let p = policy();
        assert_eq!(confidence_tier(3, 0.50, &p), ConfidenceTier::Medium);
        assert_eq!(confidence_tier(3, 0.20, &p), ConfidenceTier::Medium);
        assert_eq!(confidence_tier(3, 0.19, &p), ConfidenceTier::Low);
    }

    #[test]
    fn test_dnb_totals_scenario_is_medium() {
        // DNB-home 0.60 × TOTALS-under-3.5 0.58 ≈ 0.348 → medium tier.
        let legs = vec![
            leg("m1", MarketKey::new(MarketType::Dnb, MarketSide::Home), 0.60),
            leg("m1", MarketKey::with_line(MarketType::Totals, MarketSide::Under, 3.5), 0.58),
        ];
        let out = combine(&legs, ParlayScope::SingleMatch, &policy());
        assert_eq!(out.len(), 1);
        assert!((out[0].combined_prob - 0.348).abs() < 1e-9);
        assert_eq!(out[0].confidence_tier, ConfidenceTier::Medium);
    }

    #[test]
    fn test_leg_order_reassigned_within_candidate() {
        let legs = vec![
            leg("m1", MarketKey::new(MarketType::Dnb, MarketSide::Home), 0.60),
            leg("m2", MarketKey::new(MarketType::Btts, MarketSide::No), 0.58),
        ];
        let out = combine(&legs, ParlayScope::CrossMatch, &policy());
        assert_eq!(out[0].legs[0].order, 0);
        assert_eq!(out[0].legs[1].order, 1);
    }
}
