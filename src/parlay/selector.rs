//! Leg selection.
//!
//! Filters a match's classified outcomes down to the legs eligible for
//! parlay combination: per-market minimum-probability thresholds from the
//! scoring policy, then a top-N cap by probability to bound the
//! combinatorial blow-up downstream.

use tracing::debug;

use crate::config::ScoringPolicy;
use crate::types::{MarketOutcome, MarketSide, MarketType, ParlayLeg};

/// Minimum qualifying probability for a market/side, or `None` when the
/// market is not eligible as a parlay leg (e.g. raw 1X2 outcomes).
fn min_prob(outcome: &MarketOutcome, policy: &ScoringPolicy) -> Option<f64> {
    match (outcome.key.market, outcome.key.side) {
        (MarketType::Dnb, MarketSide::Home | MarketSide::Away) => Some(policy.dnb_min_prob),
        (MarketType::Totals, MarketSide::Under) => Some(policy.totals_under_min_prob),
        (MarketType::Totals, MarketSide::Over) => Some(policy.totals_over_min_prob),
        (MarketType::Btts, MarketSide::Yes | MarketSide::No) => Some(policy.btts_min_prob),
        (MarketType::DoubleChance, MarketSide::HomeOrDraw | MarketSide::DrawOrAway) => {
            Some(policy.double_chance_min_prob)
        }
        (MarketType::WinToNil, MarketSide::Home | MarketSide::Away) => {
            Some(policy.win_to_nil_min_prob)
        }
        _ => None,
    }
}

/// Select the qualifying legs for one match, best-first, capped at
/// `max_legs_per_match`.
pub fn select_legs(outcomes: &[MarketOutcome], policy: &ScoringPolicy) -> Vec<ParlayLeg> {
    let mut legs: Vec<ParlayLeg> = outcomes
        .iter()
        .filter_map(|o| {
            let threshold = min_prob(o, policy)?;
            if o.consensus_prob < threshold || o.consensus_prob <= 0.0 {
                return None;
            }
            Some(ParlayLeg {
                match_id: o.match_id.clone(),
                key: o.key,
                probability: o.consensus_prob,
                odds: 1.0 / o.consensus_prob,
                edge: o.edge,
                order: 0,
            })
        })
        .collect();

    legs.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    legs.truncate(policy.max_legs_per_match);
    for (i, leg) in legs.iter_mut().enumerate() {
        leg.order = i;
    }

    debug!(
        candidates_in = outcomes.len(),
        legs_out = legs.len(),
        "Leg selection complete"
    );

    legs
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markets::{correlation_tags, risk_level, settle_type};
    use crate::types::MarketKey;

    fn outcome(key: MarketKey, prob: f64) -> MarketOutcome {
        let policy = ScoringPolicy::default();
        MarketOutcome {
            match_id: "m1".to_string(),
            key,
            consensus_prob: prob,
            consensus_confidence: 0.7,
            model_agreement: 1.0,
            edge: 0.05,
            correlation_tags: correlation_tags(&key, &policy),
            risk_level: risk_level(prob, &policy),
            settle_type: settle_type(key.market),
        }
    }

    #[test]
    fn test_dnb_threshold() {
        let policy = ScoringPolicy::default();
        let above = outcome(MarketKey::new(MarketType::Dnb, MarketSide::Home), 0.56);
        let below = outcome(MarketKey::new(MarketType::Dnb, MarketSide::Away), 0.54);
        let legs = select_legs(&[above, below], &policy);
        assert_eq!(legs.len(), 1);
        assert_eq!(legs[0].key.side, MarketSide::Home);
    }

    #[test]
    fn test_win_to_nil_lower_threshold() {
        let policy = ScoringPolicy::default();
        let wtn = outcome(MarketKey::new(MarketType::WinToNil, MarketSide::Home), 0.36);
        let legs = select_legs(&[wtn], &policy);
        assert_eq!(legs.len(), 1);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let policy = ScoringPolicy::default();
        let exact = outcome(MarketKey::new(MarketType::Btts, MarketSide::Yes), 0.55);
        let legs = select_legs(&[exact], &policy);
        assert_eq!(legs.len(), 1);
    }

    #[test]
    fn test_match_result_not_eligible() {
        let policy = ScoringPolicy::default();
        let mr = outcome(MarketKey::new(MarketType::MatchResult, MarketSide::Home), 0.80);
        let legs = select_legs(&[mr], &policy);
        assert!(legs.is_empty());
    }

    #[test]
    fn test_cap_keeps_top_three_by_probability() {
        let policy = ScoringPolicy::default();
        let outcomes = vec![
            outcome(MarketKey::new(MarketType::Dnb, MarketSide::Home), 0.58),
            outcome(MarketKey::with_line(MarketType::Totals, MarketSide::Under, 3.5), 0.72),
            outcome(MarketKey::new(MarketType::Btts, MarketSide::No), 0.60),
            outcome(MarketKey::new(MarketType::DoubleChance, MarketSide::HomeOrDraw), 0.65),
        ];
        let legs = select_legs(&outcomes, &policy);
        assert_eq!(legs.len(), 3);
        // Best-first ordering with order indices assigned.
        assert!((legs[0].probability - 0.72).abs() < 1e-12);
        assert!((legs[1].probability - 0.65).abs() < 1e-12);
        assert!((legs[2].probability - 0.60).abs() < 1e-12);
        assert_eq!(legs[0].order, 0);
        assert_eq!(legs[2].order, 2);
    }

    #[test]
    fn test_leg_odds_are_reciprocal_probability() {
        let policy = ScoringPolicy::default();
        let o = outcome(MarketKey::new(MarketType::Dnb, MarketSide::Home), 0.60);
        let legs = select_legs(&[o], &policy);
        assert!((legs[0].odds - 1.0 / 0.60).abs() < 1e-12);
    }
}
