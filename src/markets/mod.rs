//! Market classification.
//!
//! Turns blended consensus probabilities into a fully classified
//! `MarketOutcome` catalog for a match: guarded edge vs. the odds-implied
//! probability, risk tiering with exact inclusive boundaries, and the
//! fixed correlation-tag table used later for parlay penalties.

use std::collections::BTreeSet;

use tracing::debug;

use crate::config::ScoringPolicy;
use crate::consensus::ConsensusBlender;
use crate::types::{
    Consensus, CorrelationTag, MarketKey, MarketOutcome, MarketSide, MarketType, ModelId,
    ModelOutput, OutcomeCode, RiskLevel, SettleType,
};

// ---------------------------------------------------------------------------
// Pure classification functions
// ---------------------------------------------------------------------------

/// Edge of a model probability over the odds-implied probability.
/// Guarded: returns 0 when either operand is non-positive — a missing
/// quote must never produce an unbounded ratio.
pub fn edge(model_prob: f64, implied_prob: f64) -> f64 {
    if model_prob <= 0.0 || implied_prob <= 0.0 {
        0.0
    } else {
        model_prob / implied_prob - 1.0
    }
}

/// Implied probability of decimal odds, 0 when the odds are unusable.
pub fn implied_prob(odds: f64) -> f64 {
    if odds > 0.0 {
        1.0 / odds
    } else {
        0.0
    }
}

/// Risk tier of a single outcome probability. Boundaries are inclusive:
/// exactly 0.20 is `low`, exactly 0.10 is `medium`.
pub fn risk_level(prob: f64, policy: &ScoringPolicy) -> RiskLevel {
    if prob >= policy.risk_low_prob {
        RiskLevel::Low
    } else if prob >= policy.risk_medium_prob {
        RiskLevel::Medium
    } else {
        RiskLevel::High
    }
}

/// How a market settles.
pub fn settle_type(market: MarketType) -> SettleType {
    match market {
        MarketType::MatchResult => SettleType::ThreeWay,
        MarketType::Dnb => SettleType::DrawVoid,
        MarketType::Totals
        | MarketType::Btts
        | MarketType::DoubleChance
        | MarketType::WinToNil => SettleType::TwoWay,
    }
}

/// Fixed correlation-tag lookup for a market key.
pub fn correlation_tags(key: &MarketKey, policy: &ScoringPolicy) -> BTreeSet<CorrelationTag> {
    let mut tags = BTreeSet::new();
    match key.market {
        MarketType::Totals => {
            tags.insert(CorrelationTag::Totals);
            match key.side {
                MarketSide::Over => {
                    tags.insert(CorrelationTag::Over);
                }
                MarketSide::Under => {
                    tags.insert(CorrelationTag::Under);
                }
                _ => {}
            }
            if let Some(line) = key.line {
                if line.goals() <= policy.goals_low_line {
                    tags.insert(CorrelationTag::GoalsLow);
                }
                if line.goals() >= policy.goals_high_line {
                    tags.insert(CorrelationTag::GoalsHigh);
                }
            }
        }
        MarketType::Btts => {
            tags.insert(CorrelationTag::Btts);
            match key.side {
                MarketSide::Yes => {
                    tags.insert(CorrelationTag::GoalsHigh);
                }
                MarketSide::No => {
                    tags.insert(CorrelationTag::GoalsLow);
                    tags.insert(CorrelationTag::CleanSheet);
                }
                _ => {}
            }
        }
        MarketType::MatchResult | MarketType::Dnb => {
            tags.insert(CorrelationTag::MatchResult);
            match key.side {
                MarketSide::Home => {
                    tags.insert(CorrelationTag::HomeWin);
                }
                MarketSide::Away => {
                    tags.insert(CorrelationTag::AwayWin);
                }
                _ => {}
            }
        }
        MarketType::DoubleChance => {
            tags.insert(CorrelationTag::DoubleChance);
            tags.insert(CorrelationTag::MatchResult);
            match key.side {
                MarketSide::HomeOrDraw => {
                    tags.insert(CorrelationTag::HomeWin);
                }
                MarketSide::DrawOrAway => {
                    tags.insert(CorrelationTag::AwayWin);
                }
                _ => {}
            }
        }
        MarketType::WinToNil => {
            tags.insert(CorrelationTag::WinToNil);
            tags.insert(CorrelationTag::CleanSheet);
            match key.side {
                MarketSide::Home => {
                    tags.insert(CorrelationTag::HomeWin);
                }
                MarketSide::Away => {
                    tags.insert(CorrelationTag::AwayWin);
                }
                _ => {}
            }
        }
    }
    tags
}

// ---------------------------------------------------------------------------
// Catalog builder
// ---------------------------------------------------------------------------

/// Builds the classified `MarketOutcome` set for a match from model
/// outputs, the secondary probability feed, and quoted odds.
pub struct MarketCatalog {
    blender: ConsensusBlender,
    policy: ScoringPolicy,
}

impl MarketCatalog {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self {
            blender: ConsensusBlender::new(policy.clone()),
            policy,
        }
    }

    /// Recompute every market outcome for one match, wholesale.
    ///
    /// 1X2 outcomes come from blending the two models; secondary-feed
    /// markets are single-source externals at the fixed confidence.
    /// Edge uses the quoted odds for the same key when available.
    pub fn classify_match(
        &self,
        match_id: &str,
        model_outputs: &[ModelOutput],
        external_probs: &[(MarketKey, f64)],
        market_odds: &[(MarketKey, f64)],
    ) -> Vec<MarketOutcome> {
        let v1 = model_outputs.iter().find(|m| m.model == ModelId::V1);
        let v2 = model_outputs.iter().find(|m| m.model == ModelId::V2);

        let mut outcomes = Vec::new();

        // 1X2 from the blended models.
        for (code, side) in [
            (OutcomeCode::H, MarketSide::Home),
            (OutcomeCode::D, MarketSide::Draw),
            (OutcomeCode::A, MarketSide::Away),
        ] {
            let key = MarketKey::new(MarketType::MatchResult, side);
            let consensus = self.blender.blend_outcome(v1, v2, code);
            outcomes.push(self.build_outcome(match_id, key, consensus, market_odds));
        }

        // Secondary-feed markets.
        for (key, prob) in external_probs {
            let consensus = self.blender.external(*prob);
            outcomes.push(self.build_outcome(match_id, *key, consensus, market_odds));
        }

        debug!(
            match_id,
            outcomes = outcomes.len(),
            models = model_outputs.len(),
            externals = external_probs.len(),
            "Match classified"
        );

        outcomes
    }

    fn build_outcome(
        &self,
        match_id: &str,
        key: MarketKey,
        consensus: Consensus,
        market_odds: &[(MarketKey, f64)],
    ) -> MarketOutcome {
        let quoted = market_odds
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, odds)| implied_prob(*odds))
            .unwrap_or(0.0);

        MarketOutcome {
            match_id: match_id.to_string(),
            key,
            consensus_prob: consensus.prob,
            consensus_confidence: consensus.confidence,
            model_agreement: consensus.agreement,
            edge: edge(consensus.prob, quoted),
            correlation_tags: correlation_tags(&key, &self.policy),
            risk_level: risk_level(consensus.prob, &self.policy),
            settle_type: settle_type(key.market),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
