//! Parlay engine — leg selection, combination, and quality classification.

pub mod combiner;
pub mod quality;
pub mod selector;

use std::collections::HashMap;

use tracing::{debug, info};

use crate::config::ScoringPolicy;
use crate::types::{MarketKey, MarketOutcome, ParlayCandidate, ParlayLeg, ParlayScope};
use quality::QualityClassifier;

/// Quoted bookmaker odds lookup: (match id, market key) → decimal odds.
pub type QuoteBook = HashMap<(String, MarketKey), f64>;

/// Composite quoted odds for a set of legs: product of each leg's quoted
/// odds. `None` when any leg is unquoted — a partially quoted candidate
/// has no meaningful composite price.
pub fn composite_quoted_odds(legs: &[ParlayLeg], quotes: &QuoteBook) -> Option<f64> {
    legs.iter()
        .map(|leg| quotes.get(&(leg.match_id.clone(), leg.key)).copied())
        .try_fold(1.0, |acc, odds| odds.map(|o| acc * o))
}

/// Pipelines leg selection → combination → quality classification and
/// returns candidates ranked best-first.
///
/// Instantiate once per engine; the scoring policy is injected at
/// construction and shared by every stage.
pub struct ParlayPipeline {
    policy: ScoringPolicy,
    classifier: QualityClassifier,
}

impl ParlayPipeline {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self {
            classifier: QualityClassifier::new(policy.clone()),
            policy,
        }
    }

    /// Ephemeral single-match candidates from one match's classified
    /// outcomes.
    pub fn single_match(
        &self,
        outcomes: &[MarketOutcome],
        quotes: &QuoteBook,
    ) -> Vec<ParlayCandidate> {
        let legs = selector::select_legs(outcomes, &self.policy);
        let combined = combiner::combine(&legs, ParlayScope::SingleMatch, &self.policy);
        self.classify_and_rank(combined, quotes)
    }

    /// Durable cross-match candidates: the single best leg from each
    /// match, pooled and combined across matches.
    pub fn cross_match(
        &self,
        legs_per_match: &[Vec<ParlayLeg>],
        quotes: &QuoteBook,
    ) -> Vec<ParlayCandidate> {
        let mut pool: Vec<ParlayLeg> = legs_per_match
            .iter()
            .filter_map(|legs| legs.first().cloned())
            .collect();
        pool.sort_by(|a, b| {
            b.probability
                .partial_cmp(&a.probability)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        pool.truncate(self.policy.cross_match_pool);

        debug!(matches = legs_per_match.len(), pool = pool.len(), "Cross-match leg pool");

        let combined = combiner::combine(&pool, ParlayScope::CrossMatch, &self.policy);
        let ranked = self.classify_and_rank(combined, quotes);
        info!(candidates = ranked.len(), "Cross-match candidates built");
        ranked
    }

    /// Classify every candidate and rank by edge descending, adjusted
    /// probability as tie-break.
    fn classify_and_rank(
        &self,
        candidates: Vec<ParlayCandidate>,
        quotes: &QuoteBook,
    ) -> Vec<ParlayCandidate> {
        let mut classified: Vec<ParlayCandidate> = candidates
            .into_iter()
            .map(|c| {
                let composite = composite_quoted_odds(&c.legs, quotes);
                self.classifier.classify(c, composite)
            })
            .collect();

        classified.sort_by(|a, b| {
            b.edge_pct
                .partial_cmp(&a.edge_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(
                    b.adjusted_prob
                        .partial_cmp(&a.adjusted_prob)
                        .unwrap_or(std::cmp::Ordering::Equal),
                )
        });

        classified
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
