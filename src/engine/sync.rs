//! Batch resync engine.
//!
//! Recomputes the full market catalog and parlay candidate set from a
//! batch of match snapshots. Each match is independent and recomputed
//! wholesale from its own snapshot, so matches run as parallel tasks
//! and a failing match never cancels the batch: failures are counted,
//! logged with their match id, and the sync moves on.

use std::fmt;

use tracing::{info, warn};

use crate::clv::ClvEngine;
use crate::config::ScoringPolicy;
use crate::feeds::{MatchSnapshot, OddsTick};
use crate::markets::MarketCatalog;
use crate::parlay::{selector, ParlayPipeline, QuoteBook};
use crate::storage::CatalogStore;
use crate::types::{ClvRecord, EngineError, MarketOutcome, ParlayCandidate, ParlayLeg, Window};

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Summary of one resync pass.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub matches_processed: usize,
    pub matches_failed: usize,
    pub outcomes_written: usize,
    pub potential_candidates: usize,
    pub persisted_candidates: usize,
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "resync: matches={} failed={} outcomes={} potential={} persisted={}",
            self.matches_processed,
            self.matches_failed,
            self.outcomes_written,
            self.potential_candidates,
            self.persisted_candidates,
        )
    }
}

/// Everything a resync pass produced, ready for serving.
#[derive(Debug)]
pub struct SyncOutcome {
    pub report: SyncReport,
    /// Ephemeral single-match candidates, ranked best-first.
    pub potential: Vec<ParlayCandidate>,
    /// Durable cross-match candidates, ranked best-first.
    pub persisted: Vec<ParlayCandidate>,
}

/// Per-match computation result, produced inside a worker task.
struct MatchComputation {
    match_id: String,
    outcomes: Vec<MarketOutcome>,
    legs: Vec<ParlayLeg>,
    quotes: Vec<((String, crate::types::MarketKey), f64)>,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Orchestrates classify → select → combine → classify-quality across a
/// snapshot batch, plus the CLV window scan.
pub struct SyncEngine {
    policy: ScoringPolicy,
    pipeline: ParlayPipeline,
    clv: ClvEngine,
}

impl SyncEngine {
    pub fn new(policy: ScoringPolicy) -> Self {
        Self {
            pipeline: ParlayPipeline::new(policy.clone()),
            clv: ClvEngine::new(policy.clone()),
            policy,
        }
    }

    /// Recompute every snapshot's catalog entries and parlay candidates.
    ///
    /// Each processed match's outcome set replaces its previous entries
    /// wholesale: a market key that vanished from the feed is dropped,
    /// never left to linger from an earlier pass.
    pub async fn resync(
        &self,
        snapshots: Vec<MatchSnapshot>,
        store: &mut CatalogStore,
    ) -> SyncOutcome {
        let total = snapshots.len();
        info!(matches = total, "Starting resync pass");

        let handles = snapshots.into_iter().map(|snap| {
            let policy = self.policy.clone();
            tokio::spawn(async move { process_match(snap, &policy) })
        });
        let results = futures::future::join_all(handles).await;

        let mut report = SyncReport::default();
        let mut quotes = QuoteBook::new();
        let mut processed: Vec<MatchComputation> = Vec::new();

        for joined in results {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!(error = %e, "Match worker panicked, skipping");
                    report.matches_failed += 1;
                    continue;
                }
            };
            match result {
                Ok(mut computed) => {
                    report.matches_processed += 1;
                    report.outcomes_written += computed.outcomes.len();
                    quotes.extend(computed.quotes.drain(..));
                    processed.push(computed);
                }
                Err(e) => {
                    warn!(error = %e, "Match failed, continuing batch");
                    report.matches_failed += 1;
                }
            }
        }

        // Single-match candidates are built from this cycle's freshly
        // computed outcomes, not the store, and need the full quote book
        // for composite pricing, so they wait for all workers.
        let mut legs_per_match: Vec<Vec<ParlayLeg>> = Vec::new();
        let mut potential: Vec<ParlayCandidate> = Vec::new();
        for computed in processed {
            potential.extend(self.pipeline.single_match(&computed.outcomes, &quotes));
            legs_per_match.push(computed.legs);
            store.replace_match(&computed.match_id, computed.outcomes);
        }

        let persisted = self.pipeline.cross_match(&legs_per_match, &quotes);

        report.potential_candidates = potential.len();
        report.persisted_candidates = persisted.len();
        info!(%report, "Resync pass complete");

        SyncOutcome { report, potential, persisted }
    }

    /// Evaluate CLV for every tick matching a window label and optional
    /// league filter, sorted by CLV% descending. Non-computable ticks
    /// (zero/negative odds) are skipped.
    pub fn scan_clv(
        &self,
        ticks: &[OddsTick],
        window: Window,
        league: Option<&str>,
    ) -> Vec<ClvRecord> {
        let mut records: Vec<ClvRecord> = ticks
            .iter()
            .filter(|t| window.matches(t.window))
            .filter(|t| league.map_or(true, |l| t.league == l))
            .filter_map(|t| {
                self.clv.record(
                    &t.match_id,
                    &t.league,
                    t.outcome,
                    t.window,
                    t.entry_odds,
                    t.close_odds,
                    t.clv_pct,
                )
            })
            .collect();

        records.sort_by(|a, b| {
            b.clv_pct
                .partial_cmp(&a.clv_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        info!(
            ticks = ticks.len(),
            records = records.len(),
            window = %window,
            "CLV scan complete"
        );

        records
    }
}

// ---------------------------------------------------------------------------
// Per-match worker
// ---------------------------------------------------------------------------

/// Validate and classify one snapshot. Pure; runs inside a worker task.
fn process_match(
    snap: MatchSnapshot,
    policy: &ScoringPolicy,
) -> Result<MatchComputation, EngineError> {
    validate_snapshot(&snap)?;

    let catalog = MarketCatalog::new(policy.clone());
    let externals: Vec<_> = snap.external_probs.iter().map(|e| (e.key, e.value)).collect();
    let odds: Vec<_> = snap.market_odds.iter().map(|e| (e.key, e.value)).collect();

    let outcomes = catalog.classify_match(&snap.match_id, &snap.model_outputs, &externals, &odds);
    let legs = selector::select_legs(&outcomes, policy);

    let quotes = snap
        .market_odds
        .iter()
        .map(|e| ((snap.match_id.clone(), e.key), e.value))
        .collect();

    Ok(MatchComputation {
        match_id: snap.match_id,
        outcomes,
        legs,
        quotes,
    })
}

fn validate_snapshot(snap: &MatchSnapshot) -> Result<(), EngineError> {
    let fail = |message: String| {
        Err(EngineError::Snapshot {
            match_id: snap.match_id.clone(),
            message,
        })
    };

    if snap.match_id.trim().is_empty() {
        return Err(EngineError::Snapshot {
            match_id: "<blank>".to_string(),
            message: "empty match id".to_string(),
        });
    }

    for m in &snap.model_outputs {
        for (label, p) in [
            ("home", m.probs.home),
            ("draw", m.probs.draw),
            ("away", m.probs.away),
        ] {
            if !p.is_finite() || !(0.0..=1.0).contains(&p) {
                return fail(format!("model {} {label} probability out of range: {p}", m.model));
            }
        }
        if let Some(c) = m.confidence {
            if !c.is_finite() || !(0.0..=1.0).contains(&c) {
                return fail(format!("model {} confidence out of range: {c}", m.model));
            }
        }
    }

    for e in &snap.external_probs {
        if !e.value.is_finite() || !(0.0..=1.0).contains(&e.value) {
            return fail(format!("external probability out of range for {}: {}", e.key, e.value));
        }
    }

    for e in &snap.market_odds {
        if !e.value.is_finite() || e.value < 0.0 {
            return fail(format!("quoted odds out of range for {}: {}", e.key, e.value));
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feeds::MarketEntry;
    use crate::types::{
        MarketKey, MarketSide, MarketType, ModelId, ModelOutput, OutcomeCode, OutcomeProbs,
    };
    use chrono::Utc;

    fn model(id: ModelId, home: f64, draw: f64, away: f64, conf: f64) -> ModelOutput {
        ModelOutput {
            model: id,
            pick: OutcomeCode::H,
            confidence: Some(conf),
            probs: OutcomeProbs { home, draw, away },
        }
    }

    fn snapshot(match_id: &str) -> MatchSnapshot {
        let dnb = MarketKey::new(MarketType::Dnb, MarketSide::Home);
        let under = MarketKey::with_line(MarketType::Totals, MarketSide::Under, 3.5);
        MatchSnapshot {
            match_id: match_id.to_string(),
            league: "EPL".to_string(),
            kickoff: Utc::now(),
            model_outputs: vec![
                model(ModelId::V1, 0.50, 0.30, 0.20, 0.8),
                model(ModelId::V2, 0.56, 0.27, 0.17, 0.8),
            ],
            external_probs: vec![
                MarketEntry { key: dnb, value: 0.60 },
                MarketEntry { key: under, value: 0.58 },
            ],
            market_odds: vec![
                MarketEntry { key: dnb, value: 1.85 },
                MarketEntry { key: under, value: 1.90 },
            ],
        }
    }

    fn engine() -> SyncEngine {
        SyncEngine::new(ScoringPolicy::default())
    }

    #[tokio::test]
    async fn test_resync_writes_catalog_and_candidates() {
        let mut store = CatalogStore::new();
        let out = engine().resync(vec![snapshot("m1")], &mut store).await;

        assert_eq!(out.report.matches_processed, 1);
        assert_eq!(out.report.matches_failed, 0);
        // 3 × 1X2 + 2 externals
        assert_eq!(out.report.outcomes_written, 5);
        assert_eq!(store.len(), 5);

        // DNB 0.60 and TOTALS-under 0.58 qualify → one 2-leg candidate.
        assert_eq!(out.potential.len(), 1);
        assert!((out.potential[0].combined_prob - 0.348).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_vanished_market_dropped_on_resync() {
        let mut store = CatalogStore::new();
        let eng = engine();
        eng.resync(vec![snapshot("m1")], &mut store).await;
        let dnb = MarketKey::new(MarketType::Dnb, MarketSide::Home);
        assert!(store.get("m1", &dnb).is_some());

        // Next pass: the DNB external is no longer supplied upstream.
        let mut snap = snapshot("m1");
        snap.external_probs.retain(|e| e.key != dnb);
        let out = eng.resync(vec![snap], &mut store).await;

        // Wholesale recompute: the vanished key is gone, not lingering.
        assert!(store.get("m1", &dnb).is_none());
        assert_eq!(store.len(), 4); // 3 × 1X2 + the surviving TOTALS entry
        // And it cannot re-enter leg selection: only the under leg remains,
        // so no 2-leg candidate can form.
        assert!(out.potential.is_empty());
    }

    #[tokio::test]
    async fn test_resync_is_idempotent_overwrite() {
        let mut store = CatalogStore::new();
        let eng = engine();
        eng.resync(vec![snapshot("m1")], &mut store).await;
        let first_len = store.len();
        eng.resync(vec![snapshot("m1")], &mut store).await;
        assert_eq!(store.len(), first_len);
    }

    #[tokio::test]
    async fn test_bad_match_does_not_sink_batch() {
        let mut bad = snapshot("m_bad");
        bad.model_outputs[0].probs.home = 1.7; // out of range

        let mut store = CatalogStore::new();
        let out = engine()
            .resync(vec![snapshot("m1"), bad, snapshot("m2")], &mut store)
            .await;

        assert_eq!(out.report.matches_processed, 2);
        assert_eq!(out.report.matches_failed, 1);
        assert!(store.get("m_bad", &MarketKey::new(MarketType::MatchResult, MarketSide::Home)).is_none());
        assert!(store.get("m1", &MarketKey::new(MarketType::MatchResult, MarketSide::Home)).is_some());
    }

    #[tokio::test]
    async fn test_cross_match_candidates_span_matches() {
        let mut store = CatalogStore::new();
        let out = engine()
            .resync(vec![snapshot("m1"), snapshot("m2")], &mut store)
            .await;

        assert!(!out.persisted.is_empty());
        let c = &out.persisted[0];
        let match_ids: std::collections::HashSet<_> =
            c.legs.iter().map(|l| l.match_id.clone()).collect();
        assert!(match_ids.len() > 1);
    }

    #[tokio::test]
    async fn test_empty_batch_is_quiet() {
        let mut store = CatalogStore::new();
        let out = engine().resync(Vec::new(), &mut store).await;
        assert_eq!(out.report.matches_processed, 0);
        assert!(out.potential.is_empty());
        assert!(out.persisted.is_empty());
    }

    #[test]
    fn test_validate_rejects_blank_match_id() {
        let mut snap = snapshot(" ");
        snap.match_id = "  ".to_string();
        assert!(validate_snapshot(&snap).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_odds() {
        let mut snap = snapshot("m1");
        snap.market_odds[0].value = -2.0;
        assert!(validate_snapshot(&snap).is_err());
    }

    // -- CLV scan --

    fn tick(match_id: &str, league: &str, window: Window, entry: f64, close: f64) -> OddsTick {
        OddsTick {
            match_id: match_id.to_string(),
            league: league.to_string(),
            outcome: OutcomeCode::H,
            window,
            entry_odds: entry,
            close_odds: close,
            clv_pct: None,
        }
    }

    #[test]
    fn test_scan_clv_sorted_descending() {
        let ticks = vec![
            tick("m1", "EPL", Window::T24, 2.00, 1.90),
            tick("m2", "EPL", Window::T24, 2.00, 1.70),
            tick("m3", "EPL", Window::T24, 2.00, 1.80),
        ];
        let records = engine().scan_clv(&ticks, Window::T24, None);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].match_id, "m2");
        assert_eq!(records[2].match_id, "m1");
    }

    #[test]
    fn test_scan_clv_window_and_league_filters() {
        let ticks = vec![
            tick("m1", "EPL", Window::T24, 2.00, 1.80),
            tick("m2", "EPL", Window::T2, 2.00, 1.80),
            tick("m3", "SerieA", Window::T24, 2.00, 1.80),
        ];
        let eng = engine();
        assert_eq!(eng.scan_clv(&ticks, Window::T24, None).len(), 2);
        assert_eq!(eng.scan_clv(&ticks, Window::All, None).len(), 3);
        assert_eq!(eng.scan_clv(&ticks, Window::T24, Some("EPL")).len(), 1);
    }

    #[test]
    fn test_scan_clv_skips_not_computable() {
        let ticks = vec![
            tick("m1", "EPL", Window::T24, 0.0, 1.80),
            tick("m2", "EPL", Window::T24, 2.00, 1.80),
        ];
        let records = engine().scan_clv(&ticks, Window::All, None);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].match_id, "m2");
    }
}
