//! Upstream feed inputs.
//!
//! Defines the `SnapshotProvider` trait and the snapshot/odds-tick types
//! the engine consumes. Ingestion itself lives outside this repository;
//! providers here read pre-delivered JSON exports so the engine stays a
//! pure consumer of read-only snapshots.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::types::{MarketKey, ModelOutput, OutcomeCode, Window};

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// One market's externally supplied probability or quoted odds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketEntry {
    #[serde(flatten)]
    pub key: MarketKey,
    pub value: f64,
}

/// Everything the engine needs to recompute one match's catalog:
/// both models' outputs, the secondary-feed probabilities, and the
/// best-available bookmaker odds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub match_id: String,
    pub league: String,
    pub kickoff: DateTime<Utc>,
    #[serde(default)]
    pub model_outputs: Vec<ModelOutput>,
    /// Secondary-feed probabilities (DNB/BTTS/TOTALS/DC/WTN), no confidence.
    #[serde(default)]
    pub external_probs: Vec<MarketEntry>,
    /// Quoted decimal odds per market key.
    #[serde(default)]
    pub market_odds: Vec<MarketEntry>,
}

/// Entry/closing odds movement for one 1X2 outcome within a labeled window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OddsTick {
    pub match_id: String,
    pub league: String,
    pub outcome: OutcomeCode,
    pub window: Window,
    /// Best-available decimal odds at detection time.
    pub entry_odds: f64,
    /// Composite/consensus decimal odds at the window's reference time.
    pub close_odds: f64,
    /// Upstream-precomputed CLV%, when the feed supplies one.
    #[serde(default)]
    pub clv_pct: Option<f64>,
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Abstraction over snapshot delivery.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Fetch the current per-match snapshots for upcoming matches.
    async fn fetch_snapshots(&self) -> Result<Vec<MatchSnapshot>>;

    /// Fetch the odds-movement ticks feeding CLV evaluation.
    async fn fetch_odds_ticks(&self) -> Result<Vec<OddsTick>>;

    /// Provider name for logging and identification.
    fn name(&self) -> &str;
}

/// File-backed provider reading JSON exports dropped by the ingestion jobs.
pub struct FileSnapshotProvider {
    snapshot_path: String,
    odds_path: String,
}

impl FileSnapshotProvider {
    pub fn new(snapshot_path: impl Into<String>, odds_path: impl Into<String>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            odds_path: odds_path.into(),
        }
    }

    fn read_json<T: serde::de::DeserializeOwned>(path: &str) -> Result<Vec<T>> {
        if !Path::new(path).exists() {
            info!(path, "Feed file not present, treating as empty");
            return Ok(Vec::new());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read feed file: {path}"))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse feed file: {path}"))
    }
}

#[async_trait]
impl SnapshotProvider for FileSnapshotProvider {
    async fn fetch_snapshots(&self) -> Result<Vec<MatchSnapshot>> {
        let snapshots: Vec<MatchSnapshot> = Self::read_json(&self.snapshot_path)?;
        info!(
            path = %self.snapshot_path,
            matches = snapshots.len(),
            "Snapshots loaded"
        );
        Ok(snapshots)
    }

    async fn fetch_odds_ticks(&self) -> Result<Vec<OddsTick>> {
        let ticks: Vec<OddsTick> = Self::read_json(&self.odds_path)?;
        info!(path = %self.odds_path, ticks = ticks.len(), "Odds ticks loaded");
        Ok(ticks)
    }

    fn name(&self) -> &str {
        "file"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MarketSide, MarketType, ModelId, OutcomeProbs};
    use uuid::Uuid;

    fn temp_path(tag: &str) -> String {
        let mut p = std::env::temp_dir();
        p.push(format!("linesmith_feed_{tag}_{}.json", Uuid::new_v4()));
        p.to_string_lossy().to_string()
    }

    #[test]
    fn test_snapshot_serde_roundtrip() {
        let snap = MatchSnapshot {
            match_id: "m1".into(),
            league: "EPL".into(),
            kickoff: Utc::now(),
            model_outputs: vec![ModelOutput {
                model: ModelId::V1,
                pick: OutcomeCode::H,
                confidence: Some(0.8),
                probs: OutcomeProbs { home: 0.5, draw: 0.3, away: 0.2 },
            }],
            external_probs: vec![MarketEntry {
                key: MarketKey::new(MarketType::Dnb, MarketSide::Home),
                value: 0.61,
            }],
            market_odds: vec![MarketEntry {
                key: MarketKey::with_line(MarketType::Totals, MarketSide::Under, 3.5),
                value: 1.85,
            }],
        };
        let json = serde_json::to_string(&snap).unwrap();
        let back: MatchSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back.match_id, "m1");
        assert_eq!(back.external_probs[0].key.market, MarketType::Dnb);
        assert_eq!(back.market_odds[0].key.line.unwrap().goals(), 3.5);
    }

    #[test]
    fn test_odds_tick_defaults_optional_clv() {
        let json = r#"{
            "match_id": "m1",
            "league": "EPL",
            "outcome": "H",
            "window": "t-24h",
            "entry_odds": 2.0,
            "close_odds": 1.8
        }"#;
        let tick: OddsTick = serde_json::from_str(json).unwrap();
        assert!(tick.clv_pct.is_none());
        assert_eq!(tick.window, Window::T24);
    }

    #[tokio::test]
    async fn test_missing_files_are_empty_feeds() {
        let provider = FileSnapshotProvider::new(
            "/tmp/linesmith_missing_snapshots.json",
            "/tmp/linesmith_missing_odds.json",
        );
        assert!(provider.fetch_snapshots().await.unwrap().is_empty());
        assert!(provider.fetch_odds_ticks().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_provider_reads_snapshots() {
        let path = temp_path("snap");
        let snaps = vec![MatchSnapshot {
            match_id: "m9".into(),
            league: "SerieA".into(),
            kickoff: Utc::now(),
            model_outputs: Vec::new(),
            external_probs: Vec::new(),
            market_odds: Vec::new(),
        }];
        std::fs::write(&path, serde_json::to_string(&snaps).unwrap()).unwrap();

        let provider = FileSnapshotProvider::new(&path, "/tmp/linesmith_none.json");
        let loaded = provider.fetch_snapshots().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].match_id, "m9");

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_malformed_feed_is_an_error() {
        let path = temp_path("bad");
        std::fs::write(&path, "not json").unwrap();
        let provider = FileSnapshotProvider::new(&path, "/tmp/linesmith_none.json");
        assert!(provider.fetch_snapshots().await.is_err());
        std::fs::remove_file(&path).unwrap();
    }
}
