//! Catalog persistence.
//!
//! Holds the recomputed `MarketOutcome` catalog keyed by
//! (match id, market key) and snapshots it to a JSON file. Writes are
//! idempotent overwrites: recomputing the same key is last-write-wins,
//! never an append, so concurrent recomputation of one match is safe.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use crate::types::{MarketKey, MarketOutcome};

/// Default catalog file path.
const DEFAULT_CATALOG_FILE: &str = "linesmith_catalog.json";

/// In-memory market outcome catalog.
#[derive(Debug, Default)]
pub struct CatalogStore {
    outcomes: HashMap<(String, MarketKey), MarketOutcome>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the outcome for its (match, key) slot.
    pub fn upsert(&mut self, outcome: MarketOutcome) {
        self.outcomes
            .insert((outcome.match_id.clone(), outcome.key), outcome);
    }

    /// Overwrite a whole batch.
    pub fn upsert_all(&mut self, outcomes: Vec<MarketOutcome>) {
        for outcome in outcomes {
            self.upsert(outcome);
        }
    }

    /// Replace a match's entire outcome set (wholesale recompute).
    /// Existing entries for the match are dropped first, so a market key
    /// that vanished upstream does not linger across sync passes.
    pub fn replace_match(&mut self, match_id: &str, outcomes: Vec<MarketOutcome>) {
        self.outcomes.retain(|(m, _), _| m != match_id);
        self.upsert_all(outcomes);
    }

    pub fn get(&self, match_id: &str, key: &MarketKey) -> Option<&MarketOutcome> {
        self.outcomes.get(&(match_id.to_string(), *key))
    }

    /// All outcomes for one match, ordered by market key.
    pub fn match_outcomes(&self, match_id: &str) -> Vec<&MarketOutcome> {
        let mut out: Vec<&MarketOutcome> = self
            .outcomes
            .values()
            .filter(|o| o.match_id == match_id)
            .collect();
        out.sort_by_key(|o| o.key);
        out
    }

    /// Every outcome in the catalog, ordered by (match, key).
    pub fn all(&self) -> Vec<&MarketOutcome> {
        let mut out: Vec<&MarketOutcome> = self.outcomes.values().collect();
        out.sort_by(|a, b| (&a.match_id, a.key).cmp(&(&b.match_id, b.key)));
        out
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Save the catalog to a JSON file.
    pub fn save(&self, path: Option<&str>) -> Result<()> {
        let path = path.unwrap_or(DEFAULT_CATALOG_FILE);
        let records: Vec<&MarketOutcome> = self.all();
        let json = serde_json::to_string_pretty(&records)
            .context("Failed to serialise catalog")?;

        std::fs::write(path, &json)
            .context(format!("Failed to write catalog to {path}"))?;

        debug!(path, outcomes = records.len(), "Catalog saved");
        Ok(())
    }

    /// Load a catalog from a JSON file.
    /// Returns an empty store if the file doesn't exist (fresh start).
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = path.unwrap_or(DEFAULT_CATALOG_FILE);

        if !Path::new(path).exists() {
            info!(path, "No saved catalog found, starting fresh");
            return Ok(Self::new());
        }

        let json = std::fs::read_to_string(path)
            .context(format!("Failed to read catalog from {path}"))?;
        let records: Vec<MarketOutcome> = serde_json::from_str(&json)
            .context(format!("Failed to parse catalog from {path}"))?;

        let mut store = Self::new();
        let count = records.len();
        store.upsert_all(records);

        info!(path, outcomes = count, "Catalog loaded from disk");
        Ok(store)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
