//! Dashboard API route handlers.
//!
//! All endpoints return JSON. State is shared via `Arc<DashboardState>`;
//! the engine publishes each cycle's results, handlers only read.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::engine::SyncReport;
use crate::types::{ClvRecord, MarketOutcome, ParlayCandidate, Window};

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// Shared state accessible by all route handlers.
pub struct DashboardState {
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub cycle_count: RwLock<u64>,
    pub outcomes: RwLock<Vec<MarketOutcome>>,
    pub parlays: RwLock<Vec<ParlayCandidate>>,
    pub clv_records: RwLock<Vec<ClvRecord>>,
    pub last_report: RwLock<Option<SyncReport>>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self {
            started_at: chrono::Utc::now(),
            cycle_count: RwLock::new(0),
            outcomes: RwLock::new(Vec::new()),
            parlays: RwLock::new(Vec::new()),
            clv_records: RwLock::new(Vec::new()),
            last_report: RwLock::new(None),
        }
    }

    /// Publish one cycle's results wholesale.
    pub async fn publish_cycle(
        &self,
        report: SyncReport,
        outcomes: Vec<MarketOutcome>,
        parlays: Vec<ParlayCandidate>,
        clv_records: Vec<ClvRecord>,
    ) {
        *self.outcomes.write().await = outcomes;
        *self.parlays.write().await = parlays;
        *self.clv_records.write().await = clv_records;
        *self.last_report.write().await = Some(report);
        *self.cycle_count.write().await += 1;
    }
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

pub type AppState = Arc<DashboardState>;

// ---------------------------------------------------------------------------
// Query and response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct MarketsQuery {
    pub match_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ClvQuery {
    pub window: Option<Window>,
    pub league: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportResponse {
    pub status: String,
    pub cycle_count: u64,
    pub matches_processed: usize,
    pub matches_failed: usize,
    pub outcomes_written: usize,
    pub potential_candidates: usize,
    pub persisted_candidates: usize,
    pub catalog_size: usize,
    pub clv_records: usize,
    pub uptime_secs: i64,
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// GET /api/markets?match_id=
pub async fn get_markets(
    State(state): State<AppState>,
    Query(query): Query<MarketsQuery>,
) -> Json<Vec<MarketOutcome>> {
    let outcomes = state.outcomes.read().await;
    let filtered = outcomes
        .iter()
        .filter(|o| query.match_id.as_deref().map_or(true, |m| o.match_id == m))
        .cloned()
        .collect();
    Json(filtered)
}

/// GET /api/parlays
pub async fn get_parlays(State(state): State<AppState>) -> Json<Vec<ParlayCandidate>> {
    let parlays = state.parlays.read().await;
    Json(parlays.clone())
}

/// GET /api/clv?window=&league=
pub async fn get_clv(
    State(state): State<AppState>,
    Query(query): Query<ClvQuery>,
) -> Json<Vec<ClvRecord>> {
    let window = query.window.unwrap_or(Window::All);
    let records = state.clv_records.read().await;
    let filtered = records
        .iter()
        .filter(|r| window.matches(r.window))
        .filter(|r| query.league.as_deref().map_or(true, |l| r.league == l))
        .cloned()
        .collect();
    Json(filtered)
}

/// GET /api/report
pub async fn get_report(State(state): State<AppState>) -> Json<ReportResponse> {
    let report = state.last_report.read().await;
    let cycle_count = *state.cycle_count.read().await;
    let catalog_size = state.outcomes.read().await.len();
    let clv_len = state.clv_records.read().await.len();
    let uptime = (chrono::Utc::now() - state.started_at).num_seconds();

    let (processed, failed, written, potential, persisted) = report
        .as_ref()
        .map(|r| {
            (
                r.matches_processed,
                r.matches_failed,
                r.outcomes_written,
                r.potential_candidates,
                r.persisted_candidates,
            )
        })
        .unwrap_or_default();

    Json(ReportResponse {
        status: if cycle_count > 0 { "RUNNING" } else { "WARMING_UP" }.to_string(),
        cycle_count,
        matches_processed: processed,
        matches_failed: failed,
        outcomes_written: written,
        potential_candidates: potential,
        persisted_candidates: persisted,
        catalog_size,
        clv_records: clv_len,
        uptime_secs: uptime,
    })
}

/// GET /health
pub async fn health() -> StatusCode {
    StatusCode::OK
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
