//! LINESMITH — Probability-Consensus and Wager-Risk Engine
//!
//! Entry point. Loads configuration, initialises structured logging,
//! restores the market catalog from disk (or starts fresh), and runs
//! the periodic resync→combine→CLV loop with graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use linesmith::config;
use linesmith::dashboard::{self, DashboardState};
use linesmith::engine::{SyncEngine, SyncReport};
use linesmith::feeds::{FileSnapshotProvider, SnapshotProvider};
use linesmith::storage::CatalogStore;
use linesmith::types::{ClvRecord, MarketOutcome, ParlayCandidate, Window};

const BANNER: &str = r#"
 _     ___ _   _ _____ ____  __  __ ___ _____ _   _
| |   |_ _| \ | | ____/ ___||  \/  |_ _|_   _| | | |
| |    | ||  \| |  _| \___ \| |\/| || |  | | | |_| |
| |___ | || |\  | |___ ___) | |  | || |  | | |  _  |
|_____|___|_| \_|_____|____/|_|  |_|___| |_| |_| |_|

  Probability-Consensus and Wager-Risk Engine
  v0.1.0
"#;

/// Everything one cycle produced, ready for publishing.
struct CycleResult {
    report: SyncReport,
    outcomes: Vec<MarketOutcome>,
    parlays: Vec<ParlayCandidate>,
    clv_records: Vec<ClvRecord>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    // Load configuration from TOML
    let cfg = config::AppConfig::load("config.toml")?;

    // Initialise structured logging
    init_logging(&cfg);

    // Print startup banner
    println!("{BANNER}");
    info!(
        engine_name = %cfg.engine.name,
        sync_interval_secs = cfg.engine.sync_interval_secs,
        league_filter = ?cfg.engine.league_filter,
        "LINESMITH starting up"
    );

    // -- Restore or create the catalog -----------------------------------

    let mut store = CatalogStore::load(Some(&cfg.engine.catalog_path))?;
    if store.is_empty() {
        info!("Starting with an empty catalog");
    } else {
        info!(outcomes = store.len(), "Resumed catalog from disk");
    }

    // -- Initialise components -------------------------------------------

    let provider = FileSnapshotProvider::new(&cfg.engine.snapshot_path, &cfg.engine.odds_path);
    let engine = SyncEngine::new(cfg.scoring.clone());

    let dashboard_state = Arc::new(DashboardState::new());
    if cfg.dashboard.enabled {
        dashboard::spawn_dashboard(dashboard_state.clone(), cfg.dashboard.port)?;
    }

    // -- Main loop -------------------------------------------------------

    let sync_interval = Duration::from_secs(cfg.engine.sync_interval_secs);
    let mut interval = tokio::time::interval(sync_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.engine.sync_interval_secs,
        "Entering main loop. Press Ctrl+C to stop."
    );

    let mut cycle: u64 = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                cycle += 1;
                match run_cycle(&provider, &engine, &mut store, cfg.engine.league_filter.as_deref()).await {
                    Ok(result) => {
                        info!(cycle, report = %result.report, "Cycle complete");
                        dashboard_state
                            .publish_cycle(
                                result.report,
                                result.outcomes,
                                result.parlays,
                                result.clv_records,
                            )
                            .await;
                        // Persist the catalog after each cycle
                        if let Err(e) = store.save(Some(&cfg.engine.catalog_path)) {
                            error!(error = %e, "Failed to save catalog");
                        }
                    }
                    Err(e) => {
                        error!(cycle, error = %e, "Cycle failed — continuing to next");
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    // Save the final catalog
    store.save(Some(&cfg.engine.catalog_path))?;
    info!(
        cycles = cycle,
        outcomes = store.len(),
        "LINESMITH shut down cleanly."
    );

    Ok(())
}

/// Run a single fetch→resync→combine→CLV cycle.
async fn run_cycle(
    provider: &dyn SnapshotProvider,
    engine: &SyncEngine,
    store: &mut CatalogStore,
    league_filter: Option<&str>,
) -> Result<CycleResult> {
    // 1. Fetch snapshots
    let mut snapshots = provider.fetch_snapshots().await?;
    if let Some(league) = league_filter {
        snapshots.retain(|s| s.league == league);
    }
    info!(matches = snapshots.len(), provider = provider.name(), "Snapshots fetched");

    // 2. Resync the catalog and build candidates
    let sync = engine.resync(snapshots, store).await;

    // 3. CLV scan over the odds-movement feed
    let ticks = provider.fetch_odds_ticks().await?;
    let clv_records = engine.scan_clv(&ticks, Window::All, league_filter);

    // 4. Collect everything for publishing: durable cross-match candidates
    //    first, ephemeral single-match candidates after.
    let mut parlays = sync.persisted;
    parlays.extend(sync.potential);

    let outcomes = store.all().into_iter().cloned().collect();

    Ok(CycleResult {
        report: sync.report,
        outcomes,
        parlays,
        clv_records,
    })
}

/// Initialise the `tracing` subscriber.
fn init_logging(cfg: &config::AppConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("linesmith=info"));

    let json_logging = std::env::var("LINESMITH_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }

    let _ = cfg;
}
