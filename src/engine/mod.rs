//! Core engine — the batch resync → combine → CLV pipeline.

pub mod sync;

pub use sync::{SyncEngine, SyncOutcome, SyncReport};
