//! LINESMITH — Probability-Consensus and Wager-Risk Engine
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod consensus;
pub mod markets;
pub mod parlay;
pub mod clv;
pub mod feeds;
pub mod engine;
pub mod storage;
pub mod dashboard;
