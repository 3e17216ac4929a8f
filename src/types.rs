//! Shared types for the LINESMITH engine.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that feed, engine, parlay,
//! and dashboard modules can depend on them without circular references.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Market identity
// ---------------------------------------------------------------------------

/// Betting market family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MarketType {
    /// 1X2 full-time result.
    MatchResult,
    /// Draw no bet (stake refunded on a draw).
    Dnb,
    /// Over/under total goals at a given line.
    Totals,
    /// Both teams to score.
    Btts,
    /// Double chance (1X / X2).
    DoubleChance,
    /// Team wins without conceding.
    WinToNil,
}

impl fmt::Display for MarketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketType::MatchResult => write!(f, "1X2"),
            MarketType::Dnb => write!(f, "DNB"),
            MarketType::Totals => write!(f, "TOTALS"),
            MarketType::Btts => write!(f, "BTTS"),
            MarketType::DoubleChance => write!(f, "DOUBLE_CHANCE"),
            MarketType::WinToNil => write!(f, "WIN_TO_NIL"),
        }
    }
}

impl std::str::FromStr for MarketType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "1X2" | "MATCH_RESULT" => Ok(MarketType::MatchResult),
            "DNB" | "DRAW_NO_BET" => Ok(MarketType::Dnb),
            "TOTALS" | "OVER_UNDER" => Ok(MarketType::Totals),
            "BTTS" => Ok(MarketType::Btts),
            "DOUBLE_CHANCE" | "DC" => Ok(MarketType::DoubleChance),
            "WIN_TO_NIL" | "WTN" => Ok(MarketType::WinToNil),
            _ => Err(anyhow::anyhow!("Unknown market type: {s}")),
        }
    }
}

/// Market subtype — which side of the market an outcome refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketSide {
    Home,
    Draw,
    Away,
    Over,
    Under,
    Yes,
    No,
    HomeOrDraw,
    DrawOrAway,
}

impl MarketSide {
    /// The directly opposing side, where one exists.
    /// Used by contradiction checks and tests; double-chance sides
    /// overlap rather than oppose, so they return `None`.
    pub fn opposite(&self) -> Option<MarketSide> {
        match self {
            MarketSide::Home => Some(MarketSide::Away),
            MarketSide::Away => Some(MarketSide::Home),
            MarketSide::Over => Some(MarketSide::Under),
            MarketSide::Under => Some(MarketSide::Over),
            MarketSide::Yes => Some(MarketSide::No),
            MarketSide::No => Some(MarketSide::Yes),
            MarketSide::Draw | MarketSide::HomeOrDraw | MarketSide::DrawOrAway => None,
        }
    }
}

impl fmt::Display for MarketSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketSide::Home => write!(f, "home"),
            MarketSide::Draw => write!(f, "draw"),
            MarketSide::Away => write!(f, "away"),
            MarketSide::Over => write!(f, "over"),
            MarketSide::Under => write!(f, "under"),
            MarketSide::Yes => write!(f, "yes"),
            MarketSide::No => write!(f, "no"),
            MarketSide::HomeOrDraw => write!(f, "1X"),
            MarketSide::DrawOrAway => write!(f, "X2"),
        }
    }
}

/// Goal line stored in tenths of a goal (3.5 → 35) so that market keys
/// are hashable and comparable without floating-point equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Line(i16);

impl Line {
    pub fn from_goals(goals: f64) -> Self {
        Line((goals * 10.0).round() as i16)
    }

    pub fn goals(&self) -> f64 {
        f64::from(self.0) / 10.0
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}", self.goals())
    }
}

impl Serialize for Line {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.goals())
    }
}

impl<'de> Deserialize<'de> for Line {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let goals = f64::deserialize(deserializer)?;
        Ok(Line::from_goals(goals))
    }
}

/// Catalog key for a market outcome: (market type, side, optional line).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MarketKey {
    pub market: MarketType,
    pub side: MarketSide,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
}

impl MarketKey {
    pub fn new(market: MarketType, side: MarketSide) -> Self {
        Self {
            market,
            side,
            line: None,
        }
    }

    pub fn with_line(market: MarketType, side: MarketSide, goals: f64) -> Self {
        Self {
            market,
            side,
            line: Some(Line::from_goals(goals)),
        }
    }
}

impl fmt::Display for MarketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}/{}@{}", self.market, self.side, line),
            None => write!(f, "{}/{}", self.market, self.side),
        }
    }
}

// ---------------------------------------------------------------------------
// Model outputs
// ---------------------------------------------------------------------------

/// Identifier of one of the two independent prediction models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelId {
    V1,
    V2,
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelId::V1 => write!(f, "v1"),
            ModelId::V2 => write!(f, "v2"),
        }
    }
}

/// Full-time outcome code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeCode {
    H,
    D,
    A,
}

impl fmt::Display for OutcomeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutcomeCode::H => write!(f, "H"),
            OutcomeCode::D => write!(f, "D"),
            OutcomeCode::A => write!(f, "A"),
        }
    }
}

impl std::str::FromStr for OutcomeCode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "H" | "HOME" | "1" => Ok(OutcomeCode::H),
            "D" | "DRAW" | "X" => Ok(OutcomeCode::D),
            "A" | "AWAY" | "2" => Ok(OutcomeCode::A),
            _ => Err(anyhow::anyhow!("Unknown outcome code: {s}")),
        }
    }
}

/// 1X2 probability triple from one model.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OutcomeProbs {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

impl OutcomeProbs {
    pub fn get(&self, outcome: OutcomeCode) -> f64 {
        match outcome {
            OutcomeCode::H => self.home,
            OutcomeCode::D => self.draw,
            OutcomeCode::A => self.away,
        }
    }
}

/// Per-match output of one prediction model. Read-only upstream input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelOutput {
    pub model: ModelId,
    /// The model's picked full-time outcome.
    pub pick: OutcomeCode,
    /// Self-reported confidence (0–1). Absent for models that don't emit one.
    #[serde(default)]
    pub confidence: Option<f64>,
    pub probs: OutcomeProbs,
}

impl fmt::Display for ModelOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] pick={} H={:.0}% D={:.0}% A={:.0}% conf={}",
            self.model,
            self.pick,
            self.probs.home * 100.0,
            self.probs.draw * 100.0,
            self.probs.away * 100.0,
            self.confidence
                .map(|c| format!("{:.0}%", c * 100.0))
                .unwrap_or_else(|| "n/a".to_string()),
        )
    }
}

// ---------------------------------------------------------------------------
// Classification enums
// ---------------------------------------------------------------------------

/// Correlation tag attached to market outcomes. Candidates sharing tags
/// across legs attract a correlation penalty.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CorrelationTag {
    Totals,
    Over,
    Under,
    GoalsLow,
    GoalsHigh,
    Btts,
    MatchResult,
    HomeWin,
    AwayWin,
    DoubleChance,
    WinToNil,
    CleanSheet,
}

impl fmt::Display for CorrelationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CorrelationTag::Totals => "TOTALS",
            CorrelationTag::Over => "OVER",
            CorrelationTag::Under => "UNDER",
            CorrelationTag::GoalsLow => "GOALS_LOW",
            CorrelationTag::GoalsHigh => "GOALS_HIGH",
            CorrelationTag::Btts => "BTTS",
            CorrelationTag::MatchResult => "MATCH_RESULT",
            CorrelationTag::HomeWin => "HOME_WIN",
            CorrelationTag::AwayWin => "AWAY_WIN",
            CorrelationTag::DoubleChance => "DOUBLE_CHANCE",
            CorrelationTag::WinToNil => "WIN_TO_NIL",
            CorrelationTag::CleanSheet => "CLEAN_SHEET",
        };
        write!(f, "{s}")
    }
}

/// Risk tier. `VeryHigh` only appears at the parlay-candidate level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::VeryHigh => write!(f, "very_high"),
        }
    }
}

/// How the market settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleType {
    /// Two outcomes, one wins.
    TwoWay,
    /// Three outcomes (1X2).
    ThreeWay,
    /// Two outcomes, stake refunded on a draw (DNB).
    DrawVoid,
}

impl fmt::Display for SettleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettleType::TwoWay => write!(f, "two_way"),
            SettleType::ThreeWay => write!(f, "three_way"),
            SettleType::DrawVoid => write!(f, "draw_void"),
        }
    }
}

/// Parlay confidence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfidenceTier::High => write!(f, "high"),
            ConfidenceTier::Medium => write!(f, "medium"),
            ConfidenceTier::Low => write!(f, "low"),
        }
    }
}

// ---------------------------------------------------------------------------
// Consensus & market outcomes
// ---------------------------------------------------------------------------

/// Blended estimate for one outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Consensus {
    pub prob: f64,
    pub confidence: f64,
    /// 1 − |p1 − p2| when two models contributed, 1.0 otherwise.
    pub agreement: f64,
}

/// Fully classified market outcome for one match.
/// Recomputed wholesale on every sync pass (overwrite, never patched).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketOutcome {
    pub match_id: String,
    pub key: MarketKey,
    pub consensus_prob: f64,
    pub consensus_confidence: f64,
    pub model_agreement: f64,
    pub edge: f64,
    pub correlation_tags: BTreeSet<CorrelationTag>,
    pub risk_level: RiskLevel,
    pub settle_type: SettleType,
}

impl fmt::Display for MarketOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} | P={:.1}% conf={:.0}% agree={:.0}% edge={:.1}% risk={}",
            self.match_id,
            self.key,
            self.consensus_prob * 100.0,
            self.consensus_confidence * 100.0,
            self.model_agreement * 100.0,
            self.edge * 100.0,
            self.risk_level,
        )
    }
}

// ---------------------------------------------------------------------------
// Parlay types
// ---------------------------------------------------------------------------

/// A single-outcome leg inside a parlay candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParlayLeg {
    pub match_id: String,
    pub key: MarketKey,
    pub probability: f64,
    /// Fair decimal odds (1/probability).
    pub odds: f64,
    pub edge: f64,
    /// Position inside the candidate (stable ordering).
    pub order: usize,
}

impl fmt::Display for ParlayLeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} P={:.1}% @{:.2}",
            self.match_id,
            self.key,
            self.probability * 100.0,
            self.odds,
        )
    }
}

/// Whether a candidate combines legs inside one match or across matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParlayScope {
    /// Ephemeral, generated on demand from one match.
    SingleMatch,
    /// Durable, cross-match.
    CrossMatch,
}

/// Pass/fail tradability judgement with explicit reasons.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QualityFlags {
    pub is_tradable: bool,
    pub has_low_edge: bool,
    pub has_low_probability: bool,
    pub risk_level: RiskLevel,
}

/// A combination of legs wagered together with multiplied odds.
///
/// `combined_prob` multiplies leg probabilities under a documented
/// independence assumption; `independence_assumed` discloses that the
/// figure is an approximation, not a joint-probability model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParlayCandidate {
    pub id: Uuid,
    pub scope: ParlayScope,
    pub legs: Vec<ParlayLeg>,
    pub combined_prob: f64,
    pub correlation_penalty: f64,
    pub adjusted_prob: f64,
    pub implied_odds: f64,
    pub edge_pct: f64,
    pub confidence_tier: ConfidenceTier,
    pub flags: QualityFlags,
    pub independence_assumed: bool,
}

impl fmt::Display for ParlayCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-leg parlay | P={:.1}% (adj {:.1}%) @{:.2} edge={:.1}% tier={} tradable={}",
            self.legs.len(),
            self.combined_prob * 100.0,
            self.adjusted_prob * 100.0,
            self.implied_odds,
            self.edge_pct * 100.0,
            self.confidence_tier,
            self.flags.is_tradable,
        )
    }
}

// ---------------------------------------------------------------------------
// CLV types
// ---------------------------------------------------------------------------

/// Labeled odds-feed time window relative to kickoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Window {
    #[serde(rename = "t-72h")]
    T72,
    #[serde(rename = "t-48h")]
    T48,
    #[serde(rename = "t-24h")]
    T24,
    #[serde(rename = "t-2h")]
    T2,
    #[serde(rename = "all")]
    All,
}

impl Window {
    /// Whether a tick tagged with `other` falls inside this query window.
    pub fn matches(&self, other: Window) -> bool {
        *self == Window::All || *self == other
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::T72 => write!(f, "t-72h"),
            Window::T48 => write!(f, "t-48h"),
            Window::T24 => write!(f, "t-24h"),
            Window::T2 => write!(f, "t-2h"),
            Window::All => write!(f, "all"),
        }
    }
}

impl std::str::FromStr for Window {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "t-72h" | "72h" | "72" => Ok(Window::T72),
            "t-48h" | "48h" | "48" => Ok(Window::T48),
            "t-24h" | "24h" | "24" => Ok(Window::T24),
            "t-2h" | "2h" | "2" => Ok(Window::T2),
            "all" | "" => Ok(Window::All),
            _ => Err(anyhow::anyhow!("Unknown window label: {s}")),
        }
    }
}

/// Closing-line-value record for one odds movement. Ephemeral, computed
/// per query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClvRecord {
    pub match_id: String,
    pub league: String,
    pub outcome: OutcomeCode,
    pub window: Window,
    pub entry_odds: f64,
    pub close_odds: f64,
    pub clv_pct: f64,
    pub ev_percent: f64,
    /// 0–100; ≥ 70 is the documented high-confidence cutoff.
    pub confidence_score: f64,
    pub kelly_fraction: f64,
    /// Half-Kelly, capped at the bankroll stake ceiling.
    pub recommended_stake: f64,
}

impl fmt::Display for ClvRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}] {:.2}→{:.2} | CLV={:+.2}% EV={:+.2}% score={:.0} stake={:.2}%",
            self.match_id,
            self.outcome,
            self.window,
            self.entry_odds,
            self.close_odds,
            self.clv_pct,
            self.ev_percent,
            self.confidence_score,
            self.recommended_stake * 100.0,
        )
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for LINESMITH.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Snapshot error ({match_id}): {message}")]
    Snapshot { match_id: String, message: String },

    #[error("Feed error ({feed}): {message}")]
    Feed { feed: String, message: String },

    #[error("Classification error ({match_id}): {message}")]
    Classification { match_id: String, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
