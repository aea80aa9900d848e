use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::MAX_ROUNDS;
use crate::error::{AppError, Result};

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// Fantasy position. Declaration order is the canonical display order
/// (QB, RB, WR, TE, then K and DST).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Position {
    QB,
    RB,
    WR,
    TE,
    K,
    DST,
}

impl Position {
    pub const COUNT: usize = 6;

    pub const ALL: [Position; Position::COUNT] = [
        Position::QB,
        Position::RB,
        Position::WR,
        Position::TE,
        Position::K,
        Position::DST,
    ];

    /// Positions that make up a roster's skeleton in roster-construction counts.
    pub const CORE: [Position; 4] = [Position::QB, Position::RB, Position::WR, Position::TE];

    pub fn as_str(self) -> &'static str {
        match self {
            Position::QB => "QB",
            Position::RB => "RB",
            Position::WR => "WR",
            Position::TE => "TE",
            Position::K => "K",
            Position::DST => "DST",
        }
    }

    /// Index into `ALL`; used for fixed-size per-position count arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    /// WR or TE: the pass catchers a QB can be stacked with.
    pub fn is_receiver(self) -> bool {
        matches!(self, Position::WR | Position::TE)
    }
}

impl FromStr for Position {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "QB" => Ok(Position::QB),
            "RB" => Ok(Position::RB),
            "WR" => Ok(Position::WR),
            "TE" => Ok(Position::TE),
            "K" => Ok(Position::K),
            "DST" | "DEF" | "D/ST" => Ok(Position::DST),
            other => Err(AppError::InvalidParameter(format!("unknown position '{other}'"))),
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Pick
// ---------------------------------------------------------------------------

/// One player selected by one team at one point in a draft.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pick {
    pub draft_id: i64,
    /// Unique per (draft, slot).
    pub team_id: i64,
    /// 1..=12, fixed for a team across all rounds.
    pub draft_slot: u32,
    pub round: u32,
    /// Draft-wide sequential pick number, already wrap-corrected.
    pub pick_number: u32,
    pub player_name: String,
    pub position: Position,
    pub nfl_team: String,
}

// ---------------------------------------------------------------------------
// Round window
// ---------------------------------------------------------------------------

/// Which rounds a roster is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundWindow {
    /// The entire draft.
    All,
    /// Rounds 1..=n.
    FirstN(u32),
}

impl RoundWindow {
    /// `None` means the whole draft. Anything outside 1..=MAX_ROUNDS is rejected.
    pub fn from_param(n_rounds: Option<u32>) -> Result<Self> {
        match n_rounds {
            None => Ok(RoundWindow::All),
            Some(n) if (1..=MAX_ROUNDS).contains(&n) => Ok(RoundWindow::FirstN(n)),
            Some(n) => Err(AppError::InvalidParameter(format!(
                "n_rounds must be between 1 and {MAX_ROUNDS}, got {n}"
            ))),
        }
    }

    #[inline]
    pub fn includes(self, round: u32) -> bool {
        match self {
            RoundWindow::All => true,
            RoundWindow::FirstN(n) => round <= n,
        }
    }
}

impl std::fmt::Display for RoundWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoundWindow::All => write!(f, "all"),
            RoundWindow::FirstN(n) => write!(f, "<= {n}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Query enums
// ---------------------------------------------------------------------------

/// Columns a player summary can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    Name,
    Position,
    Team,
    DraftPercentage,
    AvgPick,
    AvgRound,
}

impl FromStr for SortColumn {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "name" => Ok(SortColumn::Name),
            "position" => Ok(SortColumn::Position),
            "team" => Ok(SortColumn::Team),
            "draft_percentage" => Ok(SortColumn::DraftPercentage),
            "avg_pick" => Ok(SortColumn::AvgPick),
            "avg_round" => Ok(SortColumn::AvgRound),
            other => Err(AppError::InvalidParameter(format!("unknown sort column '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(AppError::InvalidParameter(format!("unknown sort order '{other}'"))),
        }
    }
}

/// How per-draft counts are collapsed into one number per round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Mean,
    Median,
}

impl FromStr for Aggregation {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mean" => Ok(Aggregation::Mean),
            "median" => Ok(Aggregation::Median),
            other => Err(AppError::InvalidParameter(format!("unknown aggregation '{other}'"))),
        }
    }
}

/// Ranking metric for draft-slot correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMetric {
    /// Raw number of slot teams that drafted the player.
    Count,
    /// Share of slot teams that drafted the player.
    Percent,
    /// Slot share divided by overall share.
    Ratio,
}

impl FromStr for CorrelationMetric {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "count" => Ok(CorrelationMetric::Count),
            "percent" => Ok(CorrelationMetric::Percent),
            "ratio" => Ok(CorrelationMetric::Ratio),
            other => Err(AppError::InvalidParameter(format!(
                "metric must be one of count|percent|ratio, got '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for CorrelationMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CorrelationMetric::Count => "count",
            CorrelationMetric::Percent => "percent",
            CorrelationMetric::Ratio => "ratio",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Small numeric helpers shared by the aggregation queries
// ---------------------------------------------------------------------------

/// Median of an unsorted slice; the mean of the two middle values for even
/// lengths. `None` when empty.
pub fn median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
