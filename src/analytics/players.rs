use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::config::{DEFAULT_LIMIT, MAX_LIMIT};
use crate::error::{AppError, Result};
use crate::state::Dataset;
use crate::types::{Position, SortColumn, SortOrder};

// ---------------------------------------------------------------------------
// Query / result types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerQuery {
    /// Empty means every position.
    pub positions: Vec<Position>,
    pub search_term: Option<String>,
    pub sort_by: SortColumn,
    pub sort_order: SortOrder,
    pub offset: usize,
    pub limit: usize,
}

impl Default for PlayerQuery {
    fn default() -> Self {
        Self {
            positions: Vec::new(),
            search_term: None,
            sort_by: SortColumn::AvgPick,
            sort_order: SortOrder::Asc,
            offset: 0,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PlayerQuery {
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_LIMIT).contains(&self.limit) {
            return Err(AppError::InvalidParameter(format!(
                "limit must be between 1 and {MAX_LIMIT}, got {}",
                self.limit
            )));
        }
        // SQLite binds OFFSET as a signed 64-bit integer.
        if i64::try_from(self.offset).is_err() {
            return Err(AppError::InvalidParameter(format!(
                "offset must be at most {}, got {}",
                i64::MAX,
                self.offset
            )));
        }
        Ok(())
    }

    /// Search term in the same normalized form as player names. `None` when
    /// there is nothing to match on.
    pub fn normalized_search(&self) -> Option<String> {
        self.search_term
            .as_deref()
            .map(normalize_name)
            .filter(|t| !t.is_empty())
    }
}

/// Draft summary for one (player, position, NFL team).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub name: String,
    pub position: Position,
    pub team: String,
    pub avg_pick: f64,
    pub min_pick: u32,
    pub max_pick: u32,
    pub avg_round: f64,
    /// Share of drafts the player went in, 0-100.
    pub draft_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageInfo {
    pub total_count: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_next: bool,
    pub has_previous: bool,
    pub current_page: usize,
    pub total_pages: usize,
}

impl PageInfo {
    pub fn new(total_count: usize, limit: usize, offset: usize) -> Self {
        let limit_nz = limit.max(1);
        Self {
            total_count,
            limit,
            offset,
            has_next: offset.saturating_add(limit) < total_count,
            has_previous: offset > 0,
            current_page: offset / limit_nz + 1,
            total_pages: total_count.div_ceil(limit_nz),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerPage {
    pub players: Vec<PlayerSummary>,
    /// Matches before pagination.
    pub total_count: usize,
    pub page_info: PageInfo,
}

// ---------------------------------------------------------------------------
// Name normalization
// ---------------------------------------------------------------------------

/// Lowercase and drop periods and apostrophes, so "aj brown" finds
/// "A.J. Brown" and "jamarr" finds "Ja'Marr Chase".
///
/// ASCII lowercasing keeps this identical to SQLite's `lower()`.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '.' && *c != '\'')
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

// ---------------------------------------------------------------------------
// Player summary
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PickAccumulator {
    count: u64,
    pick_sum: u64,
    round_sum: u64,
    min_pick: u32,
    max_pick: u32,
}

impl PickAccumulator {
    fn push(&mut self, pick_number: u32, round: u32) {
        if self.count == 0 {
            self.min_pick = pick_number;
            self.max_pick = pick_number;
        } else {
            self.min_pick = self.min_pick.min(pick_number);
            self.max_pick = self.max_pick.max(pick_number);
        }
        self.count += 1;
        self.pick_sum += u64::from(pick_number);
        self.round_sum += u64::from(round);
    }
}

/// Filter, group, sort and paginate the per-player draft summary.
pub fn player_summary(dataset: &Dataset, query: &PlayerQuery) -> Result<PlayerPage> {
    query.validate()?;

    let total_drafts = dataset.metadata().total_drafts.max(1) as f64;
    let search = query.normalized_search();

    let mut groups: BTreeMap<(&str, Position, &str), PickAccumulator> = BTreeMap::new();
    for pick in dataset.picks() {
        if !query.positions.is_empty() && !query.positions.contains(&pick.position) {
            continue;
        }
        if let Some(term) = &search {
            if !normalize_name(&pick.player_name).contains(term.as_str()) {
                continue;
            }
        }
        groups
            .entry((pick.player_name.as_str(), pick.position, pick.nfl_team.as_str()))
            .or_default()
            .push(pick.pick_number, pick.round);
    }

    let mut players: Vec<PlayerSummary> = groups
        .into_iter()
        .map(|((name, position, team), acc)| PlayerSummary {
            name: name.to_string(),
            position,
            team: team.to_string(),
            avg_pick: acc.pick_sum as f64 / acc.count as f64,
            min_pick: acc.min_pick,
            max_pick: acc.max_pick,
            avg_round: acc.round_sum as f64 / acc.count as f64,
            draft_percentage: acc.count as f64 * 100.0 / total_drafts,
        })
        .collect();

    let total_count = players.len();
    players.sort_by(|a, b| compare_players(a, b, query.sort_by, query.sort_order));

    let page: Vec<PlayerSummary> = players
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect();

    debug!(total_count, returned = page.len(), offset = query.offset, "Player summary");

    Ok(PlayerPage {
        players: page,
        total_count,
        page_info: PageInfo::new(total_count, query.limit, query.offset),
    })
}

/// Primary key in the requested direction, then (name, position, team)
/// ascending so pages never overlap. Positions compare by name, like SQL text.
pub fn compare_players(a: &PlayerSummary, b: &PlayerSummary, by: SortColumn, order: SortOrder) -> Ordering {
    let primary = match by {
        SortColumn::Name => a.name.cmp(&b.name),
        SortColumn::Position => a.position.as_str().cmp(b.position.as_str()),
        SortColumn::Team => a.team.cmp(&b.team),
        SortColumn::DraftPercentage => a.draft_percentage.total_cmp(&b.draft_percentage),
        SortColumn::AvgPick => a.avg_pick.total_cmp(&b.avg_pick),
        SortColumn::AvgRound => a.avg_round.total_cmp(&b.avg_round),
    };
    let primary = match order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.position.as_str().cmp(b.position.as_str()))
        .then_with(|| a.team.cmp(&b.team))
}

// ---------------------------------------------------------------------------
// Player details
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerDetails {
    pub player_name: String,
    pub position: Position,
    pub team: String,
    pub avg_pick: f64,
    pub avg_round: f64,
    pub min_pick: u32,
    pub max_pick: u32,
    /// Sample standard deviation; `None` with fewer than two picks.
    pub std_dev_pick: Option<f64>,
    /// Distinct fantasy teams that drafted the player.
    pub teams_drafted: usize,
    pub picks: Vec<u32>,
    pub rounds: Vec<u32>,
}

/// Every pick of one (player, position, NFL team). `NotFound` when the
/// combination never appears.
pub fn player_details(dataset: &Dataset, name: &str, position: Position, team: &str) -> Result<PlayerDetails> {
    let rows: Vec<_> = dataset
        .picks()
        .iter()
        .filter(|p| p.player_name == name && p.position == position && p.nfl_team == team)
        .collect();

    if rows.is_empty() {
        return Err(AppError::NotFound(format!("no picks for {name} ({position}, {team})")));
    }

    let n = rows.len() as f64;
    let picks: Vec<u32> = rows.iter().map(|p| p.pick_number).collect();
    let rounds: Vec<u32> = rows.iter().map(|p| p.round).collect();
    let avg_pick = picks.iter().map(|&p| f64::from(p)).sum::<f64>() / n;
    let avg_round = rounds.iter().map(|&r| f64::from(r)).sum::<f64>() / n;

    let std_dev_pick = (rows.len() > 1).then(|| {
        let var = picks
            .iter()
            .map(|&p| (f64::from(p) - avg_pick).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        var.sqrt()
    });

    let teams: BTreeSet<i64> = rows.iter().map(|p| p.team_id).collect();

    Ok(PlayerDetails {
        player_name: name.to_string(),
        position,
        team: team.to_string(),
        avg_pick,
        avg_round,
        min_pick: picks.iter().copied().min().unwrap_or_default(),
        max_pick: picks.iter().copied().max().unwrap_or_default(),
        std_dev_pick,
        teams_drafted: teams.len(),
        picks,
        rounds,
    })
}
