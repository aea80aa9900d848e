use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use crate::state::Dataset;
use crate::types::{median, Aggregation, Position};

// ---------------------------------------------------------------------------
// Position stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionStats {
    pub position: Position,
    pub total_drafted: usize,
    pub unique_players: usize,
    /// Median number of this position on a team; teams without one count as 0.
    pub median_per_team: f64,
}

/// Totals, distinct players and per-team median for each position present,
/// in canonical order (QB, RB, WR, TE, K, DST).
pub fn position_stats(dataset: &Dataset) -> Vec<PositionStats> {
    let mut totals: BTreeMap<Position, usize> = BTreeMap::new();
    let mut players: BTreeMap<Position, BTreeSet<&str>> = BTreeMap::new();
    let mut per_team: HashMap<(i64, Position), usize> = HashMap::new();
    let mut teams: BTreeSet<i64> = BTreeSet::new();

    for pick in dataset.picks() {
        *totals.entry(pick.position).or_default() += 1;
        players
            .entry(pick.position)
            .or_default()
            .insert(pick.player_name.as_str());
        *per_team.entry((pick.team_id, pick.position)).or_default() += 1;
        teams.insert(pick.team_id);
    }

    totals
        .into_iter()
        .map(|(position, total_drafted)| {
            let mut counts: Vec<f64> = teams
                .iter()
                .map(|&team| per_team.get(&(team, position)).copied().unwrap_or(0) as f64)
                .collect();
            PositionStats {
                position,
                total_drafted,
                unique_players: players.get(&position).map_or(0, BTreeSet::len),
                median_per_team: median(&mut counts).unwrap_or(0.0),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Position by round
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundCount {
    pub round: u32,
    pub count: f64,
}

/// How many players of `position` go in each round of a typical draft.
///
/// Built over the complete rounds × drafts grid: a draft with no pick of the
/// position in some round contributes a 0 for that round.
pub fn position_round_counts(dataset: &Dataset, position: Position, aggregation: Aggregation) -> Vec<RoundCount> {
    let rounds = dataset.rounds();
    let drafts = dataset.draft_ids();
    if drafts.is_empty() {
        return Vec::new();
    }

    let mut actual: HashMap<(u32, i64), usize> = HashMap::new();
    for pick in dataset.picks().iter().filter(|p| p.position == position) {
        *actual.entry((pick.round, pick.draft_id)).or_default() += 1;
    }

    let result: Vec<RoundCount> = rounds
        .into_iter()
        .map(|round| {
            let mut values: Vec<f64> = drafts
                .iter()
                .map(|&draft| actual.get(&(round, draft)).copied().unwrap_or(0) as f64)
                .collect();
            let count = match aggregation {
                Aggregation::Mean => values.iter().sum::<f64>() / values.len() as f64,
                Aggregation::Median => median(&mut values).unwrap_or(0.0),
            };
            RoundCount { round, count }
        })
        .collect();

    debug!(%position, ?aggregation, rounds = result.len(), "Position round counts");
    result
}

// ---------------------------------------------------------------------------
// First player at each position
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FirstPickStats {
    pub position: Position,
    pub avg_first_pick: f64,
    pub min_first_pick: u32,
    pub max_first_pick: u32,
}

/// Where the first player of each position comes off the board, across drafts.
pub fn first_pick_stats(dataset: &Dataset) -> Vec<FirstPickStats> {
    let mut first: BTreeMap<(i64, Position), u32> = BTreeMap::new();
    for pick in dataset.picks() {
        first
            .entry((pick.draft_id, pick.position))
            .and_modify(|p| *p = (*p).min(pick.pick_number))
            .or_insert(pick.pick_number);
    }

    let mut by_position: BTreeMap<Position, Vec<u32>> = BTreeMap::new();
    for ((_, position), pick_number) in first {
        by_position.entry(position).or_default().push(pick_number);
    }

    by_position
        .into_iter()
        .map(|(position, picks)| FirstPickStats {
            position,
            avg_first_pick: picks.iter().map(|&p| f64::from(p)).sum::<f64>() / picks.len() as f64,
            min_first_pick: picks.iter().copied().min().unwrap_or_default(),
            max_first_pick: picks.iter().copied().max().unwrap_or_default(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Heat map
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeatMapCell {
    pub round: u32,
    pub position: Position,
    pub count: usize,
}

/// Pick counts per (round, position), ordered by round then canonical position.
pub fn heat_map(dataset: &Dataset) -> Vec<HeatMapCell> {
    let mut cells: BTreeMap<(u32, Position), usize> = BTreeMap::new();
    for pick in dataset.picks() {
        *cells.entry((pick.round, pick.position)).or_default() += 1;
    }
    cells
        .into_iter()
        .map(|((round, position), count)| HeatMapCell { round, position, count })
        .collect()
}
