use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::config::{DEFAULT_MIN_TEAMS, DEFAULT_TOP_N, DRAFT_SLOTS, MAX_TOP_N};
use crate::error::{AppError, Result};
use crate::state::Dataset;
use crate::types::CorrelationMetric;

#[derive(Debug, Clone, PartialEq)]
pub struct DraftSlotQuery {
    pub slot: u32,
    pub metric: CorrelationMetric,
    pub top_n: usize,
    /// Players drafted by fewer slot teams than this are not ranked.
    pub min_teams: usize,
}

impl DraftSlotQuery {
    pub fn new(slot: u32, metric: CorrelationMetric) -> Self {
        Self {
            slot,
            metric,
            top_n: DEFAULT_TOP_N,
            min_teams: DEFAULT_MIN_TEAMS,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=DRAFT_SLOTS).contains(&self.slot) {
            return Err(AppError::InvalidParameter(format!(
                "slot must be between 1 and {DRAFT_SLOTS}, got {}",
                self.slot
            )));
        }
        if !(1..=MAX_TOP_N).contains(&self.top_n) {
            return Err(AppError::InvalidParameter(format!(
                "top_n must be between 1 and {MAX_TOP_N}, got {}",
                self.top_n
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftSlotRow {
    pub player: String,
    /// Teams in the slot that drafted the player.
    pub slot: usize,
    /// Teams anywhere that drafted the player.
    pub overall: usize,
    /// Percent of slot teams, 0-100.
    pub p_slot: f64,
    /// Percent of all teams, 0-100.
    pub p_overall: f64,
    pub score: f64,
}

/// Players most associated with one draft slot, best score first.
pub fn draft_slot_correlation(dataset: &Dataset, query: &DraftSlotQuery) -> Result<Vec<DraftSlotRow>> {
    query.validate()?;

    // A team that somehow lists a player twice still counts once.
    let team_players: BTreeSet<(i64, u32, &str)> = dataset
        .picks()
        .iter()
        .map(|p| (p.team_id, p.draft_slot, p.player_name.as_str()))
        .collect();

    let all_teams: BTreeSet<i64> = dataset.picks().iter().map(|p| p.team_id).collect();
    let slot_teams: BTreeSet<i64> = dataset
        .picks()
        .iter()
        .filter(|p| p.draft_slot == query.slot)
        .map(|p| p.team_id)
        .collect();

    let mut overall: BTreeMap<&str, usize> = BTreeMap::new();
    let mut in_slot: BTreeMap<&str, usize> = BTreeMap::new();
    for &(_, slot, player) in &team_players {
        *overall.entry(player).or_default() += 1;
        if slot == query.slot {
            *in_slot.entry(player).or_default() += 1;
        }
    }

    let total_overall = all_teams.len() as f64;
    let total_slot = slot_teams.len() as f64;

    let mut rows: Vec<DraftSlotRow> = in_slot
        .into_iter()
        .filter(|&(_, slot_count)| slot_count >= query.min_teams)
        .map(|(player, slot_count)| {
            let overall_count = overall.get(player).copied().unwrap_or(0);
            let p_slot = slot_count as f64 / total_slot * 100.0;
            let p_overall = overall_count as f64 / total_overall * 100.0;
            let score = match query.metric {
                CorrelationMetric::Count => slot_count as f64,
                CorrelationMetric::Percent => p_slot,
                CorrelationMetric::Ratio => p_slot / p_overall,
            };
            DraftSlotRow {
                player: player.to_string(),
                slot: slot_count,
                overall: overall_count,
                p_slot,
                p_overall,
                score,
            }
        })
        .collect();

    rows.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.player.cmp(&b.player)));
    rows.truncate(query.top_n);

    debug!(slot = query.slot, metric = %query.metric, rows = rows.len(), "Draft slot correlation");
    Ok(rows)
}
