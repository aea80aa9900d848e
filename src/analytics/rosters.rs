use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::combinations::PositionCounts;
use crate::state::Dataset;
use crate::types::Position;

/// Zero-filled position counts for one team.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamRosterConstruction {
    pub draft_id: i64,
    pub team_id: i64,
    pub position_counts: BTreeMap<Position, usize>,
    pub total_players: usize,
}

/// How many teams share one position-count vector.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterConstruction {
    #[serde(rename = "QB")]
    pub qb: usize,
    #[serde(rename = "RB")]
    pub rb: usize,
    #[serde(rename = "WR")]
    pub wr: usize,
    #[serde(rename = "TE")]
    pub te: usize,
    #[serde(rename = "K")]
    pub k: usize,
    #[serde(rename = "DST")]
    pub dst: usize,
    pub total_players: usize,
    /// Teams with exactly this construction.
    pub count: usize,
    /// `count` as a share of all teams, 0-100.
    pub frequency: f64,
}

/// Same as `RosterConstruction`, restricted to QB/RB/WR/TE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreRosterCount {
    #[serde(rename = "QB")]
    pub qb: usize,
    #[serde(rename = "RB")]
    pub rb: usize,
    #[serde(rename = "WR")]
    pub wr: usize,
    #[serde(rename = "TE")]
    pub te: usize,
    pub count: usize,
}

/// Position counts per (draft, team), ordered by draft then team.
fn team_counts(dataset: &Dataset) -> BTreeMap<(i64, i64), PositionCounts> {
    let mut teams: BTreeMap<(i64, i64), PositionCounts> = BTreeMap::new();
    for pick in dataset.picks() {
        teams
            .entry((pick.draft_id, pick.team_id))
            .or_default()
            .add(pick.position);
    }
    teams
}

/// Every team's full construction, all positions present (0 when absent).
pub fn team_roster_constructions(dataset: &Dataset) -> Vec<TeamRosterConstruction> {
    team_counts(dataset)
        .into_iter()
        .map(|((draft_id, team_id), counts)| TeamRosterConstruction {
            draft_id,
            team_id,
            position_counts: Position::ALL.iter().map(|&p| (p, counts.get(p))).collect(),
            total_players: counts.total(),
        })
        .collect()
}

/// Frequency table of identical constructions, most common first.
pub fn roster_construction(dataset: &Dataset) -> Vec<RosterConstruction> {
    let teams = team_counts(dataset);
    let total_teams = teams.len();

    let mut freq: HashMap<PositionCounts, usize> = HashMap::new();
    for counts in teams.into_values() {
        *freq.entry(counts).or_default() += 1;
    }

    let mut rows: Vec<(PositionCounts, usize)> = freq.into_iter().collect();
    rows.sort_by(|(a_counts, a), (b_counts, b)| b.cmp(a).then_with(|| a_counts.cmp(b_counts)));

    rows.into_iter()
        .map(|(c, count)| RosterConstruction {
            qb: c.get(Position::QB),
            rb: c.get(Position::RB),
            wr: c.get(Position::WR),
            te: c.get(Position::TE),
            k: c.get(Position::K),
            dst: c.get(Position::DST),
            total_players: c.total(),
            count,
            frequency: count as f64 / total_teams as f64 * 100.0,
        })
        .collect()
}

/// Frequency table over QB/RB/WR/TE only, most common first.
pub fn core_roster_counts(dataset: &Dataset) -> Vec<CoreRosterCount> {
    let mut freq: HashMap<[usize; 4], usize> = HashMap::new();
    for counts in team_counts(dataset).into_values() {
        *freq.entry(counts.core()).or_default() += 1;
    }

    let mut rows: Vec<([usize; 4], usize)> = freq.into_iter().collect();
    rows.sort_by(|(a_core, a), (b_core, b)| b.cmp(a).then_with(|| a_core.cmp(b_core)));

    rows.into_iter()
        .map(|([qb, rb, wr, te], count)| CoreRosterCount { qb, rb, wr, te, count })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{league_dataset, pick, sample_dataset};

    #[test]
    fn team_constructions_zero_fill_every_position() {
        let ds = sample_dataset();
        let teams = team_roster_constructions(&ds);
        assert_eq!(teams.len(), 4);

        let t101 = &teams[0];
        assert_eq!((t101.draft_id, t101.team_id), (1, 101));
        assert_eq!(t101.position_counts.len(), Position::COUNT);
        assert_eq!(t101.position_counts[&Position::RB], 1);
        assert_eq!(t101.position_counts[&Position::WR], 1);
        assert_eq!(t101.position_counts[&Position::DST], 0);
        assert_eq!(t101.total_players, 2);
    }

    #[test]
    fn frequency_table_sorted_by_count() {
        let ds = league_dataset();
        let rows = roster_construction(&ds);
        // Slot 1: QB + 2 WR (4 teams); slot 2: QB + RB + TE (4 teams).
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.count == 4 && r.frequency == 50.0));
        // Equal counts fall back to the count vector order.
        assert_eq!((rows[0].qb, rows[0].rb, rows[0].wr, rows[0].te), (1, 0, 2, 0));
        assert_eq!((rows[1].qb, rows[1].rb, rows[1].wr, rows[1].te), (1, 1, 0, 1));
        assert_eq!(rows[0].total_players, 3);
    }

    #[test]
    fn most_common_construction_first() {
        let ds = crate::state::Dataset::new(vec![
            pick(1, 101, 1, 1, "Josh Allen", Position::QB, "BUF"),
            pick(1, 102, 2, 1, "Lamar Jackson", Position::QB, "BAL"),
            pick(2, 201, 1, 1, "Puka Nacua", Position::WR, "LAR"),
        ]);
        let rows = roster_construction(&ds);
        assert_eq!(rows[0].qb, 1);
        assert_eq!(rows[0].count, 2);
        assert!((rows[0].frequency - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(rows[1].wr, 1);
        assert_eq!(rows[1].count, 1);
    }

    #[test]
    fn core_counts_ignore_kickers() {
        let ds = crate::state::Dataset::new(vec![
            pick(1, 101, 1, 1, "Josh Allen", Position::QB, "BUF"),
            pick(1, 101, 1, 2, "Justin Tucker", Position::K, "BAL"),
            pick(1, 102, 2, 1, "Lamar Jackson", Position::QB, "BAL"),
        ]);
        let rows = core_roster_counts(&ds);
        assert_eq!(rows, vec![CoreRosterCount { qb: 1, rb: 0, wr: 0, te: 0, count: 2 }]);
        // The full table still separates them.
        assert_eq!(roster_construction(&ds).len(), 2);
    }
}
