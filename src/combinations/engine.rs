use std::collections::{BTreeMap, HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::combinations::summary::PositionCounts;
use crate::state::Dataset;
use crate::types::{Position, RoundWindow};

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// One team's picks inside the active round window.
#[derive(Debug, Clone)]
pub struct Roster {
    pub team_id: i64,
    pub draft_id: i64,
    pub draft_slot: u32,
    /// Draft order (round, then pick number).
    pub players: Vec<String>,
    pub positions: Vec<Position>,
}

impl Roster {
    fn contains_all(&self, required: &HashSet<&str>) -> bool {
        let on_roster: HashSet<&str> = self.players.iter().map(String::as_str).collect();
        required.is_subset(&on_roster)
    }

    /// Sorted player names: identifies the roster regardless of pick order.
    /// Compared element by element, so "A|B" and ["A", "B"] stay distinct.
    pub fn signature(&self) -> Vec<&str> {
        let mut key: Vec<&str> = self.players.iter().map(String::as_str).collect();
        key.sort_unstable();
        key
    }
}

/// Group the picks inside `window` by team. Teams are returned in team_id
/// order; a team's draft and slot come from its first pick.
pub fn build_rosters(dataset: &Dataset, window: RoundWindow) -> Vec<Roster> {
    let mut by_team: BTreeMap<i64, Roster> = BTreeMap::new();

    // Dataset picks are ordered by (draft, round, pick), so each team's
    // players arrive in draft order.
    for pick in dataset.picks().iter().filter(|p| window.includes(p.round)) {
        let roster = by_team.entry(pick.team_id).or_insert_with(|| Roster {
            team_id: pick.team_id,
            draft_id: pick.draft_id,
            draft_slot: pick.draft_slot,
            players: Vec::new(),
            positions: Vec::new(),
        });
        roster.players.push(pick.player_name.clone());
        roster.positions.push(pick.position);
    }

    by_team.into_values().collect()
}

/// Team ids, ascending, whose roster inside `window` holds every required
/// player. Empty `required_players` matches every team with a pick in the window.
pub fn teams_with_players(dataset: &Dataset, window: RoundWindow, required_players: &[String]) -> Vec<i64> {
    let required: HashSet<&str> = required_players.iter().map(String::as_str).collect();
    build_rosters(dataset, window)
        .into_iter()
        .filter(|r| required.is_empty() || r.contains_all(&required))
        .map(|r| r.team_id)
        .collect()
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamCombinationResult {
    pub team_id: i64,
    pub draft_id: i64,
    pub draft_slot: u32,
    /// Draft order, as picked.
    pub players: Vec<String>,
    pub position_counts: PositionCounts,
    /// e.g. `"QB: 1, RB: 2, WR: 3"`.
    pub position_counts_display: String,
}

impl From<Roster> for TeamCombinationResult {
    fn from(roster: Roster) -> Self {
        let position_counts = PositionCounts::from_positions(roster.positions.iter().copied());
        Self {
            team_id: roster.team_id,
            draft_id: roster.draft_id,
            draft_slot: roster.draft_slot,
            players: roster.players,
            position_counts_display: position_counts.display(),
            position_counts,
        }
    }
}

/// Size figures reported alongside a combination query. Informational only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CombinationStats {
    /// Rosters holding every required player, before deduplication.
    pub teams_meeting_criteria: usize,
    /// Distinct rosters after deduplication, before `limit`.
    pub unique_rosters: usize,
    pub total_teams: usize,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// One representative per distinct roster inside `window`, restricted to
/// rosters that contain every name in `required_players`.
///
/// Ties between identical rosters resolve to the **last** roster in ascending
/// (draft_id, draft_slot) order. Output is ordered by (draft_id, draft_slot).
pub fn find_unique_rosters(
    dataset: &Dataset,
    window: RoundWindow,
    required_players: &[String],
    limit: Option<usize>,
) -> Vec<TeamCombinationResult> {
    unique_rosters_with_stats(dataset, window, required_players, limit).0
}

pub fn unique_rosters_with_stats(
    dataset: &Dataset,
    window: RoundWindow,
    required_players: &[String],
    limit: Option<usize>,
) -> (Vec<TeamCombinationResult>, CombinationStats) {
    let required: HashSet<&str> = required_players.iter().map(String::as_str).collect();

    let mut candidates: Vec<Roster> = build_rosters(dataset, window)
        .into_iter()
        .filter(|r| required.is_empty() || r.contains_all(&required))
        .collect();
    let teams_meeting_criteria = candidates.len();

    candidates.sort_by_key(|r| (r.draft_id, r.draft_slot, r.team_id));

    // Later rosters overwrite earlier ones with the same player set.
    let mut keep: HashMap<Vec<&str>, usize> = HashMap::with_capacity(candidates.len());
    for (idx, roster) in candidates.iter().enumerate() {
        keep.insert(roster.signature(), idx);
    }
    let mut kept: Vec<usize> = keep.into_values().collect();
    kept.sort_unstable();

    let unique_rosters = kept.len();
    let mut slots: Vec<Option<Roster>> = candidates.into_iter().map(Some).collect();
    let mut results: Vec<TeamCombinationResult> = kept
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .map(TeamCombinationResult::from)
        .collect();

    if let Some(limit) = limit {
        results.truncate(limit);
    }

    let stats = CombinationStats {
        teams_meeting_criteria,
        unique_rosters,
        total_teams: dataset.metadata().total_teams,
    };

    let pct = if stats.total_teams > 0 {
        unique_rosters as f64 / stats.total_teams as f64 * 100.0
    } else {
        0.0
    };
    debug!(window = %window, required = required.len(), "Combination query");
    info!(
        teams_meeting_criteria,
        unique_rosters,
        total_teams = stats.total_teams,
        "Unique rosters: {unique_rosters} of {} teams ({pct:.2}%)",
        stats.total_teams,
    );

    (results, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{league_dataset, pick, sample_dataset};

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn team_ids(results: &[TeamCombinationResult]) -> Vec<i64> {
        results.iter().map(|r| r.team_id).collect()
    }

    #[test]
    fn no_required_players_returns_every_distinct_roster() {
        let ds = sample_dataset();
        let results = find_unique_rosters(&ds, RoundWindow::FirstN(2), &[], None);

        assert_eq!(team_ids(&results), vec![101, 102, 201, 202]);
        assert_eq!(results[0].players, names(&["PlayerA", "PlayerB"]));
        assert_eq!(results[1].players, names(&["PlayerA", "PlayerC"]));
        assert_eq!(results[2].players, names(&["PlayerD", "PlayerE"]));
        assert_eq!(results[3].players, names(&["PlayerD", "PlayerF"]));
        assert_eq!((results[3].draft_id, results[3].draft_slot), (2, 2));
    }

    #[test]
    fn single_required_player_filters_rosters() {
        let ds = sample_dataset();
        let results = find_unique_rosters(&ds, RoundWindow::FirstN(2), &names(&["PlayerA"]), None);
        assert_eq!(team_ids(&results), vec![101, 102]);
    }

    #[test]
    fn multiple_required_players_must_all_be_present() {
        let ds = sample_dataset();
        let results = find_unique_rosters(
            &ds,
            RoundWindow::FirstN(2),
            &names(&["PlayerA", "PlayerC"]),
            None,
        );
        assert_eq!(team_ids(&results), vec![102]);
        assert_eq!(results[0].draft_id, 1);
        assert_eq!(results[0].draft_slot, 2);
        assert_eq!(results[0].players, names(&["PlayerA", "PlayerC"]));
    }

    #[test]
    fn duplicate_rosters_keep_the_later_draft_slot() {
        let ds = sample_dataset();
        // Round 1 only: 101 and 102 both hold just PlayerA.
        let results = find_unique_rosters(&ds, RoundWindow::FirstN(1), &names(&["PlayerA"]), None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].team_id, 102);
        assert_eq!(results[0].draft_slot, 2);
        assert_eq!(results[0].players, names(&["PlayerA"]));
    }

    #[test]
    fn keep_last_spans_drafts() {
        let ds = crate::state::Dataset::new(vec![
            pick(5, 503, 3, 1, "Same", Position::RB, "DET"),
            pick(2, 207, 7, 1, "Same", Position::RB, "DET"),
            pick(9, 901, 1, 1, "Same", Position::RB, "DET"),
        ]);
        let results = find_unique_rosters(&ds, RoundWindow::All, &[], None);
        assert_eq!(team_ids(&results), vec![901]);
    }

    #[test]
    fn unknown_required_player_returns_empty() {
        let ds = sample_dataset();
        let results = find_unique_rosters(&ds, RoundWindow::FirstN(2), &names(&["PlayerZ"]), None);
        assert!(results.is_empty());

        let partial = find_unique_rosters(
            &ds,
            RoundWindow::FirstN(2),
            &names(&["PlayerA", "PlayerZ"]),
            None,
        );
        assert!(partial.is_empty());
    }

    #[test]
    fn empty_dataset_returns_empty() {
        let ds = crate::state::Dataset::new(Vec::new());
        let (results, stats) =
            unique_rosters_with_stats(&ds, RoundWindow::FirstN(2), &names(&["PlayerA"]), None);
        assert!(results.is_empty());
        assert_eq!(stats, CombinationStats::default());
    }

    #[test]
    fn window_beyond_draft_length_matches_unbounded() {
        let ds = sample_dataset();
        let bounded = find_unique_rosters(&ds, RoundWindow::FirstN(20), &[], None);
        let unbounded = find_unique_rosters(&ds, RoundWindow::All, &[], None);
        assert_eq!(bounded, unbounded);
    }

    #[test]
    fn signature_ignores_pick_order() {
        let ds = crate::state::Dataset::new(vec![
            pick(1, 101, 1, 1, "Alpha", Position::WR, "LV"),
            pick(1, 101, 1, 2, "Bravo", Position::RB, "NYJ"),
            pick(2, 202, 2, 1, "Bravo", Position::RB, "NYJ"),
            pick(2, 202, 2, 2, "Alpha", Position::WR, "LV"),
        ]);
        let results = find_unique_rosters(&ds, RoundWindow::All, &[], None);
        assert_eq!(results.len(), 1);
        // Survivor keeps its own draft order for display.
        assert_eq!(results[0].team_id, 202);
        assert_eq!(results[0].players, names(&["Bravo", "Alpha"]));
    }

    #[test]
    fn separator_inside_a_name_does_not_merge_rosters() {
        let ds = crate::state::Dataset::new(vec![
            pick(1, 101, 1, 1, "A|B", Position::WR, "LV"),
            pick(1, 102, 2, 1, "A", Position::WR, "LV"),
            pick(1, 102, 2, 2, "B", Position::RB, "NYJ"),
        ]);
        let results = find_unique_rosters(&ds, RoundWindow::All, &[], None);
        assert_eq!(team_ids(&results), vec![101, 102]);
    }

    #[test]
    fn signatures_are_unique_and_supersets_hold() {
        let ds = league_dataset();
        let required = names(&["Joe Burrow"]);
        for n in 1..=3 {
            let results = find_unique_rosters(&ds, RoundWindow::FirstN(n), &required, None);
            let mut seen = HashSet::new();
            for r in &results {
                let mut sorted = r.players.clone();
                sorted.sort();
                assert!(seen.insert(sorted), "duplicate roster {:?}", r.players);
                assert!(r.players.iter().any(|p| p == "Joe Burrow"));
            }
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let ds = league_dataset();
        let first = find_unique_rosters(&ds, RoundWindow::FirstN(3), &[], None);
        let second = find_unique_rosters(&ds, RoundWindow::FirstN(3), &[], None);
        assert_eq!(first, second);
    }

    #[test]
    fn output_is_sorted_and_limited() {
        let ds = league_dataset();
        let (all, stats) = unique_rosters_with_stats(&ds, RoundWindow::FirstN(2), &[], None);
        // Through round 2 slot-1 rosters never change; slot-2 rosters split early/late.
        assert_eq!(stats.teams_meeting_criteria, 8);
        assert_eq!(stats.unique_rosters, 3);
        assert_eq!(team_ids(&all), vec![202, 401, 402]);

        let limited = find_unique_rosters(&ds, RoundWindow::FirstN(2), &[], Some(2));
        assert_eq!(team_ids(&limited), vec![202, 401]);
    }

    #[test]
    fn position_breakdown_is_attached() {
        let ds = league_dataset();
        let results = find_unique_rosters(&ds, RoundWindow::FirstN(3), &names(&["Joe Burrow"]), None);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].position_counts_display, "QB: 1, WR: 2");
        assert_eq!(results[0].position_counts.get(Position::WR), 2);
    }

    #[test]
    fn teams_with_players_lists_every_match_before_dedup() {
        let ds = league_dataset();
        let teams = teams_with_players(&ds, RoundWindow::FirstN(2), &names(&["Jalen Hurts"]));
        assert_eq!(teams, vec![302, 402]);
        // Hurts is a round-3 pick in the early drafts.
        let all = teams_with_players(&ds, RoundWindow::All, &names(&["Jalen Hurts"]));
        assert_eq!(all, vec![102, 202, 302, 402]);
        assert_eq!(teams_with_players(&ds, RoundWindow::FirstN(1), &[]).len(), 8);
    }
}
