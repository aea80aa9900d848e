use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::config::MAX_LIMIT;
use crate::error::{AppError, Result};
use crate::state::Dataset;
use crate::types::{Pick, Position, RoundWindow};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackEntry {
    pub draft_id: i64,
    pub team_id: i64,
    pub nfl_team: String,
    pub qb: String,
    /// WR or TE.
    pub receiver: String,
    pub round_qb: u32,
    pub round_receiver: u32,
}

/// QB + pass-catcher pairs from the same NFL team on one fantasy roster,
/// within `window`. One entry per QB × receiver pair, ordered by draft,
/// team, NFL team, then the QB's and receiver's rounds.
pub fn find_stacks(dataset: &Dataset, window: RoundWindow, limit: usize) -> Result<Vec<StackEntry>> {
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(AppError::InvalidParameter(format!(
            "limit must be between 1 and {MAX_LIMIT}, got {limit}"
        )));
    }

    // (draft, team, nfl team) -> (qbs, receivers)
    type Group<'a> = (Vec<&'a Pick>, Vec<&'a Pick>);
    let mut groups: BTreeMap<(i64, i64, &str), Group> = BTreeMap::new();

    for pick in dataset.picks().iter().filter(|p| window.includes(p.round)) {
        if pick.nfl_team.is_empty() {
            continue;
        }
        let is_qb = pick.position == Position::QB;
        if !is_qb && !pick.position.is_receiver() {
            continue;
        }
        let group = groups
            .entry((pick.draft_id, pick.team_id, pick.nfl_team.as_str()))
            .or_default();
        if is_qb {
            group.0.push(pick);
        } else {
            group.1.push(pick);
        }
    }

    let mut stacks = Vec::new();
    'outer: for ((draft_id, team_id, nfl_team), (qbs, receivers)) in groups {
        for qb in &qbs {
            for receiver in &receivers {
                stacks.push(StackEntry {
                    draft_id,
                    team_id,
                    nfl_team: nfl_team.to_string(),
                    qb: qb.player_name.clone(),
                    receiver: receiver.player_name.clone(),
                    round_qb: qb.round,
                    round_receiver: receiver.round,
                });
                if stacks.len() >= limit {
                    break 'outer;
                }
            }
        }
    }

    debug!(window = %window, stacks = stacks.len(), "Stack finder");
    Ok(stacks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{league_dataset, pick};

    #[test]
    fn finds_same_team_qb_receiver_pairs() {
        let ds = league_dataset();
        let stacks = find_stacks(&ds, RoundWindow::FirstN(3), 100).unwrap();
        // Burrow + Chase on every slot-1 team.
        assert_eq!(stacks.len(), 4);
        assert!(stacks.iter().all(|s| s.qb == "Joe Burrow" && s.receiver == "Ja'Marr Chase"));
        assert_eq!(stacks[0].nfl_team, "CIN");
        assert_eq!((stacks[0].round_qb, stacks[0].round_receiver), (2, 1));
        assert_eq!((stacks[0].draft_id, stacks[0].team_id), (1, 101));
    }

    #[test]
    fn round_window_excludes_late_pieces() {
        let ds = league_dataset();
        // Burrow goes in round 2.
        assert!(find_stacks(&ds, RoundWindow::FirstN(1), 100).unwrap().is_empty());
    }

    #[test]
    fn every_qb_receiver_pair_is_listed() {
        let ds = crate::state::Dataset::new(vec![
            pick(1, 101, 1, 1, "Jalen Hurts", Position::QB, "PHI"),
            pick(1, 101, 1, 2, "A.J. Brown", Position::WR, "PHI"),
            pick(1, 101, 1, 3, "DeVonta Smith", Position::WR, "PHI"),
            pick(1, 101, 1, 4, "Dallas Goedert", Position::TE, "PHI"),
            pick(1, 101, 1, 5, "Saquon Barkley", Position::RB, "PHI"),
            pick(1, 102, 2, 1, "Kenneth Gainwell", Position::RB, "PHI"),
        ]);
        let stacks = find_stacks(&ds, RoundWindow::All, 100).unwrap();
        let receivers: Vec<&str> = stacks.iter().map(|s| s.receiver.as_str()).collect();
        assert_eq!(receivers, vec!["A.J. Brown", "DeVonta Smith", "Dallas Goedert"]);

        let limited = find_stacks(&ds, RoundWindow::All, 2).unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn limit_is_validated() {
        let ds = league_dataset();
        assert!(matches!(
            find_stacks(&ds, RoundWindow::All, 0),
            Err(AppError::InvalidParameter(_))
        ));
    }
}
