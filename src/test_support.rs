//! Fixture builders shared by the unit tests.

use std::sync::Arc;

use crate::config::DRAFT_SLOTS;
use crate::state::Dataset;
use crate::types::{Pick, Position};

/// Build a pick; the pick number follows round then slot.
pub fn pick(
    draft_id: i64,
    team_id: i64,
    draft_slot: u32,
    round: u32,
    player: &str,
    position: Position,
    nfl_team: &str,
) -> Pick {
    Pick {
        draft_id,
        team_id,
        draft_slot,
        round,
        pick_number: (round - 1) * DRAFT_SLOTS + draft_slot,
        player_name: player.to_string(),
        position,
        nfl_team: nfl_team.to_string(),
    }
}

/// Two drafts, two teams each, two rounds:
///
/// | team | draft | slot | round 1 | round 2 |
/// |------|-------|------|---------|---------|
/// | 101  | 1     | 1    | PlayerA | PlayerB |
/// | 102  | 1     | 2    | PlayerA | PlayerC |
/// | 201  | 2     | 1    | PlayerD | PlayerE |
/// | 202  | 2     | 2    | PlayerD | PlayerF |
pub fn sample_dataset() -> Arc<Dataset> {
    Dataset::new(vec![
        pick(1, 101, 1, 1, "PlayerA", Position::RB, "SF"),
        pick(1, 101, 1, 2, "PlayerB", Position::WR, "MIA"),
        pick(1, 102, 2, 1, "PlayerA", Position::RB, "SF"),
        pick(1, 102, 2, 2, "PlayerC", Position::QB, "KC"),
        pick(2, 201, 1, 1, "PlayerD", Position::WR, "CIN"),
        pick(2, 201, 1, 2, "PlayerE", Position::TE, "KC"),
        pick(2, 202, 2, 1, "PlayerD", Position::WR, "CIN"),
        pick(2, 202, 2, 2, "PlayerF", Position::QB, "CIN"),
    ])
}

/// Four drafts with two teams each and three rounds, with realistic names,
/// QB/receiver stacks and an ADP shift between the early and late drafts.
///
/// Draft slot 1 always takes Ja'Marr Chase in round 1.
pub fn league_dataset() -> Arc<Dataset> {
    let mut picks = Vec::new();
    for draft in 1..=4i64 {
        let t1 = draft * 100 + 1;
        let t2 = draft * 100 + 2;
        picks.push(pick(draft, t1, 1, 1, "Ja'Marr Chase", Position::WR, "CIN"));
        picks.push(pick(draft, t2, 2, 1, "Bijan Robinson", Position::RB, "ATL"));
        if draft <= 2 {
            // Early drafts: Burrow goes in round 2, Kelce in round 3.
            picks.push(pick(draft, t1, 1, 2, "Joe Burrow", Position::QB, "CIN"));
            picks.push(pick(draft, t2, 2, 2, "Travis Kelce", Position::TE, "KC"));
            picks.push(pick(draft, t1, 1, 3, "A.J. Brown", Position::WR, "PHI"));
            picks.push(pick(draft, t2, 2, 3, "Jalen Hurts", Position::QB, "PHI"));
        } else {
            // Late drafts: Hurts climbs to round 2, Kelce falls to round 3.
            picks.push(pick(draft, t1, 1, 2, "Joe Burrow", Position::QB, "CIN"));
            picks.push(pick(draft, t2, 2, 2, "Jalen Hurts", Position::QB, "PHI"));
            picks.push(pick(draft, t1, 1, 3, "A.J. Brown", Position::WR, "PHI"));
            picks.push(pick(draft, t2, 2, 3, "Travis Kelce", Position::TE, "KC"));
        }
    }
    Dataset::new(picks)
}
