use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;

use crate::types::Pick;

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Derived once at load time and cached next to the picks.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetMetadata {
    pub total_players: usize,
    pub total_drafts: usize,
    pub total_teams: usize,
    /// Distinct player names, sorted ascending.
    pub all_players: Vec<String>,
}

impl DatasetMetadata {
    fn compute(picks: &[Pick]) -> Self {
        let players: BTreeSet<&str> = picks.iter().map(|p| p.player_name.as_str()).collect();
        let drafts: BTreeSet<i64> = picks.iter().map(|p| p.draft_id).collect();
        let teams: BTreeSet<i64> = picks.iter().map(|p| p.team_id).collect();

        Self {
            total_players: players.len(),
            total_drafts: drafts.len(),
            total_teams: teams.len(),
            all_players: players.into_iter().map(str::to_string).collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Immutable pick table shared by every query. Built once at startup and
/// handed to the router as `Arc<Dataset>`; nothing mutates it afterwards.
#[derive(Debug)]
pub struct Dataset {
    /// Ordered by (draft_id, round, pick_number).
    picks: Vec<Pick>,
    metadata: DatasetMetadata,
}

impl Dataset {
    pub fn new(mut picks: Vec<Pick>) -> Arc<Self> {
        picks.sort_by(|a, b| {
            (a.draft_id, a.round, a.pick_number, a.team_id)
                .cmp(&(b.draft_id, b.round, b.pick_number, b.team_id))
        });
        let metadata = DatasetMetadata::compute(&picks);
        Arc::new(Self { picks, metadata })
    }

    pub fn picks(&self) -> &[Pick] {
        &self.picks
    }

    pub fn metadata(&self) -> &DatasetMetadata {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.picks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.picks.is_empty()
    }

    /// Distinct draft ids, ascending.
    pub fn draft_ids(&self) -> Vec<i64> {
        let ids: BTreeSet<i64> = self.picks.iter().map(|p| p.draft_id).collect();
        ids.into_iter().collect()
    }

    /// Distinct rounds present anywhere in the snapshot, ascending.
    pub fn rounds(&self) -> Vec<u32> {
        let rounds: BTreeSet<u32> = self.picks.iter().map(|p| p.round).collect();
        rounds.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{pick, sample_dataset};
    use crate::types::Position;

    #[test]
    fn metadata_counts_distinct_values() {
        let ds = sample_dataset();
        let meta = ds.metadata();
        assert_eq!(meta.total_drafts, 2);
        assert_eq!(meta.total_teams, 4);
        assert_eq!(meta.total_players, 6);
        assert_eq!(
            meta.all_players,
            vec!["PlayerA", "PlayerB", "PlayerC", "PlayerD", "PlayerE", "PlayerF"]
        );
    }

    #[test]
    fn picks_are_ordered_by_draft_then_round() {
        let ds = Dataset::new(vec![
            pick(2, 201, 1, 1, "Late", Position::QB, "KC"),
            pick(1, 101, 1, 2, "Second", Position::RB, "SF"),
            pick(1, 101, 1, 1, "First", Position::WR, "MIA"),
        ]);
        let names: Vec<&str> = ds.picks().iter().map(|p| p.player_name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second", "Late"]);
        assert_eq!(ds.draft_ids(), vec![1, 2]);
        assert_eq!(ds.rounds(), vec![1, 2]);
    }

    #[test]
    fn empty_dataset_has_zeroed_metadata() {
        let ds = Dataset::new(Vec::new());
        assert!(ds.is_empty());
        assert_eq!(*ds.metadata(), DatasetMetadata::default());
    }
}
