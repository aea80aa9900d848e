use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::state::Dataset;
use crate::types::{median, Position};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriftEntry {
    pub name: String,
    pub position: Position,
    pub avg_pick_early: f64,
    pub avg_pick_late: f64,
    /// `late - early`. Positive: going later over time (falling);
    /// negative: going earlier (rising).
    pub drift: f64,
}

#[derive(Default)]
struct Mean {
    sum: u64,
    n: u64,
}

impl Mean {
    fn push(&mut self, v: u32) {
        self.sum += u64::from(v);
        self.n += 1;
    }

    fn value(&self) -> f64 {
        self.sum as f64 / self.n as f64
    }
}

/// ADP movement between the early and late halves of the snapshot.
///
/// Drafts with an id at or below the median draft id form the early half.
/// Only players drafted in both halves are reported, largest drift first.
pub fn adp_drift(dataset: &Dataset) -> Vec<DriftEntry> {
    let mut ids: Vec<f64> = dataset.draft_ids().into_iter().map(|id| id as f64).collect();
    let Some(split) = median(&mut ids) else {
        return Vec::new();
    };

    let mut early: BTreeMap<(&str, Position), Mean> = BTreeMap::new();
    let mut late: BTreeMap<(&str, Position), Mean> = BTreeMap::new();
    for pick in dataset.picks() {
        let half = if (pick.draft_id as f64) <= split { &mut early } else { &mut late };
        half.entry((pick.player_name.as_str(), pick.position))
            .or_default()
            .push(pick.pick_number);
    }

    let mut entries: Vec<DriftEntry> = early
        .iter()
        .filter_map(|(key, e)| {
            let l = late.get(key)?;
            let (avg_pick_early, avg_pick_late) = (e.value(), l.value());
            Some(DriftEntry {
                name: key.0.to_string(),
                position: key.1,
                avg_pick_early,
                avg_pick_late,
                drift: avg_pick_late - avg_pick_early,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.drift
            .total_cmp(&a.drift)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.position.cmp(&b.position))
    });

    debug!(split, players = entries.len(), "ADP drift");
    entries
}
