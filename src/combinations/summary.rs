use serde::ser::{Serialize, Serializer};

use crate::types::Position;

/// Per-position pick counts for one roster. Fixed-size, indexed by
/// `Position::index()`, so every position is implicitly zero-filled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PositionCounts([usize; Position::COUNT]);

impl PositionCounts {
    pub fn from_positions<I>(positions: I) -> Self
    where
        I: IntoIterator<Item = Position>,
    {
        let mut counts = Self::default();
        for p in positions {
            counts.add(p);
        }
        counts
    }

    pub fn add(&mut self, position: Position) {
        self.0[position.index()] += 1;
    }

    pub fn get(&self, position: Position) -> usize {
        self.0[position.index()]
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    /// Positions actually on the roster, ordered by position name ascending.
    pub fn present(&self) -> Vec<(Position, usize)> {
        let mut present: Vec<(Position, usize)> = Position::ALL
            .iter()
            .map(|&p| (p, self.get(p)))
            .filter(|&(_, n)| n > 0)
            .collect();
        present.sort_by_key(|(p, _)| p.as_str());
        present
    }

    /// Counts restricted to QB/RB/WR/TE.
    pub fn core(&self) -> [usize; 4] {
        Position::CORE.map(|p| self.get(p))
    }

    /// `"QB: 1, RB: 2, WR: 3"`; absent positions omitted.
    pub fn display(&self) -> String {
        self.present()
            .iter()
            .map(|(p, n)| format!("{p}: {n}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Serialized as a map of the positions present, in display order.
impl Serialize for PositionCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.present())
    }
}
