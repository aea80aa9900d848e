pub mod engine;
pub mod summary;

pub use engine::{
    find_unique_rosters, teams_with_players, unique_rosters_with_stats, CombinationStats, TeamCombinationResult,
};
pub use summary::PositionCounts;
