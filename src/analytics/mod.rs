pub mod draft_slot;
pub mod drift;
pub mod players;
pub mod positions;
pub mod rosters;
pub mod stacks;

pub use draft_slot::{draft_slot_correlation, DraftSlotQuery, DraftSlotRow};
pub use drift::{adp_drift, DriftEntry};
pub use players::{player_details, player_summary, PlayerDetails, PlayerPage, PlayerQuery, PlayerSummary};
pub use positions::{
    first_pick_stats, heat_map, position_round_counts, position_stats, FirstPickStats, HeatMapCell, PositionStats,
    RoundCount,
};
pub use rosters::{
    core_roster_counts, roster_construction, team_roster_constructions, CoreRosterCount, RosterConstruction,
    TeamRosterConstruction,
};
pub use stacks::{find_stacks, StackEntry};
