//! Snapshot row types. Column names follow the upstream export
//! (`draft`, `draft_position`, `pick`, `Position`, `Team`), not our domain names.
//! Read by csv/serde for `.csv` snapshots and by sqlx for SQLite snapshots.

use serde::Deserialize;

use crate::config::{DRAFT_SLOTS, PICK_WRAP_OFFSET, ROSTER_SIGNATURE_SEPARATOR};
use crate::error::{AppError, Result};
use crate::types::{Pick, Position};

#[derive(Debug, Clone, Deserialize, sqlx::FromRow)]
pub struct PickRecord {
    pub draft: i64,
    pub team_id: i64,
    pub draft_position: i64,
    pub round: i64,
    pub pick: i64,
    pub player: String,
    #[serde(rename = "Position")]
    #[sqlx(rename = "Position")]
    pub position: String,
    #[serde(rename = "Team")]
    #[sqlx(rename = "Team")]
    pub team: Option<String>,
}

impl PickRecord {
    /// Type-check one row and undo the pick-number wraparound.
    pub fn into_pick(self) -> Result<Pick> {
        if self.player.contains(ROSTER_SIGNATURE_SEPARATOR) {
            return Err(AppError::DataUnavailable(format!(
                "player name '{}' in draft {} contains the reserved '{ROSTER_SIGNATURE_SEPARATOR}'",
                self.player, self.draft
            )));
        }

        let position = self.position.parse::<Position>().map_err(|_| {
            AppError::DataUnavailable(format!(
                "unknown position '{}' for {} in draft {}",
                self.position, self.player, self.draft
            ))
        })?;

        let draft_slot = u32::try_from(self.draft_position)
            .ok()
            .filter(|s| (1..=DRAFT_SLOTS).contains(s))
            .ok_or_else(|| {
                AppError::DataUnavailable(format!(
                    "draft_position {} out of range in draft {}",
                    self.draft_position, self.draft
                ))
            })?;

        let round = u32::try_from(self.round)
            .ok()
            .filter(|r| *r >= 1)
            .ok_or_else(|| {
                AppError::DataUnavailable(format!("round {} out of range in draft {}", self.round, self.draft))
            })?;

        Ok(Pick {
            draft_id: self.draft,
            team_id: self.team_id,
            draft_slot,
            round,
            pick_number: normalize_pick_number(self.pick)?,
            player_name: self.player,
            position,
            nfl_team: self.team.unwrap_or_default(),
        })
    }
}

/// The export wrote pick numbers as a signed byte: anything past 127 comes
/// back negative. Shift those back into 128..=255.
pub fn normalize_pick_number(raw: i64) -> Result<u32> {
    let corrected = if raw < 0 { raw + PICK_WRAP_OFFSET } else { raw };
    if !(1..PICK_WRAP_OFFSET).contains(&corrected) {
        return Err(AppError::DataUnavailable(format!("pick number {raw} cannot be normalized")));
    }
    Ok(corrected as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pick: i64, position: &str) -> PickRecord {
        PickRecord {
            draft: 7,
            team_id: 701,
            draft_position: 3,
            round: 11,
            pick,
            player: "Chris Olave".to_string(),
            position: position.to_string(),
            team: Some("NO".to_string()),
        }
    }

    #[test]
    fn negative_picks_wrap_back_past_127() {
        assert_eq!(normalize_pick_number(-125).unwrap(), 131);
        assert_eq!(normalize_pick_number(-1).unwrap(), 255);
        assert_eq!(normalize_pick_number(42).unwrap(), 42);
    }

    #[test]
    fn unreachable_pick_numbers_are_rejected() {
        assert!(normalize_pick_number(0).is_err());
        assert!(normalize_pick_number(-300).is_err());
        assert!(normalize_pick_number(256).is_err());
    }

    #[test]
    fn record_converts_into_pick() {
        let pick = record(-125, "WR").into_pick().unwrap();
        assert_eq!(pick.pick_number, 131);
        assert_eq!(pick.position, Position::WR);
        assert_eq!(pick.draft_slot, 3);
        assert_eq!(pick.nfl_team, "NO");
    }

    #[test]
    fn separator_in_player_name_is_rejected() {
        let mut row = record(5, "WR");
        row.player = "A|B".to_string();
        assert!(matches!(row.into_pick(), Err(AppError::DataUnavailable(_))));
    }

    #[test]
    fn unknown_position_is_data_unavailable() {
        let err = record(5, "LB").into_pick().unwrap_err();
        assert!(matches!(err, AppError::DataUnavailable(_)));
    }
}
