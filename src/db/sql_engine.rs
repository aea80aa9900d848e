//! SQLite mirror of the loaded dataset. Answers the player summary, the heat
//! map and the required-player team filter with plain SQL so the in-memory
//! engine can be checked against an independent implementation.

use std::collections::BTreeSet;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::QueryBuilder;
use tracing::{debug, info};

use crate::analytics::players::{PageInfo, PlayerPage, PlayerQuery, PlayerSummary};
use crate::analytics::positions::HeatMapCell;
use crate::config::SQL_INSERT_CHUNK_ROWS;
use crate::error::{AppError, Result};
use crate::state::Dataset;
use crate::types::{Position, RoundWindow, SortColumn, SortOrder};

const CREATE_PICKS: &str = r#"
CREATE TABLE picks (
    draft_id    INTEGER NOT NULL,
    team_id     INTEGER NOT NULL,
    draft_slot  INTEGER NOT NULL,
    round       INTEGER NOT NULL,
    pick_number INTEGER NOT NULL,
    player      TEXT    NOT NULL,
    position    TEXT    NOT NULL,
    nfl_team    TEXT    NOT NULL
)
"#;

const CREATE_INDEXES: [&str; 2] = [
    "CREATE INDEX idx_picks_player ON picks (player, position, nfl_team)",
    "CREATE INDEX idx_picks_team ON picks (team_id, round)",
];

/// Same normalization as `normalize_name`: ASCII lowercase, no periods or apostrophes.
const NORMALIZED_PLAYER: &str = "replace(replace(lower(player), '.', ''), '''', '')";

#[derive(sqlx::FromRow)]
struct PlayerRow {
    player: String,
    position: String,
    nfl_team: String,
    n: i64,
    pick_sum: i64,
    round_sum: i64,
    min_pick: i64,
    max_pick: i64,
}

#[derive(sqlx::FromRow)]
struct HeatMapRow {
    round: i64,
    position: String,
    count: i64,
}

#[derive(Clone)]
pub struct SqlEngine {
    pool: SqlitePool,
    total_drafts: usize,
}

impl SqlEngine {
    /// Copy every pick into a private in-memory SQLite database.
    pub async fn mirror(dataset: &Dataset) -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        // One connection that never expires: the database lives and dies with it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await?;

        sqlx::query(CREATE_PICKS).execute(&pool).await?;

        let mut tx = pool.begin().await?;
        for chunk in dataset.picks().chunks(SQL_INSERT_CHUNK_ROWS) {
            let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
                "INSERT INTO picks (draft_id, team_id, draft_slot, round, pick_number, player, position, nfl_team) ",
            );
            qb.push_values(chunk, |mut row, pick| {
                row.push_bind(pick.draft_id)
                    .push_bind(pick.team_id)
                    .push_bind(i64::from(pick.draft_slot))
                    .push_bind(i64::from(pick.round))
                    .push_bind(i64::from(pick.pick_number))
                    .push_bind(pick.player_name.clone())
                    .push_bind(pick.position.as_str())
                    .push_bind(pick.nfl_team.clone());
            });
            qb.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        for ddl in CREATE_INDEXES {
            sqlx::query(ddl).execute(&pool).await?;
        }

        let total_drafts: i64 = sqlx::query_scalar("SELECT COUNT(DISTINCT draft_id) FROM picks")
            .fetch_one(&pool)
            .await?;

        info!(rows = dataset.len(), total_drafts, "SQL mirror ready");
        Ok(Self {
            pool,
            total_drafts: usize::try_from(total_drafts).unwrap_or_default(),
        })
    }

    // -----------------------------------------------------------------------
    // Player summary
    // -----------------------------------------------------------------------

    pub async fn player_summary(&self, query: &PlayerQuery) -> Result<PlayerPage> {
        query.validate()?;
        let search = query.normalized_search();
        let limit = i64::try_from(query.limit)
            .map_err(|_| AppError::InvalidParameter(format!("limit {} out of range", query.limit)))?;
        let offset = i64::try_from(query.offset)
            .map_err(|_| AppError::InvalidParameter(format!("offset {} out of range", query.offset)))?;

        let mut count_qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT COUNT(*) FROM (SELECT 1 FROM picks");
        push_player_filters(&mut count_qb, &query.positions, search.as_deref());
        count_qb.push(" GROUP BY player, position, nfl_team)");
        let total_count: i64 = count_qb.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT player, position, nfl_team, \
             COUNT(*) AS n, SUM(pick_number) AS pick_sum, SUM(round) AS round_sum, \
             MIN(pick_number) AS min_pick, MAX(pick_number) AS max_pick \
             FROM picks",
        );
        push_player_filters(&mut qb, &query.positions, search.as_deref());
        qb.push(" GROUP BY player, position, nfl_team ORDER BY ")
            .push(sort_expression(query.sort_by))
            .push(match query.sort_order {
                SortOrder::Asc => " ASC",
                SortOrder::Desc => " DESC",
            })
            .push(", player ASC, position ASC, nfl_team ASC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows: Vec<PlayerRow> = qb.build_query_as::<PlayerRow>().fetch_all(&self.pool).await?;

        let total_drafts = self.total_drafts.max(1) as f64;
        let players = rows
            .into_iter()
            .map(|r| {
                Ok(PlayerSummary {
                    position: mirror_position(&r.position)?,
                    avg_pick: r.pick_sum as f64 / r.n as f64,
                    min_pick: mirror_u32(r.min_pick, "min_pick")?,
                    max_pick: mirror_u32(r.max_pick, "max_pick")?,
                    avg_round: r.round_sum as f64 / r.n as f64,
                    draft_percentage: r.n as f64 * 100.0 / total_drafts,
                    name: r.player,
                    team: r.nfl_team,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let total_count = usize::try_from(total_count).unwrap_or_default();
        debug!(total_count, returned = players.len(), "SQL player summary");
        Ok(PlayerPage {
            players,
            total_count,
            page_info: PageInfo::new(total_count, query.limit, query.offset),
        })
    }

    // -----------------------------------------------------------------------
    // Heat map
    // -----------------------------------------------------------------------

    pub async fn heat_map(&self) -> Result<Vec<HeatMapCell>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT round, position, COUNT(*) AS count FROM picks GROUP BY round, position ORDER BY round, CASE position",
        );
        for position in Position::ALL {
            qb.push(format!(" WHEN '{}' THEN {}", position.as_str(), position.index()));
        }
        qb.push(" END");

        let rows: Vec<HeatMapRow> = qb.build_query_as::<HeatMapRow>().fetch_all(&self.pool).await?;
        rows.into_iter()
            .map(|r| {
                Ok(HeatMapCell {
                    round: mirror_u32(r.round, "round")?,
                    position: mirror_position(&r.position)?,
                    count: usize::try_from(r.count).unwrap_or_default(),
                })
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Required-player filter
    // -----------------------------------------------------------------------

    /// Team ids, ascending, holding every required player within `window`.
    pub async fn teams_with_players(&self, window: RoundWindow, required_players: &[String]) -> Result<Vec<i64>> {
        let required: BTreeSet<&str> = required_players.iter().map(String::as_str).collect();

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT team_id FROM picks WHERE 1 = 1");
        if let RoundWindow::FirstN(n) = window {
            qb.push(" AND round <= ").push_bind(i64::from(n));
        }
        if !required.is_empty() {
            qb.push(" AND player IN (");
            let mut names = qb.separated(", ");
            for name in &required {
                names.push_bind(name.to_string());
            }
            names.push_unseparated(")");
        }
        qb.push(" GROUP BY team_id");
        if !required.is_empty() {
            qb.push(" HAVING COUNT(DISTINCT player) = ")
                .push_bind(required.len() as i64);
        }
        qb.push(" ORDER BY team_id");

        let teams: Vec<i64> = qb.build_query_scalar::<i64>().fetch_all(&self.pool).await?;
        Ok(teams)
    }
}

fn push_player_filters(qb: &mut QueryBuilder<'_, Sqlite>, positions: &[Position], search: Option<&str>) {
    qb.push(" WHERE 1 = 1");
    if !positions.is_empty() {
        qb.push(" AND position IN (");
        let mut list = qb.separated(", ");
        for position in positions {
            list.push_bind(position.as_str());
        }
        list.push_unseparated(")");
    }
    if let Some(term) = search {
        // instr, not LIKE: `_` and `%` in a search term are literal.
        qb.push(" AND instr(")
            .push(NORMALIZED_PLAYER)
            .push(", ")
            .push_bind(term.to_string())
            .push(") > 0");
    }
}

/// ORDER BY expression matching `compare_players` for each sort column.
fn sort_expression(column: SortColumn) -> &'static str {
    match column {
        SortColumn::Name => "player",
        SortColumn::Position => "position",
        SortColumn::Team => "nfl_team",
        SortColumn::DraftPercentage => "COUNT(*)",
        SortColumn::AvgPick => "CAST(SUM(pick_number) AS REAL) / COUNT(*)",
        SortColumn::AvgRound => "CAST(SUM(round) AS REAL) / COUNT(*)",
    }
}

fn mirror_position(raw: &str) -> Result<Position> {
    raw.parse::<Position>()
        .map_err(|_| AppError::DataUnavailable(format!("SQL mirror returned unknown position '{raw}'")))
}

fn mirror_u32(raw: i64, column: &str) -> Result<u32> {
    u32::try_from(raw).map_err(|_| AppError::DataUnavailable(format!("SQL mirror returned {column} = {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::players::player_summary;
    use crate::analytics::positions::heat_map;
    use crate::combinations::teams_with_players;
    use crate::test_support::{league_dataset, sample_dataset};

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn player_summary_matches_memory_engine() {
        let ds = league_dataset();
        let sql = SqlEngine::mirror(&ds).await.unwrap();

        let queries = [
            PlayerQuery::default(),
            PlayerQuery { sort_by: SortColumn::Name, sort_order: SortOrder::Desc, ..PlayerQuery::default() },
            PlayerQuery { sort_by: SortColumn::AvgRound, limit: 2, offset: 3, ..PlayerQuery::default() },
            PlayerQuery { positions: vec![Position::QB], ..PlayerQuery::default() },
            PlayerQuery { search_term: Some("aj br".to_string()), ..PlayerQuery::default() },
            PlayerQuery { search_term: Some("JAMARR".to_string()), ..PlayerQuery::default() },
        ];
        for query in &queries {
            let memory = player_summary(&ds, query).unwrap();
            let mirrored = sql.player_summary(query).await.unwrap();
            assert_eq!(memory, mirrored, "{query:?}");
        }
    }

    #[tokio::test]
    async fn offset_past_the_end_keeps_total() {
        let ds = league_dataset();
        let sql = SqlEngine::mirror(&ds).await.unwrap();
        let page = sql
            .player_summary(&PlayerQuery { offset: 50, ..PlayerQuery::default() })
            .await
            .unwrap();
        assert!(page.players.is_empty());
        assert_eq!(page.total_count, 6);
    }

    #[tokio::test]
    async fn engines_agree_at_the_offset_boundary() {
        let ds = league_dataset();
        let sql = SqlEngine::mirror(&ds).await.unwrap();

        let too_far = PlayerQuery { offset: usize::MAX, ..PlayerQuery::default() };
        assert!(matches!(player_summary(&ds, &too_far), Err(AppError::InvalidParameter(_))));
        assert!(matches!(sql.player_summary(&too_far).await, Err(AppError::InvalidParameter(_))));

        for offset in [i64::MAX as usize, (i64::MAX as usize) - 1] {
            let query = PlayerQuery { offset, ..PlayerQuery::default() };
            let memory = player_summary(&ds, &query).unwrap();
            let mirrored = sql.player_summary(&query).await.unwrap();
            assert!(mirrored.players.is_empty());
            assert_eq!(memory, mirrored);
        }
    }

    #[tokio::test]
    async fn underscore_in_search_is_literal() {
        let ds = league_dataset();
        let sql = SqlEngine::mirror(&ds).await.unwrap();
        let page = sql
            .player_summary(&PlayerQuery { search_term: Some("_".to_string()), ..PlayerQuery::default() })
            .await
            .unwrap();
        assert_eq!(page.total_count, 0);
    }

    #[tokio::test]
    async fn heat_map_uses_canonical_position_order() {
        let ds = sample_dataset();
        let sql = SqlEngine::mirror(&ds).await.unwrap();
        let cells = sql.heat_map().await.unwrap();
        assert_eq!(cells, heat_map(&ds));
        // Round 2: QB before WR before TE, not alphabetical.
        let round2: Vec<Position> = cells.iter().filter(|c| c.round == 2).map(|c| c.position).collect();
        assert_eq!(round2, vec![Position::QB, Position::WR, Position::TE]);
    }

    #[tokio::test]
    async fn required_player_filter_matches_engine() {
        let ds = league_dataset();
        let sql = SqlEngine::mirror(&ds).await.unwrap();
        let cases = [
            (RoundWindow::All, names(&[])),
            (RoundWindow::FirstN(2), names(&["Jalen Hurts"])),
            (RoundWindow::All, names(&["Joe Burrow", "A.J. Brown"])),
            (RoundWindow::FirstN(2), names(&["Joe Burrow", "A.J. Brown"])),
            (RoundWindow::All, names(&["Nobody"])),
        ];
        for (window, required) in &cases {
            assert_eq!(
                sql.teams_with_players(*window, required).await.unwrap(),
                teams_with_players(&ds, *window, required),
                "{window} {required:?}"
            );
        }
    }

    #[tokio::test]
    async fn empty_dataset_mirrors() {
        let ds = crate::state::Dataset::new(Vec::new());
        let sql = SqlEngine::mirror(&ds).await.unwrap();
        let page = sql.player_summary(&PlayerQuery::default()).await.unwrap();
        assert_eq!(page.total_count, 0);
        assert!(sql.heat_map().await.unwrap().is_empty());
    }
}
