//! Backend selection for queries both engines answer, and the startup
//! cross-check between them.

use serde::Serialize;
use tracing::{info, warn};

use crate::analytics::players::{player_summary, PlayerPage, PlayerQuery};
use crate::analytics::positions::heat_map;
use crate::combinations::teams_with_players;
use crate::config::QueryBackend;
use crate::db::sql_engine::SqlEngine;
use crate::error::{AppError, Result};
use crate::state::Dataset;
use crate::types::{Position, RoundWindow, SortColumn, SortOrder};

/// Byte-identical JSON or `BackendDivergence`.
pub fn ensure_same<T: Serialize>(query: &str, memory: &T, sql: &T) -> Result<()> {
    if serde_json::to_vec(memory)? != serde_json::to_vec(sql)? {
        warn!(query, "In-memory and SQL results differ");
        return Err(AppError::BackendDivergence { query: query.to_string() });
    }
    Ok(())
}

/// Player summary through whichever engine `backend` names.
pub async fn players(
    backend: QueryBackend,
    dataset: &Dataset,
    sql: Option<&SqlEngine>,
    query: &PlayerQuery,
) -> Result<PlayerPage> {
    match (backend, sql) {
        (QueryBackend::Memory, _) => player_summary(dataset, query),
        (QueryBackend::Sql, Some(sql)) => sql.player_summary(query).await,
        (QueryBackend::Verified, Some(sql)) => {
            let memory = player_summary(dataset, query)?;
            let mirrored = sql.player_summary(query).await?;
            ensure_same("player_summary", &memory, &mirrored)?;
            Ok(memory)
        }
        (backend, None) => Err(AppError::Config(format!(
            "query backend '{backend}' needs the SQL mirror, which was not built"
        ))),
    }
}

/// Run a fixed battery of queries through both engines. Any difference is
/// fatal; the caller must not serve traffic.
pub async fn verify_backends(dataset: &Dataset, sql: &SqlEngine) -> Result<()> {
    let mut checks = 0usize;

    let mut queries: Vec<(String, PlayerQuery)> = vec![("default".to_string(), PlayerQuery::default())];
    for sort_by in [
        SortColumn::Name,
        SortColumn::Position,
        SortColumn::Team,
        SortColumn::DraftPercentage,
        SortColumn::AvgPick,
        SortColumn::AvgRound,
    ] {
        queries.push((
            format!("sort {sort_by:?} desc"),
            PlayerQuery { sort_by, sort_order: SortOrder::Desc, ..PlayerQuery::default() },
        ));
    }
    queries.push((
        "QB/WR filter, second page".to_string(),
        PlayerQuery {
            positions: vec![Position::QB, Position::WR],
            offset: 10,
            limit: 10,
            ..PlayerQuery::default()
        },
    ));
    queries.push((
        "search".to_string(),
        PlayerQuery { search_term: Some("a".to_string()), ..PlayerQuery::default() },
    ));

    for (label, query) in &queries {
        let memory = player_summary(dataset, query)?;
        let mirrored = sql.player_summary(query).await?;
        ensure_same(&format!("player_summary ({label})"), &memory, &mirrored)?;
        checks += 1;
    }

    ensure_same("heat_map", &heat_map(dataset), &sql.heat_map().await?)?;
    checks += 1;

    // Required players: the two earliest-drafted names, alone and together.
    let top: Vec<String> = player_summary(dataset, &PlayerQuery { limit: 2, ..PlayerQuery::default() })?
        .players
        .into_iter()
        .map(|p| p.name)
        .collect();
    let mut required_sets: Vec<Vec<String>> = vec![Vec::new()];
    required_sets.extend(top.iter().map(|name| vec![name.clone()]));
    required_sets.push(top);

    for window in [RoundWindow::All, RoundWindow::FirstN(2)] {
        for required in &required_sets {
            ensure_same(
                &format!("teams_with_players ({window}, {required:?})"),
                &teams_with_players(dataset, window, required),
                &sql.teams_with_players(window, required).await?,
            )?;
            checks += 1;
        }
    }

    info!(checks, "SQL mirror agrees with in-memory engine");
    Ok(())
}
