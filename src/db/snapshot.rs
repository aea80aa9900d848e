use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{debug, info};

use crate::db::models::PickRecord;
use crate::error::{AppError, Result};
use crate::state::Dataset;
use crate::types::Pick;

/// Snapshot encodings, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Csv,
    Sqlite,
}

impl SnapshotFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(SnapshotFormat::Csv),
            "db" | "sqlite" | "sqlite3" => Ok(SnapshotFormat::Sqlite),
            _ => Err(AppError::DataUnavailable(format!(
                "unsupported snapshot extension for {} (expected .csv, .db, .sqlite)",
                path.display()
            ))),
        }
    }
}

/// Load the draft snapshot once at startup.
/// Any failure is reported as `DataUnavailable`; the caller must not serve traffic.
pub async fn load(path: &str) -> Result<Arc<Dataset>> {
    let path_ref = Path::new(path);
    if !path_ref.exists() {
        return Err(AppError::DataUnavailable(format!("snapshot not found at {path}")));
    }

    let format = SnapshotFormat::from_path(path_ref)?;
    info!(path, ?format, "Loading draft snapshot");

    let records = match format {
        SnapshotFormat::Csv => std::fs::File::open(path_ref)
            .map_err(AppError::from)
            .and_then(read_csv),
        SnapshotFormat::Sqlite => read_sqlite(path_ref).await,
    }
    .map_err(|e| unavailable(path, e))?;

    let picks = records
        .into_iter()
        .map(PickRecord::into_pick)
        .collect::<Result<Vec<Pick>>>()
        .map_err(|e| unavailable(path, e))?;

    let dataset = Dataset::new(picks);
    let meta = dataset.metadata();
    info!(
        rows = dataset.len(),
        players = meta.total_players,
        drafts = meta.total_drafts,
        teams = meta.total_teams,
        "Snapshot loaded"
    );
    Ok(dataset)
}

/// Decode CSV rows with a header line.
pub fn read_csv<R: Read>(rdr: R) -> Result<Vec<PickRecord>> {
    let mut reader = csv::Reader::from_reader(rdr);
    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: PickRecord = row?;
        records.push(record);
    }
    debug!(rows = records.len(), "Decoded CSV snapshot");
    Ok(records)
}

/// Read the `picks` table from a SQLite snapshot, opened read-only.
pub async fn read_sqlite(path: &Path) -> Result<Vec<PickRecord>> {
    let options = SqliteConnectOptions::new().filename(path).read_only(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;

    let records = sqlx::query_as::<_, PickRecord>(
        r#"
        SELECT draft, team_id, draft_position, round, pick, player, Position, Team
        FROM picks
        "#,
    )
    .fetch_all(&pool)
    .await?;

    pool.close().await;
    debug!(rows = records.len(), "Read SQLite snapshot");
    Ok(records)
}

fn unavailable(path: &str, e: AppError) -> AppError {
    match e {
        AppError::DataUnavailable(msg) => AppError::DataUnavailable(format!("{path}: {msg}")),
        other => AppError::DataUnavailable(format!("{path}: {other}")),
    }
}
