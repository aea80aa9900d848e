use std::str::FromStr;

use crate::error::{AppError, Result};

pub const DATA_PATH: &str = "data/bestball.csv";

/// Highest round a caller may request. Drafts in the snapshot run 18-20 rounds.
pub const MAX_ROUNDS: u32 = 20;

/// Teams per draft; draft slots run 1..=DRAFT_SLOTS.
pub const DRAFT_SLOTS: u32 = 12;

/// The upstream export stores pick numbers as a signed byte, so picks past 127
/// arrive negative. Adding this offset restores the real pick number.
pub const PICK_WRAP_OFFSET: i64 = 256;

/// Reserved roster-signature separator. Snapshot rows whose player name
/// contains it are rejected at load.
pub const ROSTER_SIGNATURE_SEPARATOR: &str = "|";

/// Page size / result caps shared by the API layer.
pub const DEFAULT_LIMIT: usize = 100;
pub const MAX_LIMIT: usize = 1000;

/// Draft slot correlation defaults.
pub const DEFAULT_TOP_N: usize = 25;
pub const MAX_TOP_N: usize = 100;
/// Minimum slot teams that must have drafted a player before it is ranked.
/// Filters out small-sample noise.
pub const DEFAULT_MIN_TEAMS: usize = 10;

/// Stack finder default round window.
pub const DEFAULT_STACK_ROUNDS: u32 = 10;

/// Rows per INSERT statement when mirroring the dataset into SQLite.
/// 8 columns × 500 rows stays well under SQLite's bind-parameter limit.
pub const SQL_INSERT_CHUNK_ROWS: usize = 500;

/// Which engine answers the queries both engines implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryBackend {
    /// In-process engine. Canonical.
    Memory,
    /// SQLite mirror only.
    Sql,
    /// Run both; any difference is an error.
    Verified,
}

impl FromStr for QueryBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(QueryBackend::Memory),
            "sql" => Ok(QueryBackend::Sql),
            "verified" => Ok(QueryBackend::Verified),
            other => Err(AppError::Config(format!(
                "QUERY_BACKEND must be one of memory|sql|verified, got '{other}'"
            ))),
        }
    }
}

impl std::fmt::Display for QueryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            QueryBackend::Memory => "memory",
            QueryBackend::Sql => "sql",
            QueryBackend::Verified => "verified",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Snapshot file (.csv, or a SQLite file with a `picks` table) (DATA_PATH)
    pub data_path: String,
    pub log_level: String,
    pub api_port: u16,
    /// Engine used for player summaries (QUERY_BACKEND)
    pub query_backend: QueryBackend,
    /// Cross-check the SQL mirror against the in-memory engine before serving
    /// (VERIFY_BACKENDS_ON_STARTUP)
    pub verify_backends_on_startup: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            data_path: std::env::var("DATA_PATH").unwrap_or_else(|_| DATA_PATH.to_string()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            query_backend: std::env::var("QUERY_BACKEND")
                .unwrap_or_else(|_| "memory".to_string())
                .parse::<QueryBackend>()?,
            verify_backends_on_startup: parse_bool(
                "VERIFY_BACKENDS_ON_STARTUP",
                &std::env::var("VERIFY_BACKENDS_ON_STARTUP").unwrap_or_else(|_| "true".to_string()),
            )?,
        })
    }

    /// The SQL mirror is only built when something will read from it.
    pub fn needs_sql_backend(&self) -> bool {
        self.verify_backends_on_startup || self.query_backend != QueryBackend::Memory
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::Config(format!("{name} must be a boolean, got '{value}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_backend_parses_case_insensitively() {
        assert_eq!("Memory".parse::<QueryBackend>().unwrap(), QueryBackend::Memory);
        assert_eq!(" sql ".parse::<QueryBackend>().unwrap(), QueryBackend::Sql);
        assert_eq!("VERIFIED".parse::<QueryBackend>().unwrap(), QueryBackend::Verified);
        assert!("fastest".parse::<QueryBackend>().is_err());
    }

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_bool("X", "yes").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "maybe").is_err());
    }
}
