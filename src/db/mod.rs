pub mod backend;
pub mod models;
pub mod snapshot;
pub mod sql_engine;

pub use sql_engine::SqlEngine;
