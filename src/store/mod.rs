//! SQLite persistence for skills, models, agents, workflows, sessions,
//! messages and gallery items.

mod entity;
mod manager;
mod schema;

pub use entity::{Entity, Filters};
pub use manager::DbManager;

use std::path::PathBuf;

/// Errors raised by the entity store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("record serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid timestamp stored in {table}: {value}")]
    Timestamp { table: &'static str, value: String },
    #[error("refusing to delete from {table} without filters")]
    UnfilteredDelete { table: &'static str },
    #[error("cannot create database directory {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Whether an upsert created a row or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Added,
    Updated,
}

impl std::fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpsertOutcome::Added => f.write_str("Item Added Successfully"),
            UpsertOutcome::Updated => f.write_str("Item Updated Successfully"),
        }
    }
}

/// Result of a filtered delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted(usize),
    NotFound,
}

impl std::fmt::Display for DeleteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeleteOutcome::Deleted(_) => f.write_str("Deleted Successfully"),
            DeleteOutcome::NotFound => f.write_str("Row not found"),
        }
    }
}
