//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where the current schema comes from.
    pub source: SnapshotSource,

    /// Where the desired schema comes from.
    pub target: SnapshotSource,

    /// Migration planning options.
    #[serde(default)]
    pub migration: MigrationOptions,
}

/// One side of a diff: a schema snapshot and how to obtain it.
///
/// Only the `json` source type is handled here; other types name external
/// reader implementations and are rejected at validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotSource {
    /// Source type (currently always "json").
    #[serde(default = "default_json")]
    pub r#type: String,

    /// Path to the snapshot file.
    pub path: PathBuf,
}

/// Migration planning options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationOptions {
    /// Target dialect name (default: "postgres").
    #[serde(default = "default_postgres")]
    pub dialect: String,

    /// Whether destructive operations (drops, renames) may appear in the
    /// plan without an explicit CLI override.
    #[serde(default)]
    pub allow_destructive: bool,

    /// Log verbosity filter, e.g. "debug" or "schema_migrate=trace".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<String>,
}

impl Default for MigrationOptions {
    fn default() -> Self {
        Self {
            dialect: default_postgres(),
            allow_destructive: false,
            verbosity: None,
        }
    }
}

fn default_json() -> String {
    "json".to_string()
}

fn default_postgres() -> String {
    "postgres".to_string()
}
