//! Version history: append-only snapshots of every lifecycle mutation.
//!
//! History entries are immutable once recorded and can be replayed to
//! understand exactly how a contract reached its current state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use covenant_types::{Clause, ContractStatus};

/// One immutable version snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub version: u32,
    pub status: ContractStatus,
    /// Clause set as of this version.
    pub clauses: Vec<Clause>,
    pub change_summary: String,
    pub author: String,
    pub recorded_at: DateTime<Utc>,
}

impl VersionRecord {
    pub fn new(
        version: u32,
        status: ContractStatus,
        clauses: Vec<Clause>,
        change_summary: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            version,
            status,
            clauses,
            change_summary: change_summary.into(),
            author: author.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// One audit event, recorded alongside the version snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub action: String,
    pub actor: String,
    pub detail: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEvent {
    pub fn new(action: impl Into<String>, actor: impl Into<String>, detail: serde_json::Value) -> Self {
        Self {
            action: action.into(),
            actor: actor.into(),
            detail,
            recorded_at: Utc::now(),
        }
    }
}
