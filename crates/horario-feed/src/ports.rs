//! Outbound ports. The engine calls into the external system of record.
//!
//! Implemented by adapters.

use horario_core::{DateRange, WorkerRecord};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::FeedError;

/// Type filter of the schedule-entries feed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum EntryKind {
    /// Hours (manual entries and tracked shifts)
    Hours = 1,
    /// Free-text day notes
    Notes = 2,
}

impl EntryKind {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(EntryKind::Hours),
            2 => Some(EntryKind::Notes),
            _ => None,
        }
    }

    /// Kind of a raw record; records without a usable `type` count as hours
    pub fn of_record(record: &Value) -> Self {
        let code = match record.get("type") {
            Some(Value::Number(n)) => n.as_u64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        };
        code.and_then(|c| u8::try_from(c).ok())
            .and_then(Self::from_code)
            .unwrap_or(EntryKind::Hours)
    }
}

impl From<EntryKind> for u8 {
    fn from(kind: EntryKind) -> u8 {
        kind.code()
    }
}

impl TryFrom<u8> for EntryKind {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown entry type {code}"))
    }
}

/// Schedule-entries feed. Records are returned raw: their shape drifts.
#[async_trait::async_trait]
pub trait ScheduleFeed: Send + Sync {
    /// Raw records of one kind for a worker over a date window.
    async fn fetch_entries(
        &self,
        worker_id: &str,
        range: &DateRange,
        kind: EntryKind,
    ) -> Result<Vec<Value>, FeedError>;
}

/// Worker/company directory feed.
#[async_trait::async_trait]
pub trait DirectoryFeed: Send + Sync {
    /// All workers with their contracts, relations and company names.
    async fn workers(&self) -> Result<Vec<WorkerRecord>, FeedError>;

    /// Company-label lookup as `(id, label)` pairs.
    async fn company_labels(&self) -> Result<Vec<(String, String)>, FeedError>;
}
