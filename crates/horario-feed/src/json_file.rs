//! Directory-of-JSON-files adapter
//!
//! Layout under the root directory:
//!
//! ```text
//! directory.json          { "workers": [...], "companies": { "<id>": "<label>" } }
//! entries/<workerId>.json [ raw schedule records, any kind ]
//! ```
//!
//! `companies` may also be a list of `{ "id": ..., "name": ... }` objects.
//! A worker without an entries file has no records. The date window is
//! applied later by the daily builder, after the timestamp offset.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use horario_core::{DateRange, WorkerRecord};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::ports::{DirectoryFeed, EntryKind, ScheduleFeed};
use crate::FeedError;

const DIRECTORY_FILE: &str = "directory.json";
const ENTRIES_DIR: &str = "entries";

#[derive(Debug, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    workers: Vec<WorkerRecord>,
    #[serde(default)]
    companies: CompanyLabels,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CompanyLabels {
    Map(BTreeMap<String, String>),
    List(Vec<CompanyLabel>),
}

impl Default for CompanyLabels {
    fn default() -> Self {
        CompanyLabels::Map(BTreeMap::new())
    }
}

#[derive(Debug, Deserialize)]
struct CompanyLabel {
    id: String,
    #[serde(alias = "label", alias = "companyName")]
    name: String,
}

/// Feed backed by JSON files on disk
#[derive(Clone, Debug)]
pub struct JsonFileFeed {
    root: PathBuf,
}

impl JsonFileFeed {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entries_path(&self, worker_id: &str) -> Result<PathBuf, FeedError> {
        let usable = !worker_id.is_empty()
            && worker_id != ".."
            && !worker_id.contains(['/', '\\']);
        if !usable {
            return Err(FeedError::NotFound(format!("worker id '{worker_id}'")));
        }
        Ok(self.root.join(ENTRIES_DIR).join(format!("{worker_id}.json")))
    }

    async fn read_directory(&self) -> Result<DirectoryFile, FeedError> {
        let path = self.root.join(DIRECTORY_FILE);
        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                FeedError::NotFound(path.display().to_string())
            } else {
                FeedError::Io(e)
            }
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[async_trait::async_trait]
impl ScheduleFeed for JsonFileFeed {
    async fn fetch_entries(
        &self,
        worker_id: &str,
        _range: &DateRange,
        kind: EntryKind,
    ) -> Result<Vec<Value>, FeedError> {
        let path = self.entries_path(worker_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(worker_id, "no entries file");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let records: Vec<Value> = serde_json::from_str(&content)?;
        let total = records.len();
        let records: Vec<Value> = records
            .into_iter()
            .filter(|r| EntryKind::of_record(r) == kind)
            .collect();
        debug!(worker_id, ?kind, total, kept = records.len(), "entries read");
        Ok(records)
    }
}

#[async_trait::async_trait]
impl DirectoryFeed for JsonFileFeed {
    async fn workers(&self) -> Result<Vec<WorkerRecord>, FeedError> {
        Ok(self.read_directory().await?.workers)
    }

    async fn company_labels(&self) -> Result<Vec<(String, String)>, FeedError> {
        let labels = match self.read_directory().await?.companies {
            CompanyLabels::Map(map) => map.into_iter().collect(),
            CompanyLabels::List(list) => list.into_iter().map(|c| (c.id, c.name)).collect(),
        };
        Ok(labels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_path_rejects_traversal() {
        let feed = JsonFileFeed::new("/data");
        assert!(feed.entries_path("../etc/passwd").is_err());
        assert!(feed.entries_path("..").is_err());
        assert!(feed.entries_path("").is_err());
        assert_eq!(
            feed.entries_path("w-1").unwrap(),
            PathBuf::from("/data/entries/w-1.json")
        );
    }

    #[test]
    fn company_labels_accept_list_form() {
        let file: DirectoryFile =
            serde_json::from_str(r#"{ "companies": [{ "id": "c1", "label": "Acme" }] }"#).unwrap();
        assert!(file.workers.is_empty());
        assert!(matches!(file.companies, CompanyLabels::List(ref l) if l[0].name == "Acme"));
    }
}
