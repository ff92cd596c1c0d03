//! Concurrent per-worker fetch with settle-all semantics
//!
//! One task per worker fetches hour and note records and folds them with the
//! daily builder. A failure for one worker never discards the others: the
//! report carries the loaded data plus the list of failed workers.

use std::collections::HashMap;
use std::sync::Arc;

use horario_core::daily::{build_worker_weekly_data, DailyOptions};
use horario_core::{AssignmentTotalsContext, DateRange, WorkerWeeklyData};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::ports::{EntryKind, ScheduleFeed};
use crate::FeedError;

/// A worker whose data could not be loaded
#[derive(Clone, Debug, PartialEq)]
pub struct FetchFailure {
    pub worker_id: String,
    pub error: String,
}

/// Outcome of a batch fetch
#[derive(Clone, Debug, Default)]
pub struct FetchReport {
    /// Loaded data, in the order workers were requested
    pub data: Vec<WorkerWeeklyData>,
    pub failures: Vec<FetchFailure>,
}

impl FetchReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Partial-failure message naming workers by id
    pub fn warning(&self) -> Option<String> {
        self.warning_with(|id| id.to_string())
    }

    /// Partial-failure message, naming workers with `label`
    pub fn warning_with(&self, label: impl Fn(&str) -> String) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        let names: Vec<String> = self.failures.iter().map(|f| label(&f.worker_id)).collect();
        Some(format!(
            "Could not load hours for {} worker(s): {}",
            names.len(),
            names.join(", ")
        ))
    }

    /// Lookup context for the aggregation engine
    pub fn context(&self) -> AssignmentTotalsContext {
        AssignmentTotalsContext::new(self.data.iter().cloned())
    }
}

async fn fetch_worker(
    feed: Arc<dyn ScheduleFeed>,
    worker_id: String,
    range: DateRange,
    options: DailyOptions,
) -> Result<WorkerWeeklyData, FeedError> {
    let (hours, notes) = tokio::try_join!(
        feed.fetch_entries(&worker_id, &range, EntryKind::Hours),
        feed.fetch_entries(&worker_id, &range, EntryKind::Notes),
    )?;
    Ok(build_worker_weekly_data(&worker_id, &hours, &notes, &range, &options))
}

/// Fetch and fold every worker's records concurrently, settling all tasks
pub async fn fetch_weekly_data(
    feed: Arc<dyn ScheduleFeed>,
    worker_ids: &[String],
    range: DateRange,
    options: DailyOptions,
) -> FetchReport {
    let mut unique: Vec<&String> = Vec::with_capacity(worker_ids.len());
    for worker_id in worker_ids {
        if !unique.contains(&worker_id) {
            unique.push(worker_id);
        }
    }

    let mut tasks = JoinSet::new();
    for &worker_id in &unique {
        let feed = Arc::clone(&feed);
        let worker_id = worker_id.clone();
        let options = options.clone();
        tasks.spawn(async move {
            let result = fetch_worker(feed, worker_id.clone(), range, options).await;
            (worker_id, result)
        });
    }

    let mut loaded: HashMap<String, WorkerWeeklyData> = HashMap::new();
    let mut failed: HashMap<String, String> = HashMap::new();
    let mut panics = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((worker_id, Ok(data))) => {
                debug!(worker_id, days = data.days.len(), "worker data loaded");
                loaded.insert(worker_id, data);
            }
            Ok((worker_id, Err(e))) => {
                warn!(worker_id, error = %e, "worker data failed");
                failed.insert(worker_id, e.to_string());
            }
            Err(e) => {
                warn!(error = %e, "fetch task aborted");
                panics.push(FeedError::Task(e.to_string()).to_string());
            }
        }
    }

    let mut report = FetchReport::default();
    for worker_id in unique {
        if let Some(data) = loaded.remove(worker_id) {
            report.data.push(data);
            continue;
        }
        // Aborted tasks lose their worker id; unsettled workers take those errors
        let error = failed
            .remove(worker_id)
            .or_else(|| panics.pop())
            .unwrap_or_else(|| FeedError::Task("no result".into()).to_string());
        report.failures.push(FetchFailure {
            worker_id: worker_id.clone(),
            error,
        });
    }
    report
}
