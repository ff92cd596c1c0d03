//! Last-request-wins freshness for overlapping loads
//!
//! Each load takes a ticket. When it completes, its result is applied only if
//! no newer load started in the meantime; stale results are discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use horario_core::daily::DailyOptions;
use horario_core::DateRange;
use tracing::debug;

use crate::fetch::{fetch_weekly_data, FetchReport};
use crate::ports::ScheduleFeed;

/// Generation of one in-flight request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// Monotonic request counter
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, superseding every earlier one
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }
}

/// Loads weekly data, dropping results overtaken by a newer load
#[derive(Clone)]
pub struct WeeklyDataLoader {
    feed: Arc<dyn ScheduleFeed>,
    tracker: Arc<RequestTracker>,
    options: DailyOptions,
}

impl WeeklyDataLoader {
    pub fn new(feed: Arc<dyn ScheduleFeed>, options: DailyOptions) -> Self {
        Self {
            feed,
            tracker: Arc::new(RequestTracker::new()),
            options,
        }
    }

    pub fn tracker(&self) -> &RequestTracker {
        &self.tracker
    }

    /// `None` when a newer load started before this one finished
    pub async fn load(&self, worker_ids: &[String], range: DateRange) -> Option<FetchReport> {
        let ticket = self.tracker.begin();
        let report = fetch_weekly_data(Arc::clone(&self.feed), worker_ids, range, self.options.clone()).await;
        if self.tracker.is_current(ticket) {
            Some(report)
        } else {
            debug!(?ticket, "stale weekly data discarded");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::NaiveDate;
    use serde_json::{json, Value};

    use crate::ports::EntryKind;
    use crate::FeedError;

    /// Answers slowly for ranges starting in January
    struct SlowJanuary;

    #[async_trait::async_trait]
    impl ScheduleFeed for SlowJanuary {
        async fn fetch_entries(
            &self,
            _worker_id: &str,
            range: &DateRange,
            _kind: EntryKind,
        ) -> Result<Vec<Value>, FeedError> {
            if range.start.format("%m").to_string() == "01" {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            Ok(vec![json!({ "date": range.start_key(), "companyId": "c1", "hours": 1 })])
        }
    }

    fn week(month: u32) -> DateRange {
        let start = NaiveDate::from_ymd_opt(2024, month, 1).unwrap();
        DateRange::new(start, start + chrono::Duration::days(6)).unwrap()
    }

    #[test]
    fn newer_ticket_supersedes() {
        let tracker = RequestTracker::new();
        let first = tracker.begin();
        assert!(tracker.is_current(first));
        let second = tracker.begin();
        assert!(!tracker.is_current(first));
        assert!(tracker.is_current(second));
    }

    #[tokio::test]
    async fn slow_stale_load_is_discarded() {
        let loader = WeeklyDataLoader::new(Arc::new(SlowJanuary), DailyOptions::default());
        let workers = vec!["w1".to_string()];

        let slow = loader.load(&workers, week(1));
        let fast = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            loader.load(&workers, week(2)).await
        };
        let (slow, fast) = tokio::join!(slow, fast);

        assert!(slow.is_none());
        let fresh = fast.unwrap();
        assert!(fresh.context().day("w1", "2024-02-01").is_some());
    }
}
