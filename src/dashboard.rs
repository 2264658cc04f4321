//! Aggregate counters over interns, entries and visitors.

use chrono::{NaiveDate, Utc};
use serde::Serialize;

use crate::api::{ApiClient, ApiError, EntryLog, Intern, Visitor};

/// Counters shown by `rollcall dashboard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_interns: usize,
    pub total_entries: usize,
    pub today_entries: usize,
    pub total_visitors: usize,
}

impl DashboardStats {
    /// Compute the counters for `today`.
    #[must_use]
    pub fn compute(
        interns: &[Intern],
        entries: &[EntryLog],
        visitors: &[Visitor],
        today: NaiveDate,
    ) -> Self {
        Self {
            total_interns: interns.len(),
            total_entries: entries.len(),
            today_entries: entries.iter().filter(|entry| entry.is_on(today)).count(),
            total_visitors: visitors.len(),
        }
    }

    /// Fetch the three lists concurrently and count them, with today
    /// taken as the current UTC date.
    ///
    /// # Errors
    ///
    /// Returns the first failing request's error.
    pub async fn fetch(client: &ApiClient) -> Result<Self, ApiError> {
        let (interns, entries, visitors) = tokio::try_join!(
            client.list_interns(),
            client.list_entry_logs(),
            client.list_visitors()
        )?;
        let today = Utc::now().date_naive();
        log::debug!(
            "Dashboard over {} interns, {} entries, {} visitors for {}",
            interns.len(),
            entries.len(),
            visitors.len(),
            today
        );
        Ok(Self::compute(&interns, &entries, &visitors, today))
    }
}
