//! Record store seam
//!
//! The core depends on a repository contract (query by user, sorted by
//! creation time descending) rather than on Airtable directly, so the
//! filter and estimator stay testable without a live network.

pub mod airtable;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{MeasurementRecord, NewRecord};

pub use airtable::AirtableStore;

/// External tabular store holding the measurement records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records for `user`, newest first.
    async fn fetch_records(&self, user: &str) -> Result<Vec<MeasurementRecord>>;

    /// Persist a new record; the store assigns id and timestamp.
    async fn create_record(&self, record: &NewRecord) -> Result<()>;

    /// Bulk soft delete: set the exclude-from-calculations flag on every
    /// listed record. The flag is never unset.
    async fn set_excluded(&self, record_ids: &[String]) -> Result<()>;
}
