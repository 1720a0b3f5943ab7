// src/ingest/types.rs
use anyhow::Result;

use crate::launch::LaunchRecord;

/// One launch-tracking website.
///
/// `fetch` returns an empty list, not an error, when the site lists nothing.
/// Fields that fail to parse come back as `None` / `LaunchTime::Unknown`
/// instead of dropping the record.
#[async_trait::async_trait]
pub trait SiteAdapter: Send + Sync {
    async fn fetch(&self) -> Result<Vec<LaunchRecord>>;
    fn source_id(&self) -> &'static str;
}
