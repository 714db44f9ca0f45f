use async_trait::async_trait;
use tally_core::{HistoryEntry, ListResponse, ProjectId};

use crate::error::Result;
use crate::query::QueryParams;

pub mod http;

pub use http::HttpSource;

/// Where catalog data comes from.
#[async_trait]
pub trait StatsSource: Send + Sync {
    /// Fetch one catalog page.
    async fn list(&self, query: &QueryParams) -> Result<ListResponse>;

    /// Fetch the analysis history of one project, newest first.
    async fn history(&self, project_id: ProjectId) -> Result<Vec<HistoryEntry>>;
}
