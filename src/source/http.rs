use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use tally_core::{HistoryEntry, ListResponse, ProjectId};
use tracing::debug;

use crate::error::{Error, Result};
use crate::query::{history_path, join_path, QueryParams};
use crate::source::StatsSource;

/// Project-stats API over HTTP
///
/// Endpoints, relative to the base URL:
/// ```text
/// GET /project-stats?page={p}&limit={l}[&name={q}]
/// GET /project-stats?id={cursor}&limit={l}&direction={asc|desc}
/// GET /project-stats/{project_id}
/// ```
pub struct HttpSource {
    client: Client,
    base_url: Url,
}

impl HttpSource {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Like [`HttpSource::new`] with a per-request timeout.
    pub fn with_timeout(base_url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!("GET {} returned {}", url, status)));
        }

        let body = response.text().await?;
        let value = serde_json::from_str(&body)?;
        Ok(value)
    }
}

#[async_trait]
impl StatsSource for HttpSource {
    async fn list(&self, query: &QueryParams) -> Result<ListResponse> {
        let page: ListResponse = self.get_json(query.url(&self.base_url)).await?;
        debug!(
            "Fetched {} project stat(s) of {}",
            page.records.len(),
            page.total_count()
        );
        Ok(page)
    }

    async fn history(&self, project_id: ProjectId) -> Result<Vec<HistoryEntry>> {
        let url = join_path(&self.base_url, &history_path(project_id));
        let history: Vec<HistoryEntry> = self.get_json(url).await?;
        debug!("Fetched {} history entries for project {}", history.len(), project_id);
        Ok(history)
    }
}
