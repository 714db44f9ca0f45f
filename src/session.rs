//! The browsing session: one owner for the pager, the view and both resources.

use std::sync::Arc;

use tally_core::{Direction, ProjectId};
use tokio::sync::watch;
use tracing::info;

use crate::config::Config;
use crate::derive::{ListPage, ProjectHistory, StatRow};
use crate::error::{Error, Result};
use crate::pagination::{Pager, PaginationState, Transition};
use crate::query::QueryParams;
use crate::resource::Resource;
use crate::source::{HttpSource, StatsSource};
use crate::view::{Navigator, View, NO_PROJECT};

/// What the list view renders.
#[derive(Debug, Clone)]
pub struct ListSnapshot {
    pub page: Option<Arc<ListPage>>,
    pub loading: bool,
    /// `page` belongs to an earlier query.
    pub stale: bool,
    pub error: Option<Error>,
    pub records_shown_so_far: u64,
    pub pagination: PaginationState,
}

impl ListSnapshot {
    /// The page fetched for the current pagination state, if it has arrived.
    pub fn fresh(&self) -> Option<&ListPage> {
        if self.stale {
            None
        } else {
            self.page.as_deref()
        }
    }

    pub fn records(&self) -> &[StatRow] {
        self.fresh()
            .map(|page| page.records.as_slice())
            .unwrap_or_default()
    }

    pub fn total_count(&self) -> u64 {
        self.fresh().map_or(0, |page| page.total_count)
    }
}

/// What the detail view renders.
#[derive(Debug, Clone)]
pub struct DetailSnapshot {
    pub project_id: ProjectId,
    pub history: Option<Arc<ProjectHistory>>,
    pub loading: bool,
    pub error: Option<Error>,
}

/// A browsing session.
///
/// Intents are plain synchronous calls; any fetch they cause runs on the
/// tokio runtime they are called from. Snapshots are cheap to take and never
/// block on the network.
pub struct Session {
    pager: Pager,
    navigator: Navigator,
    list: Resource<QueryParams, ListPage>,
    detail: Resource<ProjectId, ProjectHistory>,
}

impl Session {
    pub fn new(source: Arc<dyn StatsSource>, initial: PaginationState) -> Self {
        let list = {
            let source = Arc::clone(&source);
            Resource::new("list", move |query: QueryParams| {
                let source = Arc::clone(&source);
                async move { source.list(&query).await.map(ListPage::from_response) }
            })
        };

        // Names for the detail view come from whatever catalog page was last seen.
        let detail = {
            let list = list.clone();
            Resource::new("detail", move |project_id: ProjectId| {
                let source = Arc::clone(&source);
                let list = list.clone();
                async move {
                    let entries = source.history(project_id).await?;
                    let listing = list.snapshot().value;
                    Ok(ProjectHistory::derive(project_id, entries, listing.as_deref()))
                }
            })
            .with_short_circuit(|project_id: &ProjectId| {
                (*project_id == NO_PROJECT).then(|| ProjectHistory::empty(NO_PROJECT))
            })
        };

        Self {
            pager: Pager::new(initial),
            navigator: Navigator::default(),
            list,
            detail,
        }
    }

    /// Session against the HTTP API named by `config`.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config.base_url()?;
        info!("Using project-stats API at {}", base_url);
        let source = match config.timeout() {
            Some(timeout) => HttpSource::with_timeout(base_url, timeout)?,
            None => HttpSource::new(base_url),
        };
        Ok(Self::new(Arc::new(source), config.initial_state()))
    }

    pub fn view(&self) -> View {
        self.navigator.view()
    }

    pub fn pagination(&self) -> PaginationState {
        self.pager.state()
    }

    /// Observe pagination changes.
    pub fn subscribe_pagination(&self) -> watch::Receiver<PaginationState> {
        self.pager.subscribe()
    }

    /// Observe list resource changes.
    pub fn subscribe_list(&self) -> watch::Receiver<u64> {
        self.list.subscribe()
    }

    /// Observe detail resource changes.
    pub fn subscribe_detail(&self) -> watch::Receiver<u64> {
        self.detail.subscribe()
    }

    pub fn list_snapshot(&self) -> ListSnapshot {
        let snapshot = self.list.snapshot();
        let pagination = self.pager.state();
        ListSnapshot {
            records_shown_so_far: pagination.records_shown_so_far(snapshot.fresh()),
            page: snapshot.value,
            loading: snapshot.loading,
            stale: snapshot.stale,
            error: snapshot.error,
            pagination,
        }
    }

    pub fn detail_snapshot(&self) -> DetailSnapshot {
        let snapshot = self.detail.snapshot();
        DetailSnapshot {
            project_id: self.detail.key().unwrap_or(NO_PROJECT),
            history: if snapshot.stale { None } else { snapshot.value },
            loading: snapshot.loading,
            error: snapshot.error,
        }
    }

    /// Home -> List. Fetches the catalog the first time only.
    pub fn open_list(&mut self) -> Result<()> {
        self.navigator.open_list()?;
        self.sync_list();
        Ok(())
    }

    /// Any view -> Home.
    pub fn go_home(&mut self) {
        self.navigator.home();
        self.detail.load(NO_PROJECT);
    }

    pub fn set_limit(&mut self, n: u32) -> Result<Transition> {
        self.navigator.require_list("change the page size")?;
        let transition = self.pager.set_limit(n)?;
        self.sync_list();
        Ok(transition)
    }

    pub fn set_search(&mut self, term: &str) -> Result<Transition> {
        self.navigator.require_list("search")?;
        let transition = self.pager.set_search(term);
        self.sync_list();
        Ok(transition)
    }

    pub fn paginate(&mut self, direction: Direction) -> Result<Transition> {
        self.navigator.require_list("paginate")?;
        let snapshot = self.list.snapshot();
        let transition = self.pager.paginate(direction, snapshot.fresh());
        self.sync_list();
        Ok(transition)
    }

    /// List -> Details for the selected row.
    pub fn select_project(&mut self, project_id: ProjectId) -> Result<()> {
        self.navigator.select(project_id)?;
        self.detail.load(project_id);
        Ok(())
    }

    /// Details -> List. The detail resource drops back to "no project".
    pub fn go_back(&mut self) -> Result<()> {
        self.navigator.back()?;
        self.detail.load(NO_PROJECT);
        Ok(())
    }

    /// Fetch what the current view shows again.
    pub fn retry(&mut self) -> bool {
        match self.navigator.view() {
            View::Home => false,
            View::List => self.list.reload(),
            View::Details(_) => self.detail.reload(),
        }
    }

    /// Wait until neither resource has a fetch in flight.
    pub async fn settled(&self) {
        self.list.settled().await;
        self.detail.settled().await;
    }

    fn sync_list(&self) {
        self.list.load(self.pager.query());
    }
}
