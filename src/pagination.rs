//! Pagination state and the transitions user intents drive through it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tally_core::{Direction, Limit, ProjectId};
use tokio::sync::watch;
use tracing::debug;

use crate::derive::ListPage;
use crate::error::{Error, Result};
use crate::query::QueryParams;

/// Which paging scheme the catalog is browsed with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PagingMode {
    /// Page numbers with search support.
    #[default]
    Page,
    /// Boundary project id plus direction.
    Cursor,
}

impl fmt::Display for PagingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PagingMode::Page => f.write_str("page"),
            PagingMode::Cursor => f.write_str("cursor"),
        }
    }
}

impl FromStr for PagingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "page" => Ok(PagingMode::Page),
            "cursor" => Ok(PagingMode::Cursor),
            other => Err(Error::Config(format!(
                "unknown paging mode {other:?}, expected \"page\" or \"cursor\""
            ))),
        }
    }
}

/// Where in the catalog the session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Position {
    /// 1-indexed page number.
    Page(u32),
    /// Boundary project id (0 = start) and direction of travel.
    Cursor { id: ProjectId, direction: Direction },
}

impl Position {
    /// First position of a paging mode.
    pub fn start(mode: PagingMode) -> Self {
        match mode {
            PagingMode::Page => Position::Page(1),
            PagingMode::Cursor => Position::Cursor {
                id: 0,
                direction: Direction::Asc,
            },
        }
    }

    pub fn mode(&self) -> PagingMode {
        match self {
            Position::Page(_) => PagingMode::Page,
            Position::Cursor { .. } => PagingMode::Cursor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PaginationState {
    pub position: Position,
    pub limit: Limit,
    /// Trimmed, never empty.
    pub search_term: Option<String>,
}

impl PaginationState {
    pub fn new(mode: PagingMode, limit: Limit) -> Self {
        Self {
            position: Position::start(mode),
            limit,
            search_term: None,
        }
    }

    pub fn mode(&self) -> PagingMode {
        self.position.mode()
    }

    /// Current page number in page mode.
    pub fn page(&self) -> Option<u32> {
        match self.position {
            Position::Page(page) => Some(page),
            Position::Cursor { .. } => None,
        }
    }

    /// Records on earlier pages plus those on `current`.
    ///
    /// `current` must be the page fetched for this state; with none on
    /// screen nothing has been shown. Cursor paging has no notion of earlier
    /// pages, so only the records on screen count.
    pub fn records_shown_so_far(&self, current: Option<&ListPage>) -> u64 {
        let Some(current) = current else {
            return 0;
        };
        let on_screen = current.records.len() as u64;
        match self.position {
            Position::Page(page) => {
                u64::from(page.saturating_sub(1)) * u64::from(self.limit.get()) + on_screen
            }
            Position::Cursor { .. } => on_screen,
        }
    }

    fn reset_position(&mut self) {
        self.position = Position::start(self.mode());
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(PagingMode::default(), Limit::default())
    }
}

/// Outcome of an intent against the pager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The state changed; the catalog key changed with it.
    Changed,
    /// The intent asked for the state the pager is already in.
    Unchanged,
    /// No page exists in that direction.
    Boundary(Direction),
}

impl Transition {
    pub fn is_changed(self) -> bool {
        self == Transition::Changed
    }
}

/// Owner of the pagination state.
///
/// The state sits in a watch channel so observers see every change and
/// intents that would not change anything never notify.
#[derive(Debug)]
pub struct Pager {
    state: watch::Sender<PaginationState>,
}

impl Pager {
    pub fn new(initial: PaginationState) -> Self {
        let (state, _) = watch::channel(initial);
        Self { state }
    }

    pub fn state(&self) -> PaginationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PaginationState> {
        self.state.subscribe()
    }

    /// Catalog request for the current state.
    pub fn query(&self) -> QueryParams {
        QueryParams::from_state(&self.state.borrow())
    }

    pub fn records_shown_so_far(&self, current: Option<&ListPage>) -> u64 {
        self.state.borrow().records_shown_so_far(current)
    }

    /// Switch page size. A new size returns to the first page or cursor start.
    pub fn set_limit(&self, n: u32) -> Result<Transition> {
        let limit = Limit::try_from(n)?;
        let changed = self.state.send_if_modified(|state| {
            if state.limit == limit {
                return false;
            }
            state.limit = limit;
            state.reset_position();
            true
        });
        debug!(%limit, changed, "set limit");
        Ok(transition(changed))
    }

    /// Search by project name. Blank terms clear the search.
    pub fn set_search(&self, term: &str) -> Transition {
        let term = Some(term.trim()).filter(|t| !t.is_empty()).map(String::from);
        let changed = self.state.send_if_modified(|state| {
            if state.search_term == term {
                return false;
            }
            state.search_term = term.clone();
            state.reset_position();
            true
        });
        debug!(term = ?term, changed, "set search");
        transition(changed)
    }

    /// Move one page in `direction`, based on the page currently on screen.
    ///
    /// `current` is `None` while nothing fresh is on screen; there is nothing
    /// to navigate from then, except back to an earlier page number.
    pub fn paginate(&self, direction: Direction, current: Option<&ListPage>) -> Transition {
        let state = self.state();
        let next = match state.position {
            Position::Page(page) => match direction {
                Direction::Asc => {
                    let Some(current) = current else {
                        return Transition::Boundary(direction);
                    };
                    if state.records_shown_so_far(Some(current)) >= current.total_count {
                        return Transition::Boundary(direction);
                    }
                    Position::Page(page + 1)
                }
                Direction::Desc if page > 1 => Position::Page(page - 1),
                Direction::Desc => return Transition::Boundary(direction),
            },
            Position::Cursor { .. } => {
                let bound = match direction {
                    Direction::Asc => current.and_then(ListPage::max_project_id),
                    Direction::Desc => current.and_then(ListPage::min_project_id),
                };
                // Nothing on screen means nothing to step past.
                let Some(bound) = bound else {
                    return Transition::Boundary(direction);
                };
                let id = match direction {
                    Direction::Asc => bound,
                    Direction::Desc => desc_cursor(bound, state.limit),
                };
                Position::Cursor { id, direction }
            }
        };

        let changed = self.state.send_if_modified(|state| {
            if state.position == next {
                return false;
            }
            state.position = next;
            true
        });
        debug!(?direction, position = ?next, changed, "paginate");
        transition(changed)
    }
}

/// Boundary id for a backwards cursor step.
///
/// The smallest id on screen is floored at the page size. This mixes a count
/// with an id; kept as observed against the catalog API until real id
/// distributions say otherwise.
fn desc_cursor(min_id: ProjectId, limit: Limit) -> ProjectId {
    min_id.max(ProjectId::from(limit.get()))
}

fn transition(changed: bool) -> Transition {
    if changed {
        Transition::Changed
    } else {
        Transition::Unchanged
    }
}

#[cfg(test)]
mod tests {
    use tally_core::{ListMeta, ListResponse, ProjectStat};

    use super::*;

    fn stat(project_id: ProjectId) -> ProjectStat {
        ProjectStat {
            project_id,
            name: format!("project-{project_id}"),
            url: String::new(),
            code_lines: 100,
            unsafe_lines: 1,
            created_at: None,
            updated_at: None,
        }
    }

    fn listing(ids: impl IntoIterator<Item = ProjectId>, total: u64) -> ListPage {
        ListPage::from_response(ListResponse {
            records: ids.into_iter().map(stat).collect(),
            meta: ListMeta { total },
        })
    }

    #[test]
    fn defaults_match_first_page() {
        let state = PaginationState::default();
        assert_eq!(state.position, Position::Page(1));
        assert_eq!(state.limit.get(), 25);
        assert_eq!(state.search_term, None);
    }

    #[test]
    fn walks_to_the_last_page_and_stops() {
        let pager = Pager::new(PaginationState::default());

        let first = listing(1..=25, 30);
        assert_eq!(pager.records_shown_so_far(Some(&first)), 25);
        assert_eq!(pager.paginate(Direction::Asc, Some(&first)), Transition::Changed);
        assert_eq!(pager.state().page(), Some(2));

        let second = listing(26..=30, 30);
        assert_eq!(pager.records_shown_so_far(Some(&second)), 30);
        assert_eq!(
            pager.paginate(Direction::Asc, Some(&second)),
            Transition::Boundary(Direction::Asc)
        );
        assert_eq!(pager.state().page(), Some(2));
    }

    #[test]
    fn cannot_go_before_the_first_page() {
        let pager = Pager::new(PaginationState::default());
        let first = listing(1..=25, 30);
        assert_eq!(
            pager.paginate(Direction::Desc, Some(&first)),
            Transition::Boundary(Direction::Desc)
        );
    }

    #[test]
    fn going_back_does_not_need_page_data() {
        let pager = Pager::new(PaginationState {
            position: Position::Page(3),
            ..PaginationState::default()
        });
        assert_eq!(pager.paginate(Direction::Desc, None), Transition::Changed);
        assert_eq!(pager.state().page(), Some(2));
        assert_eq!(
            pager.paginate(Direction::Asc, None),
            Transition::Boundary(Direction::Asc)
        );
    }

    #[test]
    fn rejects_limits_outside_the_menu() {
        let pager = Pager::new(PaginationState::default());
        let watcher = pager.subscribe();

        let err = pager.set_limit(30).unwrap_err();
        assert!(matches!(err, Error::InvalidStateTransition(_)));
        assert_eq!(pager.state(), PaginationState::default());
        assert!(!watcher.has_changed().unwrap());
    }

    #[test]
    fn new_limit_resets_to_first_page() {
        let pager = Pager::new(PaginationState {
            position: Position::Page(4),
            search_term: Some("tokio".into()),
            ..PaginationState::default()
        });
        assert_eq!(pager.set_limit(100), Ok(Transition::Changed));
        let state = pager.state();
        assert_eq!(state.position, Position::Page(1));
        assert_eq!(state.limit.get(), 100);
        assert_eq!(state.search_term.as_deref(), Some("tokio"));
        assert_eq!(pager.set_limit(100), Ok(Transition::Unchanged));
    }

    #[test]
    fn repeated_search_is_a_no_op() {
        let pager = Pager::new(PaginationState {
            position: Position::Page(2),
            ..PaginationState::default()
        });
        let mut watcher = pager.subscribe();

        assert_eq!(pager.set_search("serde"), Transition::Changed);
        assert!(watcher.has_changed().unwrap());
        watcher.borrow_and_update();

        assert_eq!(pager.set_search("  serde "), Transition::Unchanged);
        assert!(!watcher.has_changed().unwrap());
        assert_eq!(pager.state().position, Position::Page(1));
    }

    #[test]
    fn blank_search_clears_the_term() {
        let pager = Pager::new(PaginationState::default());
        pager.set_search("rand");
        assert_eq!(pager.set_search("   "), Transition::Changed);
        assert_eq!(pager.state().search_term, None);
        assert_eq!(pager.set_search(""), Transition::Unchanged);
    }

    #[test]
    fn cursor_steps_use_id_bounds() {
        let pager = Pager::new(PaginationState::new(PagingMode::Cursor, Limit::default()));
        let shown = listing([40, 31, 57, 33], 100);

        assert_eq!(pager.paginate(Direction::Asc, Some(&shown)), Transition::Changed);
        assert_eq!(
            pager.state().position,
            Position::Cursor {
                id: 57,
                direction: Direction::Asc
            }
        );

        assert_eq!(pager.paginate(Direction::Desc, Some(&shown)), Transition::Changed);
        assert_eq!(
            pager.state().position,
            Position::Cursor {
                id: 31,
                direction: Direction::Desc
            }
        );
        assert_eq!(pager.paginate(Direction::Desc, Some(&shown)), Transition::Unchanged);
    }

    #[test]
    fn backwards_cursor_is_floored_at_limit() {
        let pager = Pager::new(PaginationState::new(PagingMode::Cursor, Limit::default()));
        let shown = listing(3..=10, 100);
        pager.paginate(Direction::Desc, Some(&shown));
        assert_eq!(
            pager.state().position,
            Position::Cursor {
                id: 25,
                direction: Direction::Desc
            }
        );
    }

    #[test]
    fn empty_cursor_page_is_a_boundary_both_ways() {
        let at = Position::Cursor {
            id: 30,
            direction: Direction::Asc,
        };
        let pager = Pager::new(PaginationState {
            position: at,
            ..PaginationState::new(PagingMode::Cursor, Limit::default())
        });
        let empty = listing([], 30);

        assert_eq!(
            pager.paginate(Direction::Asc, Some(&empty)),
            Transition::Boundary(Direction::Asc)
        );
        assert_eq!(
            pager.paginate(Direction::Desc, Some(&empty)),
            Transition::Boundary(Direction::Desc)
        );
        assert_eq!(pager.state().position, at);
    }

    #[test]
    fn nothing_on_screen_counts_as_nothing_shown() {
        let state = PaginationState {
            position: Position::Page(2),
            ..PaginationState::default()
        };
        assert_eq!(state.records_shown_so_far(None), 0);
        assert_eq!(state.records_shown_so_far(Some(&listing(26..=30, 30))), 30);
    }

    #[test]
    fn cursor_search_clears_bounds() {
        let pager = Pager::new(PaginationState {
            position: Position::Cursor {
                id: 80,
                direction: Direction::Desc,
            },
            ..PaginationState::new(PagingMode::Cursor, Limit::default())
        });
        pager.set_search("hyper");
        assert_eq!(pager.state().position, Position::start(PagingMode::Cursor));
    }

    #[test]
    fn paging_mode_parses_case_insensitively() {
        assert_eq!("Cursor".parse::<PagingMode>().unwrap(), PagingMode::Cursor);
        assert!("offset".parse::<PagingMode>().is_err());
    }
}
