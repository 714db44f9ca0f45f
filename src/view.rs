//! In-memory view selector.

use tally_core::ProjectId;
use tracing::info;

use crate::error::{Error, Result};

/// Project id meaning "no project selected".
pub const NO_PROJECT: ProjectId = 0;

/// The screens of the browser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Home,
    List,
    Details(ProjectId),
}

impl View {
    /// Project the detail resource should be keyed on in this view.
    pub fn project_id(self) -> ProjectId {
        match self {
            View::Details(id) => id,
            View::Home | View::List => NO_PROJECT,
        }
    }
}

/// Holds the active view and allows only the browser's transitions.
#[derive(Debug, Default)]
pub struct Navigator {
    view: View,
}

impl Navigator {
    pub fn view(&self) -> View {
        self.view
    }

    /// Home -> List. Opening the list while on it is allowed and changes nothing.
    pub fn open_list(&mut self) -> Result<()> {
        match self.view {
            View::Home | View::List => self.go(View::List),
            View::Details(_) => Err(invalid(self.view, "open the list")),
        }
    }

    /// List -> Details, on row selection.
    pub fn select(&mut self, project_id: ProjectId) -> Result<()> {
        if project_id == NO_PROJECT {
            return Err(Error::InvalidStateTransition(
                "project id 0 cannot be selected".to_string(),
            ));
        }
        match self.view {
            View::List => self.go(View::Details(project_id)),
            _ => Err(invalid(self.view, "select a project")),
        }
    }

    /// Details -> List.
    pub fn back(&mut self) -> Result<()> {
        match self.view {
            View::Details(_) => self.go(View::List),
            _ => Err(invalid(self.view, "go back")),
        }
    }

    /// Any view -> Home.
    pub fn home(&mut self) {
        self.view = View::Home;
        info!("View: {:?}", self.view);
    }

    /// Pagination intents only make sense while the list is on screen.
    pub fn require_list(&self, intent: &str) -> Result<()> {
        match self.view {
            View::List => Ok(()),
            _ => Err(invalid(self.view, intent)),
        }
    }

    fn go(&mut self, view: View) -> Result<()> {
        if self.view != view {
            info!("View: {:?} -> {:?}", self.view, view);
            self.view = view;
        }
        Ok(())
    }
}

fn invalid(view: View, intent: &str) -> Error {
    Error::InvalidStateTransition(format!("cannot {} from {:?}", intent, view))
}
