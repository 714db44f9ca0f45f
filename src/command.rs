//! User intents typed at the prompt.

use std::str::FromStr;

use tally_core::{Direction, ProjectId};

use crate::error::Result;
use crate::pagination::Transition;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Home,
    List,
    Next,
    Prev,
    Limit(u32),
    /// Empty term clears the search.
    Search(String),
    Open(ProjectId),
    Back,
    Retry,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Type a command, or `help`")]
    Empty,

    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("`{command}` expects {expected}")]
    BadArgument {
        command: &'static str,
        expected: &'static str,
    },
}

impl FromStr for Command {
    type Err = ParseError;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let line = line.trim();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };
        let command = match word.to_ascii_lowercase().as_str() {
            "" => return Err(ParseError::Empty),
            "home" => Command::Home,
            "list" | "ls" => Command::List,
            "next" | "n" => Command::Next,
            "prev" | "p" => Command::Prev,
            "limit" => Command::Limit(rest.parse().map_err(|_| ParseError::BadArgument {
                command: "limit",
                expected: "a page size (25, 50, 100 or 500)",
            })?),
            "search" | "s" => Command::Search(rest.to_string()),
            "open" | "o" => Command::Open(rest.parse().map_err(|_| ParseError::BadArgument {
                command: "open",
                expected: "a project id",
            })?),
            "back" | "b" => Command::Back,
            "retry" | "r" => Command::Retry,
            "help" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            other => return Err(ParseError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

impl Command {
    /// Forward the intent to `session`.
    ///
    /// Returns the pager outcome for pagination intents; `Help` and `Quit`
    /// are the caller's business and do nothing here.
    pub fn apply(&self, session: &mut Session) -> Result<Option<Transition>> {
        match self {
            Command::Home => session.go_home(),
            Command::List => session.open_list()?,
            Command::Next => return session.paginate(Direction::Asc).map(Some),
            Command::Prev => return session.paginate(Direction::Desc).map(Some),
            Command::Limit(n) => return session.set_limit(*n).map(Some),
            Command::Search(term) => return session.set_search(term).map(Some),
            Command::Open(id) => session.select_project(*id)?,
            Command::Back => session.go_back()?,
            Command::Retry => {
                session.retry();
            }
            Command::Help | Command::Quit => {}
        }
        Ok(None)
    }
}
