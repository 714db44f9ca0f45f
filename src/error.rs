use tally_core::ProjectId;

/// Errors surfaced by the session, its resources and the data source.
///
/// Cloneable so resource snapshots can hand the same error to every reader.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("No cached name for project {0}")]
    UnresolvedName(ProjectId),

    #[error("Not enough data to chart: {points} point(s)")]
    InsufficientChartData { points: usize },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the error only degrades the display instead of failing a view.
    pub fn is_cosmetic(&self) -> bool {
        matches!(
            self,
            Error::UnresolvedName(_) | Error::InsufficientChartData { .. }
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::MalformedResponse(e.to_string())
        } else {
            Error::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::MalformedResponse(e.to_string())
    }
}

impl From<tally_core::InvalidLimit> for Error {
    fn from(e: tally_core::InvalidLimit) -> Self {
        Error::InvalidStateTransition(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
