//! Request descriptors for the catalog endpoints.

use std::fmt;

use reqwest::Url;
use tally_core::ProjectId;

use crate::pagination::{PaginationState, Position};

/// Path of the catalog listing, relative to the configured base URL.
pub const LIST_PATH: &str = "/project-stats";

/// Path of one project's history, relative to the configured base URL.
pub fn history_path(project_id: ProjectId) -> String {
    format!("{}/{}", LIST_PATH, project_id)
}

/// A catalog request: path plus ordered query parameters.
///
/// This is the key of the list resource, so equality is structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryParams {
    path: &'static str,
    params: Vec<(&'static str, String)>,
}

impl QueryParams {
    /// Build the request for a pagination state.
    ///
    /// Page mode emits `page`, `limit` and `name` (only for a non-empty search
    /// term). Cursor mode emits `id`, `limit` and `direction`.
    pub fn from_state(state: &PaginationState) -> Self {
        let limit = state.limit.to_string();
        let params = match state.position {
            Position::Page(page) => {
                let mut params = vec![("page", page.to_string()), ("limit", limit)];
                if let Some(term) = state.search_term.as_deref().filter(|t| !t.is_empty()) {
                    params.push(("name", term.to_string()));
                }
                params
            }
            Position::Cursor { id, direction } => vec![
                ("id", id.to_string()),
                ("limit", limit),
                ("direction", direction.to_string()),
            ],
        };
        Self {
            path: LIST_PATH,
            params,
        }
    }

    pub fn path(&self) -> &str {
        self.path
    }

    pub fn params(&self) -> &[(&'static str, String)] {
        &self.params
    }

    /// Value of the first parameter called `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Absolute URL of this request under `base`.
    ///
    /// The path is appended to whatever path `base` already has, so a base of
    /// `http://host/api/v1` yields `http://host/api/v1/project-stats?...`.
    pub fn url(&self, base: &Url) -> Url {
        let mut url = join_path(base, self.path);
        let query = self.query_string();
        url.set_query(Some(&query).filter(|q| !q.is_empty()).map(String::as_str));
        url
    }

    /// Percent-encoded `key=value` pairs joined by `&`, without the `?`.
    pub fn query_string(&self) -> String {
        self.params
            .iter()
            .map(|(key, value)| format!("{}={}", key, encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl fmt::Display for QueryParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path)?;
        if !self.params.is_empty() {
            write!(f, "?{}", self.query_string())?;
        }
        Ok(())
    }
}

/// `base` with `path` appended to its path and no query.
pub(crate) fn join_path(base: &Url, path: &str) -> Url {
    let mut url = base.clone();
    let joined = format!("{}{}", base.path().trim_end_matches('/'), path);
    url.set_path(&joined);
    url.set_query(None);
    url
}

/// Percent-encode everything outside the RFC 3986 unreserved set.
fn encode(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(byte as char)
            }
            _ => result.push_str(&format!("%{:02X}", byte)),
        }
    }
    result
}
