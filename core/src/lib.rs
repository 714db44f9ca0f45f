//! Wire types for the tally project-stats API.
//!
//! This crate provides the shared data types used by the tally session
//! library and by any client that talks to the project-stats API directly.
//!
//! # Overview
//!
//! The main types are:
//!
//! - [`ListResponse`] - One page of the project catalog plus its total
//! - [`ProjectStat`] - The latest analysis of a single project
//! - [`HistoryEntry`] - One historical analysis of a project
//! - [`Limit`] - The allowed page sizes
//! - [`Direction`] - Cursor direction for id-based paging
//!
//! # Example
//!
//! Fetching the first page of the catalog:
//!
//! ```ignore
//! use tally_core::{HistoryEntry, ListResponse};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = reqwest::Client::new();
//!
//! let page: ListResponse = client
//!     .get("http://localhost:8000/api/v1/project-stats?page=1&limit=25")
//!     .send()
//!     .await?
//!     .json()
//!     .await?;
//!
//! for stat in &page.records {
//!     println!("{}: {} unsafe of {}", stat.name, stat.unsafe_lines, stat.code_lines);
//! }
//!
//! let history: Vec<HistoryEntry> = client
//!     .get("http://localhost:8000/api/v1/project-stats/1")
//!     .send()
//!     .await?
//!     .json()
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// Identifier of an analyzed project. `0` is never a real project.
pub type ProjectId = u64;

/// Page sizes accepted by the catalog.
///
/// # Example
///
/// ```
/// use tally_core::Limit;
///
/// assert_eq!(Limit::default().get(), 25);
/// assert!(Limit::new(50).is_some());
/// assert!(Limit::new(30).is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Limit(u32);

impl Limit {
    /// Every page size the catalog offers, smallest first.
    pub const ALLOWED: [u32; 4] = [25, 50, 100, 500];

    /// Returns `None` when `n` is not one of [`Limit::ALLOWED`].
    pub fn new(n: u32) -> Option<Self> {
        Self::ALLOWED.contains(&n).then_some(Self(n))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Limit {
    fn default() -> Self {
        Self(Self::ALLOWED[0])
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Limit> for u32 {
    fn from(limit: Limit) -> Self {
        limit.0
    }
}

impl TryFrom<u32> for Limit {
    type Error = InvalidLimit;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        Self::new(n).ok_or(InvalidLimit(n))
    }
}

/// A page size outside [`Limit::ALLOWED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidLimit(pub u32);

impl fmt::Display for InvalidLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "limit {} is not one of {:?}", self.0, Limit::ALLOWED)
    }
}

impl std::error::Error for InvalidLimit {}

/// Direction of travel for id-cursor paging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The latest analysis of a project, as listed by `/project-stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectStat {
    pub project_id: ProjectId,
    pub name: String,
    /// Repository URL of the project.
    #[serde(default)]
    pub url: String,
    pub code_lines: u64,
    pub unsafe_lines: u64,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<Timestamp>,
}

/// One historical analysis of a project, as returned by
/// `/project-stats/{id}` (newest first).
///
/// History entries carry no name or URL; those come from the catalog listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub project_id: ProjectId,
    pub code_lines: u64,
    pub unsafe_lines: u64,
    #[serde(default, with = "timestamp")]
    pub created_at: Option<Timestamp>,
    #[serde(default, with = "timestamp")]
    pub updated_at: Option<Timestamp>,
}

/// Pagination metadata of a catalog page.
///
/// Reads both `{"total": n}` and the bare number some servers emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MetaRepr")]
pub struct ListMeta {
    /// Number of projects matching the query across all pages.
    pub total: u64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MetaRepr {
    Object { total: u64 },
    Bare(u64),
}

impl From<MetaRepr> for ListMeta {
    fn from(repr: MetaRepr) -> Self {
        match repr {
            MetaRepr::Object { total } | MetaRepr::Bare(total) => Self { total },
        }
    }
}

/// One page of the project catalog.
///
/// The records field is written as `projectStats`; the older
/// `project_stats` spelling is accepted when reading.
///
/// # Example
///
/// ```
/// use tally_core::ListResponse;
///
/// let page: ListResponse = serde_json::from_str(
///     r#"{"projectStats": [], "meta": {"total": 0}}"#,
/// ).unwrap();
///
/// assert!(page.records.is_empty());
/// assert_eq!(page.total_count(), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListResponse {
    #[serde(rename = "projectStats", alias = "project_stats")]
    pub records: Vec<ProjectStat>,
    pub meta: ListMeta,
}

impl ListResponse {
    pub fn total_count(&self) -> u64 {
        self.meta.total
    }
}

/// Lenient timestamps: RFC 3339, a space instead of `T`, or a civil
/// datetime read as UTC. Empty strings, `null` and anything unparseable
/// mean unknown.
mod timestamp {
    use jiff::civil::DateTime;
    use jiff::tz::TimeZone;
    use jiff::Timestamp;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Timestamp>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => s.serialize_str(&ts.to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Timestamp>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => Ok(parse(s).ok()),
        }
    }

    pub(crate) fn parse(s: &str) -> Result<Timestamp, jiff::Error> {
        s.parse::<Timestamp>().or_else(|_| {
            let s = s.replacen(' ', "T", 1);
            s.parse::<Timestamp>().or_else(|_| {
                s.parse::<DateTime>()
                    .and_then(|dt| dt.to_zoned(TimeZone::UTC))
                    .map(|zoned| zoned.timestamp())
            })
        })
    }
}
