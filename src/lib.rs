//! Browsing session for the project unsafe-usage catalog.
//!
//! A [`Session`] turns user intents (page size, search, next/previous page,
//! row selection, back) into catalog requests, caches the responses by
//! request, and hands out derived, display-ready snapshots.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use tally::{HttpSource, PaginationState, Session};
//!
//! # async fn example() -> tally::Result<()> {
//! let source = HttpSource::new("http://localhost:8000/api/v1".parse().unwrap());
//! let mut session = Session::new(Arc::new(source), PaginationState::default());
//!
//! session.open_list()?;
//! session.settled().await;
//! for row in session.list_snapshot().records() {
//!     println!("{} {}", row.stat.name, row.percentage);
//! }
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod config;
pub mod derive;
pub mod error;
pub mod pagination;
pub mod query;
pub mod render;
pub mod resource;
pub mod session;
pub mod source;
pub mod view;

pub use config::Config;
pub use derive::{ChartPoint, ListPage, ProjectHistory, ProjectName, StatRow};
pub use error::{Error, Result};
pub use pagination::{Pager, PaginationState, PagingMode, Position, Transition};
pub use query::QueryParams;
pub use resource::{Resource, Snapshot};
pub use session::{DetailSnapshot, ListSnapshot, Session};
pub use source::{HttpSource, StatsSource};
pub use tally_core::{Direction, HistoryEntry, Limit, ListResponse, ProjectId, ProjectStat};
pub use view::View;
