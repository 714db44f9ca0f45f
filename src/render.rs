//! Plain-text rendering of session snapshots.

use std::fmt::Write;

use jiff::Timestamp;
use tally_core::Direction;

use crate::error::Error;
use crate::pagination::{Position, Transition};
use crate::session::{DetailSnapshot, ListSnapshot, Session};
use crate::view::View;

pub const HELP: &str = "\
Commands:
  list              show the project catalog
  next | prev       move one page forward or back
  limit N           page size: 25, 50, 100 or 500
  search [TERM]     filter by project name (no term clears)
  open ID           show the history of project ID
  back              return to the catalog
  retry             fetch the current view again
  home              about this tool
  quit";

/// Render whatever the session's current view shows.
pub fn screen(session: &Session) -> String {
    match session.view() {
        View::Home => home(),
        View::List => list(&session.list_snapshot()),
        View::Details(_) => detail(&session.detail_snapshot()),
    }
}

pub fn home() -> String {
    "Unsafe usage in Rust projects\n\n\
     Lines of code and lines using `unsafe`, per analyzed project and over time.\n\
     Type `list` to browse the catalog or `help` for all commands.\n"
        .to_string()
}

pub fn list(snapshot: &ListSnapshot) -> String {
    let mut out = String::new();
    let state = &snapshot.pagination;

    let _ = write!(out, "Current projects stats (limit {}", state.limit);
    match state.position {
        Position::Page(page) => {
            let _ = write!(out, ", page {}", page);
        }
        Position::Cursor { id, direction } => {
            let _ = write!(out, ", from id {} {}", id, direction);
        }
    }
    if let Some(term) = &state.search_term {
        let _ = write!(out, ", search {:?}", term);
    }
    out.push_str(")\n\n");

    let _ = writeln!(
        out,
        "{:>6}  {:<28} {:>10} {:>8} {:>9}  {:<16}  {:<16}",
        "ID", "NAME", "CODE", "UNSAFE", "RATIO", "CREATED", "UPDATED"
    );
    for row in snapshot.records() {
        let stat = &row.stat;
        let _ = writeln!(
            out,
            "{:>6}  {:<28} {:>10} {:>8} {:>9}  {:<16}  {:<16}",
            stat.project_id,
            truncate(&stat.name, 28),
            stat.code_lines,
            stat.unsafe_lines,
            row.percentage,
            when(stat.created_at),
            when(stat.updated_at),
        );
    }

    let _ = writeln!(
        out,
        "\nShowing {} of {} Entries",
        snapshot.records_shown_so_far,
        snapshot.total_count()
    );
    status(&mut out, snapshot.loading, snapshot.error.as_ref());
    out
}

pub fn detail(snapshot: &DetailSnapshot) -> String {
    let mut out = String::new();

    let Some(history) = snapshot.history.as_deref() else {
        status(&mut out, snapshot.loading, snapshot.error.as_ref());
        return out;
    };

    let _ = writeln!(out, "Project details: {}", history.name);
    if let Some(url) = history.rows.iter().find_map(|row| row.url.as_deref()) {
        let _ = writeln!(out, "{}", url);
    }
    if let Some(e) = history.name_error() {
        let _ = writeln!(out, "note: {}", e);
    }
    out.push('\n');

    let _ = writeln!(
        out,
        "{:<28} {:>10} {:>8}  {:<16}  {:<16}",
        "NAME", "CODE", "UNSAFE", "CREATED", "UPDATED"
    );
    for row in &history.rows {
        let _ = writeln!(
            out,
            "{:<28} {:>10} {:>8}  {:<16}  {:<16}",
            truncate(&row.name.to_string(), 28),
            row.entry.code_lines,
            row.entry.unsafe_lines,
            when(row.entry.created_at),
            when(row.entry.updated_at),
        );
    }

    out.push('\n');
    match &history.chart {
        Ok(points) => {
            out.push_str("Unsafe lines over time:\n");
            for point in points {
                let _ = writeln!(
                    out,
                    "  {}  {}",
                    when(Some(point.timestamp)),
                    point.unsafe_lines
                );
            }
        }
        Err(e) => {
            let _ = writeln!(out, "Chart omitted: {}", e);
        }
    }

    status(&mut out, snapshot.loading, snapshot.error.as_ref());
    out
}

/// A line explaining a pagination outcome, if it needs one.
pub fn transition(transition: Transition) -> Option<&'static str> {
    match transition {
        Transition::Changed | Transition::Unchanged => None,
        Transition::Boundary(Direction::Asc) => Some("Already on the last page."),
        Transition::Boundary(Direction::Desc) => Some("Already on the first page."),
    }
}

fn status(out: &mut String, loading: bool, error: Option<&Error>) {
    if loading {
        out.push_str("Loading...\n");
    }
    if let Some(e) = error {
        let _ = writeln!(out, "{} (type `retry` to try again)", e);
    }
}

fn when(timestamp: Option<Timestamp>) -> String {
    timestamp
        .map(|ts| ts.strftime("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut cut: String = s.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tally_core::{HistoryEntry, ListMeta, ListResponse, ProjectStat};

    use super::*;
    use crate::derive::{ListPage, ProjectHistory};
    use crate::pagination::PaginationState;

    fn page() -> ListPage {
        ListPage::from_response(ListResponse {
            records: vec![ProjectStat {
                project_id: 1,
                name: "bytes".into(),
                url: "https://github.com/tokio-rs/bytes".into(),
                code_lines: 200,
                unsafe_lines: 10,
                created_at: Some("2023-01-02T03:04:05Z".parse().unwrap()),
                updated_at: None,
            }],
            meta: ListMeta { total: 30 },
        })
    }

    #[test]
    fn list_shows_rows_and_counts() {
        let snapshot = ListSnapshot {
            page: Some(Arc::new(page())),
            loading: false,
            stale: false,
            error: None,
            records_shown_so_far: 1,
            pagination: PaginationState::default(),
        };
        let text = list(&snapshot);
        assert!(text.contains("bytes"));
        assert!(text.contains("0.050%"));
        assert!(text.contains("2023-01-02 03:04"));
        assert!(text.contains("Showing 1 of 30 Entries"));
        assert!(!text.contains("Loading"));
    }

    #[test]
    fn list_reports_errors_with_recovery_hint() {
        let snapshot = ListSnapshot {
            page: None,
            loading: false,
            stale: false,
            error: Some(Error::Network("connection refused".into())),
            records_shown_so_far: 0,
            pagination: PaginationState::default(),
        };
        let text = list(&snapshot);
        assert!(text.contains("Showing 0 of 0 Entries"));
        assert!(text.contains("connection refused"));
        assert!(text.contains("retry"));
    }

    #[test]
    fn detail_with_placeholder_name_and_no_chart() {
        let history = ProjectHistory::derive(
            5,
            vec![HistoryEntry {
                project_id: 5,
                code_lines: 10,
                unsafe_lines: 1,
                created_at: None,
                updated_at: None,
            }],
            None,
        );
        let snapshot = DetailSnapshot {
            project_id: 5,
            history: Some(Arc::new(history)),
            loading: false,
            error: None,
        };
        let text = detail(&snapshot);
        assert!(text.contains("Project details: (unknown project)"));
        assert!(text.contains("No cached name for project 5"));
        assert!(text.contains("Chart omitted"));
    }

    #[test]
    fn boundaries_get_a_message() {
        assert!(transition(Transition::Boundary(Direction::Asc)).is_some());
        assert_eq!(transition(Transition::Changed), None);
    }

    #[test]
    fn long_names_are_cut() {
        assert_eq!(truncate("abcdef", 5), "ab...");
        assert!(truncate(&"x".repeat(40), 28).is_ascii());
        assert_eq!(truncate("abc", 4), "abc");
    }
}
