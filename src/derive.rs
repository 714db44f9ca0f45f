//! Display-ready records derived from raw API payloads.

use std::fmt;

use jiff::Timestamp;
use tally_core::{HistoryEntry, ListResponse, ProjectId, ProjectStat};

use crate::error::{Error, Result};

/// Share of code lines that use `unsafe`. Zero when either count is zero.
pub fn ratio(unsafe_lines: u64, code_lines: u64) -> f64 {
    if unsafe_lines == 0 || code_lines == 0 {
        return 0.0;
    }
    unsafe_lines as f64 / code_lines as f64
}

/// Ratio with three decimals and a percent sign, e.g. `0.050%`.
pub fn percentage(ratio: f64) -> String {
    format!("{:.3}%", ratio)
}

/// A catalog record with its ratio worked out.
#[derive(Debug, Clone, PartialEq)]
pub struct StatRow {
    pub stat: ProjectStat,
    pub ratio: f64,
    pub percentage: String,
}

impl From<ProjectStat> for StatRow {
    fn from(stat: ProjectStat) -> Self {
        let ratio = ratio(stat.unsafe_lines, stat.code_lines);
        Self {
            percentage: percentage(ratio),
            ratio,
            stat,
        }
    }
}

/// One derived catalog page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListPage {
    pub records: Vec<StatRow>,
    pub total_count: u64,
}

impl ListPage {
    pub fn from_response(response: ListResponse) -> Self {
        let total_count = response.total_count();
        Self {
            records: response.records.into_iter().map(StatRow::from).collect(),
            total_count,
        }
    }

    pub fn find(&self, project_id: ProjectId) -> Option<&StatRow> {
        self.records.iter().find(|row| row.stat.project_id == project_id)
    }

    pub fn max_project_id(&self) -> Option<ProjectId> {
        self.records.iter().map(|row| row.stat.project_id).max()
    }

    pub fn min_project_id(&self) -> Option<ProjectId> {
        self.records.iter().map(|row| row.stat.project_id).min()
    }
}

/// Display name of a project in the detail view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectName {
    Resolved(String),
    /// Not on the last catalog page seen.
    Unresolved,
}

impl ProjectName {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ProjectName::Resolved(_))
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectName::Resolved(name) => f.write_str(name),
            ProjectName::Unresolved => f.write_str("(unknown project)"),
        }
    }
}

/// A history entry with the name and URL borrowed from the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRow {
    pub entry: HistoryEntry,
    pub name: ProjectName,
    pub url: Option<String>,
}

/// One point of the unsafe-lines chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartPoint {
    pub timestamp: Timestamp,
    pub unsafe_lines: u64,
}

/// Chart points in chronological order.
///
/// The API lists history newest first. Entries without a timestamp cannot be
/// placed and are left out.
pub fn chart_series(entries: &[HistoryEntry]) -> Result<Vec<ChartPoint>> {
    let points: Vec<ChartPoint> = entries
        .iter()
        .rev()
        .filter_map(|entry| {
            entry.created_at.map(|timestamp| ChartPoint {
                timestamp,
                unsafe_lines: entry.unsafe_lines,
            })
        })
        .collect();
    if points.len() < 2 {
        return Err(Error::InsufficientChartData {
            points: points.len(),
        });
    }
    Ok(points)
}

/// Derived detail view of one project.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectHistory {
    pub project_id: ProjectId,
    pub name: ProjectName,
    pub rows: Vec<HistoryRow>,
    pub chart: Result<Vec<ChartPoint>>,
}

impl ProjectHistory {
    /// The "no project selected" history.
    pub fn empty(project_id: ProjectId) -> Self {
        Self {
            project_id,
            name: ProjectName::Unresolved,
            rows: Vec::new(),
            chart: Err(Error::InsufficientChartData { points: 0 }),
        }
    }

    /// Attach names from `listing` to `entries` and shape the chart.
    pub fn derive(
        project_id: ProjectId,
        entries: Vec<HistoryEntry>,
        listing: Option<&ListPage>,
    ) -> Self {
        let lookup = |id: ProjectId| listing.and_then(|page| page.find(id));
        let name = match lookup(project_id) {
            Some(row) => ProjectName::Resolved(row.stat.name.clone()),
            None => ProjectName::Unresolved,
        };
        let chart = chart_series(&entries);
        let rows = entries
            .into_iter()
            .map(|entry| {
                let found = lookup(entry.project_id);
                HistoryRow {
                    name: found.map_or(ProjectName::Unresolved, |row| {
                        ProjectName::Resolved(row.stat.name.clone())
                    }),
                    url: found.map(|row| row.stat.url.clone()),
                    entry,
                }
            })
            .collect();
        Self {
            project_id,
            name,
            rows,
            chart,
        }
    }

    /// `UnresolvedName` when the project name could not be found.
    pub fn name_error(&self) -> Option<Error> {
        match self.name {
            ProjectName::Resolved(_) => None,
            ProjectName::Unresolved if self.project_id == 0 => None,
            ProjectName::Unresolved => Some(Error::UnresolvedName(self.project_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use tally_core::ListMeta;

    use super::*;

    fn stat(project_id: ProjectId, name: &str) -> ProjectStat {
        ProjectStat {
            project_id,
            name: name.to_string(),
            url: format!("https://github.com/example/{name}"),
            code_lines: 200,
            unsafe_lines: 10,
            created_at: None,
            updated_at: None,
        }
    }

    fn entry(project_id: ProjectId, unsafe_lines: u64, created_at: Option<&str>) -> HistoryEntry {
        HistoryEntry {
            project_id,
            code_lines: 1000,
            unsafe_lines,
            created_at: created_at.map(|s| s.parse().unwrap()),
            updated_at: None,
        }
    }

    #[test]
    fn ratio_of_ten_in_two_hundred() {
        let row = StatRow::from(stat(1, "regex"));
        assert!((row.ratio - 0.05).abs() < f64::EPSILON);
        assert_eq!(row.percentage, "0.050%");
    }

    #[test]
    fn ratio_never_divides_by_zero() {
        assert_eq!(ratio(5, 0), 0.0);
        assert_eq!(ratio(0, 0), 0.0);
        assert_eq!(ratio(0, 10), 0.0);
        assert!(ratio(5, 0).is_finite());
        assert_eq!(percentage(ratio(5, 0)), "0.000%");
    }

    #[test]
    fn ratio_is_exact_division_for_nonzero_code() {
        assert_eq!(ratio(3, 4), 0.75);
        assert_eq!(percentage(ratio(1, 3)), "0.333%");
    }

    #[test]
    fn list_page_tracks_id_bounds() {
        let page = ListPage::from_response(ListResponse {
            records: vec![stat(9, "a"), stat(100, "b"), stat(12, "c")],
            meta: ListMeta { total: 3 },
        });
        assert_eq!(page.max_project_id(), Some(100));
        assert_eq!(page.min_project_id(), Some(9));
        assert_eq!(page.find(12).map(|r| r.stat.name.as_str()), Some("c"));
        assert_eq!(ListPage::default().max_project_id(), None);
    }

    #[test]
    fn chart_is_chronological() {
        let entries = vec![
            entry(1, 30, Some("2023-03-01T00:00:00Z")),
            entry(1, 20, Some("2023-02-01T00:00:00Z")),
            entry(1, 10, Some("2023-01-01T00:00:00Z")),
        ];
        let points = chart_series(&entries).unwrap();
        let lines: Vec<u64> = points.iter().map(|p| p.unsafe_lines).collect();
        assert_eq!(lines, vec![10, 20, 30]);
        assert!(points[0].timestamp < points[2].timestamp);
    }

    #[test]
    fn single_point_is_not_a_chart() {
        let entries = vec![
            entry(1, 30, Some("2023-03-01T00:00:00Z")),
            entry(1, 20, None),
        ];
        assert_eq!(
            chart_series(&entries),
            Err(Error::InsufficientChartData { points: 1 })
        );
    }

    #[test]
    fn names_come_from_the_listing() {
        let listing = ListPage::from_response(ListResponse {
            records: vec![stat(4, "rayon")],
            meta: ListMeta { total: 1 },
        });
        let history = ProjectHistory::derive(4, vec![entry(4, 1, None)], Some(&listing));
        assert_eq!(history.name, ProjectName::Resolved("rayon".into()));
        assert_eq!(history.rows[0].name.to_string(), "rayon");
        assert_eq!(
            history.rows[0].url.as_deref(),
            Some("https://github.com/example/rayon")
        );
        assert_eq!(history.name_error(), None);
    }

    #[test]
    fn missing_name_is_reported_not_fatal() {
        let history = ProjectHistory::derive(8, vec![entry(8, 1, None)], None);
        assert_eq!(history.rows.len(), 1);
        assert!(!history.rows[0].name.is_resolved());
        assert_eq!(history.rows[0].name.to_string(), "(unknown project)");
        assert_eq!(history.name_error(), Some(Error::UnresolvedName(8)));
    }

    #[test]
    fn empty_history_has_no_name_error() {
        let history = ProjectHistory::empty(0);
        assert!(history.rows.is_empty());
        assert_eq!(history.name_error(), None);
    }
}
