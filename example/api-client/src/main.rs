//! HTTP client example for the project-stats API
//!
//! Walks the raw wire contract without the tally session: one catalog page,
//! then the history of the first project on it.
//!
//! Usage:
//!   cargo run -p api-client [--url http://localhost:8000/api/v1]

use tally_core::{HistoryEntry, Limit, ListResponse};

const DEFAULT_URL: &str = "http://localhost:8000/api/v1";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let base_url = std::env::args()
        .nth(1)
        .filter(|arg| !arg.starts_with('-'))
        .or_else(|| {
            std::env::args()
                .skip_while(|arg| arg != "--url")
                .nth(1)
        })
        .unwrap_or_else(|| DEFAULT_URL.to_string());
    let base_url = base_url.trim_end_matches('/');

    println!("Project Stats API Client Demo");
    println!("=============================\n");
    println!("Connecting to: {}\n", base_url);

    let client = reqwest::Client::new();
    let limit = Limit::default().to_string();

    // 1. First catalog page
    println!("1. Listing projects (page 1, limit {})...\n", limit);
    let page: ListResponse = client
        .get(format!("{}/project-stats", base_url))
        .query(&[("page", "1"), ("limit", limit.as_str())])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    println!(
        "   Showing {} of {} project(s):\n",
        page.records.len(),
        page.total_count()
    );

    for stat in &page.records {
        println!("   - [{}] {}", stat.project_id, stat.name);
        println!(
            "     {} unsafe of {} code lines",
            stat.unsafe_lines, stat.code_lines
        );
        println!("     {}", stat.url);
        println!();
    }

    let Some(first) = page.records.first() else {
        println!("The catalog is empty.");
        return Ok(());
    };

    // 2. History of the first project
    println!("2. History of '{}'...\n", first.name);
    let history: Vec<HistoryEntry> = client
        .get(format!("{}/project-stats/{}", base_url, first.project_id))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    for entry in &history {
        let when = entry
            .created_at
            .map(|ts| ts.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        println!("   - {}: {} unsafe lines", when, entry.unsafe_lines);
    }

    if let Some(latest) = history.first() {
        println!("\n   Latest entry as JSON:");
        println!("{}", serde_json::to_string_pretty(latest)?);
    }

    println!("\nDemo complete!");

    Ok(())
}
