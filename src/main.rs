use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tally::command::Command;
use tally::config::Config;
use tally::pagination::PagingMode;
use tally::{render, Session};

/// Terminal browser for the project unsafe-usage catalog
#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Project-stats API base URL
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Paging scheme: page or cursor
    #[arg(long, value_name = "MODE")]
    paging: Option<PagingMode>,

    /// Initial page size (25, 50, 100 or 500)
    #[arg(short, long, value_name = "N")]
    limit: Option<u32>,

    /// Open the catalog filtered by this name
    #[arg(short, long, value_name = "TERM")]
    search: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hyper=warn,reqwest=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Parse CLI arguments
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load(
        args.config.as_ref(),
        args.base_url.as_deref(),
        args.paging,
        args.limit,
    )?;
    if args.search.is_some() {
        config.search = args.search;
    }

    info!(
        "Configuration loaded: base_url={} paging={} limit={}",
        config.base_url, config.paging, config.limit
    );

    let mut session = Session::from_config(&config)?;

    // A starting search opens straight into the filtered list.
    if config.search.is_some() {
        session.open_list()?;
        session.settled().await;
    }
    println!("{}", render::screen(&session));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => {
                println!("{}", render::HELP);
                continue;
            }
            _ => {}
        }

        match command.apply(&mut session) {
            Ok(Some(transition)) => {
                if let Some(message) = render::transition(transition) {
                    println!("{}", message);
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("{:?}: {}", command, e);
                println!("{}", e);
                continue;
            }
        }

        session.settled().await;
        println!("{}", render::screen(&session));
    }

    Ok(())
}
