use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tally_core::Limit;

use crate::error::{Error, Result};
use crate::pagination::{PaginationState, PagingMode};

/// Browser configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// API base URL (default: "http://localhost:8000/api/v1")
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Paging scheme (default: page)
    #[serde(default)]
    pub paging: PagingMode,
    /// Initial page size (default: 25)
    #[serde(default)]
    pub limit: Limit,
    /// Per-request timeout in seconds (default: none)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Name filter the catalog opens with (default: none)
    #[serde(default)]
    pub search: Option<String>,
}

fn default_base_url() -> String {
    "http://localhost:8000/api/v1".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            paging: PagingMode::default(),
            limit: Limit::default(),
            timeout_secs: None,
            search: None,
        }
    }
}

impl Config {
    /// Load configuration from file, environment, and CLI arguments
    pub fn load(
        config_path: Option<&PathBuf>,
        cli_base_url: Option<&str>,
        cli_paging: Option<PagingMode>,
        cli_limit: Option<u32>,
    ) -> anyhow::Result<Self> {
        // Start with default config
        let mut config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            // Try default config file
            if let Ok(content) = std::fs::read_to_string("tally.toml") {
                toml::from_str(&content)?
            } else {
                Config::default()
            }
        };

        // Override with environment variables
        if let Ok(url) = std::env::var("TALLY_BASE_URL") {
            config.base_url = url;
        }
        if let Ok(paging) = std::env::var("TALLY_PAGING") {
            config.paging = paging.parse()?;
        }
        if let Ok(limit) = std::env::var("TALLY_LIMIT") {
            if let Ok(n) = limit.parse::<u32>() {
                config.limit = Limit::try_from(n)?;
            }
        }
        if let Ok(timeout) = std::env::var("TALLY_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse() {
                config.timeout_secs = Some(secs);
            }
        }

        // Override with CLI arguments
        if let Some(url) = cli_base_url {
            config.base_url = url.to_string();
        }
        if let Some(paging) = cli_paging {
            config.paging = paging;
        }
        if let Some(n) = cli_limit {
            config.limit = Limit::try_from(n)?;
        }

        config.base_url()?;
        Ok(config)
    }

    /// The base URL, parsed.
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("invalid base URL {:?}: {}", self.base_url, e)))?;
        if url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "base URL {:?} cannot carry a path",
                self.base_url
            )));
        }
        Ok(url)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    /// Pagination state a new session starts in.
    pub fn initial_state(&self) -> PaginationState {
        PaginationState {
            search_term: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|term| !term.is_empty())
                .map(String::from),
            ..PaginationState::new(self.paging, self.limit)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_settings_fill_in_defaults() {
        let config: Config = toml::from_str(
            r#"
            base_url = "https://stats.example.org/api/v1"
            paging = "cursor"
            "#,
        )
        .unwrap();
        assert_eq!(config.paging, PagingMode::Cursor);
        assert_eq!(config.limit, Limit::default());
        assert_eq!(config.timeout(), None);
        assert_eq!(
            config.base_url().unwrap().as_str(),
            "https://stats.example.org/api/v1"
        );
    }

    #[test]
    fn file_limit_must_be_on_the_menu() {
        assert!(toml::from_str::<Config>("limit = 30").is_err());
        let config: Config = toml::from_str("limit = 500").unwrap();
        assert_eq!(config.initial_state().limit.get(), 500);
    }

    #[test]
    fn initial_search_is_trimmed() {
        let config: Config = toml::from_str(r#"search = "  serde ""#).unwrap();
        assert_eq!(config.initial_state().search_term.as_deref(), Some("serde"));

        let config: Config = toml::from_str(r#"search = "   ""#).unwrap();
        assert_eq!(config.initial_state(), PaginationState::default());
    }

    #[test]
    fn rejects_unusable_base_urls() {
        let config = Config {
            base_url: "not a url".into(),
            ..Config::default()
        };
        assert!(matches!(config.base_url(), Err(Error::Config(_))));

        let config = Config {
            base_url: "mailto:stats@example.org".into(),
            ..Config::default()
        };
        assert!(config.base_url().is_err());
    }

    #[test]
    fn cli_arguments_win() {
        let path = std::env::temp_dir().join(format!("tally-config-{}.toml", std::process::id()));
        std::fs::write(&path, "base_url = \"http://file.example\"\nlimit = 50\n").unwrap();

        let config = Config::load(
            Some(&path),
            Some("http://cli.example/api"),
            Some(PagingMode::Cursor),
            Some(100),
        );
        std::fs::remove_file(&path).unwrap();

        let config = config.unwrap();
        assert_eq!(config.base_url, "http://cli.example/api");
        assert_eq!(config.paging, PagingMode::Cursor);
        assert_eq!(config.limit.get(), 100);
        assert_eq!(
            config.initial_state(),
            PaginationState::new(PagingMode::Cursor, Limit::new(100).unwrap())
        );
    }
}
