//! Configuration management for civicfinder
//!
//! All configuration is loaded from `./config/civicfinder.toml`.
//! No hardcoded defaults exist in source code - all defaults are in the config template.

use crate::entity::EntityCategory;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration file path relative to working directory
pub const CONFIG_PATH: &str = "./config/civicfinder.toml";

/// Default configuration file content - this is the ONLY place defaults exist
pub const DEFAULT_CONFIG: &str = include_str!("../config/civicfinder.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found at {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid URL pattern in '{field}': {pattern} ({reason})")]
    InvalidPattern {
        field: String,
        pattern: String,
        reason: String,
    },

    #[error("Configuration field '{field}' cannot be empty")]
    EmptyRequired { field: String },

    #[error("Configuration field '{field}' must be greater than zero")]
    ZeroValue { field: String },
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub crawl: CrawlConfig,
    /// Candidate URL pattern templates per category, highest priority first
    pub candidates: HashMap<EntityCategory, Vec<String>>,
    /// Department-page keywords per category
    pub departments: HashMap<EntityCategory, Vec<String>>,
    pub extraction: ExtractionConfig,
    /// Search terms appended to manual-research queries per category
    pub research: HashMap<EntityCategory, String>,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

/// Crawl pacing and budget configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Blocking pause after every successful page fetch, in seconds. The
    /// politeness knob: values below 2 increase block risk on government sites.
    pub request_delay_secs: u64,
    /// Maximum department links fetched per resolved site
    pub max_links_per_site: usize,
    /// Checkpoint write frequency, in entities processed
    pub checkpoint_interval: usize,
}

/// Content extraction configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    /// Job-title keywords anchoring the name/title proximity heuristic
    pub title_keywords: Vec<String>,
    /// Substrings that disqualify an extracted email
    pub email_blacklist: Vec<String>,
}

impl AppConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(Path::new(CONFIG_PATH))
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Candidate URL pattern templates for a category (empty slice when the
    /// category is configured for manual research only)
    pub fn patterns_for(&self, category: EntityCategory) -> &[String] {
        self.candidates.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Department-page keywords for a category
    pub fn department_keywords_for(&self, category: EntityCategory) -> &[String] {
        self.departments.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Search term for manual-research queries for a category
    pub fn search_term_for(&self, category: EntityCategory) -> &str {
        self.research
            .get(&category)
            .map(String::as_str)
            .unwrap_or("official website")
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.user_agent.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "http.user_agent".to_string(),
            });
        }
        if self.http.request_timeout_secs == 0 {
            return Err(ConfigError::ZeroValue {
                field: "http.request_timeout_secs".to_string(),
            });
        }
        if self.crawl.max_links_per_site == 0 {
            return Err(ConfigError::ZeroValue {
                field: "crawl.max_links_per_site".to_string(),
            });
        }
        if self.crawl.checkpoint_interval == 0 {
            return Err(ConfigError::ZeroValue {
                field: "crawl.checkpoint_interval".to_string(),
            });
        }
        if self.extraction.title_keywords.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "extraction.title_keywords".to_string(),
            });
        }

        // Validate pattern templates: placeholders must be known and the
        // substituted result must be a parseable absolute URL
        for (category, patterns) in &self.candidates {
            for pattern in patterns {
                let field = format!("candidates.{}", category);
                let substituted = pattern.replace("{name}", "sample").replace("{state}", "md");
                if substituted.contains('{') || substituted.contains('}') {
                    return Err(ConfigError::InvalidPattern {
                        field,
                        pattern: pattern.clone(),
                        reason: "unknown placeholder (expected {name} or {state})".to_string(),
                    });
                }
                if let Err(e) = url::Url::parse(&substituted) {
                    return Err(ConfigError::InvalidPattern {
                        field,
                        pattern: pattern.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Create default configuration file at the standard location
    pub fn create_default_config() -> Result<PathBuf, ConfigError> {
        let path = Path::new(CONFIG_PATH);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(DEFAULT_CONFIG.as_bytes())?;

        Ok(path.to_path_buf())
    }

    /// Check if stdin is a TTY (interactive terminal)
    pub fn is_interactive() -> bool {
        atty::is(atty::Stream::Stdin)
    }

    /// Prompt user to create default config (only in interactive mode)
    pub fn prompt_create_config() -> Result<Option<PathBuf>, ConfigError> {
        if !Self::is_interactive() {
            return Ok(None);
        }

        print!("Configuration file not found. Create default config? [Y/n] ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let input = input.trim().to_lowercase();

        if input.is_empty() || input == "y" || input == "yes" {
            let path = Self::create_default_config()?;
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }
}
