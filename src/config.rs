// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "config.yaml";

const MAX_RECENT_LIST_SIZE: usize = 100;
const MAX_SEARCH_PAGE_SIZE: usize = 500;
const NUMBER_PLACEHOLDER: &str = "%(number)";

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_workers() -> usize {
    2
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Describes how a new element of a given resource type is created: the
/// template is copied into `folder` under the first free name produced by
/// `name_pattern`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NewElementConfig {
    pub type_name: String,
    pub template: String,
    pub folder: String,
    pub name_pattern: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdeConfig {
    #[serde(default = "default_ade_path")]
    pub path: String,
    #[serde(default = "default_user_header")]
    pub user_header: String,
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    #[serde(default = "default_session_idle_minutes")]
    pub session_idle_minutes: u64,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    #[serde(default = "default_recent_list_size")]
    pub recent_list_size: usize,
    #[serde(default = "default_search_page_size")]
    pub search_page_size: usize,
    #[serde(default)]
    pub new_elements: Vec<NewElementConfig>,
}

impl Default for AdeConfig {
    fn default() -> Self {
        Self {
            path: default_ade_path(),
            user_header: default_user_header(),
            session_cookie: default_session_cookie(),
            session_idle_minutes: default_session_idle_minutes(),
            max_sessions: default_max_sessions(),
            recent_list_size: default_recent_list_size(),
            search_page_size: default_search_page_size(),
            new_elements: Vec::new(),
        }
    }
}

impl AdeConfig {
    pub fn new_element(&self, type_name: &str) -> Option<&NewElementConfig> {
        self.new_elements
            .iter()
            .find(|entry| entry.type_name == type_name)
    }
}

fn default_ade_path() -> String {
    "/ade".to_string()
}

fn default_user_header() -> String {
    "x-remote-user".to_string()
}

fn default_session_cookie() -> String {
    "ADE_SESSION".to_string()
}

fn default_session_idle_minutes() -> u64 {
    30
}

fn default_max_sessions() -> usize {
    1000
}

fn default_recent_list_size() -> usize {
    10
}

fn default_search_page_size() -> usize {
    20
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PublishConfig {
    #[serde(default = "default_session_gap_hours")]
    pub session_gap_hours: u32,
    #[serde(default = "default_publish_max_sessions")]
    pub max_sessions: u32,
    #[serde(default = "default_max_days")]
    pub max_days: u32,
    #[serde(default)]
    pub utc_offset_minutes: i32,
    #[serde(default = "default_true")]
    pub include_related: bool,
    #[serde(default)]
    pub include_siblings: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            session_gap_hours: default_session_gap_hours(),
            max_sessions: default_publish_max_sessions(),
            max_days: default_max_days(),
            utc_offset_minutes: 0,
            include_related: true,
            include_siblings: false,
        }
    }
}

fn default_session_gap_hours() -> u32 {
    8
}

fn default_publish_max_sessions() -> u32 {
    2
}

fn default_max_days() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RepositoryConfig {
    #[serde(default = "default_seed_file")]
    pub seed_file: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            seed_file: default_seed_file(),
        }
    }
}

fn default_seed_file() -> String {
    "repository.yaml".to_string()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub ade: AdeConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
}

#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub ade: AdeConfig,
    pub publish: PublishConfig,
    pub repository: RepositoryConfig,
}

impl Config {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join(CONFIG_FILE_NAME);
        let config_content = fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        Self::parse(&config_content).map_err(|e| match e {
            ConfigError::LoadError(msg) => ConfigError::LoadError(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                msg
            )),
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::LoadError(e.to_string()))
    }

    /// Loads and validates configuration at startup. If validation fails, the application should not start.
    pub fn load_and_validate(root: &Path) -> Result<ValidatedConfig, ConfigError> {
        Self::load(root)?.validate()
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.server.workers == 0 {
            return Err(ConfigError::ValidationError(
                "server.workers must be at least 1".to_string(),
            ));
        }

        Self::validate_logging(&self.logging)?;
        Self::validate_ade(&self.ade)?;
        Self::validate_publish(&self.publish)?;

        if self.repository.seed_file.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "repository.seed_file must not be empty".to_string(),
            ));
        }

        Ok(ValidatedConfig {
            server: self.server,
            logging: self.logging,
            ade: self.ade,
            publish: self.publish,
            repository: self.repository,
        })
    }

    fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
        match logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "logging.level must be one of trace, debug, info, warn, error; got '{}'",
                other
            ))),
        }
    }

    fn validate_ade(ade: &AdeConfig) -> Result<(), ConfigError> {
        if !ade.path.starts_with('/') || ade.path.len() < 2 || ade.path.ends_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "ade.path must start with '/' and must not end with '/', got '{}'",
                ade.path
            )));
        }
        if ade.user_header.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "ade.user_header must not be empty".to_string(),
            ));
        }
        if ade.session_cookie.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "ade.session_cookie must not be empty".to_string(),
            ));
        }
        if ade.session_idle_minutes == 0 {
            return Err(ConfigError::ValidationError(
                "ade.session_idle_minutes must be at least 1".to_string(),
            ));
        }
        if ade.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "ade.max_sessions must be at least 1".to_string(),
            ));
        }
        if ade.recent_list_size == 0 || ade.recent_list_size > MAX_RECENT_LIST_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "ade.recent_list_size must be between 1 and {}, got {}",
                MAX_RECENT_LIST_SIZE, ade.recent_list_size
            )));
        }
        if ade.search_page_size == 0 || ade.search_page_size > MAX_SEARCH_PAGE_SIZE {
            return Err(ConfigError::ValidationError(format!(
                "ade.search_page_size must be between 1 and {}, got {}",
                MAX_SEARCH_PAGE_SIZE, ade.search_page_size
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for entry in &ade.new_elements {
            if !seen.insert(entry.type_name.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "ade.new_elements lists type '{}' more than once",
                    entry.type_name
                )));
            }
            if !entry.template.starts_with('/') || !entry.folder.starts_with('/') {
                return Err(ConfigError::ValidationError(format!(
                    "ade.new_elements '{}' needs absolute template and folder paths",
                    entry.type_name
                )));
            }
            if !entry.name_pattern.contains(NUMBER_PLACEHOLDER) {
                return Err(ConfigError::ValidationError(format!(
                    "ade.new_elements '{}' name_pattern must contain {}",
                    entry.type_name, NUMBER_PLACEHOLDER
                )));
            }
        }
        if ade.new_elements.is_empty() {
            warn!("No ade.new_elements configured; the editor cannot create new elements");
        }
        Ok(())
    }

    fn validate_publish(publish: &PublishConfig) -> Result<(), ConfigError> {
        if publish.session_gap_hours == 0 {
            return Err(ConfigError::ValidationError(
                "publish.session_gap_hours must be at least 1".to_string(),
            ));
        }
        if publish.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(ConfigError::ValidationError(format!(
                "publish.utc_offset_minutes must be within one day, got {}",
                publish.utc_offset_minutes
            )));
        }
        Ok(())
    }
}

/// Expands a `name_pattern` such as `article_%(number).json` for the given counter.
pub fn expand_name_pattern(pattern: &str, number: u32) -> String {
    pattern.replace(NUMBER_PLACEHOLDER, &format!("{:05}", number))
}
