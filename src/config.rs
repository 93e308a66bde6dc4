use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetch::FetchPolicy;
use crate::model::ContentKind;

#[derive(Parser, Debug)]
#[command(name = "katalog")]
#[command(about = "Catalogue client and backend passthrough", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the passthrough server (default).
    Serve,
    /// Work with the book catalogue.
    Books {
        #[command(subcommand)]
        action: BookAction,
    },
    /// Show series and lesson stats, or change an entry.
    Stats {
        #[command(subcommand)]
        action: Option<StatsAction>,
    },
    /// List users, optionally searching by name.
    Users {
        #[arg(short, long)]
        search: Option<String>,
    },
    /// List destinations, optionally filtered by city.
    Destinations {
        #[arg(long, default_value = "all")]
        city: String,
        #[arg(short, long)]
        search: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum BookAction {
    List {
        /// Publication year to show, or "all".
        #[arg(short, long, default_value = "all")]
        filter: String,
    },
    Add {
        #[arg(long)]
        isbn: String,
        #[arg(long)]
        title: String,
        #[arg(long)]
        author_id: i64,
        #[arg(long)]
        publisher_id: Option<i64>,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        description: Option<String>,
    },
    Rename {
        isbn: String,
        title: String,
    },
    Delete {
        isbn: String,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum StatsAction {
    Add {
        #[arg(long)]
        title: String,
        #[arg(long = "type", value_enum)]
        kind: ContentKind,
    },
    Rename {
        id: i64,
        title: String,
    },
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".katalog")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_backend_url")]
    pub backend_url: String,
    #[serde(default = "default_directory_url")]
    pub directory_url: String,
}

fn default_port() -> u16 {
    3000
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_directory_url() -> String {
    "https://jsonplaceholder.typicode.com".to_string()
}

impl Default for App {
    fn default() -> Self {
        App {
            port: default_port(),
            backend_url: default_backend_url(),
            directory_url: default_directory_url(),
        }
    }
}

impl App {
    pub fn get_port(&self) -> u16 {
        self.port
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct PolicyConfig {
    pub timeout_ms: u64,
    pub retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default)]
    pub retry_server_errors: bool,
}

fn default_retry_delay_ms() -> u64 {
    500
}

impl PolicyConfig {
    fn read() -> Self {
        Self::from_policy(&FetchPolicy::read())
    }

    fn write() -> Self {
        Self::from_policy(&FetchPolicy::write())
    }

    fn from_policy(policy: &FetchPolicy) -> Self {
        PolicyConfig {
            timeout_ms: policy.timeout.as_millis() as u64,
            retries: policy.retries,
            retry_delay_ms: policy.retry_delay.as_millis() as u64,
            retry_server_errors: policy.retry_server_errors,
        }
    }

    pub fn policy(&self) -> FetchPolicy {
        let policy = FetchPolicy::read()
            .with_timeout(Duration::from_millis(self.timeout_ms))
            .with_retries(self.retries)
            .with_retry_delay(Duration::from_millis(self.retry_delay_ms));
        if self.retry_server_errors {
            policy.retrying_server_errors()
        } else {
            policy
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Fetch {
    #[serde(default = "PolicyConfig::read")]
    pub read: PolicyConfig,
    #[serde(default = "PolicyConfig::write")]
    pub write: PolicyConfig,
}

impl Default for Fetch {
    fn default() -> Self {
        Fetch {
            read: PolicyConfig::read(),
            write: PolicyConfig::write(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Proxy {
    #[serde(default = "default_proxied_resources")]
    pub resources: Vec<String>,
}

fn default_proxied_resources() -> Vec<String> {
    vec!["site-stats".to_string(), "books".to_string()]
}

impl Default for Proxy {
    fn default() -> Self {
        Proxy {
            resources: default_proxied_resources(),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    #[serde(default)]
    pub app: App,
    #[serde(default)]
    pub fetch: Fetch,
    #[serde(default)]
    pub proxy: Proxy,
}

impl Config {
    /// Loads an explicitly requested file. A missing file is an error.
    pub fn new(path: &str) -> Result<Self> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    /// Loads `path` if it exists, otherwise falls back to the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = ?path, "no config file, using defaults");
            return Ok(Config::default());
        }
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str);
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        Ok(config)
    }

    /// Expands `${VAR}` and `${VAR:-default}`. Unset variables without a
    /// default become empty strings.
    fn substitute_env_vars(yaml_str: &str) -> String {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            let Some(end) = result[actual_start..].find('}') else {
                break;
            };
            let expr = &result[actual_start + 2..actual_start + end];

            let value = match expr.split_once(":-") {
                Some((var, default)) => env::var(var).unwrap_or_else(|_| default.to_string()),
                None => env::var(expr).unwrap_or_else(|_| {
                    tracing::warn!("environment variable '{}' not found", expr);
                    String::new()
                }),
            };

            result.replace_range(actual_start..actual_start + end + 1, &value);
            offset = actual_start + value.len();
        }

        result
    }
}
