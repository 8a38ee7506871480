use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::monitor::{DEFAULT_INTERVAL_SECS, INTERVAL_FLOOR_SECS};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Antigravity quota monitor")]
pub struct Config {
    /// Enable debug mode
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Polling interval in seconds (minimum 30)
    #[arg(short = 'i', long, global = true)]
    pub poll_interval: Option<u64>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Discover, fetch once, print the result, and exit
    Status {
        /// Print the detailed breakdown as markdown instead of the compact line
        #[arg(long)]
        detail: bool,
    },
}

impl Config {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Check if running in one-shot status mode
    pub fn is_status_mode(&self) -> bool {
        matches!(self.command, Some(Command::Status { .. }))
    }

    /// Whether status mode should print the detail view
    pub fn wants_detail(&self) -> bool {
        matches!(self.command, Some(Command::Status { detail: true }))
    }
}

/// Application settings (from config file)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Polling interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Timeout for each quota request in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Timeout for each discovery probe in milliseconds
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_ms: u64,

    /// Fixed companion endpoint (skips process scanning when complete)
    #[serde(default)]
    pub companion: CompanionSettings,
}

fn default_poll_interval() -> u64 {
    DEFAULT_INTERVAL_SECS
}

fn default_request_timeout() -> u64 {
    10
}

fn default_probe_timeout() -> u64 {
    1500
}

/// Manually configured companion endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanionSettings {
    /// Port of the language server API
    #[serde(default)]
    pub port: Option<u16>,

    /// CSRF token issued by the language server
    #[serde(default)]
    pub csrf_token: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            request_timeout_secs: default_request_timeout(),
            probe_timeout_ms: default_probe_timeout(),
            companion: CompanionSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                return Self::load_file(p);
            }
            warn!("Config file {:?} not found, using defaults", p);
        }

        // Try default config locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("agpulse/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/agpulse/config.toml")),
            dirs::home_dir().map(|p| p.join(".agpulse.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                return Self::load_file(path);
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// Merge CLI config into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Config) {
        if let Some(poll_interval) = cli.poll_interval {
            self.poll_interval_secs = poll_interval;
        }
    }

    /// Validate and normalize settings values
    ///
    /// The polling floor is enforced again by the controller; clamping here
    /// keeps the displayed value honest.
    pub fn validate(&mut self) {
        if self.poll_interval_secs < INTERVAL_FLOOR_SECS {
            warn!(
                "poll_interval_secs {} is below the {}s floor, clamping",
                self.poll_interval_secs, INTERVAL_FLOOR_SECS
            );
            self.poll_interval_secs = INTERVAL_FLOOR_SECS;
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout();
        }
        if self.probe_timeout_ms == 0 {
            self.probe_timeout_ms = default_probe_timeout();
        }
    }

    /// Quota request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Discovery probe timeout
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}
