//! CLI argument definitions for the autoprop binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use autoprop_core::AutopropConfig;

/// autoprop: proposes blocks automatically once enough deploys are pending.
#[derive(Parser, Debug)]
#[command(name = "autoprop", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Poll interval for pending deploys, in milliseconds.
    #[arg(long = "check-interval-ms")]
    pub check_interval_ms: Option<u64>,

    /// Longest time new deploys wait before a proposal, in milliseconds.
    #[arg(long = "max-interval-ms")]
    pub max_interval_ms: Option<u64>,

    /// Pending deploy count that forces a proposal.
    #[arg(long = "max-count")]
    pub max_count: Option<usize>,

    /// Do not start the auto-proposer.
    #[arg(long = "no-auto-propose")]
    pub no_auto_propose: bool,

    /// Write the effective configuration to the config path and exit.
    #[arg(long = "write-config")]
    pub write_config: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > AUTOPROP_CONFIG env var > platform default (~/.autoprop/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("AUTOPROP_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Apply command-line overrides on top of the loaded file.
    pub fn apply_overrides(&self, config: &mut AutopropConfig) {
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(ms) = self.check_interval_ms {
            config.auto_propose.check_interval_ms = ms;
        }
        if let Some(ms) = self.max_interval_ms {
            config.auto_propose.max_interval_ms = ms;
        }
        if let Some(count) = self.max_count {
            config.auto_propose.max_count = count;
        }
        if self.no_auto_propose {
            config.auto_propose.enabled = false;
        }
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".autoprop").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".autoprop").join("config.toml");
    }
    PathBuf::from("config.toml")
}
