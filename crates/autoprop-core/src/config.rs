use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AutopropError, Result};

/// Top-level configuration for the autoprop host.
///
/// Loaded from `~/.autoprop/config.toml` by default. Every section falls back
/// to host defaults when omitted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutopropConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub auto_propose: AutoProposeConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl AutopropConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AutopropConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AutopropError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Automatic block proposal settings.
///
/// The defaults here belong to the host binary. The scheduler itself requires
/// all three limits to be given explicitly and validates them when building
/// its own config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoProposeConfig {
    /// Whether the auto-proposer is started at all.
    pub enabled: bool,
    /// How often pending deploys are polled, in milliseconds.
    pub check_interval_ms: u64,
    /// Longest time new deploys may wait before a proposal is forced.
    pub max_interval_ms: u64,
    /// Pending deploy count that forces a proposal.
    pub max_count: usize,
}

impl Default for AutoProposeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_interval_ms: 1_000,
            max_interval_ms: 5_000,
            max_count: 10,
        }
    }
}

impl AutoProposeConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_millis(self.max_interval_ms)
    }
}

/// Knobs for the simulated node driven by the demo binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Interval between synthetic deploys, in milliseconds.
    pub deploy_interval_ms: u64,
    /// Simulated block creation time, in milliseconds.
    pub propose_latency_ms: u64,
    /// Every Nth proposal fails. 0 disables failures.
    pub fail_every: u64,
}

impl SimulationConfig {
    pub fn deploy_interval(&self) -> Duration {
        Duration::from_millis(self.deploy_interval_ms)
    }

    pub fn propose_latency(&self) -> Duration {
        Duration::from_millis(self.propose_latency_ms)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            deploy_interval_ms: 750,
            propose_latency_ms: 200,
            fail_every: 0,
        }
    }
}
