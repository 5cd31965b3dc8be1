// ABOUTME: Configuration types and parsing for lanattach.yml.
// ABOUTME: Poll interval, convergence timeout, allocation policy and pool locking.

use crate::attach::AllocationPolicy;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "lanattach.yml";
pub const CONFIG_FILENAME_ALT: &str = "lanattach.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".lanattach/config.yml";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttachConfig {
    /// Delay between two operation state polls.
    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Upper bound on waiting for an operation to converge.
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default)]
    pub allocation_policy: AllocationPolicy,

    /// Hold a per-pool lock from snapshot until submission returns.
    #[serde(default)]
    pub serialize_pool_allocations: bool,
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_timeout() -> Duration {
    Duration::from_secs(600)
}

impl Default for AttachConfig {
    fn default() -> Self {
        AttachConfig {
            poll_interval: default_poll_interval(),
            timeout: default_timeout(),
            allocation_policy: AllocationPolicy::default(),
            serialize_pool_allocations: false,
        }
    }
}

impl AttachConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: AttachConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load the first config file found in `dir`, or defaults if there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if self.poll_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval > self.timeout {
            return Err(Error::InvalidConfig(format!(
                "poll_interval ({:?}) must not exceed timeout ({:?})",
                self.poll_interval, self.timeout
            )));
        }
        Ok(())
    }
}
