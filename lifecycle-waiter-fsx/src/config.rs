//! Default timeouts and poll delays for the FSx waiters.
//!
//! The defaults follow the FSx resource lifecycle: creation and updates can take up to
//! 45 minutes, deletion up to 30, and each is probed every 30 seconds. Alias changes
//! settle within minutes and are probed on a backoff cadence instead.
//!
//! Any subset of the values can be overridden from a JSON file:
//!
//! ```json
//! { "create_timeout_secs": 3600, "available_delay_secs": 15 }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{FsxError, FsxResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaiterConfig {
    pub create_timeout_secs: u64,
    pub update_timeout_secs: u64,
    pub delete_timeout_secs: u64,
    pub available_delay_secs: u64,
    pub deleted_delay_secs: u64,
    pub admin_action_delay_secs: u64,
    pub alias_available_timeout_secs: u64,
    pub alias_deleted_timeout_secs: u64,
}

impl Default for WaiterConfig {
    fn default() -> Self {
        Self {
            create_timeout_secs: 45 * 60,
            update_timeout_secs: 45 * 60,
            delete_timeout_secs: 30 * 60,
            available_delay_secs: 30,
            deleted_delay_secs: 30,
            admin_action_delay_secs: 30,
            alias_available_timeout_secs: 5 * 60,
            alias_deleted_timeout_secs: 5 * 60,
        }
    }
}

impl WaiterConfig {
    /// Load and validate a JSON config file. Missing fields keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> FsxResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            FsxError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&raw).map_err(|e| {
            FsxError::config(format!("Invalid waiter config {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> FsxResult<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| FsxError::config(format!("Invalid waiter config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Every timeout and delay must be positive.
    pub fn validate(&self) -> FsxResult<()> {
        let fields = [
            ("create_timeout_secs", self.create_timeout_secs),
            ("update_timeout_secs", self.update_timeout_secs),
            ("delete_timeout_secs", self.delete_timeout_secs),
            ("available_delay_secs", self.available_delay_secs),
            ("deleted_delay_secs", self.deleted_delay_secs),
            ("admin_action_delay_secs", self.admin_action_delay_secs),
            ("alias_available_timeout_secs", self.alias_available_timeout_secs),
            ("alias_deleted_timeout_secs", self.alias_deleted_timeout_secs),
        ];
        match fields.iter().find(|(_, value)| *value == 0) {
            Some((name, _)) => Err(FsxError::config(format!("{name} must be greater than zero"))),
            None => Ok(()),
        }
    }

    pub fn create_timeout(&self) -> Duration {
        Duration::from_secs(self.create_timeout_secs)
    }

    pub fn update_timeout(&self) -> Duration {
        Duration::from_secs(self.update_timeout_secs)
    }

    pub fn delete_timeout(&self) -> Duration {
        Duration::from_secs(self.delete_timeout_secs)
    }

    pub fn available_delay(&self) -> Duration {
        Duration::from_secs(self.available_delay_secs)
    }

    pub fn deleted_delay(&self) -> Duration {
        Duration::from_secs(self.deleted_delay_secs)
    }

    pub fn admin_action_delay(&self) -> Duration {
        Duration::from_secs(self.admin_action_delay_secs)
    }

    pub fn alias_available_timeout(&self) -> Duration {
        Duration::from_secs(self.alias_available_timeout_secs)
    }

    pub fn alias_deleted_timeout(&self) -> Duration {
        Duration::from_secs(self.alias_deleted_timeout_secs)
    }
}
