//! Configuration.
//!
//! Everything the crate needs is supplied up front as a [`StoreConfig`]:
//! the table descriptor, the wait timings and the AWS connection settings.
//! It deserializes from JSON with every field optional; missing fields take
//! the defaults below. Environment variables can override a few fields.
//!
//! ```json
//! {
//!   "table": {
//!     "name": "Orders",
//!     "partition_key": {"name": "id", "type": "S"},
//!     "provisioning": {"mode": "provisioned", "read_capacity_units": 5, "write_capacity_units": 5}
//!   },
//!   "wait": {"poll_interval_ms": 1000, "timeout_ms": 60000},
//!   "aws": {"region": "eu-west-1", "endpoint_url": "http://localhost:8000"}
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::client::AwsSettings;
use crate::descriptor::TableDescriptor;
use crate::errors::{Result, StoreError};

/// Default pause between two status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default overall budget for a table to become active.
pub const DEFAULT_WAIT_TIMEOUT: Duration = Duration::from_secs(20);

/// Timing of the wait-for-active phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitSettings {
    pub poll_interval_ms: u64,
    pub timeout_ms: u64,
}

impl WaitSettings {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval_ms: saturating_millis(poll_interval),
            timeout_ms: saturating_millis(timeout),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// The interval must be shorter than the timeout, otherwise the wait
    /// degenerates to a single check.
    pub fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 || self.timeout_ms == 0 {
            return Err(StoreError::Config(
                "poll interval and timeout must be positive".to_string(),
            ));
        }
        if self.poll_interval_ms >= self.timeout_ms {
            return Err(StoreError::Config(format!(
                "poll interval ({} ms) must be shorter than the timeout ({} ms)",
                self.poll_interval_ms, self.timeout_ms
            )));
        }
        Ok(())
    }
}

impl Default for WaitSettings {
    fn default() -> Self {
        WaitSettings::new(DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT)
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub table: TableDescriptor,
    pub wait: WaitSettings,
    pub aws: AwsSettings,
}

impl StoreConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: StoreConfig = serde_json::from_str(json)
            .map_err(|e| StoreError::Config(format!("invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            StoreError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Apply `DYNOSTORE_*` overrides from the process environment.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides read through `lookup`:
    /// - `DYNOSTORE_TABLE`
    /// - `DYNOSTORE_REGION`
    /// - `DYNOSTORE_ENDPOINT_URL`
    /// - `DYNOSTORE_PROFILE`
    /// - `DYNOSTORE_POLL_INTERVAL_MS`
    /// - `DYNOSTORE_WAIT_TIMEOUT_MS`
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(name) = lookup("DYNOSTORE_TABLE") {
            self.table = self.table.with_name(name);
        }
        if let Some(region) = lookup("DYNOSTORE_REGION") {
            self.aws.region = Some(region);
        }
        if let Some(url) = lookup("DYNOSTORE_ENDPOINT_URL") {
            self.aws.endpoint_url = Some(url);
        }
        if let Some(profile) = lookup("DYNOSTORE_PROFILE") {
            self.aws.profile = Some(profile);
        }
        if let Some(ms) = lookup("DYNOSTORE_POLL_INTERVAL_MS") {
            self.wait.poll_interval_ms = parse_millis("DYNOSTORE_POLL_INTERVAL_MS", &ms)?;
        }
        if let Some(ms) = lookup("DYNOSTORE_WAIT_TIMEOUT_MS") {
            self.wait.timeout_ms = parse_millis("DYNOSTORE_WAIT_TIMEOUT_MS", &ms)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        self.table.validate()?;
        self.wait.validate()
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn parse_millis(var: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| StoreError::Config(format!("{} must be milliseconds, got '{}'", var, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn huge_durations_saturate() {
        let wait = WaitSettings::new(Duration::from_secs(1), Duration::MAX);
        assert_eq!(wait.poll_interval_ms, 1000);
        assert_eq!(wait.timeout_ms, u64::MAX);
        assert!(wait.validate().is_ok());
    }

    #[test]
    fn empty_json_gives_defaults() {
        let config = StoreConfig::from_json_str("{}").unwrap();
        assert_eq!(config.table.name(), "DemoTable");
        assert_eq!(config.wait.poll_interval(), Duration::from_secs(3));
        assert_eq!(config.wait.timeout(), Duration::from_secs(20));
        assert_eq!(config.aws.region.as_deref(), Some("us-west-2"));
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config = StoreConfig::from_json_str(
            r#"{
                "table": {"name": "Orders", "partition_key": {"name": "id"}},
                "wait": {"poll_interval_ms": 500},
                "aws": {"endpoint_url": "http://localhost:8000"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.table.name(), "Orders");
        assert_eq!(config.table.partition_key().name, "id");
        assert_eq!(config.wait.poll_interval_ms, 500);
        assert_eq!(config.wait.timeout_ms, 20_000);
        assert_eq!(
            config.aws.endpoint_url.as_deref(),
            Some("http://localhost:8000")
        );
    }

    #[test]
    fn interval_must_be_below_timeout() {
        let err = StoreConfig::from_json_str(r#"{"wait": {"poll_interval_ms": 20000}}"#)
            .unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            ("DYNOSTORE_TABLE", "Orders"),
            ("DYNOSTORE_REGION", "eu-central-1"),
            ("DYNOSTORE_WAIT_TIMEOUT_MS", "60000"),
        ]
        .into_iter()
        .collect();
        let config = StoreConfig::default()
            .apply_env_from(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.table.name(), "Orders");
        assert_eq!(config.aws.region.as_deref(), Some("eu-central-1"));
        assert_eq!(config.wait.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn bad_env_number_is_rejected() {
        let err = StoreConfig::default()
            .apply_env_from(|k| (k == "DYNOSTORE_POLL_INTERVAL_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, StoreError::Config(_)));
    }
}
