//! Runtime configuration

use botbridge_core::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_SUBMIT_TIMEOUT_MS: &str = "BOTBRIDGE_SUBMIT_TIMEOUT_MS";
pub const ENV_TICK_MS: &str = "BOTBRIDGE_TICK_MS";
pub const ENV_DRAIN_BUDGET: &str = "BOTBRIDGE_DRAIN_BUDGET";

/// Configuration for the invoker and owner loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Default wait budget for blocking submits; `None` waits forever
    pub submit_timeout_ms: Option<u64>,
    /// Owner loop tick length in continuous mode
    pub tick_interval_ms: u64,
    /// Max tasks run per `drain()`; `None` drains the whole queue
    pub drain_budget: Option<usize>,
    /// Tasks running longer than this are logged at warn level
    pub slow_task_threshold_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            submit_timeout_ms: Some(10_000),
            tick_interval_ms: 600,
            drain_budget: None,
            slow_task_threshold_ms: 50,
        }
    }
}

impl BridgeConfig {
    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BridgeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay `BOTBRIDGE_*` environment variables
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from `lookup`, keyed by the `BOTBRIDGE_*` names.
    ///
    /// `BOTBRIDGE_SUBMIT_TIMEOUT_MS=none` disables the default timeout.
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup(ENV_SUBMIT_TIMEOUT_MS) {
            self.submit_timeout_ms = if raw.trim().eq_ignore_ascii_case("none") {
                None
            } else {
                Some(parse_number(ENV_SUBMIT_TIMEOUT_MS, &raw)?)
            };
        }
        if let Some(raw) = lookup(ENV_TICK_MS) {
            self.tick_interval_ms = parse_number(ENV_TICK_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DRAIN_BUDGET) {
            self.drain_budget = Some(parse_number(ENV_DRAIN_BUDGET, &raw)?);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_submit_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.submit_timeout_ms = timeout.map(millis);
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = millis(interval);
        self
    }

    pub fn with_drain_budget(mut self, budget: Option<usize>) -> Self {
        self.drain_budget = budget;
        self
    }

    pub fn submit_timeout(&self) -> Option<Duration> {
        self.submit_timeout_ms.map(Duration::from_millis)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn slow_task_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_task_threshold_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.tick_interval_ms == 0 {
            return Err(BridgeError::Config("tick_interval_ms must be positive".into()));
        }
        if self.drain_budget == Some(0) {
            return Err(BridgeError::Config("drain_budget must be positive".into()));
        }
        Ok(())
    }
}

/// Whole milliseconds, saturating at `u64::MAX`
fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| BridgeError::Config(format!("{} is not a valid number: {:?}", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.submit_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.tick_interval(), Duration::from_millis(600));
        assert_eq!(config.drain_budget, None);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = BridgeConfig::from_json_str(r#"{"tick_interval_ms": 20}"#).unwrap();
        assert_eq!(config.tick_interval_ms, 20);
        assert_eq!(config.submit_timeout_ms, Some(10_000));

        let config = BridgeConfig::from_json_str(r#"{"submit_timeout_ms": null}"#).unwrap();
        assert_eq!(config.submit_timeout(), None);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_SUBMIT_TIMEOUT_MS, "none"),
            (ENV_TICK_MS, " 50 "),
            (ENV_DRAIN_BUDGET, "8"),
        ]
        .into_iter()
        .collect();

        let config = BridgeConfig::default()
            .with_overrides_from(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.submit_timeout(), None);
        assert_eq!(config.tick_interval_ms, 50);
        assert_eq!(config.drain_budget, Some(8));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = BridgeConfig::default()
            .with_overrides_from(|key| (key == ENV_TICK_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));

        assert!(BridgeConfig::from_json_str(r#"{"tick_interval_ms": 0}"#).is_err());
        assert!(BridgeConfig::from_json_str(r#"{"drain_budget": 0}"#).is_err());
    }

    #[test]
    fn test_huge_durations_saturate() {
        let config = BridgeConfig::default()
            .with_submit_timeout(Some(Duration::MAX))
            .with_tick_interval(Duration::from_millis(250));
        assert_eq!(config.submit_timeout_ms, Some(u64::MAX));
        assert_eq!(config.tick_interval_ms, 250);
    }
}
