//! Poll loop configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{Error, Result};

/// How the trigger decides it is done polling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PollMode {
    /// Sleep once, poll once, and report. A job still running after the first wait is
    /// reported as a success.
    #[default]
    FirstCheck,
    /// Keep polling until FINISHED, FAILED or ABORTED.
    UntilTerminal,
}

/// Settings for submitting and polling an unload statement.
///
/// The defaults reproduce the deployed handler: `dev` database, `awsuser`, a fixed 15
/// second interval, no timeout and first-check polling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    pub database: String,
    pub db_user: String,
    pub mode: PollMode,
    #[serde(with = "secs")]
    pub poll_interval: Duration,
    /// Multiplier applied to the interval after every poll.
    pub backoff_factor: f64,
    #[serde(with = "secs")]
    pub max_poll_interval: Duration,
    #[serde(with = "opt_secs")]
    pub timeout: Option<Duration>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            database: String::from("dev"),
            db_user: String::from("awsuser"),
            mode: PollMode::FirstCheck,
            poll_interval: Duration::from_secs(15),
            backoff_factor: 1.0,
            max_poll_interval: Duration::from_secs(15),
            timeout: None,
        }
    }
}

impl TriggerConfig {
    /// Loads a configuration from a TOML file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the poll loop cannot honor.
    pub fn validate(&self) -> Result<()> {
        if !self.backoff_factor.is_finite() || self.backoff_factor < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "backoff_factor must be a finite non-negative number, got {}",
                self.backoff_factor
            )));
        }
        Ok(())
    }

    /// Interval to wait after a sleep of `current`.
    pub fn next_interval(&self, current: Duration) -> Duration {
        if self.backoff_factor.is_nan() || self.backoff_factor <= 1.0 {
            return current;
        }
        let cap = self.max_poll_interval.max(self.poll_interval);
        Duration::try_from_secs_f64(current.as_secs_f64() * self.backoff_factor)
            .map_or(cap, |next| next.min(cap))
    }
}

mod secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

mod opt_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs_f64()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<f64>::deserialize(deserializer)?
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TriggerConfig = toml::from_str(
            r#"
            mode = "until_terminal"
            poll_interval = 2.5
            timeout = 600
            "#,
        )
        .unwrap();

        assert_eq!(config.mode, PollMode::UntilTerminal);
        assert_eq!(config.poll_interval, Duration::from_millis(2500));
        assert_eq!(config.timeout, Some(Duration::from_secs(600)));
        assert_eq!(config.database, "dev");
        assert_eq!(config.db_user, "awsuser");
        assert_eq!(config.backoff_factor, 1.0);
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trigger.toml");
        std::fs::write(&path, "database = \"analytics\"\nbackoff_factor = 2.0\n").unwrap();

        let config = TriggerConfig::from_file(&path).unwrap();
        assert_eq!(config.database, "analytics");
        assert_eq!(config.backoff_factor, 2.0);
        assert_eq!(config.mode, PollMode::FirstCheck);
    }

    #[test]
    fn test_next_interval_backoff_is_clamped() {
        let config = TriggerConfig {
            poll_interval: Duration::from_secs(1),
            backoff_factor: 2.0,
            max_poll_interval: Duration::from_secs(5),
            ..TriggerConfig::default()
        };
        let mut interval = config.poll_interval;
        let mut seen = Vec::new();
        for _ in 0..5 {
            interval = config.next_interval(interval);
            seen.push(interval.as_secs());
        }
        assert_eq!(seen, vec![2, 4, 5, 5, 5]);
    }

    #[test]
    fn test_non_finite_backoff_is_rejected() {
        for raw in ["backoff_factor = nan", "backoff_factor = inf", "backoff_factor = -2.0"] {
            let config: TriggerConfig = toml::from_str(raw).unwrap();
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trigger.toml");
        std::fs::write(&path, "backoff_factor = nan\n").unwrap();
        assert!(matches!(
            TriggerConfig::from_file(&path),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_next_interval_never_overflows() {
        let config = TriggerConfig {
            poll_interval: Duration::from_secs(1),
            backoff_factor: 1e300,
            max_poll_interval: Duration::from_secs(60),
            ..TriggerConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(
            config.next_interval(Duration::from_secs(1)),
            Duration::from_secs(60)
        );

        let unchecked = TriggerConfig {
            backoff_factor: f64::NAN,
            ..TriggerConfig::default()
        };
        assert_eq!(
            unchecked.next_interval(Duration::from_secs(3)),
            Duration::from_secs(3)
        );
    }

    #[test]
    fn test_fixed_interval_by_default() {
        let config = TriggerConfig::default();
        assert_eq!(
            config.next_interval(config.poll_interval),
            Duration::from_secs(15)
        );
    }
}
