//! Shared serialization/deserialization utilities for configuration

/// Helper module for Duration serialization as seconds
///
/// Timeouts in the config file are plain integers:
///
/// ```ignore
/// [resolver]
/// timeout = 3
/// ```
pub mod duration_secs {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize a Duration as seconds (u64)
    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    /// Deserialize a Duration from seconds (u64)
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TimeoutConfig {
        #[serde(with = "duration_secs")]
        timeout: Duration,
    }

    #[test]
    fn test_duration_secs_in_toml() {
        let config: TimeoutConfig = toml::from_str("timeout = 3").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(3));

        let text = toml::to_string(&config).unwrap();
        assert_eq!(text.trim(), "timeout = 3");
    }

    #[test]
    fn test_duration_secs_rejects_negative() {
        assert!(toml::from_str::<TimeoutConfig>("timeout = -1").is_err());
    }
}
