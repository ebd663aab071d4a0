//! Shared HTTP plumbing for the control-plane API

use std::time::Duration;

use cast_core::config::ControlPlaneConfig;

use crate::error::ControlError;

/// HTTP client bound to one control-plane API root
///
/// Cloning is cheap; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct ControlPlaneClient {
    base_url: String,
    http: reqwest::Client,
}

impl ControlPlaneClient {
    /// Create a client for `base_url` with a per-request timeout
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, ControlError> {
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .connect_timeout(request_timeout)
            .build()
            .map_err(ControlError::Client)?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    /// Create a client from configuration
    pub fn from_config(config: &ControlPlaneConfig) -> Result<Self, ControlError> {
        Self::new(&config.base_url, config.request_timeout)
    }

    /// API root this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = ControlPlaneClient::new("http://localhost:3000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:3000/api");
        assert_eq!(client.endpoint("pairings"), "http://localhost:3000/api/pairings");
    }

    #[test]
    fn test_from_config() {
        let client = ControlPlaneClient::from_config(&ControlPlaneConfig::default()).unwrap();
        assert_eq!(client.endpoint("mode"), "http://localhost:3000/api/mode");
    }
}
