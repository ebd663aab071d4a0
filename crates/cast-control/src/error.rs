//! Control-plane error types

use cast_core::ForwardingMode;
use thiserror::Error;

/// Failure talking to the forwarding control plane
#[derive(Error, Debug)]
pub enum ControlError {
    /// Transport failure: connection refused, DNS, reset
    #[error("Control plane unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// No response within the configured request timeout
    #[error("Control plane did not respond in time")]
    Timeout,

    /// The control plane answered with a non-success status
    #[error("Control plane rejected the request (HTTP {status})")]
    Rejected { status: u16 },

    /// The response body was not what the API defines
    #[error("Malformed control-plane response: {0}")]
    Malformed(String),

    /// A mode that may only be read was passed for writing
    #[error("Forwarding mode {0} cannot be set")]
    InvalidMode(ForwardingMode),

    /// The HTTP client could not be built
    #[error("Failed to build control-plane client: {0}")]
    Client(#[source] reqwest::Error),
}

impl From<reqwest::Error> for ControlError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ControlError::Timeout
        } else if e.is_decode() {
            ControlError::Malformed(e.to_string())
        } else {
            ControlError::Unreachable(e)
        }
    }
}
