//! Core error types for castpair

use std::path::PathBuf;
use thiserror::Error;

/// A string that is not a 6-group hexadecimal MAC address
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid MAC address: {0:?}")]
pub struct MacParseError(pub String);

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// A room entry carries a malformed device MAC
    #[error("Room {room}: {source}")]
    RoomMac {
        room: u32,
        #[source]
        source: MacParseError,
    },
}

/// A forwarding mode name the control plane does not define
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unrecognized forwarding mode: {0:?}")]
pub struct ModeParseError(pub String);
