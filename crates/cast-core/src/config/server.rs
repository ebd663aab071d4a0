//! Server configuration

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

use super::serde_utils::duration_secs;
use crate::error::ConfigError;
use crate::types::{MacAddress, Room, RoomId};

/// Configuration for the castpair server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind the HTTP server to
    pub bind_address: String,

    /// Externally reachable origin used in pairing links
    /// (e.g. "https://cast.example.org"); derived per request when unset
    pub public_origin: Option<String>,

    /// Honor X-Forwarded-For / Forwarded / X-Real-IP when identifying clients
    pub trust_forwarded_headers: bool,

    /// Secret used to sign pairing links; random per process when unset
    pub link_secret: Option<String>,

    /// Remote forwarding control plane
    pub control_plane: ControlPlaneConfig,

    /// Neighbor-table resolution
    pub resolver: ResolverConfig,

    /// Rooms seeding the catalogue
    pub rooms: Vec<RoomConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            public_origin: None,
            trust_forwarded_headers: true,
            link_secret: None,
            control_plane: ControlPlaneConfig::default(),
            resolver: ResolverConfig::default(),
            rooms: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Check values that parse but cannot be used
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(origin) = &self.public_origin {
            parse_origin(origin)?;
        }

        let base = Url::parse(&self.control_plane.base_url).map_err(|e| {
            ConfigError::Invalid(format!(
                "control_plane.base_url {:?}: {}",
                self.control_plane.base_url, e
            ))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid(format!(
                "control_plane.base_url must be http(s), got {:?}",
                self.control_plane.base_url
            )));
        }

        if self.control_plane.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "control_plane.request_timeout must be at least one second".to_string(),
            ));
        }

        if self.resolver.timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "resolver.timeout must be at least one second".to_string(),
            ));
        }

        if matches!(&self.link_secret, Some(secret) if secret.is_empty()) {
            return Err(ConfigError::Invalid("link_secret must not be empty".to_string()));
        }

        self.catalog_rooms().map(|_| ())
    }

    /// Build the catalogue entries, validating ids and MACs
    pub fn catalog_rooms(&self) -> Result<Vec<Room>, ConfigError> {
        let mut seen = HashSet::new();
        self.rooms
            .iter()
            .map(|room| {
                if !seen.insert(room.id) {
                    return Err(ConfigError::Invalid(format!("duplicate room id {}", room.id)));
                }
                room.to_room()
            })
            .collect()
    }

    /// Parsed public origin, if configured
    pub fn public_origin_url(&self) -> Result<Option<Url>, ConfigError> {
        self.public_origin.as_deref().map(parse_origin).transpose()
    }
}

fn parse_origin(origin: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(origin)
        .map_err(|e| ConfigError::Invalid(format!("public_origin {:?}: {}", origin, e)))?;
    if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
        return Err(ConfigError::Invalid(format!(
            "public_origin must be an absolute http(s) URL, got {:?}",
            origin
        )));
    }
    Ok(url)
}

/// Control-plane client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlPlaneConfig {
    /// API root of the forwarding service (pairings live at `{base_url}/pairings`)
    pub base_url: String,

    /// Per-request timeout
    #[serde(with = "duration_secs")]
    pub request_timeout: Duration,
}

impl Default for ControlPlaneConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            request_timeout: Duration::from_secs(5),
        }
    }
}

/// Address resolver configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Wall-clock cap on a single neighbor-table query
    #[serde(with = "duration_secs")]
    pub timeout: Duration,

    /// Platform identifier overriding the detected one (e.g. "linux", "windows")
    pub platform: Option<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(3),
            platform: None,
        }
    }
}

/// A room as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    pub id: u32,
    pub name: String,
    /// Device MAC; empty or absent means not configured yet
    #[serde(default)]
    pub device_mac: Option<String>,
}

impl RoomConfig {
    fn to_room(&self) -> Result<Room, ConfigError> {
        let device_mac = match self.device_mac.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(mac) => Some(MacAddress::parse(mac).map_err(|source| ConfigError::RoomMac {
                room: self.id,
                source,
            })?),
        };

        Ok(Room {
            id: RoomId(self.id),
            name: self.name.clone(),
            device_mac,
        })
    }
}
