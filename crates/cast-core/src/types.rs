//! Core domain types

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

use crate::error::{MacParseError, ModeParseError};

/// Six two-digit hex groups, each of the first five followed by `:` or `-`
const MAC_PATTERN: &str = "([0-9A-Fa-f]{2}[:-]){5}[0-9A-Fa-f]{2}";

fn mac_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(MAC_PATTERN).expect("MAC pattern is a valid regex"))
}

fn mac_regex_anchored() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("^{}$", MAC_PATTERN)).expect("MAC pattern is a valid regex")
    })
}

/// A link-layer address in colon- or hyphen-delimited hex form
///
/// The textual form is kept as it was observed (case and separators are not
/// normalized), but equality and hashing ignore ASCII case.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    /// Parse a complete MAC address, rejecting anything else
    pub fn parse(s: &str) -> Result<Self, MacParseError> {
        let trimmed = s.trim();
        if mac_regex_anchored().is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(MacParseError(s.to_string()))
        }
    }

    /// Extract the first MAC-shaped token from arbitrary text
    pub fn find_in(text: &str) -> Option<Self> {
        mac_regex().find(text).map(|m| Self(m.as_str().to_string()))
    }

    /// Get the address as it was observed
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl PartialEq for MacAddress {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for MacAddress {}

impl Hash for MacAddress {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = MacParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for MacAddress {
    type Error = MacParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.0
    }
}

/// Association between a client and a casting device, owned by the control plane
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pairing {
    /// MAC of the client that asked to cast
    pub client_mac: MacAddress,
    /// MAC of the room's casting device
    pub device_mac: MacAddress,
}

impl Pairing {
    /// Create a new pairing
    pub fn new(client_mac: MacAddress, device_mac: MacAddress) -> Self {
        Self {
            client_mac,
            device_mac,
        }
    }
}

impl fmt::Display for Pairing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.client_mac, self.device_mac)
    }
}

/// Forwarding strategy of the control plane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ForwardingMode {
    Auto,
    Userspace,
    Xdp,
    /// Local fallback when the control plane cannot be read; never written
    Unknown,
}

impl ForwardingMode {
    /// Modes the control plane accepts as input
    pub const WRITABLE: [ForwardingMode; 3] = [
        ForwardingMode::Auto,
        ForwardingMode::Userspace,
        ForwardingMode::Xdp,
    ];

    /// Whether this mode may be sent to the control plane
    pub fn is_writable(self) -> bool {
        !matches!(self, ForwardingMode::Unknown)
    }

    /// Wire name of the mode
    pub fn as_str(self) -> &'static str {
        match self {
            ForwardingMode::Auto => "Auto",
            ForwardingMode::Userspace => "Userspace",
            ForwardingMode::Xdp => "Xdp",
            ForwardingMode::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for ForwardingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ForwardingMode {
    type Err = ModeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ForwardingMode::Auto),
            "userspace" => Ok(ForwardingMode::Userspace),
            "xdp" => Ok(ForwardingMode::Xdp),
            "unknown" => Ok(ForwardingMode::Unknown),
            _ => Err(ModeParseError(s.to_string())),
        }
    }
}

/// Identifier of a room in the catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u32);

impl RoomId {
    /// Get the raw numeric id
    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RoomId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse().map(RoomId)
    }
}

impl From<u32> for RoomId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// A room and the casting device installed in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    /// Device MAC, absent until the room is configured
    #[serde(default)]
    pub device_mac: Option<MacAddress>,
}
