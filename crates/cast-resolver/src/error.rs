//! Resolver error types

use std::time::Duration;
use thiserror::Error;

/// Why a client address could not be resolved
///
/// Every variant maps to "not found" for the pairing flow; they exist so
/// logs can tell a missing `arp` binary from an empty table.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No neighbor-table query is known for this platform
    #[error("Neighbor lookup is not supported on this platform")]
    UnsupportedPlatform,

    /// The lookup tool could not be started
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Reading the tool's output failed
    #[error("I/O error during neighbor lookup: {0}")]
    Io(#[from] std::io::Error),

    /// The tool did not finish in time and was killed
    #[error("Neighbor lookup timed out after {0:?}")]
    Timeout(Duration),

    /// The tool ran but printed no MAC address
    #[error("No MAC address in neighbor table output")]
    NoMatch,
}
