//! Address resolver

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use cast_core::config::ResolverConfig;
use cast_core::MacAddress;

use crate::error::ResolveError;
use crate::neighbor::{CommandNeighborTable, NeighborTable, Platform};

/// Resolves client IPs to MAC addresses through a neighbor table
///
/// The strategy is fixed at construction. An unsupported platform yields a
/// resolver with no table, which answers every query with "not found"
/// without spawning anything.
#[derive(Clone)]
pub struct AddressResolver {
    table: Option<Arc<dyn NeighborTable>>,
    timeout: Duration,
}

impl AddressResolver {
    /// Create a resolver over the given table
    pub fn new(table: Arc<dyn NeighborTable>, timeout: Duration) -> Self {
        Self {
            table: Some(table),
            timeout,
        }
    }

    /// Create a resolver that never finds anything
    pub fn unsupported(timeout: Duration) -> Self {
        Self {
            table: None,
            timeout,
        }
    }

    /// Create a resolver for a platform identifier (e.g. `std::env::consts::OS`)
    pub fn for_platform_identifier(id: &str, timeout: Duration) -> Self {
        match Platform::from_identifier(id) {
            Some(platform) => {
                tracing::debug!("Using {:?} neighbor lookup for platform {:?}", platform, id);
                Self::new(Arc::new(CommandNeighborTable::for_platform(platform)), timeout)
            }
            None => {
                tracing::warn!(
                    "No neighbor lookup for platform {:?}; client MACs will not resolve",
                    id
                );
                Self::unsupported(timeout)
            }
        }
    }

    /// Create a resolver from configuration, detecting the platform unless overridden
    pub fn from_config(config: &ResolverConfig) -> Self {
        let platform = config
            .platform
            .as_deref()
            .unwrap_or(std::env::consts::OS);
        Self::for_platform_identifier(platform, config.timeout)
    }

    /// Whether a neighbor table is available at all
    pub fn is_supported(&self) -> bool {
        self.table.is_some()
    }

    /// Timeout applied to each lookup
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Look up the MAC for `ip`, reporting why it failed
    pub async fn lookup(&self, ip: IpAddr) -> Result<MacAddress, ResolveError> {
        let table = self.table.as_ref().ok_or(ResolveError::UnsupportedPlatform)?;
        let ip = ip.to_canonical();

        let output = tokio::time::timeout(self.timeout, table.lookup(ip))
            .await
            .map_err(|_| ResolveError::Timeout(self.timeout))??;

        MacAddress::find_in(&output).ok_or(ResolveError::NoMatch)
    }

    /// Look up the MAC for `ip`; every failure is logged and becomes `None`
    pub async fn resolve(&self, ip: IpAddr) -> Option<MacAddress> {
        match self.lookup(ip).await {
            Ok(mac) => {
                tracing::debug!("Resolved {} to {}", ip, mac);
                Some(mac)
            }
            Err(ResolveError::NoMatch) => {
                tracing::debug!("No neighbor entry for {}", ip);
                None
            }
            Err(e) => {
                tracing::warn!("Failed to resolve MAC for {}: {}", ip, e);
                None
            }
        }
    }
}

impl std::fmt::Debug for AddressResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressResolver")
            .field("supported", &self.is_supported())
            .field("timeout", &self.timeout)
            .finish()
    }
}
