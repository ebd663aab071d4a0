//! QR pairing flow
//!
//! One attempt per visit to a pairing link:
//!
//! 1. look up the room and its device MAC
//! 2. resolve the visiting client's MAC from its IP
//! 3. register `{client, device}` with the control plane
//!
//! Each step either advances or ends the attempt with a [`PairingFailure`].
//! Nothing is kept between attempts.

use std::net::IpAddr;
use std::sync::Arc;

use thiserror::Error;

use cast_control::{ControlError, PairingCoordinator};
use cast_core::{MacAddress, Pairing, Room, RoomCatalog, RoomId};
use cast_resolver::AddressResolver;

/// A completed pairing
#[derive(Debug, Clone)]
pub struct PairingSuccess {
    pub room: Room,
    pub pairing: Pairing,
}

/// Why a pairing attempt ended without a pairing
#[derive(Error, Debug)]
pub enum PairingFailure {
    /// No such room
    #[error("Room {0} not found")]
    RoomNotFound(RoomId),

    /// The room exists but has no casting device yet
    #[error("Room {0} has no casting device configured")]
    DeviceNotConfigured(RoomId),

    /// The client's IP has no neighbor-table entry
    #[error(
        "Could not determine the MAC address of your device ({ip}). \
         This usually means your device is on a different network or subnet \
         than the casting system; connect to the room's network and scan again."
    )]
    UnresolvedClient { ip: IpAddr },

    /// The control plane did not accept the pairing
    #[error("The casting system could not register the pairing: {0}")]
    Remote(#[from] ControlError),
}

impl PairingFailure {
    /// Room missing or not configured
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PairingFailure::RoomNotFound(_) | PairingFailure::DeviceNotConfigured(_)
        )
    }
}

/// Runs pairing attempts against a catalogue, resolver and control plane
#[derive(Clone)]
pub struct PairingFlow {
    catalog: Arc<dyn RoomCatalog>,
    resolver: AddressResolver,
    pairings: PairingCoordinator,
}

impl PairingFlow {
    pub fn new(
        catalog: Arc<dyn RoomCatalog>,
        resolver: AddressResolver,
        pairings: PairingCoordinator,
    ) -> Self {
        Self {
            catalog,
            resolver,
            pairings,
        }
    }

    /// Pair the client at `client_ip` with the device in `room_id`
    pub async fn pair(
        &self,
        room_id: RoomId,
        client_ip: IpAddr,
    ) -> Result<PairingSuccess, PairingFailure> {
        let (room, device_mac) = self.lookup_device(room_id).await?;
        let client_mac = self.resolve_client(client_ip).await?;

        let pairing = Pairing::new(client_mac, device_mac);
        self.pairings.add(&pairing).await?;

        tracing::info!("Paired {} with room {} ({})", pairing.client_mac, room.id, room.name);
        Ok(PairingSuccess { room, pairing })
    }

    async fn lookup_device(&self, room_id: RoomId) -> Result<(Room, MacAddress), PairingFailure> {
        let room = self
            .catalog
            .get(room_id)
            .await
            .ok_or(PairingFailure::RoomNotFound(room_id))?;

        match room.device_mac.clone() {
            Some(mac) => Ok((room, mac)),
            None => Err(PairingFailure::DeviceNotConfigured(room_id)),
        }
    }

    async fn resolve_client(&self, client_ip: IpAddr) -> Result<MacAddress, PairingFailure> {
        self.resolver
            .resolve(client_ip)
            .await
            .ok_or(PairingFailure::UnresolvedClient { ip: client_ip })
    }
}

impl std::fmt::Debug for PairingFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PairingFlow")
            .field("resolver", &self.resolver)
            .field("pairings", &self.pairings)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_messages_are_distinct() {
        let unresolved = PairingFailure::UnresolvedClient {
            ip: "10.9.8.7".parse().unwrap(),
        };
        let remote = PairingFailure::Remote(ControlError::Rejected { status: 503 });

        assert!(unresolved.to_string().contains("10.9.8.7"));
        assert!(unresolved.to_string().contains("subnet"));
        assert!(!remote.to_string().contains("subnet"));
        assert_ne!(unresolved.to_string(), remote.to_string());
    }

    #[test]
    fn test_not_found_kinds() {
        assert!(PairingFailure::RoomNotFound(RoomId(1)).is_not_found());
        assert!(PairingFailure::DeviceNotConfigured(RoomId(1)).is_not_found());
        assert!(!PairingFailure::UnresolvedClient {
            ip: "10.0.0.1".parse().unwrap()
        }
        .is_not_found());
    }
}
