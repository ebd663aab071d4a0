//! Shared server state

use std::sync::Arc;

use anyhow::{Context, Result};

use cast_control::{ControlPlaneClient, ModeCoordinator, PairingCoordinator};
use cast_core::config::ServerConfig;
use cast_core::{InMemoryCatalog, RoomCatalog};
use cast_resolver::AddressResolver;

use crate::flow::PairingFlow;
use crate::links::{LinkSigner, PairingLinks};

/// State shared by every request handler
pub struct AppState {
    /// Room catalogue
    pub catalog: Arc<dyn RoomCatalog>,
    /// QR pairing flow
    pub flow: PairingFlow,
    /// Direct pairing access for the admin API
    pub pairings: PairingCoordinator,
    /// Forwarding mode access for the admin API
    pub modes: ModeCoordinator,
    /// Pairing link builder
    pub links: PairingLinks,
    /// Honor `Forwarded`/`X-Forwarded-*` headers
    pub trust_forwarded_headers: bool,
}

impl AppState {
    /// Assemble state from already-built components
    pub fn new(
        catalog: Arc<dyn RoomCatalog>,
        resolver: AddressResolver,
        control: ControlPlaneClient,
        links: PairingLinks,
        trust_forwarded_headers: bool,
    ) -> Self {
        let pairings = PairingCoordinator::new(control.clone());
        let flow = PairingFlow::new(Arc::clone(&catalog), resolver, pairings.clone());

        Self {
            catalog,
            flow,
            pairings,
            modes: ModeCoordinator::new(control),
            links,
            trust_forwarded_headers,
        }
    }

    /// Build state from a validated configuration
    pub fn from_config(config: &ServerConfig) -> Result<Self> {
        let rooms = config.catalog_rooms().context("Invalid room list")?;
        tracing::info!("Loaded {} rooms", rooms.len());
        let catalog: Arc<dyn RoomCatalog> = Arc::new(InMemoryCatalog::from_rooms(rooms));

        let resolver = AddressResolver::from_config(&config.resolver);
        if !resolver.is_supported() {
            tracing::warn!("No neighbor table on this platform - clients will never resolve");
        }

        let control = ControlPlaneClient::from_config(&config.control_plane)
            .context("Failed to create control plane client")?;
        tracing::info!("Control plane at {}", control.base_url());

        let signer = match &config.link_secret {
            Some(secret) => LinkSigner::new(secret),
            None => {
                tracing::warn!(
                    "No link_secret configured - pairing links expire when the server restarts"
                );
                LinkSigner::random()
            }
        };
        let public_origin = config.public_origin_url().context("Invalid public_origin")?;
        let links = PairingLinks::new(signer, public_origin);

        Ok(Self::new(
            catalog,
            resolver,
            control,
            links,
            config.trust_forwarded_headers,
        ))
    }
}
