//! cast-server: QR pairing service for room casting devices
//!
//! Each room displays a QR code carrying a signed link. Visiting the link
//! resolves the visitor's MAC address from the local neighbor table and
//! registers the pairing `{client, device}` with the forwarding control
//! plane. An admin JSON API exposes pairings, the forwarding mode and the
//! room catalogue.

pub mod flow;
pub mod http;
pub mod links;
pub mod qr;
pub mod state;

pub use flow::{PairingFailure, PairingFlow, PairingSuccess};
pub use links::{LinkSigner, PairingLinks};
pub use state::AppState;
