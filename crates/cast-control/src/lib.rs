//! cast-control: Forwarding control-plane client
//!
//! The forwarding service owns all pairing and mode state. This crate only
//! issues single-shot HTTP calls against its JSON API:
//!
//! - `GET /pairings`, `POST /pairings`, `DELETE /pairings` with
//!   `{"client_mac": ..., "device_mac": ...}`
//! - `GET /mode`, `POST /mode` with `{"mode": ...}`
//!
//! Reads degrade to safe defaults (an empty list, [`ForwardingMode::Unknown`])
//! so dashboards keep rendering through an outage. Writes report failures
//! to the caller and are never retried here.
//!
//! [`ForwardingMode::Unknown`]: cast_core::ForwardingMode::Unknown

pub mod client;
pub mod error;
pub mod mode;
pub mod pairings;

#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::ControlPlaneClient;
pub use error::ControlError;
pub use mode::ModeCoordinator;
pub use pairings::PairingCoordinator;
