//! cast-core: Core abstractions and configuration for castpair
//!
//! This crate provides the shared domain types, the room catalogue
//! abstraction and the configuration structures used by the resolver,
//! the control-plane client and the server.

pub mod catalog;
pub mod config;
pub mod error;
pub mod types;

pub use catalog::{InMemoryCatalog, RoomCatalog};
pub use error::{ConfigError, MacParseError, ModeParseError};
pub use types::{ForwardingMode, MacAddress, Pairing, Room, RoomId};
