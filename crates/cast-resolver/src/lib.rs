//! cast-resolver: Client MAC resolution for castpair
//!
//! Turns the IP address a request arrived from into the client's link-layer
//! address by querying the host's neighbor (ARP/NDP) table.
//!
//! Neighbor tables are filled lazily and only hold hosts on the local
//! segment that recently talked to this machine, so a miss is an ordinary
//! outcome. Callers get `None` from [`AddressResolver::resolve`] and are
//! expected to show the user why, not treat it as a fault.

pub mod error;
pub mod neighbor;
pub mod resolver;

pub use error::ResolveError;
pub use neighbor::{CommandNeighborTable, NeighborTable, Platform};
pub use resolver::AddressResolver;
