//! Room catalogue
//!
//! The pairing flow only ever reads rooms, so the catalogue is a small
//! trait that a database-backed store can implement. [`InMemoryCatalog`]
//! is seeded from configuration and is what the server ships with.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::types::{Room, RoomId};

/// Read access to the rooms known to the deployment
#[async_trait]
pub trait RoomCatalog: Send + Sync {
    /// Get a room by id
    async fn get(&self, id: RoomId) -> Option<Room>;

    /// List all rooms, ordered by id
    async fn list(&self) -> Vec<Room>;
}

/// Catalogue held in memory, indexed by room id
pub struct InMemoryCatalog {
    rooms: DashMap<RoomId, Room>,
}

impl InMemoryCatalog {
    /// Create an empty catalogue
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Create a catalogue holding the given rooms
    pub fn from_rooms(rooms: impl IntoIterator<Item = Room>) -> Self {
        let catalog = Self::new();
        for room in rooms {
            catalog.insert(room);
        }
        catalog
    }

    /// Add or replace a room
    pub fn insert(&self, room: Room) -> Option<Room> {
        self.rooms.insert(room.id, room)
    }
}

impl Default for InMemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomCatalog for InMemoryCatalog {
    async fn get(&self, id: RoomId) -> Option<Room> {
        self.rooms.get(&id).map(|r| r.value().clone())
    }

    async fn list(&self) -> Vec<Room> {
        let mut rooms: Vec<Room> = self.rooms.iter().map(|r| r.value().clone()).collect();
        rooms.sort_by_key(|room| room.id);
        rooms
    }
}
