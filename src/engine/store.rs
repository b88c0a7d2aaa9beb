use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tokio::sync::RwLock;
use ulid::Ulid;

use crate::model::*;

use super::SharedRoomState;

/// In-memory state: every live room behind its own lock, plus the indexes
/// that make name and booking lookups O(1).
pub struct Store {
    rooms: DashMap<Ulid, SharedRoomState>,
    /// Exact-name index. Doubles as the uniqueness reservation: map entry
    /// insertion is atomic, so two concurrent creates cannot both win a name.
    names: DashMap<String, Ulid>,
    /// Reverse lookup: booking id to owning room id.
    booking_to_room: DashMap<Ulid, Ulid>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            names: DashMap::new(),
            booking_to_room: DashMap::new(),
        }
    }

    // ── Room registry ────────────────────────────────────────

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn contains_room(&self, id: &Ulid) -> bool {
        self.rooms.contains_key(id)
    }

    pub fn room(&self, id: &Ulid) -> Option<SharedRoomState> {
        self.rooms.get(id).map(|e| e.value().clone())
    }

    pub fn room_id_by_name(&self, name: &str) -> Option<Ulid> {
        self.names.get(name).map(|e| *e.value())
    }

    pub fn rooms(&self) -> Vec<SharedRoomState> {
        self.rooms.iter().map(|e| e.value().clone()).collect()
    }

    /// Claim `name` for `id`. Fails when any live room already holds it.
    pub fn reserve_name(&self, name: &str, id: Ulid) -> bool {
        match self.names.entry(name.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(id);
                true
            }
        }
    }

    /// Release a reservation that never became durable (WAL append failed).
    pub fn release_name(&self, name: &str, id: &Ulid) {
        self.names.remove_if(name, |_, owner| owner == id);
    }

    pub fn insert_room(&self, rs: RoomState) {
        self.names.insert(rs.name.clone(), rs.id);
        self.rooms.insert(rs.id, Arc::new(RwLock::new(rs)));
    }

    pub fn remove_room(&self, id: &Ulid, name: &str) {
        self.rooms.remove(id);
        self.names.remove_if(name, |_, owner| owner == id);
    }

    // ── Booking index ────────────────────────────────────────

    pub fn room_for_booking(&self, booking_id: &Ulid) -> Option<Ulid> {
        self.booking_to_room.get(booking_id).map(|e| *e.value())
    }

    pub fn booking_count(&self) -> usize {
        self.booking_to_room.len()
    }

    // ── Event application ────────────────────────────────────

    /// Fold a per-room event into its state and keep the side indexes in
    /// step. No locking here: the caller holds the room's write lock.
    pub fn apply(&self, rs: &mut RoomState, event: &Event) {
        match event {
            Event::RoomRenamed { id, name } => {
                self.names.remove_if(&rs.name, |_, owner| owner == id);
                rs.name = name.clone();
                self.names.insert(name.clone(), *id);
            }
            Event::BookingCreated {
                id,
                room_id,
                requester,
                slot,
                at,
            } => {
                rs.insert_booking(Booking {
                    id: *id,
                    room_id: *room_id,
                    requester: requester.clone(),
                    slot: *slot,
                    created_at: *at,
                    updated_at: *at,
                });
                self.booking_to_room.insert(*id, *room_id);
            }
            Event::BookingUpdated {
                id,
                requester,
                slot,
                at,
                ..
            } => {
                // Remove + reinsert keeps the (date, start) ordering intact.
                if let Some(mut booking) = rs.remove_booking(*id) {
                    booking.requester = requester.clone();
                    booking.slot = *slot;
                    booking.updated_at = *at;
                    rs.insert_booking(booking);
                }
            }
            Event::BookingCancelled { id, .. } => {
                rs.remove_booking(*id);
                self.booking_to_room.remove(id);
            }
            // Room creation/deletion is handled at the map level, not here.
            Event::RoomCreated { .. } | Event::RoomDeleted { .. } => {}
        }
    }
}
