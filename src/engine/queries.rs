use chrono::NaiveDate;
use ulid::Ulid;

use crate::model::*;

use super::{Engine, EngineError};

impl Engine {
    /// Every live room, in no particular order.
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let mut rooms = Vec::with_capacity(self.store.room_count());
        for rs in self.store.rooms() {
            let guard = rs.read().await;
            rooms.push(RoomInfo {
                id: guard.id,
                name: guard.name.clone(),
            });
        }
        rooms
    }

    pub async fn get_room(&self, id: Ulid) -> Result<RoomInfo, EngineError> {
        let rs = self
            .store
            .room(&id)
            .ok_or_else(|| EngineError::NotFound(format!("room {id}")))?;
        let guard = rs.read().await;
        Ok(RoomInfo {
            id: guard.id,
            name: guard.name.clone(),
        })
    }

    /// Exact-name lookup (names are case-sensitive).
    pub async fn get_room_by_name(&self, name: &str) -> Result<RoomInfo, EngineError> {
        let id = self
            .store
            .room_id_by_name(name)
            .ok_or_else(|| EngineError::NotFound(format!("room \"{name}\"")))?;
        self.get_room(id).await
    }

    pub async fn get_booking(&self, id: Ulid) -> Result<Booking, EngineError> {
        let room_id = self
            .store
            .room_for_booking(&id)
            .ok_or_else(|| EngineError::NotFound(format!("booking {id}")))?;
        let rs = self
            .store
            .room(&room_id)
            .ok_or_else(|| EngineError::NotFound(format!("booking {id}")))?;
        let guard = rs.read().await;
        guard
            .booking(id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("booking {id}")))
    }

    /// One room's schedule for one date, ordered by start time. A clear date
    /// is an empty list; only an unknown room is an error.
    pub async fn get_bookings(
        &self,
        room_name: &str,
        date: NaiveDate,
    ) -> Result<Vec<Booking>, EngineError> {
        let id = self
            .store
            .room_id_by_name(room_name)
            .ok_or_else(|| EngineError::NotFound(format!("room \"{room_name}\"")))?;
        let rs = self
            .store
            .room(&id)
            .ok_or_else(|| EngineError::NotFound(format!("room \"{room_name}\"")))?;
        let guard = rs.read().await;
        Ok(guard.bookings_on(date).to_vec())
    }

    /// Every live booking across all rooms, ordered by `(date, start)`
    /// within each room.
    pub async fn list_bookings(&self) -> Vec<Booking> {
        let mut bookings = Vec::new();
        for rs in self.store.rooms() {
            let guard = rs.read().await;
            bookings.extend_from_slice(&guard.bookings);
        }
        bookings
    }
}
