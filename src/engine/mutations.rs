use tracing::debug;
use ulid::Ulid;

use crate::model::*;

use super::validate;
use super::{Engine, EngineError};

impl Engine {
    /// Register a new room under a unique name.
    pub async fn create_room(&self, name: &str) -> Result<RoomInfo, EngineError> {
        let id = Ulid::new();
        // Claim the name first; the map entry is the uniqueness backstop
        // under concurrent creates.
        if !self.store.reserve_name(name, id) {
            return Err(EngineError::Conflict(format!(
                "room name \"{name}\" is taken"
            )));
        }
        let event = Event::RoomCreated {
            id,
            name: name.to_string(),
        };
        if let Err(e) = self.wal_append(&event).await {
            self.store.release_name(name, &id);
            return Err(e);
        }
        self.store.insert_room(RoomState::new(id, name.to_string()));
        metrics::gauge!(crate::observability::ROOMS_LIVE).set(self.store.room_count() as f64);
        debug!(%id, name, "room created");
        Ok(RoomInfo {
            id,
            name: name.to_string(),
        })
    }

    /// Rename a room. The name check runs against every live room including
    /// this one, so renaming a room to its current name reports a conflict.
    pub async fn rename_room(&self, id: Ulid, name: &str) -> Result<RoomInfo, EngineError> {
        let rs = self
            .store
            .room(&id)
            .ok_or_else(|| EngineError::NotFound(format!("room {id}")))?;
        let mut guard = rs.write().await;
        // The room may have been deleted between the lookup and the lock.
        if !self.store.contains_room(&id) {
            return Err(EngineError::NotFound(format!("room {id}")));
        }
        if !self.store.reserve_name(name, id) {
            return Err(EngineError::Conflict(format!(
                "room name \"{name}\" is taken"
            )));
        }
        let event = Event::RoomRenamed {
            id,
            name: name.to_string(),
        };
        if let Err(e) = self.wal_append(&event).await {
            self.store.release_name(name, &id);
            return Err(e);
        }
        self.store.apply(&mut guard, &event);
        debug!(%id, name, "room renamed");
        Ok(RoomInfo {
            id,
            name: name.to_string(),
        })
    }

    /// Remove a room. Rejected while any booking still references it.
    pub async fn delete_room(&self, id: Ulid) -> Result<(), EngineError> {
        let rs = self
            .store
            .room(&id)
            .ok_or_else(|| EngineError::NotFound(format!("room {id}")))?;
        // Write lock: no booking can be admitted while the emptiness check
        // and the removal are in flight.
        let guard = rs.write().await;
        if !self.store.contains_room(&id) {
            return Err(EngineError::NotFound(format!("room {id}")));
        }
        if guard.has_bookings() {
            return Err(EngineError::Conflict(format!(
                "room \"{}\" has existing bookings",
                guard.name
            )));
        }
        let event = Event::RoomDeleted { id };
        self.wal_append(&event).await?;
        self.store.remove_room(&id, &guard.name);
        metrics::gauge!(crate::observability::ROOMS_LIVE).set(self.store.room_count() as f64);
        debug!(%id, name = %guard.name, "room deleted");
        Ok(())
    }

    /// Book a room (referenced by name) for one slot. Admission and commit
    /// run under the room's write lock: no interleaved admission can slip a
    /// conflicting booking into the same schedule.
    pub async fn create_booking(
        &self,
        room_name: &str,
        requester: &str,
        slot: Slot,
    ) -> Result<Booking, EngineError> {
        let room_id = self
            .store
            .room_id_by_name(room_name)
            .ok_or_else(|| EngineError::NotFound(format!("room \"{room_name}\"")))?;
        let rs = self
            .store
            .room(&room_id)
            .ok_or_else(|| EngineError::NotFound(format!("room \"{room_name}\"")))?;
        let mut guard = rs.write().await;
        // The room may have been deleted between the name lookup and the lock.
        if !self.store.contains_room(&room_id) {
            return Err(EngineError::NotFound(format!("room \"{room_name}\"")));
        }

        let now = self.clock.now();
        validate::admit(&guard, &slot, None, now)?;

        let id = Ulid::new();
        let event = Event::BookingCreated {
            id,
            room_id,
            requester: requester.to_string(),
            slot,
            at: now,
        };
        self.persist_and_apply(&mut guard, &event).await?;
        metrics::counter!(crate::observability::BOOKINGS_CREATED_TOTAL).increment(1);
        debug!(booking = %id, room = room_name, date = %slot.date, "booking created");
        Ok(Booking {
            id,
            room_id,
            requester: requester.to_string(),
            slot,
            created_at: now,
            updated_at: now,
        })
    }

    /// Re-admit an existing booking with new fields. The slot is checked
    /// against the schedule of the room named in the request, minus the
    /// booking's own current interval. The stored room link never changes:
    /// naming a different room validates there while the booking stays put.
    pub async fn update_booking(
        &self,
        id: Ulid,
        room_name: &str,
        requester: &str,
        slot: Slot,
    ) -> Result<Booking, EngineError> {
        let owner_id = self
            .store
            .room_for_booking(&id)
            .ok_or_else(|| EngineError::NotFound(format!("booking {id}")))?;
        let named_id = self
            .store
            .room_id_by_name(room_name)
            .ok_or_else(|| EngineError::NotFound(format!("room \"{room_name}\"")))?;
        let owner = self
            .store
            .room(&owner_id)
            .ok_or_else(|| EngineError::NotFound(format!("booking {id}")))?;

        let now = self.clock.now();
        let event = Event::BookingUpdated {
            id,
            room_id: owner_id,
            requester: requester.to_string(),
            slot,
            at: now,
        };

        // Write the owner; read the named room when it differs. Locks are
        // acquired in id order so concurrent updates cannot deadlock.
        let (mut owner_guard, named_guard) = if named_id == owner_id {
            (owner.write_owned().await, None)
        } else {
            let named = self
                .store
                .room(&named_id)
                .ok_or_else(|| EngineError::NotFound(format!("room \"{room_name}\"")))?;
            if owner_id < named_id {
                let o = owner.write_owned().await;
                let n = named.read_owned().await;
                (o, Some(n))
            } else {
                let n = named.read_owned().await;
                let o = owner.write_owned().await;
                (o, Some(n))
            }
        };

        let created_at = owner_guard
            .booking(id)
            .map(|b| b.created_at)
            .ok_or_else(|| EngineError::NotFound(format!("booking {id}")))?;

        match &named_guard {
            Some(named) => validate::admit(named, &slot, Some(id), now)?,
            None => validate::admit(&owner_guard, &slot, Some(id), now)?,
        }

        self.persist_and_apply(&mut owner_guard, &event).await?;
        metrics::counter!(crate::observability::BOOKINGS_UPDATED_TOTAL).increment(1);
        debug!(booking = %id, room = room_name, date = %slot.date, "booking updated");
        Ok(Booking {
            id,
            room_id: owner_id,
            requester: requester.to_string(),
            slot,
            created_at,
            updated_at: now,
        })
    }

    /// Cancel a booking. Bookings dated before today are history and stay.
    pub async fn cancel_booking(&self, id: Ulid) -> Result<(), EngineError> {
        let room_id = self
            .store
            .room_for_booking(&id)
            .ok_or_else(|| EngineError::NotFound(format!("booking {id}")))?;
        let rs = self
            .store
            .room(&room_id)
            .ok_or_else(|| EngineError::NotFound(format!("booking {id}")))?;
        let mut guard = rs.write().await;
        let booking = guard
            .booking(id)
            .ok_or_else(|| EngineError::NotFound(format!("booking {id}")))?;
        // Date granularity only: a booking from earlier today is cancelable.
        if booking.slot.date < self.clock.now().date() {
            return Err(EngineError::Conflict(format!(
                "booking {id} is in the past and cannot be cancelled"
            )));
        }
        let event = Event::BookingCancelled { id, room_id };
        self.persist_and_apply(&mut guard, &event).await?;
        metrics::counter!(crate::observability::BOOKINGS_CANCELLED_TOTAL).increment(1);
        debug!(booking = %id, "booking cancelled");
        Ok(())
    }
}
