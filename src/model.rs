use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// A half-open time interval `[start, end)` on a single calendar date.
///
/// Half-open means a slot ending at 10:00 and a slot starting at 10:00 do
/// not overlap, so back-to-back bookings are always possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Slot {
    pub fn new(date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Self {
        Self { date, start, end }
    }

    /// Signed length in minutes; an inverted interval yields a negative value.
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Strict comparison on both edges: touching endpoints do not overlap,
    /// and slots on different dates never overlap.
    pub fn overlaps(&self, other: &Slot) -> bool {
        self.date == other.date && self.start < other.end && other.start < self.end
    }
}

/// A reservation of one room for one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    /// Owning room. Set at creation and never reassigned afterwards.
    pub room_id: Ulid,
    /// Contact string for whoever holds the reservation.
    pub requester: String,
    pub slot: Slot,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// All live bookings for one room, sorted by `(date, start)`.
///
/// The sort order makes per-date lookups a pair of binary searches and keeps
/// day listings already ordered by start time.
#[derive(Debug, Clone)]
pub struct RoomState {
    pub id: Ulid,
    pub name: String,
    pub bookings: Vec<Booking>,
}

impl RoomState {
    pub fn new(id: Ulid, name: String) -> Self {
        Self {
            id,
            name,
            bookings: Vec::new(),
        }
    }

    /// Insert a booking maintaining sort order by `(date, start)`.
    pub fn insert_booking(&mut self, booking: Booking) {
        let key = (booking.slot.date, booking.slot.start);
        let pos = self
            .bookings
            .binary_search_by_key(&key, |b| (b.slot.date, b.slot.start))
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    /// Remove a booking by id, returning it if present.
    pub fn remove_booking(&mut self, id: Ulid) -> Option<Booking> {
        if let Some(pos) = self.bookings.iter().position(|b| b.id == id) {
            Some(self.bookings.remove(pos))
        } else {
            None
        }
    }

    pub fn booking(&self, id: Ulid) -> Option<&Booking> {
        self.bookings.iter().find(|b| b.id == id)
    }

    /// The day's schedule as a contiguous sub-slice, ordered by start time.
    pub fn bookings_on(&self, date: NaiveDate) -> &[Booking] {
        let lo = self.bookings.partition_point(|b| b.slot.date < date);
        let hi = self.bookings.partition_point(|b| b.slot.date <= date);
        &self.bookings[lo..hi]
    }

    pub fn has_bookings(&self) -> bool {
        !self.bookings.is_empty()
    }
}

/// The event types — flat, no nesting. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    RoomCreated {
        id: Ulid,
        name: String,
    },
    RoomRenamed {
        id: Ulid,
        name: String,
    },
    RoomDeleted {
        id: Ulid,
    },
    BookingCreated {
        id: Ulid,
        room_id: Ulid,
        requester: String,
        slot: Slot,
        at: NaiveDateTime,
    },
    BookingUpdated {
        id: Ulid,
        room_id: Ulid,
        requester: String,
        slot: Slot,
        at: NaiveDateTime,
    },
    BookingCancelled {
        id: Ulid,
        room_id: Ulid,
    },
}

// ── Query result types ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub id: Ulid,
    pub name: String,
}
