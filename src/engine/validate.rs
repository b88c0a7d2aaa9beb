use chrono::NaiveDateTime;
use ulid::Ulid;

use crate::model::{RoomState, Slot};

use super::EngineError;

/// Minimum bookable unit, in minutes. Durations must be a whole multiple of it.
pub(crate) const SLOT_UNIT_MINUTES: i64 = 60;

/// A slot is admissible only if its date is after today, or it is today and
/// starts at or after the current time.
pub(crate) fn check_not_past(slot: &Slot, now: NaiveDateTime) -> Result<(), EngineError> {
    if slot.date < now.date() || (slot.date == now.date() && slot.start < now.time()) {
        return Err(EngineError::PastSchedule(*slot));
    }
    Ok(())
}

/// Inverted and zero-length slots fail here too: their duration is not a
/// positive multiple of the unit.
pub(crate) fn check_duration(slot: &Slot) -> Result<(), EngineError> {
    let minutes = slot.duration_minutes();
    if minutes < SLOT_UNIT_MINUTES || minutes % SLOT_UNIT_MINUTES != 0 {
        return Err(EngineError::InvalidDuration(minutes));
    }
    Ok(())
}

/// Scan the day's schedule for an intersection with `slot`. `exclude` drops
/// one booking from the comparison set: during an update a booking never
/// conflicts with its own prior interval.
pub(crate) fn check_no_overlap(
    rs: &RoomState,
    slot: &Slot,
    exclude: Option<Ulid>,
) -> Result<(), EngineError> {
    for booking in rs.bookings_on(slot.date) {
        if exclude == Some(booking.id) {
            continue;
        }
        if booking.slot.overlaps(slot) {
            return Err(EngineError::Overlap(booking.id));
        }
    }
    Ok(())
}

/// Admission gate for booking create and update. Checks run in a fixed order
/// and stop at the first failure: past, then duration, then overlap.
pub(crate) fn admit(
    rs: &RoomState,
    slot: &Slot,
    exclude: Option<Ulid>,
    now: NaiveDateTime,
) -> Result<(), EngineError> {
    check_not_past(slot, now)?;
    check_duration(slot)?;
    check_no_overlap(rs, slot, exclude)
}
