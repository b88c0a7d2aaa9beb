use ulid::Ulid;

use crate::model::Slot;

#[derive(Debug)]
pub enum EngineError {
    NotFound(String),
    Conflict(String),
    InvalidDuration(i64),
    Overlap(Ulid),
    PastSchedule(Slot),
    Storage(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotFound(what) => write!(f, "not found: {what}"),
            EngineError::Conflict(msg) => write!(f, "conflict: {msg}"),
            EngineError::InvalidDuration(minutes) => write!(
                f,
                "invalid duration: {minutes} minutes (must be a positive multiple of 60)"
            ),
            EngineError::Overlap(id) => write!(f, "overlaps existing booking {id}"),
            EngineError::PastSchedule(slot) => {
                write!(f, "{} {} is in the past", slot.date, slot.start)
            }
            EngineError::Storage(e) => write!(f, "storage error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
