mod error;
mod mutations;
mod queries;
mod store;
mod validate;

pub use error::EngineError;

use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::info;
use ulid::Ulid;

use crate::clock::Clock;
use crate::model::*;
use crate::wal::Wal;

use store::Store;

pub type SharedRoomState = Arc<RwLock<RoomState>>;

/// Booking engine: validates requests against per-room schedules and makes
/// admitted mutations durable before applying them.
///
/// Every room sits behind its own `RwLock`, so the validate-persist-apply
/// sequence for one room runs under a single write lock while unrelated
/// rooms proceed in parallel.
pub struct Engine {
    store: Store,
    /// Append serialization point. Room locks already order writers within a
    /// room; this keeps appends from different rooms from interleaving bytes.
    wal: Mutex<Wal>,
    clock: Arc<dyn Clock>,
}

impl Engine {
    /// Open the engine, replaying the WAL at `wal_path` to rebuild state.
    pub fn open(wal_path: &Path, clock: Arc<dyn Clock>) -> io::Result<Self> {
        let events = Wal::replay(wal_path)?;
        let wal = Wal::open(wal_path)?;

        let engine = Self {
            store: Store::new(),
            wal: Mutex::new(wal),
            clock,
        };

        // Replay events — we're the sole owner of these Arcs, so try_read/try_write
        // always succeed instantly (no contention). Never use blocking_read/blocking_write
        // here because open() may run inside an async context.
        for event in &events {
            match event {
                Event::RoomCreated { id, name } => {
                    engine.store.insert_room(RoomState::new(*id, name.clone()));
                }
                Event::RoomDeleted { id } => {
                    if let Some(rs) = engine.store.room(id) {
                        let guard = rs.try_read().expect("replay: uncontended read");
                        engine.store.remove_room(id, &guard.name);
                    }
                }
                other => {
                    if let Some(room_id) = event_room_id(other)
                        && let Some(rs) = engine.store.room(&room_id)
                    {
                        let mut guard = rs.try_write().expect("replay: uncontended write");
                        engine.store.apply(&mut guard, other);
                    }
                }
            }
        }

        if !events.is_empty() {
            info!(
                events = events.len(),
                rooms = engine.store.room_count(),
                bookings = engine.store.booking_count(),
                "replayed write-ahead log"
            );
        }

        Ok(engine)
    }

    /// Durably record the event, then fold it into the locked room state.
    /// The caller holds the room's write lock, so validation and commit are
    /// atomic with respect to other writers of the same room.
    pub(super) async fn persist_and_apply(
        &self,
        rs: &mut RoomState,
        event: &Event,
    ) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        self.store.apply(rs, event);
        Ok(())
    }

    async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let start = std::time::Instant::now();
        let mut wal = self.wal.lock().await;
        let result = wal
            .append(event)
            .map_err(|e| EngineError::Storage(e.to_string()));
        metrics::histogram!(crate::observability::WAL_APPEND_DURATION_SECONDS)
            .record(start.elapsed().as_secs_f64());
        result
    }
}

/// Extract the owning room id from a per-room event.
fn event_room_id(event: &Event) -> Option<Ulid> {
    match event {
        Event::BookingCreated { room_id, .. }
        | Event::BookingUpdated { room_id, .. }
        | Event::BookingCancelled { room_id, .. } => Some(*room_id),
        Event::RoomRenamed { id, .. } => Some(*id),
        Event::RoomCreated { .. } | Event::RoomDeleted { .. } => None,
    }
}
