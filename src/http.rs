use std::sync::Arc;

use axum::extract::{MatchedPath, Path, Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::engine::{Engine, EngineError};
use crate::model::{Booking, Slot};

/// Longest accepted room name. Surface cap only; the engine has no opinion.
const MAX_ROOM_NAME_LEN: usize = 120;
/// Longest accepted requester contact string.
const MAX_REQUESTER_LEN: usize = 254;

pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route(
            "/rooms/:id",
            get(get_room).put(rename_room).delete(delete_room),
        )
        .route("/bookings", get(list_bookings_for_day).post(create_booking))
        .route("/bookings/:id", put(update_booking).delete(cancel_booking))
        .layer(middleware::from_fn(track_request))
        .with_state(engine)
}

// ── Request / response bodies ───────────────────────────────────

#[derive(Debug, Deserialize)]
struct RoomRequest {
    name: String,
}

#[derive(Debug, Serialize)]
struct RoomResponse {
    id: Ulid,
    name: String,
}

#[derive(Debug, Deserialize)]
struct BookingRequest {
    room: String,
    requester: String,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    id: Ulid,
    /// Echoes the name the caller sent (or queried), not the stored link.
    room: String,
    requester: String,
    date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl BookingResponse {
    fn from_booking(room: &str, b: &Booking) -> Self {
        Self {
            id: b.id,
            room: room.to_string(),
            requester: b.requester.clone(),
            date: b.slot.date,
            start: b.slot.start,
            end: b.slot.end,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BookingsQuery {
    room: String,
    date: NaiveDate,
}

// ── Error mapping ───────────────────────────────────────────────

/// Transport-level error: a status code plus a stable machine-readable code
/// and a human-readable message, serialized as `{"code", "message"}`.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: "BAD_REQUEST",
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = self.code, message = %self.message, "request failed");
        }
        let body = ErrorBody {
            code: self.code,
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let (status, code) = match &err {
            EngineError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            EngineError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            EngineError::InvalidDuration(_) => (StatusCode::BAD_REQUEST, "INVALID_DURATION"),
            EngineError::Overlap(_) => (StatusCode::CONFLICT, "OVERLAP"),
            EngineError::PastSchedule(_) => (StatusCode::BAD_REQUEST, "PAST_SCHEDULE"),
            EngineError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE"),
        };
        Self {
            status,
            code,
            message: err.to_string(),
        }
    }
}

// ── Surface preconditions ───────────────────────────────────────

fn check_room_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("room name must not be blank"));
    }
    if name.len() > MAX_ROOM_NAME_LEN {
        return Err(ApiError::bad_request("room name too long"));
    }
    Ok(())
}

fn check_booking_request(req: &BookingRequest) -> Result<(), ApiError> {
    check_room_name(&req.room)?;
    if req.requester.trim().is_empty() {
        return Err(ApiError::bad_request("requester must not be blank"));
    }
    if req.requester.len() > MAX_REQUESTER_LEN {
        return Err(ApiError::bad_request("requester too long"));
    }
    // Structural shape only; rule-level admission lives in the engine.
    if req.start >= req.end {
        return Err(ApiError::bad_request("start must be before end"));
    }
    Ok(())
}

// ── Room handlers ───────────────────────────────────────────────

async fn create_room(
    State(engine): State<Arc<Engine>>,
    Json(req): Json<RoomRequest>,
) -> Result<(StatusCode, Json<RoomResponse>), ApiError> {
    check_room_name(&req.name)?;
    let info = engine.create_room(&req.name).await?;
    Ok((
        StatusCode::CREATED,
        Json(RoomResponse {
            id: info.id,
            name: info.name,
        }),
    ))
}

async fn list_rooms(State(engine): State<Arc<Engine>>) -> Json<Vec<RoomResponse>> {
    let mut rooms: Vec<RoomResponse> = engine
        .list_rooms()
        .await
        .into_iter()
        .map(|r| RoomResponse {
            id: r.id,
            name: r.name,
        })
        .collect();
    rooms.sort_by(|a, b| a.name.cmp(&b.name));
    Json(rooms)
}

async fn get_room(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<Ulid>,
) -> Result<Json<RoomResponse>, ApiError> {
    let info = engine.get_room(id).await?;
    Ok(Json(RoomResponse {
        id: info.id,
        name: info.name,
    }))
}

async fn rename_room(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<Ulid>,
    Json(req): Json<RoomRequest>,
) -> Result<Json<RoomResponse>, ApiError> {
    check_room_name(&req.name)?;
    let info = engine.rename_room(id, &req.name).await?;
    Ok(Json(RoomResponse {
        id: info.id,
        name: info.name,
    }))
}

async fn delete_room(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<Ulid>,
) -> Result<StatusCode, ApiError> {
    engine.delete_room(id).await?;
    Ok(StatusCode::OK)
}

// ── Booking handlers ────────────────────────────────────────────

async fn create_booking(
    State(engine): State<Arc<Engine>>,
    Json(req): Json<BookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    check_booking_request(&req)?;
    let slot = Slot::new(req.date, req.start, req.end);
    let booking = engine
        .create_booking(&req.room, &req.requester, slot)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(BookingResponse::from_booking(&req.room, &booking)),
    ))
}

async fn list_bookings_for_day(
    State(engine): State<Arc<Engine>>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let bookings = engine.get_bookings(&query.room, query.date).await?;
    let responses = bookings
        .iter()
        .map(|b| BookingResponse::from_booking(&query.room, b))
        .collect();
    Ok(Json(responses))
}

async fn update_booking(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<Ulid>,
    Json(req): Json<BookingRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    check_booking_request(&req)?;
    let slot = Slot::new(req.date, req.start, req.end);
    let booking = engine
        .update_booking(id, &req.room, &req.requester, slot)
        .await?;
    Ok(Json(BookingResponse::from_booking(&req.room, &booking)))
}

async fn cancel_booking(
    State(engine): State<Arc<Engine>>,
    Path(id): Path<Ulid>,
) -> Result<StatusCode, ApiError> {
    engine.cancel_booking(id).await?;
    Ok(StatusCode::OK)
}

// ── Metrics middleware ──────────────────────────────────────────

/// Per-request counter and latency histogram, labeled by route template so
/// `/bookings/:id` stays one series regardless of the id.
async fn track_request(req: Request, next: Next) -> Response {
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let method = req.method().to_string();
    let start = std::time::Instant::now();

    let response = next.run(req).await;

    metrics::counter!(
        crate::observability::REQUESTS_TOTAL,
        "route" => route.clone(),
        "method" => method.clone(),
        "status" => response.status().as_u16().to_string(),
    )
    .increment(1);
    metrics::histogram!(
        crate::observability::REQUEST_DURATION_SECONDS,
        "route" => route,
        "method" => method,
    )
    .record(start.elapsed().as_secs_f64());

    response
}
