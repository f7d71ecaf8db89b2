//! HTTP adapter: axum routes over the engine. Handlers translate requests
//! into engine calls and engine errors into status codes; no booking logic
//! lives here.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{FromRequestParts, MatchedPath, Path, Query, Request, State};
use axum::http::{StatusCode, header, request::Parts};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router, async_trait};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use ulid::Ulid;

use crate::auth::{Identity, TokenAuth};
use crate::engine::{Engine, EngineError};
use crate::model::{RoomType, Stay};
use crate::observability;
use crate::payment::CardDetails;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub auth: Arc<TokenAuth>,
}

pub fn router(engine: Arc<Engine>, auth: Arc<TokenAuth>) -> Router {
    let state = AppState { engine, auth };
    Router::new()
        .route("/health", get(health))
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/available", get(available_rooms))
        .route("/rooms/:id", get(get_room).delete(delete_room))
        .route("/bookings", get(list_bookings).post(create_booking))
        .route("/bookings/:id", get(get_booking).delete(delete_booking))
        .route(
            "/bookings/:id/payment",
            get(get_payment).post(create_payment),
        )
        .route_layer(axum::middleware::from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn track_metrics(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());
    let method = req.method().to_string();

    let response = next.run(req).await;

    let status = response.status().as_u16().to_string();
    metrics::counter!(
        observability::REQUESTS_TOTAL,
        "route" => route.clone(),
        "method" => method.clone(),
        "status" => status
    )
    .increment(1);
    metrics::histogram!(
        observability::REQUEST_DURATION_SECONDS,
        "route" => route,
        "method" => method
    )
    .record(start.elapsed().as_secs_f64());
    response
}

// ── Errors ──────────────────────────────────────────────────────

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "missing or invalid bearer token")
    }

    fn forbidden() -> Self {
        Self::new(StatusCode::FORBIDDEN, "admin access required")
    }
}

impl From<EngineError> for ApiError {
    fn from(e: EngineError) -> Self {
        let status = match &e {
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::AlreadyExists(_)
            | EngineError::RoomNumberTaken(_)
            | EngineError::BookingConflict(_)
            | EngineError::PaymentAlreadyCompleted(_)
            | EngineError::PaymentInProgress(_) => StatusCode::CONFLICT,
            EngineError::PaymentDeclined(_) => StatusCode::PAYMENT_REQUIRED,
            EngineError::InvalidInput(_) | EngineError::LimitExceeded(_) => {
                StatusCode::BAD_REQUEST
            }
            EngineError::WalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {e}");
        }
        Self::new(status, e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

// ── Authentication ──────────────────────────────────────────────

/// Bearer-token extractor. Every route except /health requires it.
#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));
        match token.and_then(|t| state.auth.authenticate(t)) {
            Some(identity) => Ok(identity),
            None => {
                metrics::counter!(observability::AUTH_FAILURES_TOTAL).increment(1);
                Err(ApiError::unauthorized())
            }
        }
    }
}

fn parse_id(raw: &str) -> Result<Ulid, ApiError> {
    Ulid::from_string(raw).map_err(|_| ApiError::bad_request("malformed id"))
}

// ── Request bodies and queries ──────────────────────────────────

#[derive(Deserialize)]
struct CreateRoomRequest {
    room_number: Option<String>,
    room_type: RoomType,
    price_per_night: Decimal,
}

#[derive(Deserialize)]
struct CreateBookingRequest {
    room_id: String,
    check_in_date: NaiveDate,
    check_out_date: NaiveDate,
}

#[derive(Deserialize)]
struct PaymentRequest {
    card_number: String,
    card_expiry: String,
    card_cvv: String,
}

#[derive(Deserialize)]
struct AvailabilityQuery {
    check_in_date: Option<NaiveDate>,
    check_out_date: Option<NaiveDate>,
    room_type: Option<RoomType>,
    #[serde(default)]
    group_by_type: bool,
}

// ── Handlers ────────────────────────────────────────────────────

async fn health() -> &'static str {
    "ok"
}

async fn list_rooms(
    State(state): State<AppState>,
    _identity: Identity,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.engine.list_rooms().await))
}

async fn create_room(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<CreateRoomRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !identity.admin {
        return Err(ApiError::forbidden());
    }
    let room = state
        .engine
        .create_room(Ulid::new(), req.room_number, req.room_type, req.price_per_night)
        .await?;
    Ok((StatusCode::CREATED, Json(room)))
}

async fn get_room(
    State(state): State<AppState>,
    _identity: Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let room = state.engine.get_room_info(parse_id(&id)?).await?;
    Ok(Json(room))
}

async fn delete_room(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !identity.admin {
        return Err(ApiError::forbidden());
    }
    state.engine.delete_room(parse_id(&id)?).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn available_rooms(
    State(state): State<AppState>,
    _identity: Identity,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Response, ApiError> {
    let (Some(check_in), Some(check_out)) = (query.check_in_date, query.check_out_date) else {
        return Err(ApiError::bad_request(
            "check_in_date and check_out_date are required",
        ));
    };
    let stay = Stay {
        check_in,
        check_out,
    };
    if query.group_by_type {
        let grouped = state
            .engine
            .available_rooms_by_type(&stay, query.room_type)
            .await?;
        Ok(Json(grouped).into_response())
    } else {
        let rooms = state.engine.available_rooms(&stay, query.room_type).await?;
        Ok(Json(rooms).into_response())
    }
}

async fn list_bookings(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.engine.list_bookings(&identity).await))
}

async fn create_booking(
    State(state): State<AppState>,
    identity: Identity,
    Json(req): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let room_id = parse_id(&req.room_id)?;
    let stay = Stay {
        check_in: req.check_in_date,
        check_out: req.check_out_date,
    };
    let booking = state
        .engine
        .create_booking(Ulid::new(), room_id, &identity, stay)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

async fn get_booking(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let booking = state.engine.get_booking(parse_id(&id)?, &identity).await?;
    Ok(Json(booking))
}

async fn delete_booking(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .engine
        .delete_booking(parse_id(&id)?, &identity)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_payment(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    Json(req): Json<PaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let card = CardDetails {
        number: req.card_number,
        expiry: req.card_expiry,
        cvv: req.card_cvv,
    };
    let payment = state
        .engine
        .record_payment(parse_id(&id)?, &identity, &card)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

async fn get_payment(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = state.engine.get_payment(parse_id(&id)?, &identity).await?;
    Ok(Json(payment))
}
