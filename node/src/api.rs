use autoraffle_execution::{Eligibility, Error, ErrorKind};
use autoraffle_types::{parse_participant, Amount, Event, RaffleSnapshot};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use prometheus_client::registry::Registry;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::{
    bank::Bank,
    metrics,
    raffle::{Mailbox, ServiceError},
};

#[derive(Clone)]
pub struct AppState {
    pub mailbox: Mailbox,
    pub bank: Bank,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct EnterRequest {
    /// Hex-encoded ed25519 public key, optionally `0x`-prefixed.
    pub participant: String,
    pub amount: Amount,
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct UpkeepResponse {
    pub upkeep_needed: bool,
    pub is_open: bool,
    pub time_passed: bool,
    pub has_players: bool,
    pub has_balance: bool,
}

impl From<Eligibility> for UpkeepResponse {
    fn from(eligibility: Eligibility) -> Self {
        Self {
            upkeep_needed: eligibility.is_due(),
            is_open: eligibility.is_open,
            time_passed: eligibility.time_passed,
            has_players: eligibility.has_players,
            has_balance: eligibility.has_balance,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct BalanceResponse {
    pub participant: String,
    pub balance: Amount,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

pub enum ApiError {
    InvalidParticipant(String),
    Service(ServiceError),
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        ApiError::Service(err)
    }
}

fn kind_label(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::UserInput => "user_input",
        ErrorKind::Precondition => "precondition",
        ErrorKind::ProtocolIntegrity => "protocol_integrity",
        ErrorKind::InternalConsistency => "internal_consistency",
        ErrorKind::ExternalDependency => "external_dependency",
    }
}

fn status_for(err: &Error) -> StatusCode {
    match (err, err.kind()) {
        (Error::NotOpen { .. }, _) => StatusCode::CONFLICT,
        (_, ErrorKind::UserInput) => StatusCode::BAD_REQUEST,
        (_, ErrorKind::Precondition | ErrorKind::ProtocolIntegrity) => StatusCode::CONFLICT,
        (_, ErrorKind::InternalConsistency) => StatusCode::INTERNAL_SERVER_ERROR,
        (_, ErrorKind::ExternalDependency) => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::InvalidParticipant(value) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: format!("invalid participant: {value}"),
                    kind: "user_input",
                },
            ),
            ApiError::Service(ServiceError::MailboxClosed) => (
                StatusCode::SERVICE_UNAVAILABLE,
                ErrorBody {
                    error: ServiceError::MailboxClosed.to_string(),
                    kind: "unavailable",
                },
            ),
            ApiError::Service(ServiceError::Raffle(err)) => (
                status_for(&err),
                ErrorBody {
                    error: err.to_string(),
                    kind: kind_label(err.kind()),
                },
            ),
        };
        (status, Json(body)).into_response()
    }
}

async fn healthz() -> &'static str {
    "ok"
}

async fn raffle(State(state): State<AppState>) -> Result<Json<RaffleSnapshot>, ApiError> {
    let mut mailbox = state.mailbox.clone();
    Ok(Json(mailbox.snapshot().await?))
}

async fn upkeep(State(state): State<AppState>) -> Result<Json<UpkeepResponse>, ApiError> {
    let mut mailbox = state.mailbox.clone();
    Ok(Json(mailbox.check_upkeep().await?.into()))
}

async fn enter(
    State(state): State<AppState>,
    Json(request): Json<EnterRequest>,
) -> Result<Json<Event>, ApiError> {
    let participant = parse_participant(&request.participant)
        .ok_or_else(|| ApiError::InvalidParticipant(request.participant.clone()))?;
    let mut mailbox = state.mailbox.clone();
    Ok(Json(mailbox.enter(participant, request.amount).await?))
}

async fn balance(
    State(state): State<AppState>,
    Path(participant): Path<String>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let key = parse_participant(&participant)
        .ok_or_else(|| ApiError::InvalidParticipant(participant.clone()))?;
    Ok(Json(BalanceResponse {
        balance: state.bank.balance(&key),
        participant,
    }))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/raffle", get(raffle))
        .route("/upkeep", get(upkeep))
        .route("/enter", post(enter))
        .route("/balance/:participant", get(balance))
        .with_state(state)
}

async fn metrics_handler(
    State(registry): State<Arc<Registry>>,
) -> Result<Response<Body>, StatusCode> {
    let body = metrics::render(&registry).map_err(|err| {
        error!("metrics encoding failed: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/plain; version=0.0.4")
        .body(Body::from(body))
        .map_err(|err| {
            error!("metrics response build failed: {err}");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

pub fn metrics_router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .with_state(registry)
}
