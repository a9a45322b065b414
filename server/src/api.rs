//! JSON HTTP API over the session store.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Json, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::{Difficulty, SessionError, SessionHandle, SessionSnapshot, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
}

#[derive(Serialize)]
pub struct NewGameResponse {
    pub session_id: String,
    pub board_state: SessionSnapshot,
    pub oracle_available: bool,
}

// Request fields are loosely typed so that a missing or mistyped value is
// reported through `ApiError` rather than as an extractor rejection.

#[derive(Deserialize)]
pub struct DifficultyRequest {
    #[serde(default)]
    pub session_id: Option<Value>,
    #[serde(default)]
    pub difficulty: Option<Value>,
}

#[derive(Serialize)]
pub struct DifficultyResponse {
    pub success: bool,
    pub difficulty: Difficulty,
    pub oracle_configured: bool,
    pub board_state: SessionSnapshot,
}

#[derive(Deserialize)]
pub struct MoveRequest {
    #[serde(default)]
    pub session_id: Option<Value>,
    #[serde(default, rename = "move")]
    pub token: Option<Value>,
}

#[derive(Serialize)]
pub struct MoveResponse {
    pub success: bool,
    pub board_state: SessionSnapshot,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oracle_move: Option<String>,
}

#[derive(Deserialize)]
pub struct SessionRequest {
    #[serde(default)]
    pub session_id: Option<Value>,
}

#[derive(Serialize)]
pub struct OracleMoveResponse {
    #[serde(rename = "move")]
    pub token: String,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Session not found")]
    NotFound,
    #[error("Invalid move")]
    InvalidMove,
    #[error("Invalid difficulty")]
    InvalidDifficulty,
    #[error("Could not get move")]
    NoOracleMove,
    #[error("Invalid request body")]
    InvalidBody,
    #[error("Internal error")]
    Internal,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidMove | Self::InvalidDifficulty | Self::InvalidBody => {
                StatusCode::BAD_REQUEST
            }
            Self::NoOracleMove | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound(_) => Self::NotFound,
            SessionError::InvalidMove(_) => Self::InvalidMove,
            SessionError::InvalidDifficulty(_) => Self::InvalidDifficulty,
            SessionError::OracleUnavailable(_) => Self::NoOracleMove,
            SessionError::Internal(reason) => {
                tracing::error!("Session failure: {}", reason);
                Self::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

pub fn router(sessions: Arc<SessionStore>) -> Router {
    Router::new()
        .route("/new_game", post(new_game))
        .route("/difficulty", post(set_difficulty))
        .route("/move", post(make_move))
        .route("/game/{session_id}", get(get_game))
        .route("/oracle_move", post(oracle_move))
        .route("/health", get(health))
        .with_state(AppState { sessions })
}

async fn new_game(State(state): State<AppState>) -> Json<NewGameResponse> {
    let created = state.sessions.create().await;
    Json(NewGameResponse {
        session_id: created.session_id,
        board_state: created.snapshot,
        oracle_available: created.oracle_available,
    })
}

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        ApiError::InvalidBody
    })
}

fn as_text(value: &Option<Value>) -> Option<&str> {
    value.as_ref().and_then(Value::as_str)
}

/// A missing or non-string id is reported like an unknown one.
async fn lookup(state: &AppState, session_id: &Option<Value>) -> Result<SessionHandle, ApiError> {
    let session_id = as_text(session_id).ok_or(ApiError::NotFound)?;
    Ok(state.sessions.get(session_id).await?)
}

async fn set_difficulty(
    State(state): State<AppState>,
    payload: Result<Json<DifficultyRequest>, JsonRejection>,
) -> Result<Json<DifficultyResponse>, ApiError> {
    let payload = parse_body(payload)?;
    let handle = lookup(&state, &payload.session_id).await?;
    let difficulty: Difficulty = as_text(&payload.difficulty)
        .ok_or(ApiError::InvalidDifficulty)?
        .parse()?;

    let change = handle.set_difficulty(difficulty).await?;
    Ok(Json(DifficultyResponse {
        success: true,
        difficulty,
        oracle_configured: change.oracle_configured,
        board_state: change.snapshot,
    }))
}

async fn make_move(
    State(state): State<AppState>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> Result<Json<MoveResponse>, ApiError> {
    let payload = parse_body(payload)?;
    let handle = lookup(&state, &payload.session_id).await?;
    let token = as_text(&payload.token).ok_or(ApiError::InvalidMove)?;

    let outcome = handle.apply_move(token).await?;
    Ok(Json(MoveResponse {
        success: true,
        board_state: outcome.snapshot,
        oracle_move: outcome.oracle_move,
    }))
}

async fn get_game(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let handle = state.sessions.get(&session_id).await?;
    Ok(Json(handle.snapshot().await?))
}

async fn oracle_move(
    State(state): State<AppState>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> Result<Json<OracleMoveResponse>, ApiError> {
    let payload = parse_body(payload)?;
    let handle = lookup(&state, &payload.session_id).await?;
    let token = handle.query_oracle_move().await?;
    Ok(Json(OracleMoveResponse { token }))
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.sessions.len().await,
    })
}
