//! REST transport.
//!
//! Handlers are thin: they decode JSON, run the blocking service call on
//! the blocking pool, and map [`ServiceError`] to a status code.

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower::ServiceBuilder;
use tracing::{debug, error, info, instrument, warn};
use undefine_game::SessionError;

use crate::db::{GameResult, UserStats};
use crate::service::{
    GameService, GuessResponse, HintReveal, ServiceError, SessionView, StartedGame, WordSelection,
};
use crate::store::StoreError;

/// Body of `POST /api/games`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartGameRequest {
    /// Player name.
    pub username: String,
    /// Word choice; today's word when absent.
    #[serde(default)]
    pub selection: WordSelection,
}

/// Body of `POST /api/games/{id}/hints`.
#[derive(Debug, Clone, Deserialize)]
pub struct HintRequest {
    /// Slot index, 0-5. Wider than the slot type so out-of-range input is
    /// reported as a bad slot rather than a decode failure.
    pub slot: i64,
}

/// Body of `POST /api/games/{id}/guesses`.
#[derive(Debug, Clone, Deserialize)]
pub struct GuessRequest {
    /// Guess text as typed.
    pub guess: String,
}

/// Body of `GET /api/stats/{username}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatsResponse {
    #[serde(flatten)]
    stats: UserStats,
    win_rate: f64,
    recent_games: Vec<GameResult>,
}

/// Error returned by a handler.
#[derive(Debug, Display, From)]
pub enum ApiError {
    /// The service rejected the request.
    #[display("{_0}")]
    Service(ServiceError),

    /// The request body could not be decoded.
    #[display("Invalid request body: {_0}")]
    Rejected(JsonRejection),

    /// Hint slot outside the representable range.
    #[display("Hint slot {_0} does not exist")]
    #[from(skip)]
    InvalidSlot(i64),

    /// The blocking task panicked or was cancelled.
    #[display("Background task failed: {_0}")]
    #[from(skip)]
    Task(String),
}

impl std::error::Error for ApiError {}

impl ApiError {
    /// HTTP status and machine-readable kind.
    pub fn classify(&self) -> (StatusCode, &'static str) {
        let err = match self {
            ApiError::Service(err) => err,
            ApiError::Rejected(rejection) => return (rejection.status(), "invalid_request"),
            ApiError::InvalidSlot(_) => return (StatusCode::BAD_REQUEST, "invalid_hint_slot"),
            ApiError::Task(_) => return (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        };
        match err {
            ServiceError::Session(SessionError::InvalidGuess) => {
                (StatusCode::BAD_REQUEST, "invalid_guess")
            }
            ServiceError::Session(SessionError::InvalidHintSlot(_)) => {
                (StatusCode::BAD_REQUEST, "invalid_hint_slot")
            }
            ServiceError::Session(SessionError::SessionClosed) => {
                (StatusCode::CONFLICT, "session_closed")
            }
            ServiceError::Session(SessionError::NotComplete) => {
                (StatusCode::CONFLICT, "not_complete")
            }
            ServiceError::Session(SessionError::InvariantViolation(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
            ServiceError::Store(StoreError::Stale { .. }) => (StatusCode::CONFLICT, "conflict"),
            ServiceError::InvalidUsername => (StatusCode::BAD_REQUEST, "invalid_username"),
            ServiceError::SessionNotFound(_)
            | ServiceError::WordNotFound(_)
            | ServiceError::PlayerNotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ServiceError::NoWordsAvailable => (StatusCode::SERVICE_UNAVAILABLE, "no_words"),
            ServiceError::Store(_) | ServiceError::Db(_) | ServiceError::Clues(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.classify();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            debug!(error = %self, %status, "Request rejected");
        }
        let body = json!({ "error": kind, "message": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Runs a blocking service call off the async runtime.
async fn blocking<T, F>(call: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| ApiError::Task(e.to_string()))?
        .map_err(ApiError::from)
}

/// Builds the application router.
#[instrument(skip(service))]
pub fn router(service: GameService) -> Router {
    info!("Building HTTP router");
    Router::new()
        .route("/health", get(health))
        .route("/api/games", post(start_game))
        .route("/api/games/{id}", get(get_game))
        .route("/api/games/{id}/hints", post(reveal_hint))
        .route("/api/games/{id}/guesses", post(submit_guess))
        .route("/api/stats/{username}", get(player_stats))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(service)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[instrument(skip_all)]
async fn start_game(
    State(service): State<GameService>,
    payload: Result<Json<StartGameRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<StartedGame>), ApiError> {
    let Json(request) = payload?;
    debug!(username = %request.username, "Start game requested");
    let started =
        blocking(move || service.start_game(&request.username, request.selection)).await?;
    Ok((StatusCode::CREATED, Json(started)))
}

#[instrument(skip(service))]
async fn get_game(
    State(service): State<GameService>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    Ok(Json(blocking(move || service.session_view(&id)).await?))
}

#[instrument(skip(service, payload))]
async fn reveal_hint(
    State(service): State<GameService>,
    Path(id): Path<String>,
    payload: Result<Json<HintRequest>, JsonRejection>,
) -> Result<Json<HintReveal>, ApiError> {
    let Json(request) = payload?;
    let slot = u8::try_from(request.slot).map_err(|_| ApiError::InvalidSlot(request.slot))?;
    Ok(Json(blocking(move || service.reveal_hint(&id, slot)).await?))
}

#[instrument(skip(service, payload))]
async fn submit_guess(
    State(service): State<GameService>,
    Path(id): Path<String>,
    payload: Result<Json<GuessRequest>, JsonRejection>,
) -> Result<Json<GuessResponse>, ApiError> {
    let Json(request) = payload?;
    let response = blocking(move || service.submit_guess(&id, &request.guess)).await?;
    if *response.game_over() {
        info!(correct = response.is_correct(), "Game over");
    }
    Ok(Json(response))
}

#[instrument(skip(service))]
async fn player_stats(
    State(service): State<GameService>,
    Path(username): Path<String>,
) -> Result<Json<PlayerStatsResponse>, ApiError> {
    let response = blocking(move || {
        let stats = service.user_stats(&username)?;
        let recent_games = service.game_history(&username)?;
        Ok(PlayerStatsResponse {
            win_rate: stats.win_rate(),
            stats,
            recent_games,
        })
    })
    .await;

    if let Err(ApiError::Service(ServiceError::PlayerNotFound(name))) = &response {
        warn!(username = %name, "Stats requested for unknown player");
    }
    Ok(Json(response?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let cases = [
            (ServiceError::Session(SessionError::InvalidGuess), 400),
            (ServiceError::Session(SessionError::InvalidHintSlot(9)), 400),
            (ServiceError::Session(SessionError::SessionClosed), 409),
            (
                ServiceError::Store(StoreError::Stale {
                    id: "game-x".to_string(),
                    expected: 1,
                }),
                409,
            ),
            (ServiceError::SessionNotFound("game-x".to_string()), 404),
            (ServiceError::PlayerNotFound("ada".to_string()), 404),
            (ServiceError::Store(StoreError::Poisoned), 500),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).classify().0.as_u16(), status);
        }
    }

    #[test]
    fn test_out_of_range_slot_is_bad_hint_slot() {
        let (status, kind) = ApiError::InvalidSlot(300).classify();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(kind, "invalid_hint_slot");
    }

    #[test]
    fn test_start_request_defaults_to_daily() {
        let request: StartGameRequest = serde_json::from_str(r#"{"username":"ada"}"#).unwrap();
        assert_eq!(request.selection, WordSelection::Daily);
    }
}
