use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::post,
};
use validator::Validate;

use crate::{
    dto::game::{
        ActionResponse, CorrectGuessRequest, GameSnapshot, HintRequest, PlayerLeftRequest,
        ReturnToLobbyRequest, SelectWordRequest, SnapshotQuery, StartGameRequest,
    },
    error::AppError,
    services::{game_service, phase_service, turn_service},
    state::SharedState,
};

/// Routes driving a room's game session.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{room_id}/game", post(start_game).get(get_game))
        .route("/rooms/{room_id}/game/word", post(select_word))
        .route("/rooms/{room_id}/game/correct-guess", post(correct_guess))
        .route("/rooms/{room_id}/game/hint", post(request_hint))
        .route("/rooms/{room_id}/game/player-left", post(player_left))
        .route(
            "/rooms/{room_id}/game/return-to-lobby",
            post(return_to_lobby),
        )
}

/// Start a game for a room with the supplied roster.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/game",
    tag = "game",
    params(("room_id" = String, Path, description = "Room to start the game in")),
    request_body = StartGameRequest,
    responses(
        (status = 200, description = "Game started", body = GameSnapshot)
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    Json(payload): Json<StartGameRequest>,
) -> Result<Json<GameSnapshot>, AppError> {
    payload.validate()?;
    let snapshot = game_service::start_game(&state, room_id, payload).await?;
    Ok(Json(snapshot))
}

/// Fetch the room's game as seen by one viewer.
#[utoipa::path(
    get,
    path = "/rooms/{room_id}/game",
    tag = "game",
    params(
        ("room_id" = String, Path, description = "Room whose game to fetch"),
        SnapshotQuery,
    ),
    responses(
        (status = 200, description = "Current game snapshot", body = GameSnapshot)
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    Query(query): Query<SnapshotQuery>,
) -> Result<Json<GameSnapshot>, AppError> {
    let snapshot =
        game_service::game_snapshot(&state, &room_id, query.viewer.as_deref()).await?;
    Ok(Json(snapshot))
}

/// The drawer picks the secret word.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/game/word",
    tag = "game",
    params(("room_id" = String, Path, description = "Room whose drawer is choosing")),
    request_body = SelectWordRequest,
    responses(
        (status = 200, description = "Word accepted, drawing started", body = ActionResponse)
    )
)]
pub async fn select_word(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    Json(payload): Json<SelectWordRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    phase_service::select_word(&state, &room_id, payload).await?;
    Ok(Json(ActionResponse {
        message: "word selected".into(),
    }))
}

/// Record a guess the upstream chat pipeline already judged correct.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/game/correct-guess",
    tag = "game",
    params(("room_id" = String, Path, description = "Room the guess was made in")),
    request_body = CorrectGuessRequest,
    responses(
        (status = 200, description = "Correct guess recorded", body = ActionResponse)
    )
)]
pub async fn correct_guess(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    Json(payload): Json<CorrectGuessRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    turn_service::record_correct_guess(&state, &room_id, payload).await?;
    Ok(Json(ActionResponse {
        message: "correct guess recorded".into(),
    }))
}

/// Request a manual hint at the given level.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/game/hint",
    tag = "game",
    params(("room_id" = String, Path, description = "Room to reveal a hint in")),
    request_body = HintRequest,
    responses(
        (status = 200, description = "Hint processed", body = ActionResponse)
    )
)]
pub async fn request_hint(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    Json(payload): Json<HintRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    phase_service::request_hint(&state, &room_id, payload).await?;
    Ok(Json(ActionResponse {
        message: "hint processed".into(),
    }))
}

/// Notify the engine that a player left the room.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/game/player-left",
    tag = "game",
    params(("room_id" = String, Path, description = "Room the player left")),
    request_body = PlayerLeftRequest,
    responses(
        (status = 200, description = "Departure processed", body = ActionResponse)
    )
)]
pub async fn player_left(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    Json(payload): Json<PlayerLeftRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    turn_service::handle_player_left(&state, &room_id, &payload.player_id).await?;
    Ok(Json(ActionResponse {
        message: "departure processed".into(),
    }))
}

/// Record a player returning to the lobby after the game ended.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/game/return-to-lobby",
    tag = "game",
    params(("room_id" = String, Path, description = "Room being returned to")),
    request_body = ReturnToLobbyRequest,
    responses(
        (status = 200, description = "Return recorded", body = ActionResponse)
    )
)]
pub async fn return_to_lobby(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
    Json(payload): Json<ReturnToLobbyRequest>,
) -> Result<Json<ActionResponse>, AppError> {
    payload.validate()?;
    phase_service::record_lobby_return(&state, &room_id, &payload.player_id).await?;
    Ok(Json(ActionResponse {
        message: "return recorded".into(),
    }))
}
