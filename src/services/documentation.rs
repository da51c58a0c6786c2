use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Sketch Guess Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::room_stream,
        crate::routes::game::start_game,
        crate::routes::game::get_game,
        crate::routes::game::select_word,
        crate::routes::game::correct_guess,
        crate::routes::game::request_hint,
        crate::routes::game::player_left,
        crate::routes::game::return_to_lobby,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::StartGameRequest,
            crate::dto::game::PlayerInput,
            crate::dto::game::SelectWordRequest,
            crate::dto::game::CorrectGuessRequest,
            crate::dto::game::HintRequest,
            crate::dto::game::PlayerLeftRequest,
            crate::dto::game::ReturnToLobbyRequest,
            crate::dto::game::ActionResponse,
            crate::dto::game::GameSnapshot,
            crate::dto::game::TurnSnapshot,
            crate::dto::game::PlayerSummary,
            crate::dto::phase::VisiblePhase,
            crate::dto::sse::GameStartedEvent,
            crate::dto::sse::TurnStartedEvent,
            crate::dto::sse::DrawingStartedEvent,
            crate::dto::sse::HintRevealedEvent,
            crate::dto::sse::CorrectAnswerEvent,
            crate::dto::sse::TurnResultEvent,
            crate::dto::sse::GameEndedEvent,
            crate::dto::sse::LobbyResolvedEvent,
            crate::dto::sse::TurnEndCause,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "game", description = "Game session operations"),
    )
)]
pub struct ApiDoc;
