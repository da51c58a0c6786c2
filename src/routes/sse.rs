use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/rooms/{room_id}/events",
    tag = "sse",
    params(("room_id" = String, Path, description = "Room whose events to stream")),
    responses((status = 200, description = "Room SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream one room's realtime game events to a connected client.
pub async fn room_stream(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_room(&state, &room_id);
    info!(room_id, "new room SSE connection");
    sse_service::broadcast_room_info(&state, &room_id, "room stream connected");
    sse_service::to_sse_stream(room_id, receiver)
}

/// Configure the SSE endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/rooms/{room_id}/events", get(room_stream))
}
