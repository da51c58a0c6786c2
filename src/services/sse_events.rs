use serde::Serialize;
use tracing::warn;

use crate::dto::game::PlayerSummary;
use crate::dto::sse::{
    CorrectAnswerEvent, DrawingStartedEvent, GameEndedEvent, GameStartedEvent, HintRevealedEvent,
    LobbyResolvedEvent, ServerEvent, TurnResultEvent, TurnStartedEvent,
};
use crate::services::room_gateway::LobbyOutcome;
use crate::state::SharedState;
use crate::state::game::GameState;

const EVENT_GAME_STARTED: &str = "game.started";
const EVENT_TURN_STARTED: &str = "turn.word_select";
const EVENT_DRAWING_STARTED: &str = "turn.drawing";
const EVENT_HINT_REVEALED: &str = "turn.hint";
const EVENT_CORRECT_ANSWER: &str = "turn.correct_answer";
const EVENT_TURN_RESULT: &str = "turn.result";
const EVENT_GAME_ENDED: &str = "game.ended";
const EVENT_LOBBY_RESOLVED: &str = "game.lobby";

/// Scoreboard rows for a broadcast payload, in join order.
pub fn scoreboard(game: &GameState) -> Vec<PlayerSummary> {
    game.players.values().map(Into::into).collect()
}

/// Broadcast that a game started and the countdown is running.
pub fn broadcast_game_started(state: &SharedState, game: &GameState) {
    let payload = GameStartedEvent {
        game_session_id: game.game_session_id,
        countdown_secs: state.config().countdown_secs,
        total_rounds: game.total_rounds,
        draw_secs: game.draw_secs,
        turn_order: game.turn_order.clone(),
        players: scoreboard(game),
    };
    send_room_event(state, &game.room_id, EVENT_GAME_STARTED, &payload);
}

/// Broadcast that a turn entered word selection.
pub fn broadcast_turn_started(state: &SharedState, game: &GameState) {
    let Some(turn) = &game.current_turn else {
        return;
    };
    let payload = TurnStartedEvent {
        turn_number: turn.turn_number,
        current_round: game.current_round,
        drawer_id: turn.drawer_id.clone(),
        drawer_nickname: turn.drawer_nickname.clone(),
        word_select_secs: state.config().word_select_secs,
    };
    send_room_event(state, &game.room_id, EVENT_TURN_STARTED, &payload);
}

/// Broadcast that the drawing phase started.
pub fn broadcast_drawing_started(state: &SharedState, game: &GameState) {
    let Some(turn) = &game.current_turn else {
        return;
    };
    let payload = DrawingStartedEvent {
        turn_number: turn.turn_number,
        draw_secs: game.draw_secs,
    };
    send_room_event(state, &game.room_id, EVENT_DRAWING_STARTED, &payload);
}

/// Broadcast a freshly revealed hint mask.
pub fn broadcast_hint_revealed(state: &SharedState, game: &GameState, mask: Vec<String>) {
    let Some(turn) = &game.current_turn else {
        return;
    };
    let payload = HintRevealedEvent {
        turn_number: turn.turn_number,
        hint_level: turn.hint_level,
        mask,
    };
    send_room_event(state, &game.room_id, EVENT_HINT_REVEALED, &payload);
}

/// Broadcast a recorded correct answer and the two affected scores.
pub fn broadcast_correct_answer(state: &SharedState, game: &GameState, event: CorrectAnswerEvent) {
    send_room_event(state, &game.room_id, EVENT_CORRECT_ANSWER, &event);
}

/// Broadcast the concluded turn with the revealed word and scoreboard.
pub fn broadcast_turn_result(state: &SharedState, game: &GameState) {
    let Some(turn) = &game.current_turn else {
        return;
    };
    let Some(reason) = turn.turn_end_reason else {
        return;
    };
    let payload = TurnResultEvent {
        turn_number: turn.turn_number,
        reason: reason.into(),
        word: turn.word.clone(),
        scoreboard: scoreboard(game),
        display_secs: state.config().turn_result_secs,
    };
    send_room_event(state, &game.room_id, EVENT_TURN_RESULT, &payload);
}

/// Broadcast the end of the game with the final scoreboard.
pub fn broadcast_game_ended(state: &SharedState, game: &GameState) {
    let payload = GameEndedEvent {
        game_session_id: game.game_session_id,
        scoreboard: scoreboard(game),
        lobby_return_secs: state.config().lobby_return_secs,
    };
    send_room_event(state, &game.room_id, EVENT_GAME_ENDED, &payload);
}

/// Broadcast how the return-to-lobby window resolved.
pub fn broadcast_lobby_resolved(state: &SharedState, room_id: &str, outcome: &LobbyOutcome) {
    let payload = match outcome {
        LobbyOutcome::Disband => LobbyResolvedEvent {
            outcome: "disband".into(),
            host_id: None,
            returned: Vec::new(),
        },
        LobbyOutcome::ResumeWaiting { host_id, returned } => LobbyResolvedEvent {
            outcome: "resume_waiting".into(),
            host_id: Some(host_id.clone()),
            returned: returned.clone(),
        },
    };
    send_room_event(state, room_id, EVENT_LOBBY_RESOLVED, &payload);
}

fn send_room_event(state: &SharedState, room_id: &str, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.room_events().broadcast(room_id, event),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}
