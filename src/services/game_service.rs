//! Game bootstrap and the shared load/persist helpers every mutating
//! operation goes through. The load-for-timer helper implements the
//! staleness guard that makes superseded timers harmless.

use std::collections::HashSet;
use std::time::Duration;

use tracing::{debug, info};

use crate::dto::game::{GameSnapshot, StartGameRequest};
use crate::error::ServiceError;
use crate::services::{sse_events, timer_service};
use crate::state::SharedState;
use crate::state::game::{GameState, TimerGuard};

/// Bootstrap a fresh game for a room and arm the countdown timer.
///
/// The roster and host come from the room collaborator upstream; this is the
/// only operation that mints a new game session id.
pub async fn start_game(
    state: &SharedState,
    room_id: String,
    request: StartGameRequest,
) -> Result<GameSnapshot, ServiceError> {
    let lock = state.room_lock(&room_id);
    let _room = lock.lock().await;

    if let Some(existing) = find_state(state, &room_id).await?
        && !existing.phase.is_terminal()
    {
        return Err(ServiceError::InvalidState(format!(
            "room `{room_id}` already has a game in progress"
        )));
    }

    let roster = build_roster(&request)?;
    let draw_secs = request
        .draw_secs
        .unwrap_or(state.config().default_draw_secs);

    let mut rng = rand::rng();
    let game = GameState::new(
        room_id.clone(),
        roster,
        request.total_rounds,
        draw_secs,
        &mut rng,
    );

    persist_state(state, &game).await?;
    state.rooms().game_started(&room_id, &request.host_id);
    sse_events::broadcast_game_started(state, &game);
    timer_service::schedule(
        state,
        &room_id,
        timer_service::TimerKind::Countdown,
        Duration::from_secs(state.config().countdown_secs),
        game.guard(),
    );

    info!(
        room_id,
        game_session_id = %game.game_session_id,
        players = game.players.len(),
        total_rounds = game.total_rounds,
        "game started"
    );

    Ok(GameSnapshot::for_viewer(&game, None))
}

/// Project the current game for one viewer.
pub async fn game_snapshot(
    state: &SharedState,
    room_id: &str,
    viewer: Option<&str>,
) -> Result<GameSnapshot, ServiceError> {
    let game = load_state(state, room_id).await?;
    Ok(GameSnapshot::for_viewer(&game, viewer))
}

fn build_roster(request: &StartGameRequest) -> Result<Vec<(String, String)>, ServiceError> {
    let mut seen_ids = HashSet::new();
    let roster: Vec<(String, String)> = request
        .players
        .iter()
        .map(|player| {
            if !seen_ids.insert(player.player_id.as_str()) {
                return Err(ServiceError::InvalidInput(format!(
                    "duplicate player id `{}` in roster",
                    player.player_id
                )));
            }
            Ok((player.player_id.clone(), player.nickname.clone()))
        })
        .collect::<Result<_, _>>()?;

    if !roster.iter().any(|(id, _)| id == &request.host_id) {
        return Err(ServiceError::InvalidInput(format!(
            "host `{}` is not part of the roster",
            request.host_id
        )));
    }

    Ok(roster)
}

/// Fetch the room's game state, `None` when no game is stored.
pub(crate) async fn find_state(
    state: &SharedState,
    room_id: &str,
) -> Result<Option<GameState>, ServiceError> {
    let store = state.require_game_store().await?;
    Ok(store.find_state(room_id).await?.map(Into::into))
}

/// Fetch the room's game state or fail with not-found.
pub(crate) async fn load_state(
    state: &SharedState,
    room_id: &str,
) -> Result<GameState, ServiceError> {
    find_state(state, room_id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("no game running in room `{room_id}`")))
}

/// Reload the state for a fired timer, discarding it when the persisted
/// `(session, turn, phase)` no longer matches what the timer captured.
///
/// A stale timer is not an error: the game has legitimately moved on and the
/// firing becomes a no-op.
pub(crate) async fn load_for_timer(
    state: &SharedState,
    room_id: &str,
    guard: &TimerGuard,
) -> Result<Option<GameState>, ServiceError> {
    match find_state(state, room_id).await? {
        None => {
            debug!(room_id, "timer fired for a missing game state; discarding");
            Ok(None)
        }
        Some(game) if !game.matches_guard(guard) => {
            debug!(
                room_id,
                expected_session = %guard.game_session_id,
                expected_turn = guard.turn_number,
                expected_phase = ?guard.expected_phase,
                actual_session = %game.game_session_id,
                actual_turn = game.turn_number(),
                actual_phase = ?game.phase,
                "stale timer discarded"
            );
            Ok(None)
        }
        Some(game) => Ok(Some(game)),
    }
}

/// Upsert the state document, refreshing its retention TTL.
pub(crate) async fn persist_state(
    state: &SharedState,
    game: &GameState,
) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    store.save_state(game.clone().into()).await?;
    Ok(())
}

/// Delete the room's state document.
pub(crate) async fn delete_state(state: &SharedState, room_id: &str) -> Result<(), ServiceError> {
    let store = state.require_game_store().await?;
    store.delete_state(room_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::AppConfig;
    use crate::dao::game_store::memory::MemoryGameStore;
    use crate::dto::game::PlayerInput;
    use crate::state::AppState;
    use crate::state::state_machine::GamePhase;

    async fn app_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .set_game_store(Arc::new(MemoryGameStore::new(Duration::from_secs(3600))))
            .await;
        state
    }

    fn start_request(players: usize) -> StartGameRequest {
        StartGameRequest {
            players: (0..players)
                .map(|i| PlayerInput {
                    player_id: format!("p{i}"),
                    nickname: format!("player-{i}"),
                })
                .collect(),
            host_id: "p0".into(),
            total_rounds: 2,
            draw_secs: Some(90),
        }
    }

    #[tokio::test]
    async fn start_game_persists_countdown_state() {
        let state = app_state().await;
        let snapshot = start_game(&state, "room-1".into(), start_request(3))
            .await
            .unwrap();
        assert_eq!(snapshot.players.len(), 3);

        let game = load_state(&state, "room-1").await.unwrap();
        assert_eq!(game.phase, GamePhase::Countdown);
        assert_eq!(game.total_turns(), 6);
        assert!(game.current_turn.is_none());
    }

    #[tokio::test]
    async fn start_game_rejects_running_room() {
        let state = app_state().await;
        start_game(&state, "room-1".into(), start_request(3))
            .await
            .unwrap();
        let err = start_game(&state, "room-1".into(), start_request(3))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidState(_)));
    }

    #[tokio::test]
    async fn start_game_rejects_duplicate_players_and_foreign_host() {
        let state = app_state().await;

        let mut request = start_request(3);
        request.players[2].player_id = "p0".into();
        assert!(matches!(
            start_game(&state, "room-1".into(), request).await,
            Err(ServiceError::InvalidInput(_))
        ));

        let mut request = start_request(3);
        request.host_id = "ghost".into();
        assert!(matches!(
            start_game(&state, "room-2".into(), request).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn missing_game_is_not_found() {
        let state = app_state().await;
        assert!(matches!(
            load_state(&state, "room-1").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn operations_fail_in_degraded_mode() {
        let state = AppState::new(AppConfig::default());
        assert!(matches!(
            start_game(&state, "room-1".into(), start_request(3)).await,
            Err(ServiceError::Degraded)
        ));
    }

    #[tokio::test]
    async fn persisted_state_round_trips() {
        let state = app_state().await;
        start_game(&state, "room-1".into(), start_request(4))
            .await
            .unwrap();

        let loaded = load_state(&state, "room-1").await.unwrap();
        persist_state(&state, &loaded).await.unwrap();
        let reloaded = load_state(&state, "room-1").await.unwrap();
        assert_eq!(loaded, reloaded);
    }
}
