//! Phase manager: builds each turn, moves the session along the phase edges,
//! reveals hints, and closes the game out through the lobby-return window.
//! Every operation runs under the room's critical-section lock and persists
//! before broadcasting.

use std::time::Duration;

use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, info, warn};

use crate::dto::game::{HintRequest, SelectWordRequest};
use crate::dto::validation::validate_custom_word;
use crate::error::ServiceError;
use crate::services::timer_service::{self, TimerKind};
use crate::services::{game_service, hints, sse_events};
use crate::state::SharedState;
use crate::state::game::{GameState, TimerGuard, TurnInfo};
use crate::state::state_machine::GamePhase;

/// First hint only discloses the word's length.
pub const HINT_LEVEL_LENGTH: u8 = 1;
/// Second hint level progressively reveals letter-heads.
pub const HINT_LEVEL_REVEAL: u8 = 2;

/// Countdown elapsed: build turn 1 and enter word selection.
pub async fn begin_first_turn(
    state: &SharedState,
    room_id: &str,
    guard: TimerGuard,
) -> Result<(), ServiceError> {
    let lock = state.room_lock(room_id);
    let _room = lock.lock().await;

    let Some(mut game) = game_service::load_for_timer(state, room_id, &guard).await? else {
        return Ok(());
    };

    let choices = state
        .words()
        .word_choices(state.config().word_choice_count);
    game.begin_turn(1, choices)?;
    game_service::persist_state(state, &game).await?;
    sse_events::broadcast_turn_started(state, &game);
    schedule_word_select_deadline(state, &game);

    Ok(())
}

/// Result display elapsed: start the next turn, or end the game when the
/// turn counter is exhausted.
pub async fn advance_after_result(
    state: &SharedState,
    room_id: &str,
    guard: TimerGuard,
) -> Result<(), ServiceError> {
    let lock = state.room_lock(room_id);
    let _room = lock.lock().await;

    let Some(mut game) = game_service::load_for_timer(state, room_id, &guard).await? else {
        return Ok(());
    };

    let next_turn = game.turn_number() + 1;
    if next_turn > game.total_turns() {
        return end_game(state, &mut game).await;
    }

    let choices = state
        .words()
        .word_choices(state.config().word_choice_count);
    game.begin_turn(next_turn, choices)?;
    game_service::persist_state(state, &game).await?;
    sse_events::broadcast_turn_started(state, &game);
    schedule_word_select_deadline(state, &game);

    Ok(())
}

/// The drawer picks the secret word, from the candidates or as a custom
/// entry, and the drawing phase starts.
pub async fn select_word(
    state: &SharedState,
    room_id: &str,
    request: SelectWordRequest,
) -> Result<(), ServiceError> {
    let lock = state.room_lock(room_id);
    let _room = lock.lock().await;

    let mut game = game_service::load_state(state, room_id).await?;
    if game.phase != GamePhase::WordSelect {
        return Err(ServiceError::InvalidState(format!(
            "word selection is closed in phase {:?}",
            game.phase
        )));
    }

    {
        let turn = game
            .current_turn
            .as_mut()
            .ok_or_else(|| ServiceError::InvalidState("no active turn".into()))?;
        if turn.drawer_id != request.player_id {
            return Err(ServiceError::Unauthorized(
                "only the current drawer may pick the word".into(),
            ));
        }
        if turn.word.is_some() {
            return Err(ServiceError::InvalidState("a word is already set".into()));
        }

        let is_candidate = turn.word_choices.iter().any(|choice| choice == &request.word);
        if !is_candidate && let Err(err) = validate_custom_word(&request.word) {
            return Err(ServiceError::InvalidInput(format!(
                "rejected custom word: {}",
                err.message.unwrap_or_else(|| "invalid word".into())
            )));
        }

        turn.word = Some(request.word);
    }

    start_drawing(state, &mut game).await
}

/// Word-select deadline elapsed with no word chosen: pick one uniformly at
/// random from the drawer's candidates and proceed as if chosen.
pub async fn auto_select_word(
    state: &SharedState,
    room_id: &str,
    guard: TimerGuard,
) -> Result<(), ServiceError> {
    let lock = state.room_lock(room_id);
    let _room = lock.lock().await;

    let Some(mut game) = game_service::load_for_timer(state, room_id, &guard).await? else {
        return Ok(());
    };

    {
        let Some(turn) = game.current_turn.as_mut() else {
            return Ok(());
        };
        if turn.word.is_some() {
            // The staleness guard normally catches this; a chosen word in
            // word-select phase means the manual path is mid-flight.
            return Ok(());
        }
        let Some(word) = turn.word_choices.choose(&mut rand::rng()).cloned() else {
            warn!(room_id, turn_number = turn.turn_number, "no word candidates to auto-pick");
            return Ok(());
        };
        info!(
            room_id,
            turn_number = turn.turn_number,
            "word-select deadline hit; word auto-picked"
        );
        turn.word = Some(word);
    }

    start_drawing(state, &mut game).await
}

/// A hint timer fired for the given level.
pub async fn apply_timer_hint(
    state: &SharedState,
    room_id: &str,
    level: u8,
    guard: TimerGuard,
) -> Result<(), ServiceError> {
    let lock = state.room_lock(room_id);
    let _room = lock.lock().await;

    let Some(mut game) = game_service::load_for_timer(state, room_id, &guard).await? else {
        return Ok(());
    };

    reveal_and_publish(state, &mut game, level).await
}

/// Manual hint request; follows the auto-hint contract and is gated by the
/// current hint level.
pub async fn request_hint(
    state: &SharedState,
    room_id: &str,
    request: HintRequest,
) -> Result<(), ServiceError> {
    let lock = state.room_lock(room_id);
    let _room = lock.lock().await;

    let mut game = game_service::load_state(state, room_id).await?;
    if game.phase != GamePhase::Drawing {
        return Err(ServiceError::InvalidState(format!(
            "hints are only available while drawing, not in {:?}",
            game.phase
        )));
    }

    reveal_and_publish(state, &mut game, request.level).await
}

/// Player returned to the lobby during the post-game window.
pub async fn record_lobby_return(
    state: &SharedState,
    room_id: &str,
    player_id: &str,
) -> Result<(), ServiceError> {
    let lock = state.room_lock(room_id);
    let _room = lock.lock().await;

    let game = game_service::load_state(state, room_id).await?;
    if game.phase != GamePhase::GameEnd {
        return Err(ServiceError::InvalidState(
            "the game has not ended yet".into(),
        ));
    }
    if !game.players.contains_key(player_id) {
        return Err(ServiceError::Unauthorized(format!(
            "player `{player_id}` did not take part in this game"
        )));
    }
    if !state.rooms().record_return(room_id, player_id) {
        return Err(ServiceError::InvalidState(
            "the return-to-lobby window is closed".into(),
        ));
    }

    Ok(())
}

/// Return window elapsed: resolve the room and clean the session up.
pub async fn resolve_lobby_return(
    state: &SharedState,
    room_id: &str,
    guard: TimerGuard,
) -> Result<(), ServiceError> {
    let lock = state.room_lock(room_id);
    let _room = lock.lock().await;

    let Some(game) = game_service::load_for_timer(state, room_id, &guard).await? else {
        return Ok(());
    };

    let outcome = state.rooms().resolve_return_window(room_id);
    info!(
        room_id,
        game_session_id = %game.game_session_id,
        outcome = ?outcome,
        "return-to-lobby window resolved"
    );
    sse_events::broadcast_lobby_resolved(state, room_id, &outcome);

    game_service::delete_state(state, room_id).await?;
    state.room_events().remove_room(room_id);
    state.forget_room_lock(room_id);

    Ok(())
}

/// Clear the candidates, reset hint state, enter the drawing phase, and arm
/// the draw-timeout and hint timers.
///
/// A hint whose configured delay does not fit inside the drawing time is
/// never scheduled, so hints cannot fire after the phase ends.
async fn start_drawing(state: &SharedState, game: &mut GameState) -> Result<(), ServiceError> {
    if let Some(turn) = game.current_turn.as_mut() {
        turn.word_choices.clear();
        turn.hint_level = 0;
        turn.revealed_chosung_positions.clear();
        turn.revealed_letter_positions.clear();
    }
    game.advance_phase(GamePhase::Drawing)?;
    game_service::persist_state(state, game).await?;
    sse_events::broadcast_drawing_started(state, game);

    let guard = game.guard();
    let config = state.config();
    timer_service::schedule(
        state,
        &game.room_id,
        TimerKind::DrawTimeout,
        Duration::from_secs(game.draw_secs),
        guard,
    );
    if config.first_hint_delay_secs < game.draw_secs {
        timer_service::schedule(
            state,
            &game.room_id,
            TimerKind::FirstHint,
            Duration::from_secs(config.first_hint_delay_secs),
            guard,
        );
    }
    if config.second_hint_delay_secs < game.draw_secs {
        timer_service::schedule(
            state,
            &game.room_id,
            TimerKind::SecondHint,
            Duration::from_secs(config.second_hint_delay_secs),
            guard,
        );
    }

    Ok(())
}

/// Terminal transition: publish the final scoreboard and open the bounded
/// return-to-lobby window.
async fn end_game(state: &SharedState, game: &mut GameState) -> Result<(), ServiceError> {
    game.advance_phase(GamePhase::GameEnd)?;
    game_service::persist_state(state, game).await?;
    sse_events::broadcast_game_ended(state, game);
    state.rooms().open_return_window(&game.room_id);
    timer_service::schedule(
        state,
        &game.room_id,
        TimerKind::LobbyReturn,
        Duration::from_secs(state.config().lobby_return_secs),
        game.guard(),
    );

    info!(
        room_id = %game.room_id,
        game_session_id = %game.game_session_id,
        "game ended"
    );

    Ok(())
}

async fn reveal_and_publish(
    state: &SharedState,
    game: &mut GameState,
    level: u8,
) -> Result<(), ServiceError> {
    let turn = game
        .current_turn
        .as_mut()
        .ok_or_else(|| ServiceError::InvalidState("no active turn".into()))?;

    let mask = match reveal_hint(turn, level, &mut rand::rng())? {
        Some(mask) => mask,
        None => {
            debug!(
                room_id = %game.room_id,
                level, "hint had nothing left to reveal; no-op"
            );
            return Ok(());
        }
    };

    game_service::persist_state(state, game).await?;
    sse_events::broadcast_hint_revealed(state, game, mask);
    Ok(())
}

/// Apply one hint step to the turn. Returns the refreshed mask, or `None`
/// when the request changes nothing (level already reached, or no position
/// left to reveal) — callers skip persistence and broadcast in that case.
fn reveal_hint<R: Rng + ?Sized>(
    turn: &mut TurnInfo,
    level: u8,
    rng: &mut R,
) -> Result<Option<Vec<String>>, ServiceError> {
    let word = turn
        .word
        .clone()
        .ok_or_else(|| ServiceError::InvalidState("no word has been chosen".into()))?;

    match level {
        HINT_LEVEL_LENGTH => {
            if turn.hint_level >= HINT_LEVEL_LENGTH {
                return Ok(None);
            }
            turn.hint_level = HINT_LEVEL_LENGTH;
            Ok(Some(hints::render_mask(
                &word,
                &turn.revealed_chosung_positions,
                &turn.revealed_letter_positions,
            )))
        }
        HINT_LEVEL_REVEAL => {
            if turn.hint_level < HINT_LEVEL_LENGTH {
                return Err(ServiceError::InvalidState(
                    "the length hint has not been revealed yet".into(),
                ));
            }
            let revealed = turn.revealed_positions();
            let Some(position) = hints::next_reveal_position(&word, &revealed, rng) else {
                return Ok(None);
            };
            let Some(character) = word.chars().nth(position) else {
                return Ok(None);
            };
            if hints::is_hangul_syllable(character) {
                turn.revealed_chosung_positions.insert(position);
            } else {
                turn.revealed_letter_positions.insert(position);
            }
            turn.hint_level = HINT_LEVEL_REVEAL;
            Ok(Some(hints::render_mask(
                &word,
                &turn.revealed_chosung_positions,
                &turn.revealed_letter_positions,
            )))
        }
        other => Err(ServiceError::InvalidInput(format!(
            "hint level {other} is out of range"
        ))),
    }
}

fn schedule_word_select_deadline(state: &SharedState, game: &GameState) {
    timer_service::schedule(
        state,
        &game.room_id,
        TimerKind::WordSelectDeadline,
        Duration::from_secs(state.config().word_select_secs),
        game.guard(),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::config::AppConfig;
    use crate::dao::game_store::memory::MemoryGameStore;
    use crate::dto::game::{PlayerInput, StartGameRequest};
    use crate::state::AppState;

    async fn app_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .set_game_store(Arc::new(MemoryGameStore::new(Duration::from_secs(3600))))
            .await;
        state
    }

    async fn started_game(state: &SharedState, room_id: &str, players: usize) -> GameState {
        let request = StartGameRequest {
            players: (0..players)
                .map(|i| PlayerInput {
                    player_id: format!("p{i}"),
                    nickname: format!("player-{i}"),
                })
                .collect(),
            host_id: "p0".into(),
            total_rounds: 1,
            draw_secs: Some(90),
        };
        game_service::start_game(state, room_id.into(), request)
            .await
            .unwrap();
        game_service::load_state(state, room_id).await.unwrap()
    }

    /// Drive the game through countdown into the first word selection.
    async fn into_word_select(state: &SharedState, room_id: &str, players: usize) -> GameState {
        let game = started_game(state, room_id, players).await;
        begin_first_turn(state, room_id, game.guard()).await.unwrap();
        game_service::load_state(state, room_id).await.unwrap()
    }

    #[tokio::test]
    async fn countdown_builds_the_first_turn() {
        let state = app_state().await;
        let game = into_word_select(&state, "room-1", 3).await;

        assert_eq!(game.phase, GamePhase::WordSelect);
        let turn = game.current_turn.as_ref().unwrap();
        assert_eq!(turn.turn_number, 1);
        assert_eq!(turn.drawer_id, game.turn_order[0]);
        assert_eq!(
            turn.word_choices.len(),
            state.config().word_choice_count
        );
        assert!(turn.word.is_none());
    }

    #[tokio::test]
    async fn stale_countdown_is_discarded() {
        let state = app_state().await;
        let game = started_game(&state, "room-1", 3).await;
        let mut stale = game.guard();
        stale.turn_number = 99;

        begin_first_turn(&state, "room-1", stale).await.unwrap();
        let unchanged = game_service::load_state(&state, "room-1").await.unwrap();
        assert_eq!(unchanged.phase, GamePhase::Countdown);
        assert!(unchanged.current_turn.is_none());
    }

    #[tokio::test]
    async fn drawer_selects_a_candidate_word() {
        let state = app_state().await;
        let game = into_word_select(&state, "room-1", 3).await;
        let turn = game.current_turn.as_ref().unwrap();
        let drawer = turn.drawer_id.clone();
        let word = turn.word_choices[0].clone();

        select_word(
            &state,
            "room-1",
            SelectWordRequest {
                player_id: drawer,
                word: word.clone(),
            },
        )
        .await
        .unwrap();

        let game = game_service::load_state(&state, "room-1").await.unwrap();
        assert_eq!(game.phase, GamePhase::Drawing);
        let turn = game.current_turn.as_ref().unwrap();
        assert_eq!(turn.word.as_deref(), Some(word.as_str()));
        assert!(turn.word_choices.is_empty());
        assert_eq!(turn.hint_level, 0);
    }

    #[tokio::test]
    async fn non_drawer_selection_is_unauthorized() {
        let state = app_state().await;
        let game = into_word_select(&state, "room-1", 3).await;
        let drawer = game.current_drawer_id().unwrap();
        let intruder = game
            .turn_order
            .iter()
            .find(|id| id.as_str() != drawer)
            .unwrap()
            .clone();

        let err = select_word(
            &state,
            "room-1",
            SelectWordRequest {
                player_id: intruder,
                word: "사과".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn malformed_custom_word_is_rejected() {
        let state = app_state().await;
        let game = into_word_select(&state, "room-1", 3).await;
        let drawer = game.current_drawer_id().unwrap().to_owned();

        let err = select_word(
            &state,
            "room-1",
            SelectWordRequest {
                player_id: drawer,
                word: "사 과!".into(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));

        let game = game_service::load_state(&state, "room-1").await.unwrap();
        assert_eq!(game.phase, GamePhase::WordSelect);
    }

    #[tokio::test]
    async fn deadline_auto_picks_from_the_candidates() {
        let state = app_state().await;
        let game = into_word_select(&state, "room-1", 3).await;
        let choices = game.current_turn.as_ref().unwrap().word_choices.clone();

        auto_select_word(&state, "room-1", game.guard()).await.unwrap();

        let game = game_service::load_state(&state, "room-1").await.unwrap();
        assert_eq!(game.phase, GamePhase::Drawing);
        let word = game.current_turn.as_ref().unwrap().word.clone().unwrap();
        assert!(choices.contains(&word));
    }

    #[tokio::test]
    async fn stale_deadline_after_manual_pick_is_discarded() {
        let state = app_state().await;
        let game = into_word_select(&state, "room-1", 3).await;
        let deadline_guard = game.guard();
        let turn = game.current_turn.as_ref().unwrap();

        select_word(
            &state,
            "room-1",
            SelectWordRequest {
                player_id: turn.drawer_id.clone(),
                word: turn.word_choices[0].clone(),
            },
        )
        .await
        .unwrap();
        let chosen = game_service::load_state(&state, "room-1")
            .await
            .unwrap()
            .current_turn
            .unwrap()
            .word;

        // The deadline timer loses the race and must change nothing.
        auto_select_word(&state, "room-1", deadline_guard).await.unwrap();
        let game = game_service::load_state(&state, "room-1").await.unwrap();
        assert_eq!(game.phase, GamePhase::Drawing);
        assert_eq!(game.current_turn.unwrap().word, chosen);
    }

    #[tokio::test]
    async fn hint_levels_progress_and_reveal_positions() {
        let state = app_state().await;
        let game = into_word_select(&state, "room-1", 3).await;
        let turn = game.current_turn.as_ref().unwrap();
        select_word(
            &state,
            "room-1",
            SelectWordRequest {
                player_id: turn.drawer_id.clone(),
                word: turn.word_choices[0].clone(),
            },
        )
        .await
        .unwrap();

        let game = game_service::load_state(&state, "room-1").await.unwrap();
        apply_timer_hint(&state, "room-1", HINT_LEVEL_LENGTH, game.guard())
            .await
            .unwrap();
        let game = game_service::load_state(&state, "room-1").await.unwrap();
        let turn = game.current_turn.as_ref().unwrap();
        assert_eq!(turn.hint_level, HINT_LEVEL_LENGTH);
        assert!(turn.revealed_positions().is_empty());

        apply_timer_hint(&state, "room-1", HINT_LEVEL_REVEAL, game.guard())
            .await
            .unwrap();
        let game = game_service::load_state(&state, "room-1").await.unwrap();
        let turn = game.current_turn.as_ref().unwrap();
        assert_eq!(turn.hint_level, HINT_LEVEL_REVEAL);
        assert_eq!(turn.revealed_positions().len(), 1);
    }

    #[tokio::test]
    async fn exhausted_reveal_is_a_no_op() {
        let mut turn = TurnInfo {
            turn_number: 1,
            drawer_id: "p0".into(),
            drawer_nickname: "zero".into(),
            word: Some("사과".into()),
            word_choices: Vec::new(),
            hint_level: HINT_LEVEL_REVEAL,
            revealed_chosung_positions: [0, 1].into_iter().collect(),
            revealed_letter_positions: Default::default(),
            correct_player_ids: Vec::new(),
            turn_end_reason: None,
        };

        let mut rng = StdRng::seed_from_u64(1);
        let outcome = reveal_hint(&mut turn, HINT_LEVEL_REVEAL, &mut rng).unwrap();
        assert!(outcome.is_none());
        assert_eq!(turn.hint_level, HINT_LEVEL_REVEAL);
        assert_eq!(turn.revealed_positions().len(), 2);
    }

    #[tokio::test]
    async fn repeated_length_hint_is_a_no_op() {
        let mut turn = TurnInfo {
            turn_number: 1,
            drawer_id: "p0".into(),
            drawer_nickname: "zero".into(),
            word: Some("바나나".into()),
            word_choices: Vec::new(),
            hint_level: HINT_LEVEL_LENGTH,
            revealed_chosung_positions: Default::default(),
            revealed_letter_positions: Default::default(),
            correct_player_ids: Vec::new(),
            turn_end_reason: None,
        };

        let mut rng = StdRng::seed_from_u64(1);
        assert!(reveal_hint(&mut turn, HINT_LEVEL_LENGTH, &mut rng).unwrap().is_none());
    }
}
