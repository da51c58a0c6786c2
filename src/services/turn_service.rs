//! Turn manager: the single funnel through which every turn conclusion
//! passes, plus the correct-guess recording that feeds the scoring engine.

use std::time::Duration;

use tracing::{debug, info};

use crate::dto::game::CorrectGuessRequest;
use crate::dto::sse::CorrectAnswerEvent;
use crate::error::ServiceError;
use crate::services::scoring::{self, GuessContext};
use crate::services::timer_service::{self, TimerKind};
use crate::services::{game_service, sse_events};
use crate::state::SharedState;
use crate::state::game::{GameState, TimerGuard};
use crate::state::state_machine::{GamePhase, TurnEndReason};

/// Record a guess already judged correct upstream.
///
/// Scoring runs strictly before the guesser is marked correct, so the rank
/// and the revealed-hint counts seen by the scoring engine describe the
/// moment the answer landed. When the last guesser answers, the turn end is
/// deferred by a short grace delay instead of flipping the phase inline, so
/// this answer's broadcast reaches clients before the turn result does.
pub async fn record_correct_guess(
    state: &SharedState,
    room_id: &str,
    request: CorrectGuessRequest,
) -> Result<(), ServiceError> {
    let lock = state.room_lock(room_id);
    let _room = lock.lock().await;

    let mut game = game_service::load_state(state, room_id).await?;
    if game.phase != GamePhase::Drawing {
        return Err(ServiceError::InvalidState(format!(
            "guesses are not accepted in phase {:?}",
            game.phase
        )));
    }

    let turn = game
        .current_turn
        .as_ref()
        .ok_or_else(|| ServiceError::InvalidState("no active turn".into()))?;
    if turn.drawer_id == request.player_id {
        return Err(ServiceError::Unauthorized(
            "the drawer cannot answer their own word".into(),
        ));
    }
    let player = game
        .players
        .get(&request.player_id)
        .ok_or_else(|| {
            ServiceError::Unauthorized(format!(
                "player `{}` is not part of this game",
                request.player_id
            ))
        })?;
    if player.is_correct {
        return Err(ServiceError::InvalidState(
            "player already answered this turn".into(),
        ));
    }

    let nickname = player.nickname.clone();
    let drawer_id = turn.drawer_id.clone();
    let turn_number = turn.turn_number;
    let rank = turn.correct_player_ids.len() + 1;
    let context = GuessContext {
        rank,
        total_players: game.players.len(),
        hint_level: turn.hint_level,
        chosung_reveals: turn.revealed_chosung_positions.len(),
        letter_reveals: turn.revealed_letter_positions.len(),
    };
    let points_awarded = scoring::guesser_score(&context);
    let drawer_bonus = scoring::drawer_bonus(&context);

    game.mark_correct(&request.player_id, points_awarded, drawer_bonus);
    game_service::persist_state(state, &game).await?;

    let player_score = game
        .players
        .get(&request.player_id)
        .map_or(0, |player| player.score);
    let drawer_score = game.players.get(&drawer_id).map_or(0, |drawer| drawer.score);
    sse_events::broadcast_correct_answer(
        state,
        &game,
        CorrectAnswerEvent {
            turn_number,
            player_id: request.player_id.clone(),
            nickname,
            rank,
            points_awarded,
            drawer_bonus,
            player_score,
            drawer_score,
        },
    );

    if game.all_guessers_correct() {
        debug!(
            room_id,
            turn_number, "all guessers correct; deferring turn end by the grace delay"
        );
        timer_service::schedule(
            state,
            room_id,
            TimerKind::AllCorrectGrace,
            state.config().all_correct_grace(),
            game.guard(),
        );
    }

    Ok(())
}

/// A turn-ending timer fired (draw timeout or all-correct grace).
pub async fn end_turn_from_timer(
    state: &SharedState,
    room_id: &str,
    guard: TimerGuard,
    reason: TurnEndReason,
) -> Result<(), ServiceError> {
    let lock = state.room_lock(room_id);
    let _room = lock.lock().await;

    let Some(mut game) = game_service::load_for_timer(state, room_id, &guard).await? else {
        return Ok(());
    };

    end_turn(state, &mut game, reason).await
}

/// A player left the room mid-game. Only the current drawer leaving during
/// the drawing phase cuts the turn short; anyone else keeps their per-game
/// record and may keep scoring on later turns.
pub async fn handle_player_left(
    state: &SharedState,
    room_id: &str,
    player_id: &str,
) -> Result<(), ServiceError> {
    let lock = state.room_lock(room_id);
    let _room = lock.lock().await;

    let mut game = game_service::load_state(state, room_id).await?;
    let is_drawer = game.current_drawer_id() == Some(player_id);
    if is_drawer && game.phase == GamePhase::Drawing {
        info!(room_id, player_id, "drawer left mid-turn; ending the turn");
        return end_turn(state, &mut game, TurnEndReason::DrawerLeft).await;
    }

    debug!(
        room_id,
        player_id,
        phase = ?game.phase,
        "player left without a turn-ending effect"
    );
    Ok(())
}

/// The single funnel every turn conclusion passes through, regardless of
/// cause: stamp the reason, enter the result display, and arm its timer.
/// Callers never set `TurnResult` themselves.
async fn end_turn(
    state: &SharedState,
    game: &mut GameState,
    reason: TurnEndReason,
) -> Result<(), ServiceError> {
    if let Some(turn) = game.current_turn.as_mut() {
        turn.turn_end_reason = Some(reason);
    }
    game.advance_phase(GamePhase::TurnResult)?;
    game_service::persist_state(state, game).await?;
    sse_events::broadcast_turn_result(state, game);
    timer_service::schedule(
        state,
        &game.room_id,
        TimerKind::TurnResultDisplay,
        Duration::from_secs(state.config().turn_result_secs),
        game.guard(),
    );

    info!(
        room_id = %game.room_id,
        turn_number = game.turn_number(),
        reason = ?reason,
        "turn ended"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::config::AppConfig;
    use crate::dao::game_store::memory::MemoryGameStore;
    use crate::dto::game::{PlayerInput, SelectWordRequest, StartGameRequest};
    use crate::services::phase_service;
    use crate::state::AppState;

    async fn app_state() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state
            .set_game_store(Arc::new(MemoryGameStore::new(Duration::from_secs(3600))))
            .await;
        state
    }

    /// Drive a fresh game into the drawing phase and return its state.
    async fn into_drawing(state: &SharedState, room_id: &str, players: usize) -> GameState {
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
        let game = game_service::load_state(state, room_id).await.unwrap();
        phase_service::begin_first_turn(state, room_id, game.guard())
            .await
            .unwrap();

        let game = game_service::load_state(state, room_id).await.unwrap();
        let turn = game.current_turn.as_ref().unwrap();
        phase_service::select_word(
            state,
            room_id,
            SelectWordRequest {
                player_id: turn.drawer_id.clone(),
                word: turn.word_choices[0].clone(),
            },
        )
        .await
        .unwrap();
        game_service::load_state(state, room_id).await.unwrap()
    }

    fn guessers(game: &GameState) -> Vec<String> {
        game.turn_order
            .iter()
            .filter(|id| Some(id.as_str()) != game.current_drawer_id())
            .cloned()
            .collect()
    }

    #[tokio::test]
    async fn first_guesser_scores_the_rank_one_amounts() {
        let state = app_state().await;
        let game = into_drawing(&state, "room-1", 3).await;
        let drawer = game.current_drawer_id().unwrap().to_owned();
        let first = guessers(&game)[0].clone();

        record_correct_guess(
            &state,
            "room-1",
            CorrectGuessRequest {
                player_id: first.clone(),
            },
        )
        .await
        .unwrap();

        let game = game_service::load_state(&state, "room-1").await.unwrap();
        assert_eq!(game.players[&first].score, 100);
        assert_eq!(game.players[&drawer].score, 30);
        assert_eq!(
            game.current_turn.as_ref().unwrap().correct_player_ids,
            vec![first]
        );
    }

    #[tokio::test]
    async fn answer_ranks_decrease_and_drawer_accrues_per_guess() {
        let state = app_state().await;
        let game = into_drawing(&state, "room-1", 4).await;
        let drawer = game.current_drawer_id().unwrap().to_owned();
        let guessers = guessers(&game);

        for player_id in &guessers {
            record_correct_guess(
                &state,
                "room-1",
                CorrectGuessRequest {
                    player_id: player_id.clone(),
                },
            )
            .await
            .unwrap();
        }

        let game = game_service::load_state(&state, "room-1").await.unwrap();
        assert_eq!(game.players[&guessers[0]].score, 100);
        assert_eq!(game.players[&guessers[1]].score, 80);
        assert_eq!(game.players[&guessers[2]].score, 60);
        // 4 players, no hints: rank 1/3 pays full, 2/3 pays 75%, 3/3 halves.
        assert_eq!(game.players[&drawer].score, 24 + 18 + 12);
    }

    #[tokio::test]
    async fn drawer_and_strangers_cannot_guess() {
        let state = app_state().await;
        let game = into_drawing(&state, "room-1", 3).await;
        let drawer = game.current_drawer_id().unwrap().to_owned();

        assert!(matches!(
            record_correct_guess(
                &state,
                "room-1",
                CorrectGuessRequest { player_id: drawer }
            )
            .await,
            Err(ServiceError::Unauthorized(_))
        ));
        assert!(matches!(
            record_correct_guess(
                &state,
                "room-1",
                CorrectGuessRequest {
                    player_id: "ghost".into()
                }
            )
            .await,
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn repeated_guess_is_rejected() {
        let state = app_state().await;
        let game = into_drawing(&state, "room-1", 3).await;
        let first = guessers(&game)[0].clone();

        record_correct_guess(
            &state,
            "room-1",
            CorrectGuessRequest {
                player_id: first.clone(),
            },
        )
        .await
        .unwrap();
        assert!(matches!(
            record_correct_guess(
                &state,
                "room-1",
                CorrectGuessRequest { player_id: first }
            )
            .await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test]
    async fn all_correct_ends_the_turn_after_the_grace_delay() {
        let state = app_state().await;
        let game = into_drawing(&state, "room-1", 3).await;
        for player_id in guessers(&game) {
            record_correct_guess(&state, "room-1", CorrectGuessRequest { player_id })
                .await
                .unwrap();
        }

        // Still drawing during the grace window.
        let game = game_service::load_state(&state, "room-1").await.unwrap();
        assert_eq!(game.phase, GamePhase::Drawing);

        end_turn_from_timer(&state, "room-1", game.guard(), TurnEndReason::AllCorrect)
            .await
            .unwrap();
        let game = game_service::load_state(&state, "room-1").await.unwrap();
        assert_eq!(game.phase, GamePhase::TurnResult);
        assert_eq!(
            game.current_turn.as_ref().unwrap().turn_end_reason,
            Some(TurnEndReason::AllCorrect)
        );
    }

    #[tokio::test]
    async fn draw_timeout_after_turn_end_is_discarded() {
        let state = app_state().await;
        let game = into_drawing(&state, "room-1", 3).await;
        let timeout_guard = game.guard();

        end_turn_from_timer(&state, "room-1", game.guard(), TurnEndReason::AllCorrect)
            .await
            .unwrap();
        let ended = game_service::load_state(&state, "room-1").await.unwrap();

        // The draw timeout fires late; the phase already moved on.
        end_turn_from_timer(&state, "room-1", timeout_guard, TurnEndReason::TimeOut)
            .await
            .unwrap();
        let unchanged = game_service::load_state(&state, "room-1").await.unwrap();
        assert_eq!(unchanged, ended);
        assert_eq!(
            unchanged.current_turn.as_ref().unwrap().turn_end_reason,
            Some(TurnEndReason::AllCorrect)
        );
    }

    #[tokio::test]
    async fn drawer_leaving_cuts_the_turn_short() {
        let state = app_state().await;
        let game = into_drawing(&state, "room-1", 3).await;
        let drawer = game.current_drawer_id().unwrap().to_owned();

        handle_player_left(&state, "room-1", &drawer).await.unwrap();
        let game = game_service::load_state(&state, "room-1").await.unwrap();
        assert_eq!(game.phase, GamePhase::TurnResult);
        assert_eq!(
            game.current_turn.as_ref().unwrap().turn_end_reason,
            Some(TurnEndReason::DrawerLeft)
        );
    }

    #[tokio::test]
    async fn guesser_leaving_changes_nothing() {
        let state = app_state().await;
        let game = into_drawing(&state, "room-1", 3).await;
        let guesser = guessers(&game)[0].clone();

        handle_player_left(&state, "room-1", &guesser).await.unwrap();
        let unchanged = game_service::load_state(&state, "room-1").await.unwrap();
        assert_eq!(unchanged.phase, GamePhase::Drawing);
        assert!(unchanged.players.contains_key(&guesser));
    }
}
