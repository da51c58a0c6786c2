//! Fire-once timer scheduling. Every delayed action captures the room's
//! `(session, turn, phase)` triple when armed; on firing it re-validates that
//! triple against the persisted state before doing anything. Superseded
//! timers are never cancelled — they fire, fail the check, and die quietly.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::ServiceError;
use crate::services::{phase_service, turn_service};
use crate::state::SharedState;
use crate::state::game::TimerGuard;
use crate::state::state_machine::TurnEndReason;

/// The typed command a fired timer dispatches into the phase/turn managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Countdown before the first turn elapsed.
    Countdown,
    /// The drawer's word-selection deadline elapsed.
    WordSelectDeadline,
    /// Reveal the word-length hint.
    FirstHint,
    /// Reveal one more letter-head.
    SecondHint,
    /// The drawing time ran out.
    DrawTimeout,
    /// Grace delay after the last correct answer elapsed.
    AllCorrectGrace,
    /// The turn-result display time elapsed.
    TurnResultDisplay,
    /// The post-game return-to-lobby window elapsed.
    LobbyReturn,
}

/// Arm a fire-once timer for a room.
///
/// The task is detached; nothing cancels it when the game moves on, the
/// staleness check at firing time does that instead.
pub fn schedule(
    state: &SharedState,
    room_id: &str,
    kind: TimerKind,
    delay: Duration,
    guard: TimerGuard,
) {
    let state = state.clone();
    let room_id = room_id.to_owned();
    tokio::spawn(async move {
        sleep(delay).await;
        if let Err(err) = fire(&state, &room_id, kind, guard).await {
            warn!(
                room_id,
                kind = ?kind,
                error = %err,
                "timer action failed"
            );
        }
    });
}

/// Dispatch a fired timer to the manager owning its effect. Exposed to the
/// tests so they can drive firings without sleeping.
pub(crate) async fn fire(
    state: &SharedState,
    room_id: &str,
    kind: TimerKind,
    guard: TimerGuard,
) -> Result<(), ServiceError> {
    debug!(
        room_id,
        kind = ?kind,
        turn_number = guard.turn_number,
        expected_phase = ?guard.expected_phase,
        "timer fired"
    );

    match kind {
        TimerKind::Countdown => phase_service::begin_first_turn(state, room_id, guard).await,
        TimerKind::WordSelectDeadline => {
            phase_service::auto_select_word(state, room_id, guard).await
        }
        TimerKind::FirstHint => {
            phase_service::apply_timer_hint(state, room_id, phase_service::HINT_LEVEL_LENGTH, guard)
                .await
        }
        TimerKind::SecondHint => {
            phase_service::apply_timer_hint(state, room_id, phase_service::HINT_LEVEL_REVEAL, guard)
                .await
        }
        TimerKind::DrawTimeout => {
            turn_service::end_turn_from_timer(state, room_id, guard, TurnEndReason::TimeOut).await
        }
        TimerKind::AllCorrectGrace => {
            turn_service::end_turn_from_timer(state, room_id, guard, TurnEndReason::AllCorrect)
                .await
        }
        TimerKind::TurnResultDisplay => {
            phase_service::advance_after_result(state, room_id, guard).await
        }
        TimerKind::LobbyReturn => phase_service::resolve_lobby_return(state, room_id, guard).await,
    }
}
