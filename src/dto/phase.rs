use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::GamePhase;

/// Publicly visible game phase exposed to clients (REST/SSE).
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// Countdown before the first turn.
    Countdown,
    /// The drawer is choosing the secret word.
    WordSelect,
    /// The drawer is drawing and guesses are open.
    Drawing,
    /// The finished turn's word and scores are on display.
    TurnResult,
    /// The game is over; final scoreboard shown.
    GameEnd,
}

impl From<GamePhase> for VisiblePhase {
    fn from(value: GamePhase) -> Self {
        match value {
            GamePhase::Countdown => VisiblePhase::Countdown,
            GamePhase::WordSelect => VisiblePhase::WordSelect,
            GamePhase::Drawing => VisiblePhase::Drawing,
            GamePhase::TurnResult => VisiblePhase::TurnResult,
            GamePhase::GameEnd => VisiblePhase::GameEnd,
        }
    }
}
