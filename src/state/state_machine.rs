use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Phases a game session moves through, in the order they occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Short countdown displayed to everyone before the first turn starts.
    Countdown,
    /// The drawer is choosing the secret word from their candidates.
    WordSelect,
    /// The drawer is drawing; guesses are accepted and hints may be revealed.
    Drawing,
    /// The finished turn's word and score deltas are on display.
    TurnResult,
    /// All rounds are complete; final scoreboard shown, terminal.
    GameEnd,
}

/// Why the current turn concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnEndReason {
    /// The draw timer expired before every guesser answered.
    TimeOut,
    /// Every non-drawer answered correctly before the timer expired.
    AllCorrect,
    /// The drawer disconnected mid-turn.
    DrawerLeft,
}

/// Error returned when a phase change does not follow a legal edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid transition: {from:?} cannot advance to {to:?}")]
pub struct InvalidTransition {
    /// Phase the session was in when the illegal advance was attempted.
    pub from: GamePhase,
    /// Phase the caller tried to advance to.
    pub to: GamePhase,
}

impl GamePhase {
    /// Validate that `to` is reachable from this phase in one step.
    ///
    /// The only legal edges are the ones of the gameplay loop: countdown into
    /// word selection, word selection into drawing, drawing into the turn
    /// result, and the turn result into either the next word selection or the
    /// end of the game. `GameEnd` is terminal.
    pub fn validate_transition(self, to: GamePhase) -> Result<(), InvalidTransition> {
        use GamePhase::{Countdown, Drawing, GameEnd, TurnResult, WordSelect};

        match (self, to) {
            (Countdown, WordSelect)
            | (WordSelect, Drawing)
            | (Drawing, TurnResult)
            | (TurnResult, WordSelect)
            | (TurnResult, GameEnd) => Ok(()),
            (from, to) => Err(InvalidTransition { from, to }),
        }
    }

    /// Whether the session can never leave this phase.
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::GameEnd)
    }
}
