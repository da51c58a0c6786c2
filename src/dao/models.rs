use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::state::state_machine::{GamePhase, TurnEndReason};

/// Player record as persisted inside the game state document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GamePlayerEntity {
    /// Identifier of the player within the room.
    pub player_id: String,
    /// Display name captured when the game started.
    pub nickname: String,
    /// Cumulative score for the game.
    pub score: u32,
    /// Whether the player already answered correctly in the current turn.
    pub is_correct: bool,
}

/// Turn state as persisted inside the game state document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnEntity {
    /// Global turn counter (1-based), never reset across rounds.
    pub turn_number: u32,
    /// Identifier of the player drawing this turn.
    pub drawer_id: String,
    /// Display name of the drawer.
    pub drawer_nickname: String,
    /// The secret word, absent until the drawer picked one.
    pub word: Option<String>,
    /// Candidate words offered to the drawer during word selection.
    pub word_choices: Vec<String>,
    /// 0 = no hint, 1 = length revealed, 2 = positions being revealed.
    pub hint_level: u8,
    /// Character indices whose letter-head has been disclosed, ascending.
    pub revealed_chosung_positions: Vec<usize>,
    /// Character indices whose full character has been disclosed, ascending.
    pub revealed_letter_positions: Vec<usize>,
    /// Players who answered correctly, in answer order.
    pub correct_player_ids: Vec<String>,
    /// Why the turn concluded, set only once it did.
    pub turn_end_reason: Option<TurnEndReason>,
}

/// Aggregate game state persisted by the storage layer, one document per
/// room, bounded by the retention TTL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameStateEntity {
    /// Room this game belongs to; the storage key.
    pub room_id: String,
    /// Session identifier minted at game start.
    pub game_session_id: Uuid,
    /// 1-based round counter.
    pub current_round: u32,
    /// Number of rounds the game runs for.
    pub total_rounds: u32,
    /// Current phase.
    pub phase: GamePhase,
    /// Drawing order fixed at game start.
    pub turn_order: Vec<String>,
    /// When the current phase began.
    pub phase_started_at: SystemTime,
    /// Seconds allotted to the drawing phase.
    pub draw_secs: u64,
    /// The active turn, absent before the countdown finishes.
    pub current_turn: Option<TurnEntity>,
    /// Per-game player records in join order.
    pub players: Vec<GamePlayerEntity>,
}
