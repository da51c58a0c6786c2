use std::time::SystemTime;

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dao::models::{GamePlayerEntity, GameStateEntity, TurnEntity};
use crate::state::state_machine::GamePhase;

/// Persisted shape of one room's game state. The `expires_at` field backs the
/// retention TTL index so abandoned sessions disappear on their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoStateDocument {
    #[serde(rename = "_id")]
    room_id: String,
    game_session_id: Uuid,
    current_round: u32,
    total_rounds: u32,
    phase: GamePhase,
    turn_order: Vec<String>,
    phase_started_at: DateTime,
    draw_secs: u64,
    current_turn: Option<TurnEntity>,
    players: Vec<GamePlayerEntity>,
    pub(super) expires_at: DateTime,
}

impl MongoStateDocument {
    /// Wrap an entity for persistence, stamping the retention deadline.
    pub fn with_deadline(entity: GameStateEntity, expires_at: SystemTime) -> Self {
        Self {
            room_id: entity.room_id,
            game_session_id: entity.game_session_id,
            current_round: entity.current_round,
            total_rounds: entity.total_rounds,
            phase: entity.phase,
            turn_order: entity.turn_order,
            phase_started_at: DateTime::from_system_time(entity.phase_started_at),
            draw_secs: entity.draw_secs,
            current_turn: entity.current_turn,
            players: entity.players,
            expires_at: DateTime::from_system_time(expires_at),
        }
    }
}

impl From<MongoStateDocument> for GameStateEntity {
    fn from(value: MongoStateDocument) -> Self {
        Self {
            room_id: value.room_id,
            game_session_id: value.game_session_id,
            current_round: value.current_round,
            total_rounds: value.total_rounds,
            phase: value.phase,
            turn_order: value.turn_order,
            phase_started_at: value.phase_started_at.to_system_time(),
            draw_secs: value.draw_secs,
            current_turn: value.current_turn,
            players: value.players,
        }
    }
}
