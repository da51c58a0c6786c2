use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::dto::format_system_time;
use crate::dto::phase::VisiblePhase;
use crate::dto::validation::validate_custom_word;
use crate::services::hints;
use crate::state::game::{GamePlayer, GameState};
use crate::state::state_machine::GamePhase;

/// One roster entry supplied by the transport layer when a game starts.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PlayerInput {
    /// Identifier of the player within the room.
    #[validate(length(min = 1, max = 64))]
    pub player_id: String,
    /// Display name shown to the other players.
    #[validate(length(min = 1, max = 20))]
    pub nickname: String,
}

/// Request starting a game in a room.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct StartGameRequest {
    /// Authoritative roster at game start, including the host.
    #[validate(length(min = 2, max = 12), nested)]
    pub players: Vec<PlayerInput>,
    /// Pre-game host, recovered when the room returns to its lobby.
    #[validate(length(min = 1, max = 64))]
    pub host_id: String,
    /// Number of rounds; every player draws once per round.
    #[validate(range(min = 1, max = 10))]
    pub total_rounds: u32,
    /// Drawing time in seconds; the configured default applies when absent.
    #[validate(range(min = 30, max = 300))]
    pub draw_secs: Option<u64>,
}

/// Request carrying the drawer's word selection.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SelectWordRequest {
    /// Player attempting the selection; must be the current drawer.
    #[validate(length(min = 1, max = 64))]
    pub player_id: String,
    /// Chosen word, either one of the candidates or a custom entry.
    #[validate(custom(function = validate_custom_word))]
    pub word: String,
}

/// Request recording a guess already judged correct upstream.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CorrectGuessRequest {
    /// The guesser who got the word right.
    #[validate(length(min = 1, max = 64))]
    pub player_id: String,
}

/// Request for a manual hint, following the auto-hint contract.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct HintRequest {
    /// Requested hint level (1 or 2).
    #[validate(range(min = 1, max = 2))]
    pub level: u8,
}

/// Notification that a player left the room mid-game.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct PlayerLeftRequest {
    /// The player who disconnected.
    #[validate(length(min = 1, max = 64))]
    pub player_id: String,
}

/// Notification that a player returned to the lobby after the game ended.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReturnToLobbyRequest {
    /// The returning player.
    #[validate(length(min = 1, max = 64))]
    pub player_id: String,
}

/// Generic acknowledgement payload for mutating game routes.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    /// Human readable confirmation of what happened.
    pub message: String,
}

/// Query parameters of the snapshot route.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct SnapshotQuery {
    /// Player the snapshot is rendered for; secret fields stay hidden
    /// without it.
    pub viewer: Option<String>,
}

/// Scoreboard line for one player.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerSummary {
    /// Identifier of the player.
    pub player_id: String,
    /// Display name.
    pub nickname: String,
    /// Cumulative score.
    pub score: u32,
    /// Whether the player already answered correctly this turn.
    pub is_correct: bool,
}

impl From<&GamePlayer> for PlayerSummary {
    fn from(value: &GamePlayer) -> Self {
        Self {
            player_id: value.player_id.clone(),
            nickname: value.nickname.clone(),
            score: value.score,
            is_correct: value.is_correct,
        }
    }
}

/// Turn state as shown to one viewer. Secret fields are stripped unless the
/// viewer is entitled to them.
#[derive(Debug, Serialize, ToSchema)]
pub struct TurnSnapshot {
    /// Global turn counter (1-based).
    pub turn_number: u32,
    /// Identifier of the drawer.
    pub drawer_id: String,
    /// Display name of the drawer.
    pub drawer_nickname: String,
    /// Current hint level (0-2).
    pub hint_level: u8,
    /// Display mask, present once the length hint is out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask: Option<Vec<String>>,
    /// Players who answered correctly, in answer order.
    pub correct_player_ids: Vec<String>,
    /// The secret word; only for the drawer or once the turn is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    /// Candidate words; only for the drawer during word selection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word_choices: Option<Vec<String>>,
}

/// Snapshot of a room's game as shown to one viewer.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSnapshot {
    /// Room this game belongs to.
    pub room_id: String,
    /// Session identifier minted at game start.
    pub game_session_id: Uuid,
    /// Current phase.
    pub phase: VisiblePhase,
    /// 1-based round counter.
    pub current_round: u32,
    /// Number of rounds the game runs for.
    pub total_rounds: u32,
    /// Seconds allotted to the drawing phase.
    pub draw_secs: u64,
    /// RFC3339 timestamp of when the current phase began.
    pub phase_started_at: String,
    /// Scoreboard in join order.
    pub players: Vec<PlayerSummary>,
    /// The active turn, absent before the countdown finishes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turn: Option<TurnSnapshot>,
}

impl GameSnapshot {
    /// Project the aggregate for a viewer, masking the secret word and the
    /// candidate list away from everyone but the drawer until the turn result
    /// makes them public.
    pub fn for_viewer(game: &GameState, viewer: Option<&str>) -> Self {
        let turn = game.current_turn.as_ref().map(|turn| {
            let is_drawer = viewer == Some(turn.drawer_id.as_str());
            let turn_over = matches!(game.phase, GamePhase::TurnResult | GamePhase::GameEnd);

            let mask = match (&turn.word, game.phase) {
                (Some(word), GamePhase::Drawing) if turn.hint_level >= 1 => Some(
                    hints::render_mask(
                        word,
                        &turn.revealed_chosung_positions,
                        &turn.revealed_letter_positions,
                    ),
                ),
                _ => None,
            };

            TurnSnapshot {
                turn_number: turn.turn_number,
                drawer_id: turn.drawer_id.clone(),
                drawer_nickname: turn.drawer_nickname.clone(),
                hint_level: turn.hint_level,
                mask,
                correct_player_ids: turn.correct_player_ids.clone(),
                word: if is_drawer || turn_over {
                    turn.word.clone()
                } else {
                    None
                },
                word_choices: if is_drawer && game.phase == GamePhase::WordSelect {
                    Some(turn.word_choices.clone())
                } else {
                    None
                },
            }
        });

        Self {
            room_id: game.room_id.clone(),
            game_session_id: game.game_session_id,
            phase: game.phase.into(),
            current_round: game.current_round,
            total_rounds: game.total_rounds,
            draw_secs: game.draw_secs,
            phase_started_at: format_system_time(game.phase_started_at),
            players: game.players.values().map(Into::into).collect(),
            turn,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::state::state_machine::GamePhase;

    fn drawing_game() -> GameState {
        let mut rng = StdRng::seed_from_u64(3);
        let mut game = GameState::new(
            "room-1".into(),
            vec![
                ("p0".into(), "zero".into()),
                ("p1".into(), "one".into()),
                ("p2".into(), "two".into()),
            ],
            1,
            90,
            &mut rng,
        );
        game.begin_turn(1, vec!["사과".into(), "포도".into()]).unwrap();
        game
    }

    #[test]
    fn word_choices_are_only_shown_to_the_drawer() {
        let game = drawing_game();
        let drawer = game.current_drawer_id().unwrap().to_owned();
        let guesser = game
            .turn_order
            .iter()
            .find(|id| **id != drawer)
            .unwrap()
            .clone();

        let for_drawer = GameSnapshot::for_viewer(&game, Some(&drawer));
        assert!(for_drawer.turn.as_ref().unwrap().word_choices.is_some());

        let for_guesser = GameSnapshot::for_viewer(&game, Some(&guesser));
        assert!(for_guesser.turn.as_ref().unwrap().word_choices.is_none());

        let anonymous = GameSnapshot::for_viewer(&game, None);
        assert!(anonymous.turn.as_ref().unwrap().word_choices.is_none());
    }

    #[test]
    fn secret_word_is_hidden_until_the_turn_ends() {
        let mut game = drawing_game();
        let drawer = game.current_drawer_id().unwrap().to_owned();
        let guesser = game
            .turn_order
            .iter()
            .find(|id| **id != drawer)
            .unwrap()
            .clone();

        if let Some(turn) = game.current_turn.as_mut() {
            turn.word = Some("사과".into());
            turn.word_choices.clear();
        }
        game.advance_phase(GamePhase::Drawing).unwrap();

        let for_guesser = GameSnapshot::for_viewer(&game, Some(&guesser));
        assert!(for_guesser.turn.as_ref().unwrap().word.is_none());
        let for_drawer = GameSnapshot::for_viewer(&game, Some(&drawer));
        assert_eq!(
            for_drawer.turn.as_ref().unwrap().word.as_deref(),
            Some("사과")
        );

        game.advance_phase(GamePhase::TurnResult).unwrap();
        let for_guesser = GameSnapshot::for_viewer(&game, Some(&guesser));
        assert_eq!(
            for_guesser.turn.as_ref().unwrap().word.as_deref(),
            Some("사과")
        );
    }

    #[test]
    fn mask_appears_with_the_length_hint() {
        let mut game = drawing_game();
        if let Some(turn) = game.current_turn.as_mut() {
            turn.word = Some("사과".into());
        }
        game.advance_phase(GamePhase::Drawing).unwrap();

        let snapshot = GameSnapshot::for_viewer(&game, None);
        assert!(snapshot.turn.as_ref().unwrap().mask.is_none());

        if let Some(turn) = game.current_turn.as_mut() {
            turn.hint_level = 1;
        }
        let snapshot = GameSnapshot::for_viewer(&game, None);
        assert_eq!(
            snapshot.turn.as_ref().unwrap().mask,
            Some(vec!["_".to_owned(), "_".to_owned()])
        );
    }
}
