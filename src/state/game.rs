use std::collections::BTreeSet;
use std::time::SystemTime;

use indexmap::IndexMap;
use rand::{Rng, seq::SliceRandom};
use uuid::Uuid;

use crate::dao::models::{GamePlayerEntity, GameStateEntity, TurnEntity};
use crate::state::state_machine::{GamePhase, InvalidTransition, TurnEndReason};

/// Player record tracked for the lifetime of one game, distinct from room
/// membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamePlayer {
    /// Identifier of the player within the room.
    pub player_id: String,
    /// Display name captured when the game started.
    pub nickname: String,
    /// Cumulative score; never decreases within a game.
    pub score: u32,
    /// Whether this player already answered correctly in the current turn.
    pub is_correct: bool,
}

/// State of a single turn. Replaced wholesale when the next turn starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnInfo {
    /// Global turn counter (1-based), never reset across rounds.
    pub turn_number: u32,
    /// Identifier of the player drawing this turn.
    pub drawer_id: String,
    /// Display name of the drawer.
    pub drawer_nickname: String,
    /// The secret word; `None` until the drawer picked one.
    pub word: Option<String>,
    /// Candidate words offered to the drawer; cleared once drawing starts.
    pub word_choices: Vec<String>,
    /// 0 = no hint, 1 = word length revealed, 2 = positions being revealed.
    pub hint_level: u8,
    /// Character indices whose letter-head (chosung) has been disclosed.
    pub revealed_chosung_positions: BTreeSet<usize>,
    /// Character indices whose full character has been disclosed.
    pub revealed_letter_positions: BTreeSet<usize>,
    /// Players who answered correctly, in answer order. Never the drawer.
    pub correct_player_ids: Vec<String>,
    /// Set exactly once, when the turn concludes.
    pub turn_end_reason: Option<TurnEndReason>,
}

impl TurnInfo {
    fn new(turn_number: u32, drawer_id: String, drawer_nickname: String, choices: Vec<String>) -> Self {
        Self {
            turn_number,
            drawer_id,
            drawer_nickname,
            word: None,
            word_choices: choices,
            hint_level: 0,
            revealed_chosung_positions: BTreeSet::new(),
            revealed_letter_positions: BTreeSet::new(),
            correct_player_ids: Vec::new(),
            turn_end_reason: None,
        }
    }

    /// All revealed positions regardless of kind, for picking the next one.
    pub fn revealed_positions(&self) -> BTreeSet<usize> {
        self.revealed_chosung_positions
            .union(&self.revealed_letter_positions)
            .copied()
            .collect()
    }
}

/// Snapshot of the identifiers a timer captures at scheduling time. A fired
/// timer only acts when the reloaded state still matches all three fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerGuard {
    /// Session the timer was armed for.
    pub game_session_id: Uuid,
    /// Turn the timer was armed for (0 before the first turn).
    pub turn_number: u32,
    /// Phase the state must still be in for the timer to act.
    pub expected_phase: GamePhase,
}

/// Aggregate state of one running game, keyed by room. Owned exclusively by
/// the session engine; everything else sees broadcast snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameState {
    /// Room this game belongs to.
    pub room_id: String,
    /// Minted once per game start; stale timers are detected through it.
    pub game_session_id: Uuid,
    /// 1-based round counter, recomputed from the turn number.
    pub current_round: u32,
    /// Number of rounds the game runs for.
    pub total_rounds: u32,
    /// Current phase.
    pub phase: GamePhase,
    /// Drawing order, shuffled once at game start and fixed afterwards.
    pub turn_order: Vec<String>,
    /// When the current phase began. Informational; timers are authoritative.
    pub phase_started_at: SystemTime,
    /// Seconds allotted to the drawing phase.
    pub draw_secs: u64,
    /// The active turn, absent before the countdown finishes.
    pub current_turn: Option<TurnInfo>,
    /// Per-game player records, keyed by player id in join order.
    pub players: IndexMap<String, GamePlayer>,
}

impl GameState {
    /// Bootstrap a fresh game for a room.
    ///
    /// The turn order is shuffled once so every game deals a different
    /// drawing sequence while staying fixed for the game's lifetime.
    pub fn new<R: Rng>(
        room_id: String,
        roster: Vec<(String, String)>,
        total_rounds: u32,
        draw_secs: u64,
        rng: &mut R,
    ) -> Self {
        let players: IndexMap<String, GamePlayer> = roster
            .into_iter()
            .map(|(player_id, nickname)| {
                (
                    player_id.clone(),
                    GamePlayer {
                        player_id,
                        nickname,
                        score: 0,
                        is_correct: false,
                    },
                )
            })
            .collect();

        let mut turn_order: Vec<String> = players.keys().cloned().collect();
        if turn_order.len() > 1 {
            turn_order.shuffle(rng);
        }

        Self {
            room_id,
            game_session_id: Uuid::new_v4(),
            current_round: 1,
            total_rounds,
            phase: GamePhase::Countdown,
            turn_order,
            phase_started_at: SystemTime::now(),
            draw_secs,
            current_turn: None,
            players,
        }
    }

    /// Total number of turns the game will play.
    pub fn total_turns(&self) -> u32 {
        self.turn_order.len() as u32 * self.total_rounds
    }

    /// Turn number of the active turn, or 0 before the first turn starts.
    pub fn turn_number(&self) -> u32 {
        self.current_turn.as_ref().map_or(0, |turn| turn.turn_number)
    }

    /// Capture the staleness-guard triple for a timer armed right now.
    pub fn guard(&self) -> TimerGuard {
        TimerGuard {
            game_session_id: self.game_session_id,
            turn_number: self.turn_number(),
            expected_phase: self.phase,
        }
    }

    /// Whether a previously captured guard still describes this state.
    pub fn matches_guard(&self, guard: &TimerGuard) -> bool {
        self.game_session_id == guard.game_session_id
            && self.turn_number() == guard.turn_number
            && self.phase == guard.expected_phase
    }

    /// Advance to the next phase along a legal edge and restamp the phase
    /// start time.
    pub fn advance_phase(&mut self, to: GamePhase) -> Result<(), InvalidTransition> {
        self.phase.validate_transition(to)?;
        self.phase = to;
        self.phase_started_at = SystemTime::now();
        Ok(())
    }

    /// Replace the current turn with turn `turn_number` and enter word
    /// selection.
    ///
    /// Recomputes the round from the turn number, rotates the drawer through
    /// the fixed turn order, and clears every player's correctness flag.
    pub fn begin_turn(
        &mut self,
        turn_number: u32,
        word_choices: Vec<String>,
    ) -> Result<(), InvalidTransition> {
        self.advance_phase(GamePhase::WordSelect)?;

        let index = (turn_number - 1) as usize % self.turn_order.len();
        let drawer_id = self.turn_order[index].clone();
        let drawer_nickname = self
            .players
            .get(&drawer_id)
            .map(|player| player.nickname.clone())
            .unwrap_or_default();

        self.current_round = (turn_number - 1) / self.turn_order.len() as u32 + 1;
        for player in self.players.values_mut() {
            player.is_correct = false;
        }
        self.current_turn = Some(TurnInfo::new(
            turn_number,
            drawer_id,
            drawer_nickname,
            word_choices,
        ));

        Ok(())
    }

    /// Identifier of the player currently drawing, if a turn is active.
    pub fn current_drawer_id(&self) -> Option<&str> {
        self.current_turn.as_ref().map(|turn| turn.drawer_id.as_str())
    }

    /// Number of players guessing this turn (everyone but the drawer).
    pub fn guesser_count(&self) -> usize {
        self.players.len().saturating_sub(1)
    }

    /// Whether every guesser has answered correctly this turn.
    pub fn all_guessers_correct(&self) -> bool {
        let turn = match &self.current_turn {
            Some(turn) => turn,
            None => return false,
        };
        turn.correct_player_ids.len() >= self.guesser_count()
    }

    /// Record a correct answer for `player_id` and credit the points.
    ///
    /// The drawer and already-correct players are never recorded; callers
    /// validate beforehand and this keeps the invariant even if they slip.
    pub fn mark_correct(&mut self, player_id: &str, guesser_points: u32, drawer_points: u32) {
        let drawer_id = match self.current_drawer_id() {
            Some(id) => id.to_owned(),
            None => return,
        };
        if player_id == drawer_id {
            return;
        }

        if let Some(turn) = self.current_turn.as_mut() {
            if turn.correct_player_ids.iter().any(|id| id == player_id) {
                return;
            }
            turn.correct_player_ids.push(player_id.to_owned());
        }
        if let Some(player) = self.players.get_mut(player_id) {
            player.is_correct = true;
            player.score += guesser_points;
        }
        if let Some(drawer) = self.players.get_mut(&drawer_id) {
            drawer.score += drawer_points;
        }
    }
}

impl From<GamePlayerEntity> for GamePlayer {
    fn from(value: GamePlayerEntity) -> Self {
        Self {
            player_id: value.player_id,
            nickname: value.nickname,
            score: value.score,
            is_correct: value.is_correct,
        }
    }
}

impl From<GamePlayer> for GamePlayerEntity {
    fn from(value: GamePlayer) -> Self {
        Self {
            player_id: value.player_id,
            nickname: value.nickname,
            score: value.score,
            is_correct: value.is_correct,
        }
    }
}

impl From<TurnEntity> for TurnInfo {
    fn from(value: TurnEntity) -> Self {
        Self {
            turn_number: value.turn_number,
            drawer_id: value.drawer_id,
            drawer_nickname: value.drawer_nickname,
            word: value.word,
            word_choices: value.word_choices,
            hint_level: value.hint_level,
            revealed_chosung_positions: value.revealed_chosung_positions.into_iter().collect(),
            revealed_letter_positions: value.revealed_letter_positions.into_iter().collect(),
            correct_player_ids: value.correct_player_ids,
            turn_end_reason: value.turn_end_reason,
        }
    }
}

impl From<TurnInfo> for TurnEntity {
    fn from(value: TurnInfo) -> Self {
        Self {
            turn_number: value.turn_number,
            drawer_id: value.drawer_id,
            drawer_nickname: value.drawer_nickname,
            word: value.word,
            word_choices: value.word_choices,
            hint_level: value.hint_level,
            revealed_chosung_positions: value.revealed_chosung_positions.into_iter().collect(),
            revealed_letter_positions: value.revealed_letter_positions.into_iter().collect(),
            correct_player_ids: value.correct_player_ids,
            turn_end_reason: value.turn_end_reason,
        }
    }
}

impl From<GameStateEntity> for GameState {
    fn from(value: GameStateEntity) -> Self {
        Self {
            room_id: value.room_id,
            game_session_id: value.game_session_id,
            current_round: value.current_round,
            total_rounds: value.total_rounds,
            phase: value.phase,
            turn_order: value.turn_order,
            phase_started_at: value.phase_started_at,
            draw_secs: value.draw_secs,
            current_turn: value.current_turn.map(Into::into),
            players: value
                .players
                .into_iter()
                .map(|player| (player.player_id.clone(), player.into()))
                .collect(),
        }
    }
}

impl From<GameState> for GameStateEntity {
    fn from(value: GameState) -> Self {
        Self {
            room_id: value.room_id,
            game_session_id: value.game_session_id,
            current_round: value.current_round,
            total_rounds: value.total_rounds,
            phase: value.phase,
            turn_order: value.turn_order,
            phase_started_at: value.phase_started_at,
            draw_secs: value.draw_secs,
            current_turn: value.current_turn.map(Into::into),
            players: value.players.into_values().map(Into::into).collect(),
        }
    }
}
