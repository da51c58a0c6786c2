use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::game::PlayerSummary;
use crate::state::state_machine::TurnEndReason;

#[derive(Clone, Debug)]
/// Dispatched payload carried across a room's SSE channel.
pub struct ServerEvent {
    /// SSE event name, when the payload is a named event.
    pub event: Option<String>,
    /// Serialized JSON data.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Build an event from an already serialized data string.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Room whose events this stream carries.
    pub room_id: String,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a game starts and the countdown begins.
pub struct GameStartedEvent {
    /// Session identifier minted for this game.
    pub game_session_id: Uuid,
    /// Countdown length before the first turn, in seconds.
    pub countdown_secs: u64,
    /// Number of rounds the game will run.
    pub total_rounds: u32,
    /// Seconds allotted to each drawing phase.
    pub draw_secs: u64,
    /// Shuffled drawing order for the whole game.
    pub turn_order: Vec<String>,
    /// Initial scoreboard.
    pub players: Vec<PlayerSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a turn enters word selection.
pub struct TurnStartedEvent {
    /// Global turn counter (1-based).
    pub turn_number: u32,
    /// Round this turn belongs to.
    pub current_round: u32,
    /// Identifier of the drawer.
    pub drawer_id: String,
    /// Display name of the drawer.
    pub drawer_nickname: String,
    /// Seconds the drawer gets before a word is auto-picked.
    pub word_select_secs: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the drawing phase starts.
pub struct DrawingStartedEvent {
    /// Global turn counter (1-based).
    pub turn_number: u32,
    /// Seconds until the draw timeout.
    pub draw_secs: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a hint is revealed.
pub struct HintRevealedEvent {
    /// Global turn counter (1-based).
    pub turn_number: u32,
    /// Hint level after this reveal.
    pub hint_level: u8,
    /// Display mask, one cell per character of the secret word.
    pub mask: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a correct guess is recorded.
pub struct CorrectAnswerEvent {
    /// Global turn counter (1-based).
    pub turn_number: u32,
    /// The guesser who answered.
    pub player_id: String,
    /// Display name of the guesser.
    pub nickname: String,
    /// 1-based answer rank within the turn.
    pub rank: usize,
    /// Points awarded to the guesser.
    pub points_awarded: u32,
    /// Bonus credited to the drawer for this answer.
    pub drawer_bonus: u32,
    /// Guesser's cumulative score after the award.
    pub player_score: u32,
    /// Drawer's cumulative score after the bonus.
    pub drawer_score: u32,
}

/// Why a turn ended, as exposed to clients.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TurnEndCause {
    /// The draw timer expired.
    TimeOut,
    /// Every guesser answered correctly.
    AllCorrect,
    /// The drawer disconnected.
    DrawerLeft,
}

impl From<TurnEndReason> for TurnEndCause {
    fn from(value: TurnEndReason) -> Self {
        match value {
            TurnEndReason::TimeOut => TurnEndCause::TimeOut,
            TurnEndReason::AllCorrect => TurnEndCause::AllCorrect,
            TurnEndReason::DrawerLeft => TurnEndCause::DrawerLeft,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when a turn concludes and its result goes on display.
pub struct TurnResultEvent {
    /// Global turn counter (1-based).
    pub turn_number: u32,
    /// Why the turn ended.
    pub reason: TurnEndCause,
    /// The secret word, now public.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub word: Option<String>,
    /// Scoreboard after the turn.
    pub scoreboard: Vec<PlayerSummary>,
    /// Seconds the result stays on display.
    pub display_secs: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the last turn completes and the game ends.
pub struct GameEndedEvent {
    /// Session identifier of the finished game.
    pub game_session_id: Uuid,
    /// Final scoreboard.
    pub scoreboard: Vec<PlayerSummary>,
    /// Seconds players have to return to the lobby.
    pub lobby_return_secs: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the return-to-lobby window resolves.
pub struct LobbyResolvedEvent {
    /// `disband` when nobody returned, `resume_waiting` otherwise.
    pub outcome: String,
    /// Recovered pre-game host, present when the room resumes waiting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host_id: Option<String>,
    /// Players who returned during the window.
    pub returned: Vec<String>,
}
