//! Room membership collaborator. The engine never manages room membership
//! itself; it hands the roster/host questions to a [`RoomGateway`] and only
//! drives the post-game return-to-lobby window through it.

use dashmap::DashMap;

/// How a room resolves once its return-to-lobby window closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LobbyOutcome {
    /// Nobody came back; the room can be torn down.
    Disband,
    /// At least one player returned; the room resumes waiting.
    ResumeWaiting {
        /// Pre-game host, recovered for the waiting room.
        host_id: String,
        /// Players who returned during the window, in return order.
        returned: Vec<String>,
    },
}

/// Collaborator owning room membership and the post-game lobby workflow.
pub trait RoomGateway: Send + Sync {
    /// Remember the pre-game host when a game starts in `room_id`.
    fn game_started(&self, room_id: &str, host_id: &str);
    /// Open the bounded window during which players may return to the lobby.
    fn open_return_window(&self, room_id: &str);
    /// Record a player returning; `false` when no window is open.
    fn record_return(&self, room_id: &str, player_id: &str) -> bool;
    /// Close the window and resolve what happens to the room.
    fn resolve_return_window(&self, room_id: &str) -> LobbyOutcome;
}

#[derive(Debug, Default)]
struct RoomRecord {
    host_id: String,
    window_open: bool,
    returned: Vec<String>,
}

/// In-process gateway used when no external room service is wired in.
#[derive(Debug, Default)]
pub struct InProcessRoomGateway {
    rooms: DashMap<String, RoomRecord>,
}

impl RoomGateway for InProcessRoomGateway {
    fn game_started(&self, room_id: &str, host_id: &str) {
        self.rooms.insert(
            room_id.to_owned(),
            RoomRecord {
                host_id: host_id.to_owned(),
                window_open: false,
                returned: Vec::new(),
            },
        );
    }

    fn open_return_window(&self, room_id: &str) {
        if let Some(mut record) = self.rooms.get_mut(room_id) {
            record.window_open = true;
            record.returned.clear();
        }
    }

    fn record_return(&self, room_id: &str, player_id: &str) -> bool {
        let Some(mut record) = self.rooms.get_mut(room_id) else {
            return false;
        };
        if !record.window_open {
            return false;
        }
        if !record.returned.iter().any(|id| id == player_id) {
            record.returned.push(player_id.to_owned());
        }
        true
    }

    fn resolve_return_window(&self, room_id: &str) -> LobbyOutcome {
        let Some((_, record)) = self.rooms.remove(room_id) else {
            return LobbyOutcome::Disband;
        };
        if record.returned.is_empty() {
            LobbyOutcome::Disband
        } else {
            LobbyOutcome::ResumeWaiting {
                host_id: record.host_id,
                returned: record.returned,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nobody_returned_disbands_the_room() {
        let gateway = InProcessRoomGateway::default();
        gateway.game_started("room-1", "host");
        gateway.open_return_window("room-1");
        assert_eq!(gateway.resolve_return_window("room-1"), LobbyOutcome::Disband);
    }

    #[test]
    fn returning_players_recover_the_pre_game_host() {
        let gateway = InProcessRoomGateway::default();
        gateway.game_started("room-1", "host");
        gateway.open_return_window("room-1");

        assert!(gateway.record_return("room-1", "p2"));
        assert!(gateway.record_return("room-1", "p1"));
        assert!(gateway.record_return("room-1", "p2"));

        assert_eq!(
            gateway.resolve_return_window("room-1"),
            LobbyOutcome::ResumeWaiting {
                host_id: "host".into(),
                returned: vec!["p2".into(), "p1".into()],
            }
        );
    }

    #[test]
    fn returns_outside_a_window_are_rejected() {
        let gateway = InProcessRoomGateway::default();
        assert!(!gateway.record_return("room-1", "p1"));

        gateway.game_started("room-1", "host");
        assert!(!gateway.record_return("room-1", "p1"));
    }

    #[test]
    fn resolving_twice_is_safe() {
        let gateway = InProcessRoomGateway::default();
        gateway.game_started("room-1", "host");
        gateway.open_return_window("room-1");
        gateway.record_return("room-1", "p1");

        assert!(matches!(
            gateway.resolve_return_window("room-1"),
            LobbyOutcome::ResumeWaiting { .. }
        ));
        assert_eq!(gateway.resolve_return_window("room-1"), LobbyOutcome::Disband);
    }
}
