use dashmap::DashMap;
use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Registry of per-room broadcast hubs, created lazily on first subscription
/// or broadcast and dropped when a room's game is cleaned up.
pub struct SseState {
    rooms: DashMap<String, SseHub>,
    capacity: usize,
}

impl SseState {
    /// Build the registry with a per-room channel capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            capacity,
        }
    }

    /// Register a subscriber for a room, creating its hub when missing.
    pub fn subscribe(&self, room_id: &str) -> broadcast::Receiver<ServerEvent> {
        self.rooms
            .entry(room_id.to_owned())
            .or_insert_with(|| SseHub::new(self.capacity))
            .subscribe()
    }

    /// Publish an event to a room's subscribers. Fire-and-forget: a room
    /// without subscribers silently drops the event.
    pub fn broadcast(&self, room_id: &str, event: ServerEvent) {
        if let Some(hub) = self.rooms.get(room_id) {
            hub.broadcast(event);
        }
    }

    /// Drop the hub of a room whose game is gone.
    pub fn remove_room(&self, room_id: &str) {
        self.rooms.remove(room_id);
    }
}

/// Simple broadcast hub wrapper carrying one room's event stream.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send an event to all current subscribers, ignoring delivery errors.
    pub fn broadcast(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}
