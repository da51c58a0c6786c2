use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::game_store::GameStore;
use crate::dao::models::GameStateEntity;
use crate::dao::storage::StorageResult;

/// In-process store keeping one state document per room with lazy TTL
/// eviction. Default backend when no database is configured, and the test
/// double for the timer and service tests.
#[derive(Clone)]
pub struct MemoryGameStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    entries: DashMap<String, StoredState>,
    ttl: Duration,
}

struct StoredState {
    state: GameStateEntity,
    expires_at: Instant,
}

impl MemoryGameStore {
    /// Create a store whose entries expire `ttl` after their last write.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                entries: DashMap::new(),
                ttl,
            }),
        }
    }

    fn save(&self, state: GameStateEntity) {
        let expires_at = Instant::now() + self.inner.ttl;
        self.inner
            .entries
            .insert(state.room_id.clone(), StoredState { state, expires_at });
    }

    fn find(&self, room_id: &str) -> Option<GameStateEntity> {
        let entry = self.inner.entries.get(room_id)?;
        if entry.expires_at <= Instant::now() {
            drop(entry);
            self.inner.entries.remove(room_id);
            return None;
        }
        Some(entry.state.clone())
    }

    fn delete(&self, room_id: &str) -> bool {
        self.inner.entries.remove(room_id).is_some()
    }
}

impl GameStore for MemoryGameStore {
    fn save_state(&self, state: GameStateEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.save(state);
            Ok(())
        })
    }

    fn find_state(
        &self,
        room_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>> {
        let store = self.clone();
        let room_id = room_id.to_owned();
        Box::pin(async move { Ok(store.find(&room_id)) })
    }

    fn delete_state(&self, room_id: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        let room_id = room_id.to_owned();
        Box::pin(async move { Ok(store.delete(&room_id)) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use uuid::Uuid;

    use super::*;
    use crate::state::state_machine::GamePhase;

    fn entity(room_id: &str) -> GameStateEntity {
        GameStateEntity {
            room_id: room_id.to_owned(),
            game_session_id: Uuid::new_v4(),
            current_round: 1,
            total_rounds: 2,
            phase: GamePhase::Countdown,
            turn_order: vec!["p0".into(), "p1".into()],
            phase_started_at: SystemTime::now(),
            draw_secs: 90,
            current_turn: None,
            players: Vec::new(),
        }
    }

    #[tokio::test]
    async fn save_find_delete_round_trip() {
        let store = MemoryGameStore::new(Duration::from_secs(60));
        let state = entity("room-1");

        store.save_state(state.clone()).await.unwrap();
        let loaded = store.find_state("room-1").await.unwrap();
        assert_eq!(loaded, Some(state));

        assert!(store.delete_state("room-1").await.unwrap());
        assert!(!store.delete_state("room-1").await.unwrap());
        assert_eq!(store.find_state("room-1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_entries_are_not_returned() {
        let store = MemoryGameStore::new(Duration::from_millis(0));
        store.save_state(entity("room-1")).await.unwrap();
        assert_eq!(store.find_state("room-1").await.unwrap(), None);
    }
}
