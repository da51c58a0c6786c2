pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::models::GameStateEntity;
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for per-room game state.
///
/// Every write refreshes the retention TTL; a state that has not been touched
/// for the retention window may disappear from `find_state`.
pub trait GameStore: Send + Sync {
    /// Upsert the state document for its room and refresh the TTL.
    fn save_state(&self, state: GameStateEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Fetch the state document for a room, `None` when absent or expired.
    fn find_state(&self, room_id: &str) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>>;
    /// Remove the state document for a room; `false` when nothing was stored.
    fn delete_state(&self, room_id: &str) -> BoxFuture<'static, StorageResult<bool>>;
    /// Cheap liveness probe against the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
