pub mod game;
mod sse;
pub mod state_machine;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, watch};

use crate::config::AppConfig;
use crate::dao::game_store::GameStore;
use crate::error::ServiceError;
use crate::services::room_gateway::{InProcessRoomGateway, RoomGateway};
use crate::services::word_bank::{BundledWordBank, WordSupply};

pub use self::sse::{SseHub, SseState};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

const SSE_CHANNEL_CAPACITY: usize = 16;

/// Central application state storing the storage handle, per-room event hubs,
/// per-room critical-section locks, and the collaborator seams.
pub struct AppState {
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    sse: SseState,
    room_locks: DashMap<String, Arc<Mutex<()>>>,
    words: Arc<dyn WordSupply>,
    rooms: Arc<dyn RoomGateway>,
    config: AppConfig,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct the state with the bundled collaborators, wrapped in an
    /// [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed.
    pub fn new(config: AppConfig) -> SharedState {
        Self::with_collaborators(
            config,
            Arc::new(BundledWordBank),
            Arc::new(InProcessRoomGateway::default()),
        )
    }

    /// Construct the state with explicit collaborator implementations.
    pub fn with_collaborators(
        config: AppConfig,
        words: Arc<dyn WordSupply>,
        rooms: Arc<dyn RoomGateway>,
    ) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            game_store: RwLock::new(None),
            sse: SseState::new(SSE_CHANNEL_CAPACITY),
            room_locks: DashMap::new(),
            words,
            rooms,
            config,
            degraded: degraded_tx,
        })
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the game store or fail with a degraded-mode error.
    pub async fn require_game_store(&self) -> Result<Arc<dyn GameStore>, ServiceError> {
        self.game_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false).await;
    }

    /// Remove the current game store and enter degraded mode.
    pub async fn clear_game_store(&self) {
        {
            let mut guard = self.game_store.write().await;
            guard.take();
        }
        self.update_degraded(true).await;
    }

    /// Current degraded flag.
    pub async fn is_degraded(&self) -> bool {
        let guard = self.game_store.read().await;
        guard.is_none()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag.
    pub async fn update_degraded(&self, value: bool) {
        let _ = self.degraded.send(value);
    }

    /// Per-room event hub registry.
    pub fn room_events(&self) -> &SseState {
        &self.sse
    }

    /// Critical-section lock for a room, created lazily.
    ///
    /// Every read-modify-persist-broadcast sequence for a room — user action
    /// or timer firing — runs under this lock, so racing writers serialize
    /// and the staleness guard decides which of them still applies.
    pub fn room_lock(&self, room_id: &str) -> Arc<Mutex<()>> {
        self.room_locks
            .entry(room_id.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop the lock entry of a room whose game is gone.
    pub fn forget_room_lock(&self, room_id: &str) {
        self.room_locks.remove(room_id);
    }

    /// Word supply collaborator.
    pub fn words(&self) -> &dyn WordSupply {
        self.words.as_ref()
    }

    /// Room membership collaborator.
    pub fn rooms(&self) -> &dyn RoomGateway {
        self.rooms.as_ref()
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
