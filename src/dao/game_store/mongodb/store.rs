use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures::future::BoxFuture;
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, Database, bson::doc};
use tokio::sync::RwLock;

use super::connection::establish_connection;
use super::error::{MongoDaoError, MongoResult};
use super::models::MongoStateDocument;
use crate::dao::game_store::GameStore;
use crate::dao::models::GameStateEntity;
use crate::dao::storage::StorageResult;

const STATE_COLLECTION_NAME: &str = "game_states";

/// Connection settings for the MongoDB game store.
#[derive(Clone)]
pub struct MongoConfig {
    /// Parsed client options.
    pub options: ClientOptions,
    /// Database holding the state collection.
    pub database_name: String,
    /// Retention bound applied to every write.
    pub retention: Duration,
}

impl MongoConfig {
    /// Parse a connection URI into a config, defaulting the database name.
    pub async fn from_uri(
        uri: &str,
        db_name: Option<&str>,
        retention: Duration,
    ) -> MongoResult<Self> {
        let database_name = db_name.unwrap_or("sketch_guess").to_owned();
        let options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;

        Ok(Self {
            options,
            database_name,
            retention,
        })
    }
}

/// MongoDB-backed [`GameStore`] keeping one document per room, expired by a
/// TTL index on the retention deadline.
#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Establish a connection to MongoDB and ensure the TTL index is present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    /// Create the TTL index that lets MongoDB expire stale state documents
    /// once their retention deadline passes.
    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;
        let collection = database.collection::<mongodb::bson::Document>(STATE_COLLECTION_NAME);
        let index = mongodb::IndexModel::builder()
            .keys(doc! {"expires_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("state_retention_idx".to_owned()))
                    .expire_after(Some(Duration::from_secs(0)))
                    .build(),
            )
            .build();

        collection
            .create_index(index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: STATE_COLLECTION_NAME,
                index: "expires_at",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn collection(&self) -> Collection<MongoStateDocument> {
        let guard = self.inner.state.read().await;
        guard
            .database
            .collection::<MongoStateDocument>(STATE_COLLECTION_NAME)
    }

    async fn save(&self, state: GameStateEntity) -> MongoResult<()> {
        let room_id = state.room_id.clone();
        let deadline = SystemTime::now() + self.inner.config.retention;
        let document = MongoStateDocument::with_deadline(state, deadline);

        let collection = self.collection().await;
        collection
            .replace_one(doc! {"_id": &room_id}, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveState { room_id, source })?;

        Ok(())
    }

    async fn find(&self, room_id: String) -> MongoResult<Option<GameStateEntity>> {
        let collection = self.collection().await;

        let document = collection
            .find_one(doc! {"_id": &room_id})
            .await
            .map_err(|source| MongoDaoError::LoadState { room_id, source })?;

        Ok(document.map(Into::into))
    }

    async fn delete(&self, room_id: String) -> MongoResult<bool> {
        let collection = self.collection().await;
        let result = collection
            .delete_one(doc! {"_id": &room_id})
            .await
            .map_err(|source| MongoDaoError::DeleteState { room_id, source })?;
        Ok(result.deleted_count > 0)
    }
}

impl GameStore for MongoGameStore {
    fn save_state(&self, state: GameStateEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save(state).await.map_err(Into::into) })
    }

    fn find_state(
        &self,
        room_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<GameStateEntity>>> {
        let store = self.clone();
        let room_id = room_id.to_owned();
        Box::pin(async move { store.find(room_id).await.map_err(Into::into) })
    }

    fn delete_state(&self, room_id: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        let room_id = room_id.to_owned();
        Box::pin(async move { store.delete(room_id).await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
