use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{Client, Collection, Database, bson::doc, options::IndexOptions};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{MongoClubDocument, MongoHistoryDocument, MongoTimerDocument, doc_id, uuid_filter},
};
use crate::dao::{
    models::{ClubEntity, TimerEntity, TimerHistoryEntity},
    storage::StorageResult,
    timer_store::TimerStore,
};

const TIMER_COLLECTION_NAME: &str = "timers";
const CLUB_COLLECTION_NAME: &str = "clubs";
const HISTORY_COLLECTION_NAME: &str = "timer_histories";

#[derive(Clone)]
pub struct MongoTimerStore {
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

impl MongoTimerStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
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

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        // Titles are unique per author; the index backs both the conflict
        // check on create and the lookup itself.
        let timer_collection =
            database.collection::<mongodb::bson::Document>(TIMER_COLLECTION_NAME);
        let timer_index = mongodb::IndexModel::builder()
            .keys(doc! {"author": 1, "title": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("timer_author_title_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        timer_collection
            .create_index(timer_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: TIMER_COLLECTION_NAME,
                index: "author,title",
                source,
            })?;

        let history_collection =
            database.collection::<mongodb::bson::Document>(HISTORY_COLLECTION_NAME);
        let history_index = mongodb::IndexModel::builder()
            .keys(doc! {"club": 1, "recorded_at": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("history_club_recorded_idx".to_owned()))
                    .build(),
            )
            .build();

        history_collection
            .create_index(history_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: HISTORY_COLLECTION_NAME,
                index: "club,recorded_at",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn timer_collection(&self) -> Collection<MongoTimerDocument> {
        self.database()
            .await
            .collection::<MongoTimerDocument>(TIMER_COLLECTION_NAME)
    }

    async fn club_collection(&self) -> Collection<MongoClubDocument> {
        self.database()
            .await
            .collection::<MongoClubDocument>(CLUB_COLLECTION_NAME)
    }

    async fn history_collection(&self) -> Collection<MongoHistoryDocument> {
        self.database()
            .await
            .collection::<MongoHistoryDocument>(HISTORY_COLLECTION_NAME)
    }

    async fn insert_timer(&self, timer: TimerEntity) -> MongoResult<()> {
        let id = timer.id;
        let document: MongoTimerDocument = timer.into();
        self.timer_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveTimer { id, source })?;
        Ok(())
    }

    async fn save_timer(&self, timer: TimerEntity) -> MongoResult<()> {
        let id = timer.id;
        let document: MongoTimerDocument = timer.into();
        self.timer_collection()
            .await
            .replace_one(doc_id(id), &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveTimer { id, source })?;
        Ok(())
    }

    async fn find_timer(&self, id: Uuid) -> MongoResult<Option<TimerEntity>> {
        let document = self
            .timer_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadTimer { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn find_timer_by_title(
        &self,
        author: Uuid,
        title: String,
    ) -> MongoResult<Option<TimerEntity>> {
        let document = self
            .timer_collection()
            .await
            .find_one(doc! {"author": uuid_filter(author), "title": title})
            .await
            .map_err(|source| MongoDaoError::ListTimers { source })?;
        Ok(document.map(Into::into))
    }

    async fn timers_by_club(&self, club: Uuid) -> MongoResult<Vec<TimerEntity>> {
        let documents: Vec<MongoTimerDocument> = self
            .timer_collection()
            .await
            .find(doc! {"club": uuid_filter(club)})
            .sort(doc! {"created_at": 1})
            .await
            .map_err(|source| MongoDaoError::ListTimers { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListTimers { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn ticking_timers(&self) -> MongoResult<Vec<TimerEntity>> {
        let documents: Vec<MongoTimerDocument> = self
            .timer_collection()
            .await
            .find(doc! {
                "is_active": true,
                "paused": false,
                "remaining_minutes": { "$ne": null },
            })
            .await
            .map_err(|source| MongoDaoError::ListTimers { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListTimers { source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_timer(&self, id: Uuid) -> MongoResult<bool> {
        let result = self
            .timer_collection()
            .await
            .delete_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::DeleteTimer { id, source })?;
        Ok(result.deleted_count > 0)
    }

    async fn find_club(&self, id: Uuid) -> MongoResult<Option<ClubEntity>> {
        let document = self
            .club_collection()
            .await
            .find_one(doc_id(id))
            .await
            .map_err(|source| MongoDaoError::LoadClub { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn attach_timer(&self, club: Uuid, timer: Uuid) -> MongoResult<bool> {
        let result = self
            .club_collection()
            .await
            .update_one(
                doc_id(club),
                doc! {"$addToSet": {"timers": uuid_filter(timer)}},
            )
            .await
            .map_err(|source| MongoDaoError::UpdateClub { id: club, source })?;
        Ok(result.matched_count > 0)
    }

    async fn detach_timer(&self, club: Uuid, timer: Uuid) -> MongoResult<bool> {
        let result = self
            .club_collection()
            .await
            .update_one(doc_id(club), doc! {"$pull": {"timers": uuid_filter(timer)}})
            .await
            .map_err(|source| MongoDaoError::UpdateClub { id: club, source })?;
        Ok(result.matched_count > 0)
    }

    async fn insert_history(&self, entry: TimerHistoryEntity) -> MongoResult<()> {
        let id = entry.id;
        let document: MongoHistoryDocument = entry.into();
        self.history_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveHistory { id, source })?;
        Ok(())
    }

    async fn attach_history(&self, club: Uuid, entry: Uuid) -> MongoResult<bool> {
        let result = self
            .club_collection()
            .await
            .update_one(
                doc_id(club),
                doc! {"$addToSet": {"timer_histories": uuid_filter(entry)}},
            )
            .await
            .map_err(|source| MongoDaoError::UpdateClub { id: club, source })?;
        Ok(result.matched_count > 0)
    }

    async fn history_by_club(&self, club: Uuid) -> MongoResult<Vec<TimerHistoryEntity>> {
        let documents: Vec<MongoHistoryDocument> = self
            .history_collection()
            .await
            .find(doc! {"club": uuid_filter(club)})
            .sort(doc! {"recorded_at": 1})
            .await
            .map_err(|source| MongoDaoError::ListHistory { club, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListHistory { club, source })?;
        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_histories(&self, ids: Vec<Uuid>) -> MongoResult<u64> {
        let ids: Vec<String> = ids.into_iter().map(uuid_filter).collect();
        let result = self
            .history_collection()
            .await
            .delete_many(doc! {"_id": {"$in": ids}})
            .await
            .map_err(|source| MongoDaoError::DeleteHistory { source })?;
        Ok(result.deleted_count)
    }

    async fn detach_histories(&self, club: Uuid, ids: Vec<Uuid>) -> MongoResult<bool> {
        let ids: Vec<String> = ids.into_iter().map(uuid_filter).collect();
        let result = self
            .club_collection()
            .await
            .update_one(
                doc_id(club),
                doc! {"$pull": {"timer_histories": {"$in": ids}}},
            )
            .await
            .map_err(|source| MongoDaoError::UpdateClub { id: club, source })?;
        Ok(result.matched_count > 0)
    }
}

impl TimerStore for MongoTimerStore {
    fn insert_timer(&self, timer: TimerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_timer(timer).await.map_err(Into::into) })
    }

    fn save_timer(&self, timer: TimerEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_timer(timer).await.map_err(Into::into) })
    }

    fn find_timer(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TimerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_timer(id).await.map_err(Into::into) })
    }

    fn find_timer_by_title(
        &self,
        author: Uuid,
        title: String,
    ) -> BoxFuture<'static, StorageResult<Option<TimerEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_timer_by_title(author, title)
                .await
                .map_err(Into::into)
        })
    }

    fn timers_by_club(&self, club: Uuid) -> BoxFuture<'static, StorageResult<Vec<TimerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.timers_by_club(club).await.map_err(Into::into) })
    }

    fn ticking_timers(&self) -> BoxFuture<'static, StorageResult<Vec<TimerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.ticking_timers().await.map_err(Into::into) })
    }

    fn delete_timer(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.delete_timer(id).await.map_err(Into::into) })
    }

    fn find_club(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ClubEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.find_club(id).await.map_err(Into::into) })
    }

    fn attach_timer(&self, club: Uuid, timer: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.attach_timer(club, timer).await.map_err(Into::into) })
    }

    fn detach_timer(&self, club: Uuid, timer: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.detach_timer(club, timer).await.map_err(Into::into) })
    }

    fn insert_history(&self, entry: TimerHistoryEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_history(entry).await.map_err(Into::into) })
    }

    fn attach_history(&self, club: Uuid, entry: Uuid) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.attach_history(club, entry).await.map_err(Into::into) })
    }

    fn history_by_club(
        &self,
        club: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TimerHistoryEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.history_by_club(club).await.map_err(Into::into) })
    }

    fn delete_histories(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.delete_histories(ids).await.map_err(Into::into) })
    }

    fn detach_histories(
        &self,
        club: Uuid,
        ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        Box::pin(async move { store.detach_histories(club, ids).await.map_err(Into::into) })
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
