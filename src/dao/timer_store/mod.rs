#[cfg(test)]
pub mod memory;
pub mod mongodb;

use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::models::{ClubEntity, TimerEntity, TimerHistoryEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the persistence layer for timers, clubs, and history.
///
/// Per-document saves are atomic; the caller is responsible for serializing
/// concurrent commands against the same timer id.
pub trait TimerStore: Send + Sync {
    /// Insert a brand-new timer document.
    fn insert_timer(&self, timer: TimerEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Replace an existing timer document.
    fn save_timer(&self, timer: TimerEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Look a timer up by id.
    fn find_timer(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<TimerEntity>>>;
    /// Look a timer up by its author/title pair (titles are unique per author).
    fn find_timer_by_title(
        &self,
        author: Uuid,
        title: String,
    ) -> BoxFuture<'static, StorageResult<Option<TimerEntity>>>;
    /// All timers attached to a club.
    fn timers_by_club(&self, club: Uuid) -> BoxFuture<'static, StorageResult<Vec<TimerEntity>>>;
    /// All timers the periodic tick must advance (active, unpaused, with a
    /// duration accumulator).
    fn ticking_timers(&self) -> BoxFuture<'static, StorageResult<Vec<TimerEntity>>>;
    /// Delete a timer, reporting whether a document was removed.
    fn delete_timer(&self, id: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Look a club up by id.
    fn find_club(&self, id: Uuid) -> BoxFuture<'static, StorageResult<Option<ClubEntity>>>;
    /// Add a timer id to a club's timer list; reports whether the club exists.
    fn attach_timer(&self, club: Uuid, timer: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// Remove a timer id from a club's timer list; reports whether the club
    /// exists.
    fn detach_timer(&self, club: Uuid, timer: Uuid) -> BoxFuture<'static, StorageResult<bool>>;

    /// Append a completed-session record.
    fn insert_history(
        &self,
        entry: TimerHistoryEntity,
    ) -> BoxFuture<'static, StorageResult<()>>;
    /// Add a history id to a club's reference list; reports whether the club
    /// exists.
    fn attach_history(&self, club: Uuid, entry: Uuid) -> BoxFuture<'static, StorageResult<bool>>;
    /// All history entries for a club, oldest first.
    fn history_by_club(
        &self,
        club: Uuid,
    ) -> BoxFuture<'static, StorageResult<Vec<TimerHistoryEntity>>>;
    /// Delete the given history entries, returning how many documents were
    /// removed. Deleting an already-removed id is a no-op.
    fn delete_histories(&self, ids: Vec<Uuid>) -> BoxFuture<'static, StorageResult<u64>>;
    /// Drop the given ids from a club's history reference list.
    fn detach_histories(
        &self,
        club: Uuid,
        ids: Vec<Uuid>,
    ) -> BoxFuture<'static, StorageResult<bool>>;

    /// Verify the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
