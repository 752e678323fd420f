pub mod broadcast;
pub mod clock;
pub mod state_machine;

use std::{sync::Arc, time::Instant};

use dashmap::DashMap;
use tokio::{
    sync::{Mutex, RwLock, watch},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    dao::{models::TimerEntity, timer_store::TimerStore},
    error::ServiceError,
};

pub use self::broadcast::BroadcastHub;

pub type SharedState = Arc<AppState>;

/// Timer document captured at session start, kept briefly for diagnostics.
#[derive(Clone)]
struct StartSnapshot {
    timer: TimerEntity,
    taken_at: Instant,
}

/// Central application state storing live connections, per-timer coordination
/// primitives, and the storage handle.
pub struct AppState {
    config: AppConfig,
    timer_store: RwLock<Option<Arc<dyn TimerStore>>>,
    degraded: watch::Sender<bool>,
    hub: BroadcastHub,
    timer_locks: DashMap<Uuid, Arc<Mutex<()>>>,
    pending_clears: DashMap<Uuid, JoinHandle<()>>,
    start_snapshots: DashMap<Uuid, StartSnapshot>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            timer_store: RwLock::new(None),
            degraded: degraded_tx,
            hub: BroadcastHub::new(),
            timer_locks: DashMap::new(),
            pending_clears: DashMap::new(),
            start_snapshots: DashMap::new(),
        })
    }

    /// Application configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current timer store, if one is installed.
    pub async fn timer_store(&self) -> Option<Arc<dyn TimerStore>> {
        let guard = self.timer_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the timer store or fail because the application is degraded.
    pub async fn require_timer_store(&self) -> Result<Arc<dyn TimerStore>, ServiceError> {
        self.timer_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new timer store implementation and leave degraded mode.
    pub async fn install_timer_store(&self, store: Arc<dyn TimerStore>) {
        {
            let mut guard = self.timer_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current timer store and enter degraded mode.
    pub async fn clear_timer_store(&self) {
        {
            let mut guard = self.timer_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast hub for the per-club live timer feeds.
    pub fn hub(&self) -> &BroadcastHub {
        &self.hub
    }

    /// Serialization lock for commands against one timer id.
    ///
    /// The entry lives until [`Self::forget_timer`] removes it on deletion.
    pub fn timer_lock(&self, id: Uuid) -> Arc<Mutex<()>> {
        self.timer_locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Replace the delayed-clear task for a timer, aborting any previous one.
    pub fn set_pending_clear(&self, id: Uuid, handle: JoinHandle<()>) {
        if let Some((_, previous)) = self.pending_clears.remove(&id) {
            previous.abort();
        }
        self.pending_clears.insert(id, handle);
    }

    /// Abort the delayed-clear task for a timer, if one is scheduled.
    pub fn cancel_pending_clear(&self, id: Uuid) {
        if let Some((_, handle)) = self.pending_clears.remove(&id) {
            handle.abort();
        }
    }

    /// Drop the bookkeeping entry for a delayed clear that already ran.
    pub fn clear_finished(&self, id: Uuid) {
        self.pending_clears.remove(&id);
    }

    /// Remember the timer document as it looked when the session started.
    pub fn record_start_snapshot(&self, timer: TimerEntity) {
        self.start_snapshots.insert(
            timer.id,
            StartSnapshot {
                timer,
                taken_at: Instant::now(),
            },
        );
    }

    /// Fetch the start-time snapshot for a timer if it has not expired yet.
    pub fn start_snapshot(&self, id: Uuid) -> Option<TimerEntity> {
        let expired = match self.start_snapshots.get(&id) {
            Some(entry) => entry.value().taken_at.elapsed() > self.config.snapshot_ttl(),
            None => return None,
        };

        if expired {
            self.start_snapshots.remove(&id);
            return None;
        }

        self.start_snapshots
            .get(&id)
            .map(|entry| entry.value().timer.clone())
    }

    /// Drop every per-timer bookkeeping entry after the timer was deleted.
    pub fn forget_timer(&self, id: Uuid) {
        self.cancel_pending_clear(id);
        self.start_snapshots.remove(&id);
        self.timer_locks.remove(&id);
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }
}
