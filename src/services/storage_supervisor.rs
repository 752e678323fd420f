use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::{MissedTickBehavior, interval, sleep};
use tracing::{info, warn};

use crate::{
    dao::{storage::StorageError, timer_store::TimerStore},
    state::SharedState,
};

const CONNECT_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(15);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const RECONNECT_ATTEMPTS: u32 = 3;

/// Keep the engine supplied with a healthy storage backend.
///
/// Connects with exponential backoff, installs the store, then polls its
/// health. A store that cannot be revived through
/// [`TimerStore::try_reconnect`] is dropped entirely and the connection is
/// rebuilt from scratch. While no healthy store is installed the engine runs
/// degraded: mutations get a 503 and billed time does not advance.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn TimerStore>, StorageError>> + Send,
{
    let mut backoff = CONNECT_BACKOFF;

    loop {
        let store = match connect().await {
            Ok(store) => store,
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
                sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
                continue;
            }
        };

        info!("timer storage online; leaving degraded mode");
        state.install_timer_store(store.clone()).await;
        backoff = CONNECT_BACKOFF;

        supervise(&state, store).await;

        warn!("timer storage lost; rebuilding the connection");
        state.clear_timer_store().await;
    }
}

/// Poll the installed store until it is beyond revival.
async fn supervise(state: &SharedState, store: Arc<dyn TimerStore>) {
    let mut poll = interval(HEALTH_POLL_INTERVAL);
    poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        poll.tick().await;

        if store.health_check().await.is_ok() {
            state.update_degraded(false);
            continue;
        }

        warn!("timer storage health check failed; entering degraded mode");
        state.update_degraded(true);

        if revive(store.as_ref()).await {
            info!("timer storage reconnected; leaving degraded mode");
            state.update_degraded(false);
        } else {
            return;
        }
    }
}

/// Try a bounded number of reconnects against the existing store handle.
async fn revive(store: &dyn TimerStore) -> bool {
    let mut backoff = CONNECT_BACKOFF;

    for attempt in 1..=RECONNECT_ATTEMPTS {
        match store.try_reconnect().await {
            Ok(()) => return true,
            Err(err) => {
                warn!(attempt, error = %err, "storage reconnect attempt failed");
                sleep(backoff).await;
                backoff = (backoff * 2).min(MAX_BACKOFF);
            }
        }
    }

    false
}
