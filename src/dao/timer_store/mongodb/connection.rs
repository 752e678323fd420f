use std::time::Duration;

use mongodb::{Client, Database, bson::doc, options::ClientOptions};
use tokio::time::sleep;
use tracing::debug;

use super::error::{MongoDaoError, MongoResult};

const PING_ATTEMPTS: u32 = 10;
const PING_INITIAL_BACKOFF: Duration = Duration::from_millis(250);
const PING_MAX_BACKOFF: Duration = Duration::from_secs(5);

/// Build a client for the timer database and wait until it answers a ping.
pub async fn establish_connection(
    options: &ClientOptions,
    database_name: &str,
) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(database_name);

    wait_until_reachable(&database).await?;
    Ok((client, database))
}

/// Ping the deployment until it answers, backing off between attempts.
async fn wait_until_reachable(database: &Database) -> MongoResult<()> {
    let mut backoff = PING_INITIAL_BACKOFF;

    for attempt in 1..=PING_ATTEMPTS {
        let err = match database.run_command(doc! { "ping": 1 }).await {
            Ok(_) => return Ok(()),
            Err(err) => err,
        };
        if attempt == PING_ATTEMPTS {
            return Err(MongoDaoError::InitialPing {
                attempts: attempt,
                source: err,
            });
        }
        debug!(attempt, error = %err, "timer database not reachable yet; backing off");
        sleep(backoff).await;
        backoff = (backoff * 2).min(PING_MAX_BACKOFF);
    }

    Ok(())
}
