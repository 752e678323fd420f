use mongodb::error::Error as MongoError;
use thiserror::Error;
use uuid::Uuid;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        attempts: u32,
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save timer `{id}`")]
    SaveTimer {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load timer `{id}`")]
    LoadTimer {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list timers")]
    ListTimers {
        #[source]
        source: MongoError,
    },
    #[error("failed to delete timer `{id}`")]
    DeleteTimer {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to load club `{id}`")]
    LoadClub {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to update club `{id}`")]
    UpdateClub {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to save history entry `{id}`")]
    SaveHistory {
        id: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to list history for club `{club}`")]
    ListHistory {
        club: Uuid,
        #[source]
        source: MongoError,
    },
    #[error("failed to delete history entries")]
    DeleteHistory {
        #[source]
        source: MongoError,
    },
}
