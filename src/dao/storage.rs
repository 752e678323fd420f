use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Failure of the timer storage backend, whatever database backs it.
///
/// The engine treats every backend failure the same way: the command surfaces
/// a 503 and the supervisor decides whether to reconnect, so a single shape
/// with the backend error chained underneath is enough.
#[derive(Debug, Error)]
#[error("timer storage unavailable: {message}")]
pub struct StorageError {
    message: String,
    #[source]
    source: Box<dyn Error + Send + Sync>,
}

impl StorageError {
    /// Wrap a backend failure, keeping it as the error source.
    pub fn unavailable(source: impl Error + Send + Sync + 'static) -> Self {
        Self {
            message: source.to_string(),
            source: Box::new(source),
        }
    }
}
