/// Database model definitions shared across layers.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
/// Timer, club, and history storage trait plus backends.
pub mod timer_store;
