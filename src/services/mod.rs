/// Access gate deciding who may act on a timer.
pub mod access;
/// Live-feed snapshot fan-out.
pub mod broadcast_service;
/// Health check service.
pub mod health_service;
/// Completed-session log with per-club retention.
pub mod history_service;
/// Storage connection supervisor with degraded mode.
pub mod storage_supervisor;
/// Periodic session clock.
pub mod tick_service;
/// Session lifecycle command handlers.
pub mod timer_service;
/// WebSocket connection handling for live feeds.
pub mod websocket_service;
