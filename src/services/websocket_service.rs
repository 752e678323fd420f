//! Lifecycle of one live-feed WebSocket subscriber.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{services::broadcast_service, state::SharedState};

/// Handle the full lifecycle for an individual live-feed WebSocket connection.
///
/// The subscriber is read-only: inbound text frames are ignored, the server
/// pushes full-set snapshots of the club's timers.
pub async fn handle_socket(state: SharedState, socket: WebSocket, club: Uuid) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let subscription = state.hub().subscribe(club, outbound_tx.clone());
    info!(subscription = %subscription, club = %club, "live feed subscriber connected");

    // Initial snapshot so a fresh subscriber does not wait for the next change.
    match broadcast_service::snapshot_message(&state, club).await {
        Ok(message) => {
            let _ = outbound_tx.send(message);
        }
        Err(err) => {
            warn!(club = %club, error = %err, "failed to push initial snapshot");
        }
    }

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Text(_)) | Ok(Message::Binary(_)) | Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(subscription = %subscription, error = %err, "websocket error");
                break;
            }
        }
    }

    state.hub().unsubscribe(subscription);
    info!(subscription = %subscription, club = %club, "live feed subscriber disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
