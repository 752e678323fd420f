use axum::extract::ws::Message;
use dashmap::DashMap;
use std::collections::HashSet;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Handle used to push messages to a connected live-feed subscriber.
#[derive(Clone)]
pub struct SubscriberConnection {
    /// Connection identifier, unique per socket.
    pub id: Uuid,
    /// Club whose timer feed this subscriber watches.
    pub club: Uuid,
    /// Writer channel of the subscriber's socket.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Registry of live-feed subscribers keyed by connection id.
///
/// Fan-out is best effort: a closed writer channel just drops the message,
/// cleanup happens when the socket handler unsubscribes.
#[derive(Default)]
pub struct BroadcastHub {
    subscribers: DashMap<Uuid, SubscriberConnection>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber, returning its connection id.
    pub fn subscribe(&self, club: Uuid, tx: mpsc::UnboundedSender<Message>) -> Uuid {
        let id = Uuid::new_v4();
        self.subscribers
            .insert(id, SubscriberConnection { id, club, tx });
        id
    }

    /// Drop a subscriber after its socket closed.
    pub fn unsubscribe(&self, id: Uuid) {
        self.subscribers.remove(&id);
    }

    /// Clubs that currently have at least one subscriber.
    pub fn subscribed_clubs(&self) -> HashSet<Uuid> {
        self.subscribers
            .iter()
            .map(|entry| entry.value().club)
            .collect()
    }

    /// Push a message to every subscriber of the given club.
    pub fn push_to_club(&self, club: Uuid, message: &Message) {
        for entry in self.subscribers.iter() {
            let connection = entry.value();
            if connection.club == club {
                let _ = connection.tx.send(message.clone());
            }
        }
    }
}
