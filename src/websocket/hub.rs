//! WebSocket Connection Hub
//!
//! Manages all WebSocket connections, subscriptions, and message broadcasting.
//! Uses a tokio broadcast channel for in-process listeners.

use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use super::messages::{ServerMessage, WsEvent, TOPIC_FEED, TOPIC_SCENE, TOPIC_SYSTEM};

/// Unique identifier for a WebSocket connection
pub type ConnectionId = String;

/// Topics clients may subscribe to
pub const VALID_TOPICS: [&str; 3] = [TOPIC_SCENE, TOPIC_FEED, TOPIC_SYSTEM];

/// Manages all WebSocket connections and subscriptions
pub struct ConnectionHub {
    /// Active connections: ConnectionId → ConnectionHandle
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
    /// Topic subscriptions: Topic → Set of ConnectionIds
    subscriptions: RwLock<HashMap<String, HashSet<ConnectionId>>>,
    /// Broadcast channel for in-process listeners
    broadcast_tx: broadcast::Sender<WsEvent>,
    config: HubConfig,
}

/// Configuration for the connection hub
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Maximum number of concurrent connections
    pub max_connections: usize,
    /// Capacity of the broadcast channel
    pub broadcast_capacity: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 1000,
            broadcast_capacity: 1024,
        }
    }
}

/// Handle for sending messages to a specific connection
pub struct ConnectionHandle {
    /// Channel sender for this connection
    pub sender: mpsc::UnboundedSender<ServerMessage>,
    /// Topics this connection is subscribed to
    pub subscriptions: HashSet<String>,
}

impl ConnectionHub {
    pub fn new(config: HubConfig) -> Self {
        let (broadcast_tx, _) = broadcast::channel(config.broadcast_capacity.max(1));

        Self {
            connections: RwLock::new(HashMap::new()),
            subscriptions: RwLock::new(HashMap::new()),
            broadcast_tx,
            config,
        }
    }

    /// Register a new WebSocket connection
    ///
    /// Returns the connection ID on success, or an error if the connection
    /// limit has been reached.
    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections(self.config.max_connections));
        }

        let id = Uuid::new_v4().to_string();
        connections.insert(
            id.clone(),
            ConnectionHandle {
                sender,
                subscriptions: HashSet::new(),
            },
        );

        tracing::info!(connection_id = %id, "WebSocket connected");
        Ok(id)
    }

    /// Unregister a connection and clean up its subscriptions
    pub async fn unregister(&self, id: &str) {
        let handle = self.connections.write().await.remove(id);

        if let Some(handle) = handle {
            let mut subs = self.subscriptions.write().await;
            for topic in handle.subscriptions {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
            }
        }

        tracing::info!(connection_id = %id, "WebSocket disconnected");
    }

    /// Subscribe a connection to topics; unknown topics are dropped
    pub async fn subscribe(
        &self,
        id: &str,
        topics: Vec<String>,
    ) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections
            .get_mut(id)
            .ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut subscribed = Vec::new();

        for topic in topics {
            if !is_valid_topic(&topic) {
                tracing::warn!(topic = %topic, "Invalid topic ignored");
                continue;
            }

            handle.subscriptions.insert(topic.clone());
            subs.entry(topic.clone())
                .or_insert_with(HashSet::new)
                .insert(id.to_string());

            subscribed.push(topic);
        }

        tracing::debug!(
            connection_id = %id,
            topics = ?subscribed,
            "Subscribed to topics"
        );

        Ok(subscribed)
    }

    /// Unsubscribe a connection from topics
    pub async fn unsubscribe(
        &self,
        id: &str,
        topics: Vec<String>,
    ) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let handle = connections
            .get_mut(id)
            .ok_or(HubError::ConnectionNotFound)?;

        let mut subs = self.subscriptions.write().await;
        let mut unsubscribed = Vec::new();

        for topic in topics {
            if handle.subscriptions.remove(&topic) {
                if let Some(subscribers) = subs.get_mut(&topic) {
                    subscribers.remove(id);
                    if subscribers.is_empty() {
                        subs.remove(&topic);
                    }
                }
                unsubscribed.push(topic);
            }
        }

        tracing::debug!(
            connection_id = %id,
            topics = ?unsubscribed,
            "Unsubscribed from topics"
        );

        Ok(unsubscribed)
    }

    /// Send an event to every subscriber of its topic
    ///
    /// Returns the number of connections it reached.
    pub async fn broadcast(&self, event: &WsEvent) -> usize {
        // Release subscriptions before taking connections; subscribe locks
        // connections first.
        let subscriber_ids: Vec<ConnectionId> = {
            let subs = self.subscriptions.read().await;
            match subs.get(&event.topic) {
                Some(ids) => ids.iter().cloned().collect(),
                None => return 0,
            }
        };
        let connections = self.connections.read().await;

        let mut sent_count = 0;
        for id in &subscriber_ids {
            if let Some(handle) = connections.get(id) {
                if handle.sender.send(event.message.clone()).is_ok() {
                    sent_count += 1;
                }
            }
        }

        if sent_count > 0 {
            tracing::trace!(
                topic = %event.topic,
                subscribers = sent_count,
                "Broadcast event"
            );
        }
        sent_count
    }

    /// Publish an event to in-process listeners and WebSocket subscribers
    pub async fn publish(&self, event: WsEvent) -> usize {
        // No listeners is fine
        let _ = self.broadcast_tx.send(event.clone());
        self.broadcast(&event).await
    }

    /// Send a message directly to a specific connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let handle = connections.get(id).ok_or(HubError::ConnectionNotFound)?;

        handle
            .sender
            .send(message)
            .map_err(|_| HubError::SendFailed)
    }

    /// Receiver for every published event, regardless of topic
    pub fn subscribe_broadcast(&self) -> broadcast::Receiver<WsEvent> {
        self.broadcast_tx.subscribe()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn subscription_count(&self, topic: &str) -> usize {
        self.subscriptions
            .read()
            .await
            .get(topic)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

impl Default for ConnectionHub {
    fn default() -> Self {
        Self::new(HubConfig::default())
    }
}

fn is_valid_topic(topic: &str) -> bool {
    VALID_TOPICS.contains(&topic)
}

/// Errors that can occur in the connection hub
#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many connections (limit: {0})")]
    TooManyConnections(usize),

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::Patch;

    #[test]
    fn test_default_config() {
        let config = HubConfig::default();
        assert_eq!(config.max_connections, 1000);
        assert_eq!(config.broadcast_capacity, 1024);
    }

    #[test]
    fn test_valid_topics() {
        assert!(is_valid_topic("scene"));
        assert!(is_valid_topic("feed"));
        assert!(is_valid_topic("system"));

        assert!(!is_valid_topic("scene.*"));
        assert!(!is_valid_topic(""));
        assert!(!is_valid_topic("metrics.mood"));
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let hub = ConnectionHub::default();
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = hub.register(tx).await.unwrap();
        assert!(!id.is_empty());
        assert_eq!(hub.connection_count().await, 1);

        hub.unregister(&id).await;
        assert_eq!(hub.connection_count().await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_unsubscribe() {
        let hub = ConnectionHub::default();
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = hub.register(tx).await.unwrap();

        let subscribed = hub
            .subscribe(&id, vec!["scene".to_string(), "bogus".to_string()])
            .await
            .unwrap();
        assert_eq!(subscribed, vec!["scene"]);
        assert_eq!(hub.subscription_count("scene").await, 1);

        let unsubscribed = hub
            .unsubscribe(&id, vec!["scene".to_string()])
            .await
            .unwrap();
        assert_eq!(unsubscribed, vec!["scene"]);
        assert_eq!(hub.subscription_count("scene").await, 0);

        hub.unregister(&id).await;
    }

    #[tokio::test]
    async fn test_unregister_cleans_subscriptions() {
        let hub = ConnectionHub::default();
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();
        hub.subscribe(&id, vec!["feed".to_string()]).await.unwrap();

        hub.unregister(&id).await;
        assert_eq!(hub.subscription_count("feed").await, 0);
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let hub = ConnectionHub::new(HubConfig {
            max_connections: 2,
            broadcast_capacity: 16,
        });

        let (tx1, _) = mpsc::unbounded_channel();
        let (tx2, _) = mpsc::unbounded_channel();
        let (tx3, _) = mpsc::unbounded_channel();

        let id1 = hub.register(tx1).await.unwrap();
        let id2 = hub.register(tx2).await.unwrap();
        let result = hub.register(tx3).await;

        assert!(matches!(result, Err(HubError::TooManyConnections(2))));

        hub.unregister(&id1).await;
        hub.unregister(&id2).await;
    }

    #[tokio::test]
    async fn test_publish_reaches_topic_subscribers_only() {
        let hub = ConnectionHub::default();

        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();

        let id1 = hub.register(tx1).await.unwrap();
        let id2 = hub.register(tx2).await.unwrap();

        hub.subscribe(&id1, vec!["scene".to_string()]).await.unwrap();
        hub.subscribe(&id2, vec!["feed".to_string()]).await.unwrap();

        let sent = hub.publish(WsEvent::scene_patch(Patch::default())).await;
        assert_eq!(sent, 1);

        assert!(matches!(
            rx1.try_recv(),
            Ok(ServerMessage::ScenePatch { .. })
        ));
        assert!(rx2.try_recv().is_err());

        hub.unregister(&id1).await;
        hub.unregister(&id2).await;
    }

    #[tokio::test]
    async fn test_publish_feeds_broadcast_listeners() {
        let hub = ConnectionHub::default();
        let mut listener = hub.subscribe_broadcast();

        let sent = hub.publish(WsEvent::refresh_skipped("busy")).await;
        assert_eq!(sent, 0);

        let event = listener.recv().await.unwrap();
        assert_eq!(event.topic, "feed");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_publish_concurrent_with_subscribe() {
        use std::sync::Arc;
        use std::time::Duration;

        let hub = Arc::new(ConnectionHub::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();
        hub.subscribe(&id, vec!["scene".to_string()]).await.unwrap();

        let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });

        let publisher = {
            let hub = Arc::clone(&hub);
            tokio::spawn(async move {
                for _ in 0..5_000 {
                    hub.publish(WsEvent::scene_patch(Patch::default())).await;
                }
            })
        };
        let subscriber = {
            let hub = Arc::clone(&hub);
            let id = id.clone();
            tokio::spawn(async move {
                for _ in 0..5_000 {
                    hub.subscribe(&id, vec!["feed".to_string()]).await.unwrap();
                    hub.unsubscribe(&id, vec!["feed".to_string()]).await.unwrap();
                }
            })
        };

        tokio::time::timeout(Duration::from_secs(30), async {
            publisher.await.unwrap();
            subscriber.await.unwrap();
        })
        .await
        .expect("publish and subscribe finished");

        assert_eq!(hub.subscription_count("scene").await, 1);
        hub.unregister(&id).await;
        drain.await.unwrap();
    }
}
