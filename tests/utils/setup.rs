use serde_json::{json, Value};
use std::sync::Arc;

use sketchparty::room::repository::InMemoryRoomRegistry;
use sketchparty::{AppState, MessageHandler, ServerEvent};

use super::mocks::MockConnectionManager;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

/// A fully wired coordinator with a recording connection manager. Tests talk
/// to it the way the transport does: raw event JSON per connection id.
pub struct TestSetup {
    pub state: AppState,
    pub connections: Arc<MockConnectionManager>,
}

impl TestSetup {
    pub fn new() -> Self {
        let connections = Arc::new(MockConnectionManager::new());
        let state = AppState::new(
            Arc::new(InMemoryRoomRegistry::new()),
            connections.clone(),
        );
        Self { state, connections }
    }

    /// Feeds one inbound event into the session router.
    pub async fn send(&self, connection_id: &str, event: Value) {
        self.state
            .router
            .handle_message(connection_id, event.to_string())
            .await;
    }

    /// All events a connection has received so far, decoded.
    pub async fn events_for(&self, connection_id: &str) -> Vec<ServerEvent> {
        self.connections
            .messages_for(connection_id)
            .await
            .iter()
            .filter_map(|m| serde_json::from_str(m).ok())
            .collect()
    }

    /// The countdown values a connection has received, in order.
    pub async fn countdown_values_for(&self, connection_id: &str) -> Vec<u64> {
        self.events_for(connection_id)
            .await
            .into_iter()
            .filter_map(|e| match e {
                ServerEvent::Countdown(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub async fn clear_messages(&self) {
        self.connections.clear_messages().await;
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Creates a room and returns its generated id from the creator's ack.
    pub async fn create_room(&self, connection_id: &str, display_name: &str) -> String {
        self.send(
            connection_id,
            json!({"type": "createRoom", "payload": {"displayName": display_name}}),
        )
        .await;

        self.events_for(connection_id)
            .await
            .iter()
            .rev()
            .find_map(|e| match e {
                ServerEvent::RoomCreated { room_id, .. } => Some(room_id.clone()),
                _ => None,
            })
            .expect("roomCreated ack missing")
    }

    pub async fn join_room(&self, connection_id: &str, room_id: &str, display_name: &str) {
        self.send(
            connection_id,
            json!({
                "type": "joinRoom",
                "payload": {"roomId": room_id, "displayName": display_name}
            }),
        )
        .await;
    }

    pub async fn leave_game(&self, room_id: &str, connection_id: &str) {
        self.send(
            connection_id,
            json!({
                "type": "disconnected-from-game",
                "payload": {"roomId": room_id, "connectionId": connection_id}
            }),
        )
        .await;
    }

    /// Simulates a transport-level disconnect for a connection.
    pub async fn disconnect(&self, connection_id: &str) {
        self.state
            .router
            .handle_disconnect(connection_id)
            .await
            .expect("disconnect cleanup failed");
    }
}
