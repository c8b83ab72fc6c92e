use std::sync::Arc;

use crate::shared::AppError;
use crate::websockets::{connection_manager::ConnectionManager, messages::ServerEvent};

/// Outbound fan-out helpers shared by the handler groups.
pub struct EventFanout;

impl EventFanout {
    fn encode(event: &ServerEvent) -> Result<String, AppError> {
        serde_json::to_string(event)
            .map_err(|e| AppError::Encoding(format!("Failed to serialize event: {}", e)))
    }

    pub async fn unicast(
        connections: &Arc<dyn ConnectionManager>,
        connection_id: &str,
        event: &ServerEvent,
    ) -> Result<(), AppError> {
        let message = Self::encode(event)?;
        connections.send_to_connection(connection_id, &message).await;
        Ok(())
    }

    pub async fn multicast(
        connections: &Arc<dyn ConnectionManager>,
        connection_ids: &[String],
        event: &ServerEvent,
    ) -> Result<(), AppError> {
        let message = Self::encode(event)?;
        connections.send_to_connections(connection_ids, &message).await;
        Ok(())
    }
}
