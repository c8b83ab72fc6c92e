use std::sync::Arc;
use tracing::debug;

use crate::{
    room::RoomService,
    shared::AppError,
    websockets::{connection_manager::ConnectionManager, messages::ServerEvent},
};

use super::shared::EventFanout;

/// Stateless relay of drawing primitives and canvas snapshots.
///
/// No canvas state is kept server-side; everything is forwarded verbatim to
/// the sender's room peers, and a sender outside any room is a silent drop.
pub struct CanvasEventHandlers {
    rooms: Arc<RoomService>,
    connections: Arc<dyn ConnectionManager>,
}

impl CanvasEventHandlers {
    pub fn new(rooms: Arc<RoomService>, connections: Arc<dyn ConnectionManager>) -> Self {
        Self { rooms, connections }
    }

    /// Re-emits an event to every room peer except the originator.
    async fn relay_to_peers(
        &self,
        connection_id: &str,
        event: ServerEvent,
    ) -> Result<(), AppError> {
        let Some(room) = self.rooms.find_room_of(connection_id).await? else {
            debug!(connection_id = %connection_id, "Canvas event from connection outside any room dropped");
            return Ok(());
        };

        let peers = room.member_ids_except(connection_id);
        if peers.is_empty() {
            return Ok(());
        }

        EventFanout::multicast(&self.connections, &peers, &event).await
    }

    pub async fn handle_draw(
        &self,
        connection_id: &str,
        x: f64,
        y: f64,
        color: String,
        brush_size: f64,
    ) -> Result<(), AppError> {
        self.relay_to_peers(
            connection_id,
            ServerEvent::DrawFromServer {
                x,
                y,
                color,
                brush_size,
            },
        )
        .await
    }

    pub async fn handle_clear_canvas(&self, connection_id: &str) -> Result<(), AppError> {
        self.relay_to_peers(connection_id, ServerEvent::ClearCanvas {})
            .await
    }

    pub async fn handle_fill_color(
        &self,
        connection_id: &str,
        selected_color: String,
    ) -> Result<(), AppError> {
        self.relay_to_peers(connection_id, ServerEvent::FillColor { selected_color })
            .await
    }

    pub async fn handle_restore_drawing(
        &self,
        connection_id: &str,
        commands: serde_json::Value,
        index: Option<u64>,
    ) -> Result<(), AppError> {
        self.relay_to_peers(connection_id, ServerEvent::RestoreDrawing { commands, index })
            .await
    }

    /// Full-canvas snapshot offered by a client, forwarded to room peers as a
    /// restore command.
    pub async fn handle_canvas_state(
        &self,
        connection_id: &str,
        data_url: String,
    ) -> Result<(), AppError> {
        self.relay_to_peers(connection_id, ServerEvent::restore_from_snapshot(data_url))
            .await
    }

    /// Late-join canvas sync: ask the room's active drawer (the authoritative
    /// canvas holder) to emit its current state. Best-effort, unacknowledged.
    pub async fn handle_new_client(&self, connection_id: &str) -> Result<(), AppError> {
        let Some(room) = self.rooms.find_room_of(connection_id).await? else {
            debug!(connection_id = %connection_id, "Canvas sync request outside any room dropped");
            return Ok(());
        };

        let Some(drawer) = room.active_drawer() else {
            debug!(room_id = %room.id, "No active drawer to sync canvas from");
            return Ok(());
        };

        // The drawer owns the canvas; syncing it to itself is pointless.
        if drawer.connection_id == connection_id {
            return Ok(());
        }

        EventFanout::unicast(
            &self.connections,
            &drawer.connection_id,
            &ServerEvent::GetCanvasState {},
        )
        .await
    }
}
