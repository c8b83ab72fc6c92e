use std::sync::Arc;
use tracing::debug;

use crate::{
    countdown::CountdownEngine,
    room::RoomService,
    shared::AppError,
    websockets::{connection_manager::ConnectionManager, messages::ServerEvent},
};

use super::shared::EventFanout;

/// Countdown actions, scoped to the acting connection's room.
pub struct CountdownEventHandlers {
    rooms: Arc<RoomService>,
    countdown: Arc<CountdownEngine>,
    connections: Arc<dyn ConnectionManager>,
}

impl CountdownEventHandlers {
    pub fn new(
        rooms: Arc<RoomService>,
        countdown: Arc<CountdownEngine>,
        connections: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            rooms,
            countdown,
            connections,
        }
    }

    pub async fn handle_start_countdown(
        &self,
        connection_id: &str,
        seconds: u64,
    ) -> Result<(), AppError> {
        let Some(room) = self.rooms.find_room_of(connection_id).await? else {
            debug!(connection_id = %connection_id, "Countdown start outside any room dropped");
            return Ok(());
        };

        self.countdown.start(&room.id, seconds).await;

        // The actor gets an immediate value; everyone else hears the ticks.
        let remaining = self.countdown.snapshot_remaining(&room.id).await;
        EventFanout::unicast(
            &self.connections,
            connection_id,
            &ServerEvent::Countdown(remaining),
        )
        .await
    }

    pub async fn handle_stop_countdown(&self, connection_id: &str) -> Result<(), AppError> {
        let Some(room) = self.rooms.find_room_of(connection_id).await? else {
            debug!(connection_id = %connection_id, "Countdown stop outside any room dropped");
            return Ok(());
        };

        self.countdown.stop(&room.id).await;
        Ok(())
    }

    /// Analytic remaining-time query for late subscribers; a connection in no
    /// room reads an idle timer.
    pub async fn handle_get_initial_countdown(
        &self,
        connection_id: &str,
    ) -> Result<(), AppError> {
        let remaining = match self.rooms.find_room_of(connection_id).await? {
            Some(room) => self.countdown.snapshot_remaining(&room.id).await,
            None => 0,
        };

        EventFanout::unicast(
            &self.connections,
            connection_id,
            &ServerEvent::Countdown(remaining),
        )
        .await
    }
}
