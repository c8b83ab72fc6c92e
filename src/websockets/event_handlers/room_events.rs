use std::sync::Arc;
use tracing::{debug, info};

use crate::{
    countdown::CountdownEngine,
    room::{
        models::RoomSettings,
        repository::{JoinRoomResult, RemoveMemberResult},
        RoomService,
    },
    shared::AppError,
    websockets::{connection_manager::ConnectionManager, messages::ServerEvent},
};

use super::shared::EventFanout;

/// Room lifecycle actions: creation, membership, settings, game start.
pub struct RoomEventHandlers {
    rooms: Arc<RoomService>,
    connections: Arc<dyn ConnectionManager>,
    countdown: Arc<CountdownEngine>,
}

impl RoomEventHandlers {
    pub fn new(
        rooms: Arc<RoomService>,
        connections: Arc<dyn ConnectionManager>,
        countdown: Arc<CountdownEngine>,
    ) -> Self {
        Self {
            rooms,
            connections,
            countdown,
        }
    }

    pub async fn handle_create_room(
        &self,
        connection_id: &str,
        display_name: &str,
    ) -> Result<(), AppError> {
        let room = self.rooms.create_room(connection_id, display_name).await?;

        EventFanout::unicast(
            &self.connections,
            connection_id,
            &ServerEvent::RoomCreated {
                connection_id: connection_id.to_string(),
                room_id: room.id.clone(),
                room_data: room.members,
            },
        )
        .await
    }

    pub async fn handle_join_room(
        &self,
        connection_id: &str,
        room_id: &str,
        display_name: &str,
    ) -> Result<(), AppError> {
        let result = self
            .rooms
            .join_room(room_id, connection_id, display_name)
            .await?;

        let room = match result {
            JoinRoomResult::Success(room) => room,
            JoinRoomResult::RoomNotFound => {
                // Not-found goes to the acting connection only.
                return EventFanout::unicast(
                    &self.connections,
                    connection_id,
                    &ServerEvent::RoomNotFound {},
                )
                .await;
            }
        };

        EventFanout::multicast(
            &self.connections,
            &room.member_ids(),
            &ServerEvent::UserJoined {
                connection_id: connection_id.to_string(),
                room_id: room.id.clone(),
                room_data: room.members.clone(),
            },
        )
        .await?;

        // Late-subscriber sync: the joiner gets the room timer's current value
        // without waiting for the next tick.
        let remaining = self.countdown.snapshot_remaining(&room.id).await;
        EventFanout::unicast(
            &self.connections,
            connection_id,
            &ServerEvent::Countdown(remaining),
        )
        .await
    }

    pub async fn handle_get_users(
        &self,
        connection_id: &str,
        room_id: &str,
    ) -> Result<(), AppError> {
        let room = self.rooms.get_room(room_id).await?;
        EventFanout::unicast(
            &self.connections,
            connection_id,
            &ServerEvent::UsersList(room),
        )
        .await
    }

    pub async fn handle_check_room(
        &self,
        connection_id: &str,
        room_id: &str,
    ) -> Result<(), AppError> {
        let (room_exists, room) = self.rooms.check_room(room_id).await?;
        EventFanout::unicast(
            &self.connections,
            connection_id,
            &ServerEvent::CheckRoomStatus { room_exists, room },
        )
        .await
    }

    pub async fn handle_start_game(&self, room_id: &str) -> Result<(), AppError> {
        let Some(room) = self.rooms.start_game(room_id).await? else {
            return Ok(());
        };

        EventFanout::multicast(
            &self.connections,
            &room.member_ids(),
            &ServerEvent::ChangeStateToStarted(true),
        )
        .await
    }

    pub async fn handle_set_room_settings(
        &self,
        room_id: &str,
        settings: RoomSettings,
    ) -> Result<(), AppError> {
        let Some(room) = self.rooms.update_settings(room_id, settings).await? else {
            return Ok(());
        };

        EventFanout::multicast(
            &self.connections,
            &room.member_ids(),
            &ServerEvent::BroadcastRoomSettings {
                room_settings: room.settings.clone(),
            },
        )
        .await
    }

    pub async fn handle_get_room_settings(&self, room_id: &str) -> Result<(), AppError> {
        let Some(room) = self.rooms.get_room(room_id).await? else {
            debug!(room_id = %room_id, "Settings query for missing room dropped");
            return Ok(());
        };

        // Room-wide emit, matching the informational broadcast semantics.
        EventFanout::multicast(
            &self.connections,
            &room.member_ids(),
            &ServerEvent::GetRoomSettings {
                room_settings: room.settings.clone(),
            },
        )
        .await
    }

    pub async fn handle_selected_word(
        &self,
        room_id: &str,
        word: String,
        position: serde_json::Value,
    ) -> Result<(), AppError> {
        let Some(room) = self.rooms.get_room(room_id).await? else {
            debug!(room_id = %room_id, "Word selection for missing room dropped");
            return Ok(());
        };

        EventFanout::multicast(
            &self.connections,
            &room.member_ids(),
            &ServerEvent::GetSelectedWord { word, position },
        )
        .await
    }

    /// Explicit in-game leave (`disconnected-from-game`).
    pub async fn handle_leave_game(
        &self,
        room_id: Option<&str>,
        connection_id: &str,
    ) -> Result<(), AppError> {
        let Some(room_id) = room_id else {
            return Ok(());
        };

        match self.rooms.remove_member(room_id, connection_id).await? {
            RemoveMemberResult::Removed(room) => {
                EventFanout::multicast(
                    &self.connections,
                    &room.member_ids(),
                    &ServerEvent::ChangeInUsers {
                        new_room_data: room.members.clone(),
                        prev_room_id: room.id.clone(),
                    },
                )
                .await
            }
            RemoveMemberResult::RoomDeleted => {
                // Nobody left to notify; just tear down the room's timer.
                self.countdown.reset(room_id).await;
                Ok(())
            }
            RemoveMemberResult::MemberNotInRoom | RemoveMemberResult::RoomNotFound => Ok(()),
        }
    }

    /// Transport-level disconnect: remove the participant from whichever room
    /// contains it and reset that room's timer.
    pub async fn handle_disconnect(&self, connection_id: &str) -> Result<(), AppError> {
        let Some(room) = self.rooms.find_room_of(connection_id).await? else {
            debug!(connection_id = %connection_id, "Disconnect outside any room");
            return Ok(());
        };

        self.countdown.reset(&room.id).await;

        match self.rooms.remove_member(&room.id, connection_id).await? {
            RemoveMemberResult::Removed(room) => {
                info!(
                    room_id = %room.id,
                    connection_id = %connection_id,
                    "Disconnected participant removed"
                );
                EventFanout::multicast(
                    &self.connections,
                    &room.member_ids(),
                    &ServerEvent::UserLeft(connection_id.to_string()),
                )
                .await
            }
            RemoveMemberResult::RoomDeleted => Ok(()),
            RemoveMemberResult::MemberNotInRoom | RemoveMemberResult::RoomNotFound => Ok(()),
        }
    }
}
