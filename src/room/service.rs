use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::{
    models::{Participant, RoomModel, RoomSettings},
    repository::{JoinRoomResult, RemoveMemberResult, RoomRegistry},
};
use crate::shared::AppError;

/// Service for room lifecycle business logic
pub struct RoomService {
    registry: Arc<dyn RoomRegistry>,
}

impl RoomService {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Creates a room owned by the acting connection; the creator is the sole
    /// member and the active drawer.
    #[instrument(skip(self))]
    pub async fn create_room(
        &self,
        connection_id: &str,
        display_name: &str,
    ) -> Result<RoomModel, AppError> {
        let creator = Participant::drawer(connection_id.to_string(), display_name.to_string());
        let room = self.registry.create_room(creator).await?;

        info!(
            room_id = %room.id,
            display_name = %display_name,
            "Room created for connection"
        );
        Ok(room)
    }

    /// Appends the acting connection to an existing room as a guesser.
    #[instrument(skip(self))]
    pub async fn join_room(
        &self,
        room_id: &str,
        connection_id: &str,
        display_name: &str,
    ) -> Result<JoinRoomResult, AppError> {
        let participant =
            Participant::guesser(connection_id.to_string(), display_name.to_string());
        let result = self.registry.join_room(room_id, participant).await?;

        if let JoinRoomResult::RoomNotFound = result {
            debug!(room_id = %room_id, "Join rejected, room not found");
        }
        Ok(result)
    }

    /// Removes a member, tolerating rooms and members that already vanished.
    #[instrument(skip(self))]
    pub async fn remove_member(
        &self,
        room_id: &str,
        connection_id: &str,
    ) -> Result<RemoveMemberResult, AppError> {
        let result = self.registry.remove_member(room_id, connection_id).await?;

        match &result {
            RemoveMemberResult::Removed(room) => {
                info!(
                    room_id = %room_id,
                    remaining = room.member_count(),
                    "Member left room"
                );
            }
            RemoveMemberResult::RoomDeleted => {
                info!(room_id = %room_id, "Room torn down with its last member");
            }
            RemoveMemberResult::MemberNotInRoom | RemoveMemberResult::RoomNotFound => {
                debug!(
                    room_id = %room_id,
                    connection_id = %connection_id,
                    "Stale removal absorbed"
                );
            }
        }
        Ok(result)
    }

    #[instrument(skip(self))]
    pub async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, AppError> {
        self.registry.get_room(room_id).await
    }

    #[instrument(skip(self))]
    pub async fn find_room_of(
        &self,
        connection_id: &str,
    ) -> Result<Option<RoomModel>, AppError> {
        self.registry.find_room_of(connection_id).await
    }

    /// Existence probe plus snapshot for the `checkRoom` action.
    #[instrument(skip(self))]
    pub async fn check_room(
        &self,
        room_id: &str,
    ) -> Result<(bool, Option<RoomModel>), AppError> {
        let room = self.registry.get_room(room_id).await?;
        Ok((room.is_some(), room))
    }

    /// Full settings replacement; informational only, so a missing room is a
    /// logged no-op.
    #[instrument(skip(self, settings))]
    pub async fn update_settings(
        &self,
        room_id: &str,
        settings: RoomSettings,
    ) -> Result<Option<RoomModel>, AppError> {
        self.registry.update_settings(room_id, settings).await
    }

    /// Flips the room into its started state. Idempotent.
    #[instrument(skip(self))]
    pub async fn start_game(&self, room_id: &str) -> Result<Option<RoomModel>, AppError> {
        self.registry.mark_started(room_id).await
    }
}
