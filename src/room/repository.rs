use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::models::{Participant, RoomModel, RoomSettings};
use crate::shared::AppError;

/// Result of attempting to join a room
#[derive(Debug, Clone)]
pub enum JoinRoomResult {
    /// Successfully joined the room, returns updated room data
    Success(RoomModel),
    /// Room does not exist
    RoomNotFound,
}

/// Result of attempting to remove a member from a room
#[derive(Debug, Clone)]
pub enum RemoveMemberResult {
    /// Member removed, returns updated room data for broadcast
    Removed(RoomModel),
    /// Room was deleted because the last member left
    RoomDeleted,
    /// Connection was not a member of the room (stale reference)
    MemberNotInRoom,
    /// Room does not exist (stale reference)
    RoomNotFound,
}

/// Trait for room registry operations
///
/// All room state goes through these operations; callers never mutate rooms
/// directly. Missing rooms and members are normal results, not faults, since
/// disconnects race freely with in-flight actions.
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// Creates a room with the creator as sole member and a generated id
    /// guaranteed unique among live rooms.
    async fn create_room(&self, creator: Participant) -> Result<RoomModel, AppError>;

    async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, AppError>;

    /// Atomically appends a participant to the room's member list.
    async fn join_room(
        &self,
        room_id: &str,
        participant: Participant,
    ) -> Result<JoinRoomResult, AppError>;

    /// Atomically removes a member by connection id; deletes the room when it
    /// would become empty.
    async fn remove_member(
        &self,
        room_id: &str,
        connection_id: &str,
    ) -> Result<RemoveMemberResult, AppError>;

    /// Finds the room a connection currently belongs to, if any.
    async fn find_room_of(&self, connection_id: &str) -> Result<Option<RoomModel>, AppError>;

    /// Replaces the room settings wholesale; returns the updated room, or
    /// `None` when the room is gone.
    async fn update_settings(
        &self,
        room_id: &str,
        settings: RoomSettings,
    ) -> Result<Option<RoomModel>, AppError>;

    /// Marks the room's game as started. Idempotent.
    async fn mark_started(&self, room_id: &str) -> Result<Option<RoomModel>, AppError>;
}

/// Alphabet for generated room codes: lowercase base36.
const ROOM_CODE_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const ROOM_CODE_LEN: usize = 6;

fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_CHARSET[rng.random_range(0..ROOM_CODE_CHARSET.len())] as char)
        .collect()
}

/// In-memory implementation of RoomRegistry
pub struct InMemoryRoomRegistry {
    rooms: Mutex<HashMap<String, RoomModel>>,
}

impl Default for InMemoryRoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryRoomRegistry {
    /// Creates a new empty in-memory registry
    pub fn new() -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    #[instrument(skip(self, creator))]
    async fn create_room(&self, creator: Participant) -> Result<RoomModel, AppError> {
        let mut rooms = self.rooms.lock().unwrap();

        // Re-roll on collision; never surfaced to the caller.
        let room_id = loop {
            let candidate = generate_room_code();
            if !rooms.contains_key(&candidate) {
                break candidate;
            }
            debug!(room_id = %candidate, "Room code collision, re-rolling");
        };

        let room = RoomModel::new(room_id.clone(), creator);
        rooms.insert(room_id.clone(), room.clone());

        info!(
            room_id = %room.id,
            creator = %room.members[0].display_name,
            "Room created"
        );
        Ok(room)
    }

    #[instrument(skip(self))]
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomModel>, AppError> {
        let rooms = self.rooms.lock().unwrap();
        let room = rooms.get(room_id).cloned();

        match &room {
            Some(r) => debug!(room_id = %room_id, members = r.member_count(), "Room found"),
            None => debug!(room_id = %room_id, "Room not found"),
        }

        Ok(room)
    }

    #[instrument(skip(self, participant))]
    async fn join_room(
        &self,
        room_id: &str,
        participant: Participant,
    ) -> Result<JoinRoomResult, AppError> {
        let mut rooms = self.rooms.lock().unwrap();

        let room = match rooms.get_mut(room_id) {
            Some(room) => room,
            None => {
                debug!(room_id = %room_id, "Room not found");
                return Ok(JoinRoomResult::RoomNotFound);
            }
        };

        info!(
            room_id = %room_id,
            display_name = %participant.display_name,
            new_member_count = room.member_count() + 1,
            "Participant joined room"
        );
        room.members.push(participant);

        Ok(JoinRoomResult::Success(room.clone()))
    }

    #[instrument(skip(self))]
    async fn remove_member(
        &self,
        room_id: &str,
        connection_id: &str,
    ) -> Result<RemoveMemberResult, AppError> {
        let mut rooms = self.rooms.lock().unwrap();

        let room = match rooms.get_mut(room_id) {
            Some(room) => room,
            None => {
                debug!(room_id = %room_id, "Room not found, nothing to remove");
                return Ok(RemoveMemberResult::RoomNotFound);
            }
        };

        if !room.has_member(connection_id) {
            debug!(
                room_id = %room_id,
                connection_id = %connection_id,
                "Member already gone"
            );
            return Ok(RemoveMemberResult::MemberNotInRoom);
        }

        // An emptied room must not persist.
        if room.member_count() == 1 {
            rooms.remove(room_id);
            info!(room_id = %room_id, "Room deleted after last member left");
            return Ok(RemoveMemberResult::RoomDeleted);
        }

        room.members.retain(|m| m.connection_id != connection_id);
        let updated_room = room.clone();

        info!(
            room_id = %room_id,
            connection_id = %connection_id,
            new_member_count = updated_room.member_count(),
            "Member removed from room"
        );

        Ok(RemoveMemberResult::Removed(updated_room))
    }

    #[instrument(skip(self))]
    async fn find_room_of(&self, connection_id: &str) -> Result<Option<RoomModel>, AppError> {
        let rooms = self.rooms.lock().unwrap();
        Ok(rooms
            .values()
            .find(|room| room.has_member(connection_id))
            .cloned())
    }

    #[instrument(skip(self, settings))]
    async fn update_settings(
        &self,
        room_id: &str,
        settings: RoomSettings,
    ) -> Result<Option<RoomModel>, AppError> {
        let mut rooms = self.rooms.lock().unwrap();

        let room = match rooms.get_mut(room_id) {
            Some(room) => room,
            None => {
                warn!(room_id = %room_id, "Settings update for missing room dropped");
                return Ok(None);
            }
        };

        room.settings = settings;
        info!(room_id = %room_id, "Room settings replaced");
        Ok(Some(room.clone()))
    }

    #[instrument(skip(self))]
    async fn mark_started(&self, room_id: &str) -> Result<Option<RoomModel>, AppError> {
        let mut rooms = self.rooms.lock().unwrap();

        let room = match rooms.get_mut(room_id) {
            Some(room) => room,
            None => {
                warn!(room_id = %room_id, "Start for missing room dropped");
                return Ok(None);
            }
        };

        room.started = true;
        info!(room_id = %room_id, "Room marked started");
        Ok(Some(room.clone()))
    }
}
