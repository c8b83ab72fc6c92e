use serde::{Deserialize, Serialize};

/// One connected player inside a room.
///
/// The connection id is the opaque handle assigned by the transport when the
/// socket was accepted; it stays stable for the lifetime of the connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub connection_id: String,
    pub display_name: String,
    pub is_active_drawer: bool,
}

impl Participant {
    /// Creates the drawing participant that owns a freshly created room.
    pub fn drawer(connection_id: String, display_name: String) -> Self {
        Self {
            connection_id,
            display_name,
            is_active_drawer: true,
        }
    }

    /// Creates a guessing participant joining an existing room.
    pub fn guesser(connection_id: String, display_name: String) -> Self {
        Self {
            connection_id,
            display_name,
            is_active_drawer: false,
        }
    }
}

/// Room configuration, fully replaceable by any member before the game starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    pub max_players: u32,
    pub rounds: u32,
    pub draw_time_seconds: u32,
    pub hints: u32,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            max_players: 6,
            rounds: 4,
            draw_time_seconds: 60,
            hints: 1,
        }
    }
}

/// In-memory model for a live room.
///
/// Member order is join order; the surrounding game relies on it for turn
/// rotation. A room with zero members is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomModel {
    #[serde(rename = "roomId")]
    pub id: String,
    #[serde(rename = "roomData")]
    pub members: Vec<Participant>,
    #[serde(rename = "roomSettings")]
    pub settings: RoomSettings,
    pub started: bool,
}

impl RoomModel {
    /// Creates a new room with the creator as sole member and active drawer.
    pub fn new(id: String, creator: Participant) -> Self {
        Self {
            id,
            members: vec![creator],
            settings: RoomSettings::default(),
            started: false,
        }
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Check if a connection is a member of this room.
    pub fn has_member(&self, connection_id: &str) -> bool {
        self.members
            .iter()
            .any(|m| m.connection_id == connection_id)
    }

    /// The participant currently authorized to draw, if any.
    pub fn active_drawer(&self) -> Option<&Participant> {
        self.members.iter().find(|m| m.is_active_drawer)
    }

    /// Connection ids of all members, in join order.
    pub fn member_ids(&self) -> Vec<String> {
        self.members
            .iter()
            .map(|m| m.connection_id.clone())
            .collect()
    }

    /// Connection ids of all members except one (relay fan-out).
    pub fn member_ids_except(&self, connection_id: &str) -> Vec<String> {
        self.members
            .iter()
            .filter(|m| m.connection_id != connection_id)
            .map(|m| m.connection_id.clone())
            .collect()
    }
}
