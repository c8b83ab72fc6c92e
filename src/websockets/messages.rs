use serde::{Deserialize, Serialize};

use crate::room::models::{Participant, RoomModel, RoomSettings};

/// Client -> Server events.
///
/// Wire encoding is one JSON object per event:
/// `{"type": <event name>, "payload": <key-value payload>}`. The event and
/// field names below are the wire contract, including the kebab-case ones;
/// events without a payload carry an empty object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ClientEvent {
    #[serde(rename = "createRoom", rename_all = "camelCase")]
    CreateRoom { display_name: String },

    #[serde(rename = "joinRoom", rename_all = "camelCase")]
    JoinRoom {
        room_id: String,
        display_name: String,
    },

    #[serde(rename = "getUsers", rename_all = "camelCase")]
    GetUsers { room_id: String },

    #[serde(rename = "startGame", rename_all = "camelCase")]
    StartGame { room_id: String },

    #[serde(rename = "checkRoom", rename_all = "camelCase")]
    CheckRoom { room_id: String },

    /// A freshly joined client asking for the current canvas.
    #[serde(rename = "newClient")]
    NewClient {},

    #[serde(rename = "draw", rename_all = "camelCase")]
    Draw {
        x: f64,
        y: f64,
        color: String,
        brush_size: f64,
    },

    #[serde(rename = "startCountdown")]
    StartCountdown { seconds: u64 },

    #[serde(rename = "stopCountdown")]
    StopCountdown {},

    #[serde(rename = "getInitialCountdown")]
    GetInitialCountdown {},

    /// Replayable drawing commands; opaque to the coordinator and relayed
    /// verbatim.
    #[serde(rename = "restoreDrawing")]
    RestoreDrawing {
        commands: serde_json::Value,
        index: Option<u64>,
    },

    #[serde(rename = "clearCanvas")]
    ClearCanvas {},

    #[serde(rename = "fillColor", rename_all = "camelCase")]
    FillColor { selected_color: String },

    #[serde(rename = "setRoomSettings", rename_all = "camelCase")]
    SetRoomSettings {
        room_settings: RoomSettings,
        room_id: String,
    },

    #[serde(rename = "get-room-settings", rename_all = "camelCase")]
    GetRoomSettings { room_id: String },

    /// Full-canvas snapshot offered in response to `get-canvas-state`.
    #[serde(rename = "canvas-state")]
    CanvasState {
        #[serde(rename = "dataURL")]
        data_url: String,
    },

    #[serde(rename = "selectedWord", rename_all = "camelCase")]
    SelectedWord {
        word: String,
        room_id: String,
        position: serde_json::Value,
    },

    #[serde(rename = "disconnected-from-game", rename_all = "camelCase")]
    DisconnectedFromGame {
        room_id: Option<String>,
        connection_id: String,
    },
}

/// Server -> Client events, mirroring the inbound contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ServerEvent {
    #[serde(rename = "roomCreated", rename_all = "camelCase")]
    RoomCreated {
        connection_id: String,
        room_id: String,
        room_data: Vec<Participant>,
    },

    #[serde(rename = "userJoined", rename_all = "camelCase")]
    UserJoined {
        connection_id: String,
        room_id: String,
        room_data: Vec<Participant>,
    },

    /// Room snapshot, or null when the room is unknown.
    #[serde(rename = "usersList")]
    UsersList(Option<RoomModel>),

    #[serde(rename = "changeStateToStarted")]
    ChangeStateToStarted(bool),

    #[serde(rename = "check-room-status", rename_all = "camelCase")]
    CheckRoomStatus {
        room_exists: bool,
        room: Option<RoomModel>,
    },

    #[serde(rename = "get-canvas-state")]
    GetCanvasState {},

    #[serde(rename = "drawFromServer", rename_all = "camelCase")]
    DrawFromServer {
        x: f64,
        y: f64,
        color: String,
        brush_size: f64,
    },

    /// Remaining whole seconds of the room's countdown.
    #[serde(rename = "countdown")]
    Countdown(u64),

    #[serde(rename = "broadcastRoomSettings", rename_all = "camelCase")]
    BroadcastRoomSettings { room_settings: RoomSettings },

    #[serde(rename = "getRoomSettings", rename_all = "camelCase")]
    GetRoomSettings { room_settings: RoomSettings },

    #[serde(rename = "getSelectedWord")]
    GetSelectedWord {
        word: String,
        position: serde_json::Value,
    },

    #[serde(rename = "changeInUsers", rename_all = "camelCase")]
    ChangeInUsers {
        new_room_data: Vec<Participant>,
        prev_room_id: String,
    },

    /// Connection id of the departed member.
    #[serde(rename = "userLeft")]
    UserLeft(String),

    #[serde(rename = "roomNotFound")]
    RoomNotFound {},

    #[serde(rename = "restoreDrawing")]
    RestoreDrawing {
        commands: serde_json::Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        index: Option<u64>,
    },

    #[serde(rename = "clearCanvas")]
    ClearCanvas {},

    #[serde(rename = "fillColor", rename_all = "camelCase")]
    FillColor { selected_color: String },
}

impl ServerEvent {
    /// Wraps a full-canvas snapshot into a restore command for drawing
    /// clients.
    pub fn restore_from_snapshot(data_url: String) -> Self {
        ServerEvent::RestoreDrawing {
            commands: serde_json::json!([{ "type": "draw", "dataURL": data_url }]),
            index: None,
        }
    }
}
