use async_trait::async_trait;
use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::countdown::CountdownEngine;
use crate::room::RoomService;
use crate::shared::{AppError, AppState};
use crate::websockets::connection_manager::ConnectionManager;
use crate::websockets::event_handlers::{
    CanvasEventHandlers, CountdownEventHandlers, RoomEventHandlers,
};
use crate::websockets::messages::ClientEvent;

use super::socket::{Connection, MessageHandler};

/// The session event router: maps each inbound participant action to
/// registry/timer mutations and decides the outbound fan-out.
///
/// Stateless itself; each action validates its own preconditions and contains
/// its own failures, so no inbound event can take the coordinator down.
pub struct SessionRouter {
    room_events: RoomEventHandlers,
    canvas_events: CanvasEventHandlers,
    countdown_events: CountdownEventHandlers,
}

impl SessionRouter {
    pub fn new(
        rooms: Arc<RoomService>,
        countdown: Arc<CountdownEngine>,
        connections: Arc<dyn ConnectionManager>,
    ) -> Self {
        Self {
            room_events: RoomEventHandlers::new(
                rooms.clone(),
                connections.clone(),
                countdown.clone(),
            ),
            canvas_events: CanvasEventHandlers::new(rooms.clone(), connections.clone()),
            countdown_events: CountdownEventHandlers::new(rooms, countdown, connections),
        }
    }

    async fn dispatch(&self, connection_id: &str, event: ClientEvent) -> Result<(), AppError> {
        match event {
            ClientEvent::CreateRoom { display_name } => {
                self.room_events
                    .handle_create_room(connection_id, &display_name)
                    .await
            }
            ClientEvent::JoinRoom {
                room_id,
                display_name,
            } => {
                self.room_events
                    .handle_join_room(connection_id, &room_id, &display_name)
                    .await
            }
            ClientEvent::GetUsers { room_id } => {
                self.room_events
                    .handle_get_users(connection_id, &room_id)
                    .await
            }
            ClientEvent::StartGame { room_id } => {
                self.room_events.handle_start_game(&room_id).await
            }
            ClientEvent::CheckRoom { room_id } => {
                self.room_events
                    .handle_check_room(connection_id, &room_id)
                    .await
            }
            ClientEvent::NewClient {} => {
                self.canvas_events.handle_new_client(connection_id).await
            }
            ClientEvent::Draw {
                x,
                y,
                color,
                brush_size,
            } => {
                self.canvas_events
                    .handle_draw(connection_id, x, y, color, brush_size)
                    .await
            }
            ClientEvent::StartCountdown { seconds } => {
                self.countdown_events
                    .handle_start_countdown(connection_id, seconds)
                    .await
            }
            ClientEvent::StopCountdown {} => {
                self.countdown_events
                    .handle_stop_countdown(connection_id)
                    .await
            }
            ClientEvent::GetInitialCountdown {} => {
                self.countdown_events
                    .handle_get_initial_countdown(connection_id)
                    .await
            }
            ClientEvent::RestoreDrawing { commands, index } => {
                self.canvas_events
                    .handle_restore_drawing(connection_id, commands, index)
                    .await
            }
            ClientEvent::ClearCanvas {} => {
                self.canvas_events.handle_clear_canvas(connection_id).await
            }
            ClientEvent::FillColor { selected_color } => {
                self.canvas_events
                    .handle_fill_color(connection_id, selected_color)
                    .await
            }
            ClientEvent::SetRoomSettings {
                room_settings,
                room_id,
            } => {
                self.room_events
                    .handle_set_room_settings(&room_id, room_settings)
                    .await
            }
            ClientEvent::GetRoomSettings { room_id } => {
                self.room_events.handle_get_room_settings(&room_id).await
            }
            ClientEvent::CanvasState { data_url } => {
                self.canvas_events
                    .handle_canvas_state(connection_id, data_url)
                    .await
            }
            ClientEvent::SelectedWord {
                word,
                room_id,
                position,
            } => {
                self.room_events
                    .handle_selected_word(&room_id, word, position)
                    .await
            }
            ClientEvent::DisconnectedFromGame {
                room_id,
                connection_id: leaving_connection_id,
            } => {
                self.room_events
                    .handle_leave_game(room_id.as_deref(), &leaving_connection_id)
                    .await
            }
        }
    }

    /// Transport-level disconnect cleanup.
    pub async fn handle_disconnect(&self, connection_id: &str) -> Result<(), AppError> {
        self.room_events.handle_disconnect(connection_id).await
    }
}

#[async_trait]
impl MessageHandler for SessionRouter {
    async fn handle_message(&self, connection_id: &str, message: String) {
        let event = match serde_json::from_str::<ClientEvent>(&message) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to parse client event"
                );
                return;
            }
        };

        if let Err(e) = self.dispatch(connection_id, event).await {
            warn!(
                connection_id = %connection_id,
                error = %e,
                "Event handler failed"
            );
        }
    }
}

/// WebSocket endpoint: GET /ws, no authentication. Each accepted socket gets
/// an opaque uuid connection id for its lifetime.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(app_state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_websocket_connection(socket, app_state))
}

/// Handle the upgraded WebSocket connection
async fn handle_websocket_connection(socket: axum::extract::ws::WebSocket, app_state: AppState) {
    let connection_id = Uuid::new_v4().to_string();

    info!(
        connection_id = %connection_id,
        "WebSocket connection established"
    );

    // Create the outbound channel (app -> client)
    let (outbound_sender, outbound_receiver) = mpsc::unbounded_channel::<String>();

    app_state
        .connection_manager
        .add_connection(connection_id.clone(), outbound_sender)
        .await;

    let connection = Connection::new(
        connection_id.clone(),
        Box::new(socket),
        outbound_receiver,
        app_state.router.clone(),
    );

    // Run the connection until disconnect
    match connection.run().await {
        Ok(()) => {
            info!(
                connection_id = %connection_id,
                "WebSocket connection closed cleanly"
            );
        }
        Err(e) => {
            warn!(
                connection_id = %connection_id,
                error = ?e,
                "WebSocket connection error"
            );
        }
    }

    // Cleanup: drop the connection, then run the disconnect path. The
    // disconnect can race with explicit leave events; the registry absorbs
    // whichever loses.
    app_state
        .connection_manager
        .remove_connection(&connection_id)
        .await;

    if let Err(e) = app_state.router.handle_disconnect(&connection_id).await {
        warn!(
            connection_id = %connection_id,
            error = %e,
            "Disconnect cleanup failed"
        );
    }
}
