use std::sync::Arc;
use thiserror::Error;

use crate::countdown::CountdownEngine;
use crate::room::repository::RoomRegistry;
use crate::room::RoomService;
use crate::websockets::connection_manager::ConnectionManager;
use crate::websockets::SessionRouter;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub room_service: Arc<RoomService>,
    pub connection_manager: Arc<dyn ConnectionManager>,
    pub countdown: Arc<CountdownEngine>,
    pub router: Arc<SessionRouter>,
}

impl AppState {
    /// Wires the coordinator together from its two swappable seams: the room
    /// registry and the connection manager.
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        connection_manager: Arc<dyn ConnectionManager>,
    ) -> Self {
        let room_service = Arc::new(RoomService::new(registry.clone()));
        let countdown = Arc::new(CountdownEngine::new(registry, connection_manager.clone()));
        let router = Arc::new(SessionRouter::new(
            room_service.clone(),
            countdown.clone(),
            connection_manager.clone(),
        ));

        Self {
            room_service,
            connection_manager,
            countdown,
            router,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Event encoding error: {0}")]
    Encoding(String),
}
