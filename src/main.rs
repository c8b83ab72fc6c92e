use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sketchparty::room::repository::InMemoryRoomRegistry;
use sketchparty::shared::AppState;
use sketchparty::websockets::{websocket_handler, InMemoryConnectionManager};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sketchparty=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting sketchparty session coordinator");

    let app_state = AppState::new(
        Arc::new(InMemoryRoomRegistry::new()),
        Arc::new(InMemoryConnectionManager::new()),
    );

    // Browser clients come from the configured frontend origin; GET/POST
    // covers the upgrade request and any polling fallback.
    let cors = match std::env::var("ALLOWED_ORIGIN")
        .ok()
        .and_then(|origin| origin.parse::<HeaderValue>().ok())
    {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST]),
        None => CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods([Method::GET, Method::POST]),
    };

    let app = Router::new()
        .route("/", get(|| async { "sketchparty coordinator" }))
        .route("/ws", get(websocket_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state);

    let addr =
        std::env::var("SKETCHPARTY_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await.unwrap();
    info!("Coordinator listening on {}", addr);
    axum::serve(listener, app).await.unwrap();
}
