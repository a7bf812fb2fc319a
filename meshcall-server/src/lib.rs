mod config;
mod error;
pub mod room;
pub mod signaling;

pub use config::*;
pub use error::*;
pub use room::*;
pub use signaling::*;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// HTTP routes of the relay: `GET /ws/{room}/{name}`.
pub fn router(service: SignalingService) -> Router {
    // Browser clients are usually served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws/{room}/{name}", get(ws_handler))
        .layer(cors)
        .with_state(service)
}

/// Binds `config.bind` and serves until the process stops.
pub async fn serve(config: ServerConfig) -> Result<(), ServerError> {
    let listener = TcpListener::bind(config.bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.bind,
            source,
        })?;
    serve_on(listener, config).await
}

/// Serves on an already bound listener.
pub async fn serve_on(listener: TcpListener, config: ServerConfig) -> Result<(), ServerError> {
    let service = SignalingService::new(config.ice_servers);
    let app = router(service);

    if let Ok(addr) = listener.local_addr() {
        info!("Signaling relay listening on http://{addr}");
    }
    axum::serve(listener, app).await.map_err(ServerError::Serve)
}
