//! Axum-based WebSocket server.

use std::sync::Arc;

use axum::{
    extract::ws::rejection::WebSocketUpgradeRejection,
    extract::{State, WebSocketUpgrade},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tracing::{debug, info};

use tileboard_core::protocol::{ENDPOINT, SERVER_NAME};

use crate::connection::handle_socket;
use crate::state::AppState;

/// Start the canvas WebSocket server.
///
/// Binds the listener and runs the accept loop until shutdown. Bind and
/// listener-level failures propagate out; they are the only errors that
/// stop the whole service.
pub async fn start_server(state: Arc<AppState>, port: u16) -> anyhow::Result<()> {
    let bind_addr = state.config.bind();

    // Only the endpoint's first path segment matters; everything else 404s.
    let app = Router::new()
        .route(&format!("/{ENDPOINT}"), any(tile_handler))
        .route(&format!("/{ENDPOINT}/{{*rest}}"), any(tile_handler))
        .fallback(not_found)
        .with_state(state);

    let addr = format!("{bind_addr}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Canvas server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Upgrade handler for the canvas endpoint. A plain HTTP request here is
/// answered 404, the same as an unknown path, and no handshake completes.
async fn tile_handler(
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    State(state): State<Arc<AppState>>,
) -> Response {
    match ws {
        Ok(ws) => {
            let mut response = ws.on_upgrade(move |socket| handle_socket(state, socket));
            response
                .headers_mut()
                .insert(header::SERVER, HeaderValue::from_static(SERVER_NAME));
            response
        }
        Err(rejection) => {
            debug!(%rejection, "non-upgrade request to the canvas endpoint");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
