//! HTTP surface
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /pair-room/{id}?sig=` | run the pairing flow for the visitor |
//! | `GET /qr-code/{id}` | PNG QR code of the room's pairing link |
//! | `GET/POST/DELETE /api/pairings` | pairing administration |
//! | `GET/POST /api/mode` | forwarding mode administration |
//! | `GET /api/rooms` | room catalogue with pairing links |
//! | `GET /health` | liveness |

pub mod error;
pub mod forwarded;
pub mod handlers;
mod pages;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;

use crate::links::PAIR_PATH;
use crate::state::AppState;

pub use error::ApiError;

/// Build the application router
///
/// Handlers read the peer address through `ConnectInfo<SocketAddr>`, so the
/// router must be served with [`serve`] (or wrapped in `MockConnectInfo`).
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(&format!("{}/:room_id", PAIR_PATH), get(handlers::pair_room))
        .route("/qr-code/:room_id", get(handlers::qr_code))
        .route(
            "/api/pairings",
            get(handlers::list_pairings)
                .post(handlers::add_pairing)
                .delete(handlers::remove_pairing),
        )
        .route("/api/mode", get(handlers::get_mode).post(handlers::set_mode))
        .route("/api/rooms", get(handlers::list_rooms))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve requests on `listener` until `cancel` fires
pub async fn serve(
    listener: TcpListener,
    state: Arc<AppState>,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    tracing::info!("HTTP server listening on {}", listener.local_addr()?);

    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { cancel.cancelled().await })
    .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
