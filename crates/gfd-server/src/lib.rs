//! # gfd-server
//!
//! axum HTTP surface for Game for Devs.
//!
//! - `/api/game/**`, `/api/track/**`: public game API, CORS-enabled
//! - `/`, `/game`, `/login`, `/logout`: landing, game page and sign-in
//! - `/admin/**`, `/config/**`: back-office pages
//! - `/api/admin/**`: admin JSON API
//!
//! Back-office routes sit behind [`auth::require_admin`], which resolves the
//! session cookie against the store.

pub mod auth;
pub mod error;
pub mod extract;
pub mod html;
pub mod query;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderValue, Method};
use axum::middleware;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use gfd_config::ServerConfig;

pub use error::ApiError;
pub use state::AppState;

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));
    if config.allows_any_origin() {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin, "ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();
        layer.allow_origin(origins)
    }
}

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let public_api = Router::new()
        .nest("/api/game", routes::game::router())
        .nest("/api/track", routes::legacy::router())
        .layer(cors_layer(&state.config.server));

    let back_office = Router::new()
        .nest("/api/admin", routes::admin::router())
        .merge(routes::pages::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    Router::new()
        .merge(routes::session::router())
        .merge(public_api)
        .merge(back_office)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an I/O error if the address cannot be bound or the server fails.
pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %listener.local_addr()?, "server listening");

    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        tracing::info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("received terminate signal, shutting down");
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
