use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use gfd_config::GameConfig;
use gfd_db::service::GameService;
use gfd_server::AppState;

use crate::bootstrap;
use crate::cli::root_commands::ServeArgs;

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub async fn handle(args: &ServeArgs, mut config: GameConfig) -> anyhow::Result<()> {
    if let Some(host) = &args.host {
        config.server.host.clone_from(host);
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    let addr = config.server.socket_addr().with_context(|| {
        format!(
            "server.host must be an IP address, got '{}'",
            config.server.host
        )
    })?;

    let service = bootstrap::open_service(&config).await?;
    let state = AppState::new(service, config);
    spawn_session_purge(Arc::clone(&state.service));

    gfd_server::serve(state, addr)
        .await
        .context("HTTP server failed")
}

fn spawn_session_purge(service: Arc<GameService>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_PURGE_INTERVAL);
        // The first tick fires immediately; startup already purged.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(error) = service.purge_expired_sessions().await {
                tracing::warn!(%error, "failed to purge expired login sessions");
            }
        }
    });
}
