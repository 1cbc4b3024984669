use serde::Serialize;

use gfd_config::GameConfig;

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::output::output;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MigrateResponse {
    database: String,
    users: u64,
    tracks: usize,
}

/// Opening the store applies the embedded schema; report what is there.
pub async fn handle(config: &GameConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let service = bootstrap::open_service(config).await?;
    let response = MigrateResponse {
        database: config.database.path.clone(),
        users: service.count_users().await?,
        tracks: service.all_tracks().await?.len(),
    };
    tracing::info!(database = %response.database, "schema up to date");
    output(&response, flags.format)
}
