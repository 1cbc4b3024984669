use std::io::Write;

use anyhow::Context;

use gfd_config::GameConfig;

use crate::bootstrap;
use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;

pub mod audit;
pub mod migrate;
pub mod parse;
pub mod serve;
pub mod stats;
pub mod track;
pub mod user;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(
    command: Commands,
    config: GameConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match command {
        Commands::Serve(args) => serve::handle(&args, config).await,
        Commands::Migrate => migrate::handle(&config, flags).await,
        Commands::User { action } => {
            let service = bootstrap::open_service(&config).await?;
            user::handle(&action, &service, &config, flags).await
        }
        Commands::Track { action } => {
            let service = bootstrap::open_service(&config).await?;
            track::handle(&action, &service, flags).await
        }
        Commands::Audit { action } => {
            let service = bootstrap::open_service(&config).await?;
            audit::handle(&action, &service, flags).await
        }
        Commands::Stats { action } => {
            let service = bootstrap::open_service(&config).await?;
            stats::handle(&action, &service, flags).await
        }
    }
}

/// Write `body` to `path`, or to stdout when no path is given.
pub async fn write_or_print(path: Option<&str>, body: &[u8]) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            tokio::fs::write(path, body)
                .await
                .with_context(|| format!("failed to write {path}"))?;
            tracing::info!(path, bytes = body.len(), "written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(body)?;
            if !body.ends_with(b"\n") {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}
