use anyhow::Context;

use gfd_config::GameConfig;
use gfd_db::service::GameService;

use crate::cli::GlobalFlags;

/// Load layered configuration and apply command-line overrides.
pub fn load_config(flags: &GlobalFlags) -> anyhow::Result<GameConfig> {
    let mut config = GameConfig::load_with_dotenv().context("failed to load configuration")?;
    if let Some(path) = &flags.database {
        config.database.path.clone_from(path);
        config.validate()?;
    }
    Ok(config)
}

/// Open the store, run migrations and make sure an administrator exists.
pub async fn open_service(config: &GameConfig) -> anyhow::Result<GameService> {
    let service = GameService::new_local(&config.database.path, config.database.audit_trail_path())
        .await
        .with_context(|| format!("failed to open database at {}", config.database.path))?
        .with_bcrypt_cost(config.auth.bcrypt_cost);

    service
        .ensure_default_admin(&config.auth.bootstrap_admin)
        .await
        .context("failed to create the default administrator")?;
    service.purge_expired_sessions().await?;

    tracing::debug!(path = %config.database.path, "store ready");
    Ok(service)
}

#[cfg(test)]
mod tests {
    use gfd_config::GameConfig;
    use pretty_assertions::assert_eq;

    use super::open_service;

    fn in_memory() -> GameConfig {
        let mut config = GameConfig::default();
        config.database.path = ":memory:".into();
        config.auth.bcrypt_cost = 4;
        config
    }

    #[tokio::test]
    async fn open_service_creates_default_admin_once() {
        let config = in_memory();
        let service = open_service(&config).await.expect("service should open");

        let admin = service
            .get_user_by_username(&config.auth.bootstrap_admin.username)
            .await
            .expect("lookup should work")
            .expect("admin should exist");
        assert_eq!(admin.full_name, config.auth.bootstrap_admin.full_name);

        let again = service
            .ensure_default_admin(&config.auth.bootstrap_admin)
            .await
            .expect("second call should work");
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn disabled_bootstrap_leaves_store_empty() {
        let mut config = in_memory();
        config.auth.bootstrap_admin.enabled = false;
        let service = open_service(&config).await.expect("service should open");
        assert_eq!(service.count_users().await.expect("count should work"), 0);
    }

    #[tokio::test]
    async fn file_database_is_created_under_missing_directories() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let mut config = in_memory();
        config.database.path = dir.path().join("nested/gfd.db").display().to_string();
        open_service(&config).await.expect("service should open");
        assert!(dir.path().join("nested/gfd.db").exists());
    }
}
