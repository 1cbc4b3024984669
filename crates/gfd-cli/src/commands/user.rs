use anyhow::Context;

use gfd_config::GameConfig;
use gfd_core::enums::Role;
use gfd_core::paging::{PageRequest, SortDirection};
use gfd_db::repos::user::NewUser;
use gfd_db::service::{ActionContext, GameService};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::UserCommands;
use crate::commands::parse::parse_enum;
use crate::output::output;

pub async fn handle(
    action: &UserCommands,
    service: &GameService,
    config: &GameConfig,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let ctx = ActionContext::system();
    match action {
        UserCommands::Create {
            username,
            email,
            password,
            full_name,
            role,
        } => {
            let user = service
                .create_user(
                    NewUser {
                        username: username.clone(),
                        email: email.clone(),
                        password: password.clone(),
                        full_name: full_name.clone(),
                        role: parse_enum::<Role>(role, "role")?,
                        is_active: true,
                    },
                    &ctx,
                )
                .await?;
            output(&user, flags.format)
        }
        UserCommands::List {
            search,
            role,
            page,
            size,
        } => {
            let role = role
                .as_deref()
                .map(|raw| parse_enum::<Role>(raw, "role"))
                .transpose()?;
            let request = PageRequest::new(*page, size.unwrap_or(config.general.default_page_size))
                .capped(config.general.max_page_size)
                .sorted("created_at", SortDirection::Desc);
            let users = service
                .list_users(&request, search.as_deref(), role)
                .await?;
            output(&users, flags.format)
        }
        UserCommands::Passwd { username, password } => {
            let user = service
                .get_user_by_username(username)
                .await?
                .with_context(|| format!("no user named '{username}'"))?;
            service.change_password(user.id, password, &ctx).await?;
            output(
                &serde_json::json!({"username": user.username, "passwordChanged": true}),
                flags.format,
            )
        }
    }
}
