use gfd_core::enums::AuditActionType;
use gfd_db::repos::audit::AuditFilter;
use gfd_db::service::GameService;
use gfd_server::query::parse_optional_bound;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::AuditCommands;
use crate::commands::parse::parse_enum;
use crate::commands::write_or_print;
use crate::output::output;

pub async fn handle(
    action: &AuditCommands,
    service: &GameService,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        AuditCommands::Recent { limit } => {
            output(&service.recent_audit(*limit).await?, flags.format)
        }
        AuditCommands::Export {
            username,
            action,
            entity,
            from,
            to,
            output,
        } => {
            let filter = AuditFilter {
                username: username.clone(),
                action_type: action
                    .as_deref()
                    .map(|raw| parse_enum::<AuditActionType>(raw, "action"))
                    .transpose()?,
                resource_type: entity.clone(),
                status: None,
                from: parse_optional_bound(from.as_deref(), false)?,
                to: parse_optional_bound(to.as_deref(), true)?,
            };
            let body = service.export_audit(&filter).await?;
            write_or_print(output.as_deref(), &body).await
        }
    }
}
