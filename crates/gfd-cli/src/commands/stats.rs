use gfd_db::repos::statistics::daily_activity_csv;
use gfd_db::service::GameService;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::StatsCommands;
use crate::output::output;

pub async fn handle(
    action: &StatsCommands,
    service: &GameService,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        StatsCommands::Report => output(&service.system_report().await?, flags.format),
        StatsCommands::Daily { days, csv } => {
            let rows = service.daily_activity(*days).await?;
            if *csv {
                print!("{}", daily_activity_csv(&rows));
                Ok(())
            } else {
                output(&rows, flags.format)
            }
        }
    }
}
