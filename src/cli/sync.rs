//! Remote sync CLI commands

use clap::Subcommand;

use crate::error::DockyardResult;
use crate::services::SyncService;
use crate::state::HomeViewModel;

use super::AppContext;

/// Sync subcommands
#[derive(Subcommand, Debug)]
pub enum SyncCommands {
    /// Upload local templates, then replace them with the remote set
    Sync,
    /// Upload all local templates
    Push,
    /// Replace local templates with the remote set, keeping local flags
    Pull,
    /// Show remote configuration and check the connection
    Status,
}

/// Handle a sync command
pub async fn handle_sync_command(ctx: &AppContext, cmd: SyncCommands) -> DockyardResult<()> {
    match cmd {
        SyncCommands::Sync => {
            let remote = ctx.require_remote()?;
            let home = HomeViewModel::new(
                ctx.storage.clone(),
                Some(remote.clone()),
                ctx.settings.default_sort,
            );

            // a failure is reported once, by the caller
            let report = home.sync_with_cloud().await?;
            if let Some(message) = home.state().user_message {
                println!("{}", message);
                home.user_message_shown();
            }

            println!("  Uploaded:   {}", report.uploaded);
            println!("  Downloaded: {}", report.downloaded);
            println!("  Kept flags: {}", report.matched);
        }

        SyncCommands::Push => {
            let remote = ctx.require_remote()?;
            let uploaded = SyncService::new(&ctx.storage, remote).upload().await?;
            println!("Uploaded {} templates", uploaded);
        }

        SyncCommands::Pull => {
            let remote = ctx.require_remote()?;
            let report = SyncService::new(&ctx.storage, remote).download().await?;
            println!(
                "Downloaded {} templates ({} kept local favorites/usage)",
                report.downloaded, report.matched
            );
        }

        SyncCommands::Status => {
            let remote_settings = &ctx.settings.remote;
            println!("Remote Store");
            println!("============");
            println!(
                "URL:       {}",
                if remote_settings.url.trim().is_empty() {
                    "(not set)"
                } else {
                    remote_settings.url.as_str()
                }
            );
            println!(
                "API key:   {}",
                if remote_settings.api_key.trim().is_empty() {
                    "(not set)"
                } else {
                    "(set)"
                }
            );
            println!("Table:     {}", remote_settings.table);
            println!(
                "Auto push: {}",
                if ctx.settings.auto_push { "on" } else { "off" }
            );

            let Some(remote) = ctx.remote() else {
                println!("Status:    not configured");
                return Ok(());
            };

            match SyncService::new(&ctx.storage, remote).check_connection().await {
                Ok(rows) => println!("Status:    connected ({} remote templates)", rows),
                Err(e) => println!("Status:    unavailable ({})", e),
            }
        }
    }

    Ok(())
}
