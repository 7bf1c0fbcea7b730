use anyhow::Result;
use clap::{Parser, Subcommand};

use dockyard::cli::{
    handle_export_command, handle_sync_command, handle_template_command, AppContext,
    ExportCommands, SyncCommands, TemplateCommands,
};
use dockyard::config::{paths::DockyardPaths, settings::Settings};
use dockyard::state::SortOption;
use dockyard::storage::Storage;

#[derive(Parser)]
#[command(
    name = "dockyard",
    version,
    about = "Library of Docker Compose service templates with cloud sync",
    long_about = "Dockyard keeps reusable Docker Compose service definitions in a local \
                  library, renders them as Compose YAML, and syncs the library with a \
                  hosted Supabase table."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and settings file
    Init,

    /// Show or change configuration
    Config {
        /// Remote project URL, e.g. https://abc.supabase.co
        #[arg(long)]
        remote_url: Option<String>,
        /// Remote project key
        #[arg(long)]
        remote_key: Option<String>,
        /// Remote table name
        #[arg(long)]
        remote_table: Option<String>,
        /// Default sort order for `list`
        #[arg(long, value_enum)]
        default_sort: Option<SortOption>,
        /// Dark theme preference
        #[arg(long)]
        dark_theme: Option<bool>,
        /// Push saved templates to the remote store right away
        #[arg(long)]
        auto_push: Option<bool>,
    },

    #[command(flatten)]
    Template(TemplateCommands),

    #[command(flatten)]
    Sync(SyncCommands),

    #[command(flatten)]
    Export(ExportCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize paths and logging
    let paths = DockyardPaths::new()?;
    paths.ensure_directories()?;
    let _log_guard = dockyard::logging::init(&paths)?;

    let settings = Settings::load_or_create(&paths)?;

    // Initialize storage
    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Init) => {
            println!("Initializing Dockyard at: {}", paths.base_dir().display());
            Settings::load_file(&paths)?.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Run 'dockyard add <name> <image>' to create your first template.");
            println!("Run 'dockyard config --remote-url <url> --remote-key <key>' to enable sync.");
        }
        Some(Commands::Config {
            remote_url,
            remote_key,
            remote_table,
            default_sort,
            dark_theme,
            auto_push,
        }) => {
            let changing = remote_url.is_some()
                || remote_key.is_some()
                || remote_table.is_some()
                || default_sort.is_some()
                || dark_theme.is_some()
                || auto_push.is_some();

            if changing {
                let mut stored = Settings::load_file(&paths)?;
                if let Some(url) = remote_url {
                    stored.remote.url = url;
                }
                if let Some(key) = remote_key {
                    stored.remote.api_key = key;
                }
                if let Some(table) = remote_table {
                    stored.remote.table = table;
                }
                if let Some(sort) = default_sort {
                    stored.default_sort = sort;
                }
                if let Some(dark) = dark_theme {
                    stored.dark_theme = dark;
                }
                if let Some(push) = auto_push {
                    stored.auto_push = push;
                }
                stored.save(&paths)?;
                println!("Settings saved to {}", paths.settings_file().display());
                return Ok(());
            }

            println!("Dockyard Configuration");
            println!("======================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Templates file: {}", paths.templates_file().display());
            println!("Log directory:  {}", paths.log_dir().display());
            println!();
            println!("Settings:");
            println!("  Default sort: {}", settings.default_sort);
            println!("  Dark theme:   {}", settings.dark_theme);
            println!("  Auto push:    {}", settings.auto_push);
            println!(
                "  Remote:       {}",
                if settings.remote_configured() {
                    settings.remote.url.as_str()
                } else {
                    "(not configured)"
                }
            );
        }
        Some(Commands::Template(cmd)) => {
            let ctx = AppContext::new(storage, settings);
            handle_template_command(&ctx, cmd).await?;
        }
        Some(Commands::Sync(cmd)) => {
            let ctx = AppContext::new(storage, settings);
            handle_sync_command(&ctx, cmd).await?;
        }
        Some(Commands::Export(cmd)) => {
            let ctx = AppContext::new(storage, settings);
            handle_export_command(&ctx, cmd)?;
        }
        None => {
            println!("Dockyard - Docker Compose service templates");
            println!();
            println!("Run 'dockyard --help' for usage information.");
        }
    }

    Ok(())
}
