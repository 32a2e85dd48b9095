//! CLI entry point for the `qblock` control panel.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use quick_block::cli::{commands, resolve_store_path};
use quick_block::BlockError;

#[derive(Parser)]
#[command(
    name = "qblock",
    about = "quick-block control panel: manage the persisted block list"
)]
struct Cli {
    /// Path to the store file
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Output format: "text" (default) or "json"
    #[arg(long, global = true, default_value = "text")]
    format: String,

    /// Enable debug logging
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List blocked users, most recent first
    List {
        /// Only show usernames containing this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Block a user
    Block {
        /// Username, with or without a leading @
        username: String,
        /// Stable identity, if known
        #[arg(long)]
        id: Option<String>,
    },
    /// Unblock a user
    Unblock {
        /// Username, with or without a leading @
        username: String,
    },
    /// Unblock everyone
    Clear {
        /// Confirm; this cannot be undone
        #[arg(long)]
        yes: bool,
    },
    /// Export the block list as JSON
    Export {
        /// Output file or directory (stdout if omitted)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Pretty-print JSON
        #[arg(long)]
        pretty: bool,
    },
    /// Merge an exported block list
    Import {
        /// Path to the JSON export file
        file: PathBuf,
    },
    /// Show or change the config
    Config {
        /// Block mode: hide or native
        #[arg(long)]
        mode: Option<String>,
        /// Button visibility: hover or always
        #[arg(long)]
        buttons: Option<String>,
    },
    /// Summary statistics
    Stats,
}

fn main() {
    let cli = Cli::parse();
    let json = cli.format == "json";

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new().filter_level(level).init();

    let store = resolve_store_path(cli.store.as_deref());
    log::debug!("Using store {}", store.display());

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = runtime.block_on(async move {
        match cli.command {
            Commands::List { search } => commands::cmd_list(&store, search.as_deref(), json).await,
            Commands::Block { username, id } => {
                commands::cmd_block(&store, &username, id.as_deref(), json).await
            }
            Commands::Unblock { username } => commands::cmd_unblock(&store, &username, json).await,
            Commands::Clear { yes } => commands::cmd_clear(&store, yes, json).await,
            Commands::Export { out, pretty } => {
                commands::cmd_export(&store, out.as_deref(), pretty).await
            }
            Commands::Import { file } => commands::cmd_import(&store, &file, json).await,
            Commands::Config { mode, buttons } => {
                commands::cmd_config(&store, mode.as_deref(), buttons.as_deref(), json).await
            }
            Commands::Stats => commands::cmd_stats(&store, json).await,
        }
    });

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let code = match &e {
            BlockError::Io(_) => 1,
            BlockError::Json(_) | BlockError::InvalidImport(_) => 2,
            BlockError::InvalidArgument(_) => 3,
            BlockError::NotFound(_) => 4,
            BlockError::Store(_) => 5,
        };
        process::exit(code);
    }
}
