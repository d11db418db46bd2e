//! CLI entry and dispatch.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use imgdrive_core::config::{self, paths};
use imgdrive_core::logging;

mod commands;

#[derive(Parser)]
#[command(name = "imgdrive")]
#[command(version)]
#[command(about = "Browse, search and upload images in your imgdrive folders")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        username: String,
        /// Password (read from stdin when omitted)
        #[arg(long, env = "IMGDRIVE_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Create an account and log in with it
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long = "confirm-password")]
        confirm_password: String,
    },

    /// Forget the stored session token
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List a folder (default: the root)
    Ls {
        /// Folder names separated by '/'
        #[arg(value_name = "PATH", default_value = "")]
        path: String,
    },

    /// Search all of your images by name
    Search {
        #[arg(value_name = "QUERY")]
        query: String,
    },

    /// Create a folder; the last path segment is the new folder's name
    Mkdir {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Upload an image into a folder
    Upload {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Target folder path
        #[arg(long = "to", value_name = "PATH")]
        to: String,
        /// Image name (default: the file name without extension)
        #[arg(long)]
        name: Option<String>,
    },

    /// Interactive folder browser reading commands from stdin
    Browse,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load().context("load config")?;

    // held until exit so buffered log lines are flushed
    let _log_guard = match logging::init(&paths::logs_dir(), &config.log_level) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: file logging disabled: {e:#}");
            None
        }
    };

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    rt.block_on(async move { dispatch(cli, &config).await })
}

async fn dispatch(cli: Cli, config: &config::Config) -> Result<()> {
    match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(config, &username, password).await
        }
        Commands::Register {
            username,
            password,
            confirm_password,
        } => commands::auth::register(config, &username, &password, &confirm_password).await,
        Commands::Logout => commands::auth::logout(config),
        Commands::Whoami => commands::auth::whoami(config).await,

        Commands::Ls { path } => commands::browse::ls(config, &path).await,
        Commands::Search { query } => commands::browse::search(config, &query).await,
        Commands::Mkdir { path } => commands::browse::mkdir(config, &path).await,
        Commands::Upload { file, to, name } => {
            commands::browse::upload(config, &file, &to, name.as_deref()).await
        }
        Commands::Browse => commands::browse::shell(config).await,

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}
