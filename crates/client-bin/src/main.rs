//! pinsched - Pinterest scheduler client.

mod app;
mod commands;
mod output;
mod terminal;

use std::path::PathBuf;

use app::AppState;
use clap::{Parser, Subcommand};
use client_config_and_utils::{init_logging, Config, Paths};
use commands::auth::CallbackArgs;

/// pinsched command-line interface.
#[derive(Parser)]
#[command(name = "pinsched")]
#[command(about = "Pinterest scheduler client: sign in and manage the local session")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format (text or json)
    #[arg(short, long, default_value = "text", global = true)]
    format: output::OutputFormat,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for runtime files (storage, logs, config). Defaults to ~/.pinsched
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with Pinterest
    Login {
        /// Print the authorization URL without opening a browser
        #[arg(long)]
        no_browser: bool,
    },
    /// Finish signing in from the provider redirect
    Callback {
        /// Redirect URL or query string (e.g. "?code=...")
        redirect: Option<String>,
        /// Authorization code
        #[arg(long, conflicts_with = "redirect")]
        code: Option<String>,
        /// Provider error code
        #[arg(long, conflicts_with = "redirect")]
        error: Option<String>,
        /// Provider error description
        #[arg(long, conflicts_with = "redirect")]
        error_description: Option<String>,
    },
    /// Show the current session
    Status,
    /// Refresh the access token
    Refresh {
        /// Total attempts on transient failures
        #[arg(long, default_value = "1")]
        attempts: u32,
    },
    /// Sign out and clear the stored session
    Logout,
    /// Show how an app path resolves for the current session
    Route {
        /// App path, e.g. /dashboard/scheduled
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;

    let level = cli.log_level.unwrap_or_else(|| config.log_level.clone());
    init_logging(&level, Some(paths.log_file()));

    let open_browser = !matches!(cli.command, Commands::Login { no_browser: true });
    let state = AppState::init(config, paths, cli.format, open_browser).await?;

    let result = match cli.command {
        Commands::Login { .. } => commands::auth::login(&state).await,
        Commands::Callback {
            redirect,
            code,
            error,
            error_description,
        } => {
            let args = CallbackArgs {
                redirect,
                code,
                error,
                error_description,
            };
            commands::auth::callback(&state, args).await
        }
        Commands::Status => commands::auth::status(&state).await,
        Commands::Refresh { attempts } => commands::auth::refresh(&state, attempts).await,
        Commands::Logout => commands::auth::logout(&state).await,
        Commands::Route { path } => commands::route::route(&state, &path).await,
    };

    state.shutdown().await;
    result?;
    Ok(())
}
