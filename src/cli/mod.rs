pub mod add;
pub mod dashboard;

use std::{path::PathBuf, sync::Arc};

use add::{process_add_command, AddCommand};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dashboard::{
    process_list_command, process_today_command, process_watch_command, ListCommand,
    TodayCommand, WatchCommand,
};
use tracing::{debug, level_filters::LevelFilter, warn};

use crate::{
    config::BackendConfig,
    repository::rest::RestRepository,
    store::ActivityStore,
    utils::{
        dir::create_application_default_path,
        logging::{enable_logging, CLI_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "Daypie", version, long_about = None)]
#[command(about = "Log activities and see where your day went", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
    #[arg(
        long,
        global = true,
        help = "Read backend settings from this file instead of the environment"
    )]
    env_file: Option<PathBuf>,
    #[arg(long, global = true, help = "Backend url. Overrides DAYPIE_BACKEND_URL")]
    url: Option<String>,
    #[arg(long, global = true, help = "Backend api key. Overrides DAYPIE_API_KEY")]
    key: Option<String>,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Log a new activity")]
    Add {
        #[command(flatten)]
        command: AddCommand,
    },
    #[command(about = "Show how today was spent")]
    Today {
        #[command(flatten)]
        command: TodayCommand,
    },
    #[command(about = "List logged activities, newest first")]
    List {
        #[command(flatten)]
        command: ListCommand,
    },
    #[command(about = "Keep today's dashboard open and refresh it on every change")]
    Watch {
        #[command(flatten)]
        command: WatchCommand,
    },
}

fn load_config(args: &Args) -> Result<BackendConfig> {
    let config = match &args.env_file {
        Some(path) => BackendConfig::from_env_file(path)?,
        None => {
            match dotenvy::dotenv() {
                Ok(path) => debug!("Loaded .env from {path:?}"),
                Err(e) if e.not_found() => debug!("No .env file found"),
                Err(e) => warn!("Failed to load .env file {e}"),
            }
            match BackendConfig::from_env() {
                Ok(config) => config,
                // Flags may provide everything that's missing.
                Err(e) if args.url.is_some() && args.key.is_some() => {
                    debug!("Using flags only, environment is incomplete: {e}");
                    BackendConfig::from_lookup(|name| match name {
                        crate::config::URL_VAR => args.url.clone(),
                        crate::config::KEY_VAR => args.key.clone(),
                        _ => std::env::var(name).ok(),
                    })?
                }
                Err(e) => return Err(e),
            }
        }
    };
    Ok(config.with_overrides(args.url.clone(), args.key.clone()))
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let logs_path = create_application_default_path()?.join("logs");
    enable_logging(CLI_PREFIX, &logs_path, logging_level, args.log)?;

    let config = load_config(&args).context("Backend is not configured")?;
    let repository = Arc::new(RestRepository::new(&config)?);
    let store = ActivityStore::new(repository.clone());

    match args.commands {
        Commands::Add { command } => process_add_command(command, &store).await,
        Commands::Today { command } => process_today_command(command, &store).await,
        Commands::List { command } => {
            process_list_command(command, &store, repository.as_ref()).await
        }
        Commands::Watch { command } => process_watch_command(command, &store).await,
    }
}
