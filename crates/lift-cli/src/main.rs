//! Lift CLI - Command-line interface for the Lift training journal
//!
//! Local-first: every command works on the local database, and `sync`,
//! `export` and `import` exchange snapshots with other devices.

mod cli;
mod commands;
mod error;


use clap::Parser;

use crate::cli::{Cli, Commands, ExerciseCommands};
use crate::commands::common::{resolve_config_path, resolve_db_path};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::conflicts::run_conflicts;
use crate::commands::exercise::{run_exercise_add, run_exercise_delete, run_exercise_list};
use crate::commands::gc::run_gc;
use crate::commands::init::run_init;
use crate::commands::status::run_status;
use crate::commands::sync::{run_export, run_import, run_sync};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "lift=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path)?;
    let config_path = resolve_config_path(cli.config)?;

    match cli.command {
        Commands::Init { seed } => run_init(seed, &db_path).await?,
        Commands::Sync { provider } => {
            run_sync(provider.map(Into::into), &db_path, &config_path).await?;
        }
        Commands::Export { dir } => run_export(dir.as_deref(), &db_path, &config_path).await?,
        Commands::Import { file } => run_import(&file, &db_path, &config_path).await?,
        Commands::Status { json } => run_status(json, &db_path).await?,
        Commands::Conflicts { limit, json } => run_conflicts(limit, json, &db_path).await?,
        Commands::Gc { older_than_days } => {
            run_gc(older_than_days, &db_path, &config_path).await?;
        }
        Commands::Config { command } => run_config(command, &config_path)?,
        Commands::Exercise { command } => match command {
            ExerciseCommands::Add { name, muscle_group } => {
                run_exercise_add(&name, muscle_group, &db_path).await?;
            }
            ExerciseCommands::List { json } => run_exercise_list(json, &db_path).await?,
            ExerciseCommands::Delete { id } => run_exercise_delete(&id, &db_path).await?,
        },
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
