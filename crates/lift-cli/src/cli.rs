use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use lift_core::config::ProviderKind;
use lift_core::models::MuscleGroup;

#[derive(Parser)]
#[command(name = "lift")]
#[command(about = "Offline-first strength training journal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional path to sync configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the local database
    Init {
        /// Insert default settings, exercises and templates
        #[arg(long)]
        seed: bool,
    },
    /// Pull, merge and push through the configured provider
    Sync {
        /// Override the configured provider
        #[arg(long, value_enum)]
        provider: Option<ProviderArg>,
    },
    /// Write a dated snapshot file
    Export {
        /// Target directory (defaults to the configured export_dir)
        #[arg(long, value_name = "PATH")]
        dir: Option<PathBuf>,
    },
    /// Merge a snapshot file into the local database
    Import {
        /// Snapshot file (.json)
        file: PathBuf,
    },
    /// Show device id, last sync and table counts
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recorded sync conflicts
    Conflicts {
        /// Number of conflicts to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Purge old tombstones
    Gc {
        /// Retention window (defaults to the configured tombstone_retention_days)
        #[arg(long, value_name = "DAYS")]
        older_than_days: Option<u32>,
    },
    /// Manage the sync configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Manage the exercise catalogue
    Exercise {
        #[command(subcommand)]
        command: ExerciseCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write the config file, keeping values not given here
    Init {
        /// Default provider for `sync`
        #[arg(long, value_enum)]
        provider: Option<ProviderArg>,
        /// Directory for file exports
        #[arg(long, value_name = "PATH")]
        export_dir: Option<PathBuf>,
        /// Base URL of the cloud folder store
        #[arg(long, value_name = "URL")]
        cloud_url: Option<String>,
    },
    /// Print the effective configuration (file plus environment)
    Show,
}

#[derive(Subcommand)]
pub enum ExerciseCommands {
    /// Add a custom exercise
    Add {
        /// Exercise name
        name: Vec<String>,
        /// Primary muscle group (chest, back, shoulders, legs, arms, core, full_body, cardio, other)
        #[arg(long, value_parser = parse_muscle_group)]
        muscle_group: MuscleGroup,
    },
    /// List exercises
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an exercise by uuid or unique uuid prefix
    Delete {
        /// Exercise uuid or prefix
        id: String,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ProviderArg {
    File,
    Cloud,
}

impl From<ProviderArg> for ProviderKind {
    fn from(value: ProviderArg) -> Self {
        match value {
            ProviderArg::File => Self::File,
            ProviderArg::Cloud => Self::Cloud,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn parse_muscle_group(value: &str) -> Result<MuscleGroup, String> {
    value.parse()
}
