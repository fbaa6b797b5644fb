use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "stepdex")]
#[command(about = "Step-powered creature catalog - walk to power up your collection")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.stepdex/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show total steps, power level and progress to the next level
    Status {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add steps reported by a step counter
    Step {
        /// Number of steps to add
        count: u32,

        /// Creatures to power up with these steps (repeatable)
        #[arg(short, long = "entity")]
        entities: Vec<u32>,
    },

    /// Replay a recorded motion trace (JSON lines) through the pedometer
    Replay {
        /// Trace file
        file: PathBuf,

        /// Creatures to power up while replaying (repeatable)
        #[arg(short, long = "entity")]
        entities: Vec<u32>,

        /// Replay at the recorded sampling rate instead of as fast as possible
        #[arg(long)]
        realtime: bool,
    },

    /// Show the power level of each creature
    Powers {
        /// Only these creatures; unrecorded ones show the global level
        #[arg(short, long = "entity")]
        entities: Vec<u32>,
    },

    /// Delete all creature power records
    Reset {
        /// Also reset the lifetime step total
        #[arg(long)]
        steps: bool,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Status { json }) => {
            cli::status::status_command(config_path, json)?;
        }
        Some(Commands::Step { count, entities }) => {
            cli::step::step_command(config_path, count, &entities)?;
        }
        Some(Commands::Replay {
            file,
            entities,
            realtime,
        }) => {
            cli::replay::replay_command(config_path, &file, &entities, realtime).await?;
        }
        Some(Commands::Powers { entities }) => {
            cli::powers::powers_command(config_path, &entities)?;
        }
        Some(Commands::Reset { steps }) => {
            cli::reset::reset_command(config_path, steps)?;
        }
        Some(Commands::Init { force }) => {
            cli::init::init_command(config_path, force)?;
        }
        None => {
            cli::status::status_command(config_path, false)?;
        }
    }

    Ok(())
}
