//! Entigraph CLI - Command-line interface for Entigraph
//!
//! This is the main entry point for users. It generates the entity graph
//! snapshot, inspects it, and serves it to the visualizer.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "entigraph")]
#[command(author = "Entigraph Contributors")]
#[command(version)]
#[command(about = "Turns a directory of markdown entities into a reference graph", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to <path>/.entigraph/config.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides shared by every command that runs the pipeline.
#[derive(clap::Args)]
struct ProjectArgs {
    /// Project directory (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Entity root directory, overriding the config file
    #[arg(long)]
    root: Option<PathBuf>,

    /// Snapshot output file, overriding the config file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize Entigraph in a project directory
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Parse all entities and write the graph snapshot
    Generate {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Show entity counts without writing anything
    Status {
        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Search entities by id or label
    Query {
        /// Search query
        query: String,

        /// Maximum results to return
        #[arg(short, long, default_value = "10")]
        limit: usize,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Generate the snapshot and start the Entigraph server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "7432")]
        port: u16,

        /// Headless mode: bind to 0.0.0.0 for remote access
        #[arg(long)]
        headless: bool,

        #[command(flatten)]
        project: ProjectArgs,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let config_file = cli.config.as_deref();
    let result = match cli.command {
        Commands::Init { path } => commands::init(&path),
        Commands::Generate { project } => {
            commands::load_config(&project.path, config_file, project.root, project.output)
                .and_then(|config| commands::generate(&config))
        }
        Commands::Status { project } => {
            commands::load_config(&project.path, config_file, project.root, project.output)
                .and_then(|config| commands::status(&config))
        }
        Commands::Query {
            query,
            limit,
            project,
        } => commands::load_config(&project.path, config_file, project.root, project.output)
            .and_then(|config| commands::query(&config, &query, limit)),
        Commands::Serve {
            port,
            headless,
            project,
        } => match commands::load_config(&project.path, config_file, project.root, project.output)
        {
            Ok(config) => commands::serve(config, port, headless).await,
            Err(e) => Err(e),
        },
    };

    if let Err(e) = result {
        eprintln!("{} {}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}
