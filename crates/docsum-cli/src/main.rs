//! docsum CLI - Summarize HTML and PDF documents with an AI provider.

mod commands;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use docsum_config::{Config, LoggingConfig};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// docsum - Summarize a folder of HTML and PDF documents
#[derive(Parser)]
#[command(name = "docsum")]
#[command(author = "Lalo Morales <lalomorales22@github.com>")]
#[command(version)]
#[command(about = "Summarize a folder of HTML and PDF documents with an AI provider", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true, env = "DOCSUM_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize every document in the input folder (default)
    Run(RunArgs),

    /// Write a default config file and create the input/output folders
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Verify the provider endpoint is reachable
    Check,
}

#[derive(Args, Default)]
struct RunArgs {
    /// Input folder (overrides directories.input)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output folder (overrides directories.output)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Model to use (overrides provider.model)
    #[arg(short, long)]
    model: Option<String>,

    /// Documents processed at once (overrides processing.concurrency)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Regenerate summaries that already exist
    #[arg(long)]
    force: bool,

    /// Show what would be processed without calling the provider
    #[arg(long)]
    dry_run: bool,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the resolved configuration (API key masked)
    Show,

    /// Print which config file is used
    Path,
}

fn init_logging(verbose: bool, logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { logging.level.as_str() };
        EnvFilter::try_new(format!("docsum={},warn", level))
            .unwrap_or_else(|_| EnvFilter::new("docsum=info,warn"))
    });

    let file_layer = logging.file_path().and_then(|path| {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            let _ = std::fs::create_dir_all(parent);
        }
        match std::fs::OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            ),
            Err(e) => {
                eprintln!(
                    "{} cannot open log file {}: {}",
                    "Warning:".yellow().bold(),
                    path.display(),
                    e
                );
                None
            }
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .init();
}

fn main() {
    let cli = Cli::parse();

    let source = commands::config_source(cli.config.as_deref());
    // Logging is best effort here; a broken config is reported by the command itself.
    let logging = Config::load(&source)
        .map(|c| c.logging)
        .unwrap_or_default();
    init_logging(cli.verbose, &logging);

    let result = match cli.command.unwrap_or(Commands::Run(RunArgs::default())) {
        Commands::Run(args) => commands::run::run(
            &source,
            commands::run::RunOptions {
                input: args.input,
                output: args.output,
                model: args.model,
                concurrency: args.concurrency,
                force: args.force,
                dry_run: args.dry_run,
            },
        ),
        Commands::Init { force } => commands::init::run(&source, force),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::show(&source),
            ConfigCommands::Path => commands::config::path(&source),
        },
        Commands::Check => commands::check::run(&source),
    };

    match result {
        Ok(status) => std::process::exit(status.code()),
        Err(e) => {
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            std::process::exit(commands::Status::Fatal.code());
        }
    }
}
