mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, docs::DocsSubcommand, issue::IssueSubcommand,
    release::ReleaseSubcommand, sync::SyncSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "backlog",
    about = "File-backed issue tracking and release automation",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .backlog/ or .git/)
    #[arg(long, global = true, env = "BACKLOG_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Verbose diagnostics (shows per-file skip warnings)
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize backlog in the current project
    Init,

    /// Manage issues
    Issue {
        #[command(subcommand)]
        subcommand: IssueSubcommand,
    },

    /// Run a utility-vs-complexity tradeoff review over active issues
    Review {
        /// Report only; don't append review notes to issue files
        #[arg(long)]
        dry_run: bool,
    },

    /// Preview or cut a release
    Release {
        #[command(subcommand)]
        subcommand: ReleaseSubcommand,
    },

    /// Reconcile local issues with the remote tracker
    Sync {
        #[command(subcommand)]
        subcommand: SyncSubcommand,
    },

    /// Inspect document categories
    Docs {
        #[command(subcommand)]
        subcommand: DocsSubcommand,
    },

    /// Inspect and validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root_path = cli.root.as_deref();
    let root = root::resolve_root(root_path);

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Issue { subcommand } => cmd::issue::run(&root, subcommand, cli.json),
        Commands::Review { dry_run } => cmd::review::run(&root, dry_run, cli.json),
        Commands::Release { subcommand } => cmd::release::run(&root, subcommand, cli.json),
        Commands::Sync { subcommand } => cmd::sync::run(&root, subcommand, cli.json),
        Commands::Docs { subcommand } => cmd::docs::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
