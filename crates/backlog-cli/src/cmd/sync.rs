use crate::output::print_json;
use anyhow::Context;
use backlog_core::config::Config;
use backlog_core::sync::{self, GithubTracker};
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum SyncSubcommand {
    /// Create remote issues for unlinked local issues
    Push {
        /// Report what would be created without contacting the remote
        #[arg(long)]
        dry_run: bool,
    },
    /// Materialize local files for unmatched remote issues
    Pull {
        /// Report what would be created without writing files
        #[arg(long)]
        dry_run: bool,
    },
    /// Compare local and remote counts (never mutates)
    Status,
}

pub fn run(root: &Path, subcmd: SyncSubcommand, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load(root).context("failed to load config")?;
    // Refuse before any remote client exists.
    sync::ensure_enabled(&cfg)?;

    let repo = sync::resolve_repo(root, &cfg)?;
    let token = super::issue::github_token()?;
    let tracker = GithubTracker::new(repo, token)?;

    match subcmd {
        SyncSubcommand::Push { dry_run } => push(root, &cfg, &tracker, dry_run, json),
        SyncSubcommand::Pull { dry_run } => pull(root, &cfg, &tracker, dry_run, json),
        SyncSubcommand::Status => status(root, &cfg, &tracker, json),
    }
}

fn push(
    root: &Path,
    cfg: &Config,
    tracker: &GithubTracker,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let outcome = sync::push(root, cfg, tracker, dry_run).context("push failed")?;

    if json {
        print_json(&outcome)?;
        return Ok(());
    }

    if dry_run {
        if outcome.would_create.is_empty() {
            println!("Nothing to push.");
        } else {
            println!("Would push {} issue(s):", outcome.would_create.len());
            for id in &outcome.would_create {
                println!("  {id}");
            }
        }
    } else {
        for (id, number) in &outcome.created {
            println!("Pushed {id} → #{number}");
        }
        println!(
            "{} created, {} already linked.",
            outcome.created.len(),
            outcome.already_linked
        );
    }
    Ok(())
}

fn pull(
    root: &Path,
    cfg: &Config,
    tracker: &GithubTracker,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let outcome = sync::pull(root, cfg, tracker, dry_run).context("pull failed")?;

    if json {
        print_json(&outcome)?;
        return Ok(());
    }

    if dry_run {
        if outcome.would_create.is_empty() {
            println!("Nothing to pull.");
        } else {
            println!("Would pull {} remote issue(s):", outcome.would_create.len());
            for number in &outcome.would_create {
                println!("  #{number}");
            }
        }
    } else {
        for (number, id) in &outcome.created {
            println!("Pulled #{number} → {id}");
        }
        println!(
            "{} created, {} already linked.",
            outcome.created.len(),
            outcome.already_linked
        );
    }
    Ok(())
}

fn status(root: &Path, cfg: &Config, tracker: &GithubTracker, json: bool) -> anyhow::Result<()> {
    let report = sync::status(root, cfg, tracker).context("status failed")?;

    if json {
        print_json(&report)?;
        return Ok(());
    }

    println!("Local unsynced:   {}", report.local_unsynced);
    println!("Remote unmatched: {}", report.remote_unmatched);
    println!("Linked:           {}", report.linked);
    Ok(())
}
