use crate::output::print_json;
use anyhow::Context;
use backlog_core::config::Config;
use backlog_core::release::{self, CutOptions, ReleasePlan};
use backlog_core::sync;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum ReleaseSubcommand {
    /// Show the next version, classified commits, and changelog (read-only)
    #[command(disable_version_flag = true)]
    Preview {
        /// Version override instead of the computed bump
        #[arg(long)]
        version: Option<String>,
    },
    /// Create the release tag (and optionally a remote release)
    #[command(disable_version_flag = true)]
    Cut {
        /// Version override instead of the computed bump
        #[arg(long)]
        version: Option<String>,
        /// Also publish a release on the remote tracker
        #[arg(long)]
        push: bool,
        /// Publish as a draft (implies --push)
        #[arg(long)]
        draft: bool,
        /// Proceed without confirmation, including on a dirty working tree
        #[arg(long)]
        yes: bool,
    },
}

pub fn run(root: &Path, subcmd: ReleaseSubcommand, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load(root).context("failed to load config")?;
    match subcmd {
        ReleaseSubcommand::Preview { version } => preview(root, &cfg, version.as_deref(), json),
        ReleaseSubcommand::Cut {
            version,
            push,
            draft,
            yes,
        } => cut(root, &cfg, version.as_deref(), push || draft, draft, yes, json),
    }
}

fn preview(root: &Path, cfg: &Config, version: Option<&str>, json: bool) -> anyhow::Result<()> {
    let plan = release::plan(root, cfg, version).context("failed to plan release")?;

    if json {
        print_json(&plan)?;
        return Ok(());
    }

    print_plan(&plan);
    Ok(())
}

fn print_plan(plan: &ReleasePlan) {
    match &plan.last_tag {
        Some(tag) => println!("Last tag:  {tag}"),
        None => println!("Last tag:  (none — first release)"),
    }
    println!("Bump:      {}", plan.bump);
    println!("Next tag:  {}", plan.tag);
    println!(
        "Commits:   {} since last tag, {} resolved issue(s)",
        plan.commits.len(),
        plan.resolved.len()
    );
    if plan.dirty {
        println!("\nWorking tree has uncommitted changes.");
    }
    println!("\n{}", plan.changelog);
}

fn cut(
    root: &Path,
    cfg: &Config,
    version: Option<&str>,
    push: bool,
    draft: bool,
    yes: bool,
    json: bool,
) -> anyhow::Result<()> {
    let plan = release::plan(root, cfg, version).context("failed to plan release")?;

    // Safety gate, not a retryable error: a dirty tree needs the explicit
    // non-interactive override.
    release::cut(root, &plan, CutOptions { allow_dirty: yes })
        .with_context(|| format!("failed to cut {}", plan.tag))?;

    let mut release_url = None;
    if push {
        let repo = sync::resolve_repo(root, cfg)?;
        let token = super::issue::github_token()?;
        let url = release::publish(sync::GITHUB_API, &repo, &token, &plan, draft)
            .context("failed to publish remote release")?;
        release_url = Some(url);
    }

    if json {
        print_json(&serde_json::json!({
            "tag": plan.tag,
            "bump": plan.bump,
            "pushed": push,
            "draft": draft,
            "release_url": release_url,
        }))?;
        return Ok(());
    }

    println!("Tagged {}.", plan.tag);
    if let Some(url) = release_url {
        let kind = if draft { "draft release" } else { "release" };
        println!("Published {kind}: {url}");
    }
    Ok(())
}
