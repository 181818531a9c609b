use crate::output::{print_json, print_table};
use anyhow::Context;
use backlog_core::config::Config;
use backlog_core::issue::Section;
use backlog_core::store;
use backlog_core::sync::{self, GithubTracker};
use backlog_core::types::{IssueId, IssueKind, Priority};
use chrono::Utc;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum IssueSubcommand {
    /// Create a new issue file
    New {
        /// Issue kind: bug, feature, or enhancement
        kind: IssueKind,
        #[arg(required = true)]
        title: Vec<String>,
        /// Priority tier P0..P5
        #[arg(long, default_value = "P3")]
        priority: Priority,
        /// Issue body text
        #[arg(long)]
        body: Option<String>,
        /// Category subdirectory (defaults by kind)
        #[arg(long)]
        category: Option<String>,
        /// Record who or what discovered the issue
        #[arg(long)]
        discovered_by: Option<String>,
    },
    /// List issues
    List {
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        kind: Option<IssueKind>,
        /// List the completed partition instead of active issues
        #[arg(long)]
        completed: bool,
    },
    /// Show one issue in full
    Show { id: IssueId },
    /// Resolve an issue and move it to the completed partition
    Complete {
        id: IssueId,
        /// Text for the appended '## Resolution' section
        #[arg(long)]
        resolution: Option<String>,
        /// Also close the linked remote issue (requires sync)
        #[arg(long)]
        close_remote: bool,
    },
    /// Append a trailer section to an issue
    Note {
        id: IssueId,
        /// Section: verification or tradeoff
        section: Section,
        #[arg(required = true)]
        text: Vec<String>,
    },
}

pub fn run(root: &Path, subcmd: IssueSubcommand, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load(root).context("failed to load config")?;
    match subcmd {
        IssueSubcommand::New {
            kind,
            title,
            priority,
            body,
            category,
            discovered_by,
        } => new(
            root,
            &cfg,
            kind,
            priority,
            &title.join(" "),
            body.as_deref().unwrap_or(""),
            category.as_deref(),
            discovered_by.as_deref(),
            json,
        ),
        IssueSubcommand::List {
            priority,
            kind,
            completed,
        } => list(root, &cfg, priority, kind, completed, json),
        IssueSubcommand::Show { id } => show(root, &cfg, id, json),
        IssueSubcommand::Complete {
            id,
            resolution,
            close_remote,
        } => complete(root, &cfg, id, resolution.as_deref(), close_remote, json),
        IssueSubcommand::Note { id, section, text } => {
            note(root, &cfg, id, section, &text.join(" "), json)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn new(
    root: &Path,
    cfg: &Config,
    kind: IssueKind,
    priority: Priority,
    title: &str,
    body: &str,
    category: Option<&str>,
    discovered_by: Option<&str>,
    json: bool,
) -> anyhow::Result<()> {
    let mut issue = store::create(root, cfg, kind, priority, title, body, category)
        .context("failed to create issue")?;
    if let Some(who) = discovered_by {
        issue.set_discovered_by(who);
        issue.save().context("failed to save issue")?;
    }

    if json {
        print_json(&serde_json::json!({
            "id": issue.id,
            "priority": issue.priority.as_str(),
            "title": issue.title,
            "path": issue.path,
        }))?;
    } else {
        println!("Created {}: {} ({})", issue.id, issue.title, issue.path.display());
    }
    Ok(())
}

fn list(
    root: &Path,
    cfg: &Config,
    priority: Option<Priority>,
    kind: Option<IssueKind>,
    completed: bool,
    json: bool,
) -> anyhow::Result<()> {
    let scan = if completed {
        store::scan_completed(root, cfg)
    } else {
        store::scan(root, cfg)
    }
    .context("failed to scan issues")?;

    let issues: Vec<_> = scan
        .issues
        .into_iter()
        .filter(|i| priority.is_none_or(|p| i.priority == p))
        .filter(|i| kind.is_none_or(|k| i.id.kind == k))
        .collect();

    if json {
        let items: Vec<serde_json::Value> = issues
            .iter()
            .map(|i| {
                serde_json::json!({
                    "id": i.id,
                    "priority": i.priority.as_str(),
                    "title": i.title,
                    "github_issue": i.github_issue(),
                })
            })
            .collect();
        print_json(&serde_json::json!({
            "issues": items,
            "skipped": scan.skipped.len(),
        }))?;
        return Ok(());
    }

    if issues.is_empty() {
        println!("No issues.");
    } else {
        let rows: Vec<Vec<String>> = issues
            .iter()
            .map(|i| {
                vec![
                    i.id.to_string(),
                    i.priority.to_string(),
                    i.title.clone(),
                    i.github_issue()
                        .map(|n| format!("#{n}"))
                        .unwrap_or_default(),
                ]
            })
            .collect();
        print_table(&["ID", "PRIORITY", "TITLE", "REMOTE"], rows);
    }

    for skip in &scan.skipped {
        println!("warning: skipped {}: {}", skip.path.display(), skip.reason);
    }
    Ok(())
}

fn show(root: &Path, cfg: &Config, id: IssueId, json: bool) -> anyhow::Result<()> {
    let located = store::find(root, cfg, id).with_context(|| format!("issue '{id}' not found"))?;
    let issue = &located.issue;

    if json {
        print_json(&serde_json::json!({
            "id": issue.id,
            "priority": issue.priority.as_str(),
            "title": issue.title,
            "completed": located.completed,
            "path": issue.path,
            "github_issue": issue.github_issue(),
            "github_url": issue.github_url(),
            "discovered_by": issue.discovered_by(),
            "confidence": issue.confidence(),
            "body": issue.body,
        }))?;
        return Ok(());
    }

    println!("Issue:    {}", issue.id);
    println!("Priority: {}", issue.priority);
    println!("Status:   {}", if located.completed { "completed" } else { "active" });
    println!("File:     {}", issue.path.display());
    if let Some(n) = issue.github_issue() {
        println!("Remote:   #{n} ({})", issue.github_url().unwrap_or("no url"));
    }
    if let Some(who) = issue.discovered_by() {
        println!("Found by: {who}");
    }
    println!();
    print!("{}", issue.body);
    Ok(())
}

fn complete(
    root: &Path,
    cfg: &Config,
    id: IssueId,
    resolution: Option<&str>,
    close_remote: bool,
    json: bool,
) -> anyhow::Result<()> {
    let dest = store::complete(root, cfg, id, resolution, Utc::now())
        .with_context(|| format!("failed to complete '{id}'"))?;

    let mut remote_closed = false;
    if close_remote {
        let issue = backlog_core::issue::Issue::load(&dest)?;
        let repo = sync::resolve_repo(root, cfg)?;
        let token = github_token()?;
        let tracker = GithubTracker::new(repo, token)?;
        remote_closed = sync::close_remote(cfg, &tracker, &issue)
            .context("failed to close remote issue")?;
    }

    if json {
        print_json(&serde_json::json!({
            "id": id,
            "completed": true,
            "path": dest,
            "remote_closed": remote_closed,
        }))?;
    } else {
        println!("Completed {id} → {}", dest.display());
        if close_remote {
            if remote_closed {
                println!("Closed remote issue.");
            } else {
                println!("No remote link; nothing to close.");
            }
        }
    }
    Ok(())
}

fn note(
    root: &Path,
    cfg: &Config,
    id: IssueId,
    section: Section,
    text: &str,
    json: bool,
) -> anyhow::Result<()> {
    let located = store::find(root, cfg, id).with_context(|| format!("issue '{id}' not found"))?;
    store::append_section(&located.issue.path, section, text)
        .context("failed to append section")?;

    if json {
        print_json(&serde_json::json!({
            "id": id,
            "section": section.heading(),
            "appended": true,
        }))?;
    } else {
        println!("Appended '## {}' to {id}", section.heading());
    }
    Ok(())
}

pub fn github_token() -> anyhow::Result<String> {
    std::env::var("GITHUB_TOKEN")
        .context("GITHUB_TOKEN is not set; create a token with 'repo' scope and export it")
}
