//! Release management: conventional-commit classification, semantic
//! version arithmetic, changelog assembly, and the gated cut.

use crate::config::Config;
use crate::error::{BacklogError, Result};
use crate::git::{self, Commit};
use crate::store;
use crate::types::{Bump, CommitKind, IssueId};
use chrono::{DateTime, Utc};
use regex::Regex;
use semver::Version;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Commit classification
// ---------------------------------------------------------------------------

static PREFIX_RE: OnceLock<Regex> = OnceLock::new();

fn prefix_re() -> &'static Regex {
    PREFIX_RE.get_or_init(|| Regex::new(r"^([a-z]+)(\([^)]*\))?(!)?:").unwrap())
}

/// Classify one commit by its conventional prefix. A `!` after the type
/// or a `BREAKING CHANGE:` footer marks it breaking regardless of type;
/// unprefixed commits count as maintenance.
pub fn classify_commit(subject: &str, body: &str) -> CommitKind {
    if body.contains("BREAKING CHANGE:") || body.contains("BREAKING-CHANGE:") {
        return CommitKind::Breaking;
    }
    let Some(caps) = prefix_re().captures(subject) else {
        return CommitKind::Maintenance;
    };
    if caps.get(3).is_some() {
        return CommitKind::Breaking;
    }
    match &caps[1] {
        "feat" => CommitKind::Feature,
        "fix" => CommitKind::Fix,
        "perf" | "refactor" | "improve" => CommitKind::Improvement,
        "docs" => CommitKind::Docs,
        _ => CommitKind::Maintenance,
    }
}

/// Minimal bump required: major on any breaking change, else minor on any
/// feature, else patch.
pub fn compute_bump(kinds: &[CommitKind]) -> Bump {
    if kinds.contains(&CommitKind::Breaking) {
        Bump::Major
    } else if kinds.contains(&CommitKind::Feature) {
        Bump::Minor
    } else {
        Bump::Patch
    }
}

// ---------------------------------------------------------------------------
// Version arithmetic
// ---------------------------------------------------------------------------

/// Next version after `last_tag` under `bump`. A repository with no tag
/// yet starts at 0.1.0. The `v` prefix is tolerated on input and always
/// used on output tags.
pub fn next_version(last_tag: Option<&str>, bump: Bump) -> Result<Version> {
    let Some(tag) = last_tag else {
        return Ok(Version::new(0, 1, 0));
    };
    let last = parse_tag(tag)?;
    Ok(match bump {
        Bump::Major => Version::new(last.major + 1, 0, 0),
        Bump::Minor => Version::new(last.major, last.minor + 1, 0),
        Bump::Patch => Version::new(last.major, last.minor, last.patch + 1),
    })
}

pub fn parse_tag(tag: &str) -> Result<Version> {
    let bare = tag.strip_prefix('v').unwrap_or(tag);
    Version::parse(bare).map_err(|e| BacklogError::InvalidVersion {
        version: tag.to_string(),
        reason: e.to_string(),
    })
}

pub fn format_tag(version: &Version) -> String {
    format!("v{version}")
}

// ---------------------------------------------------------------------------
// Release plan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedCommit {
    pub kind: CommitKind,
    pub hash: String,
    pub subject: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResolvedIssue {
    pub id: IssueId,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct ReleasePlan {
    pub last_tag: Option<String>,
    pub bump: Bump,
    pub tag: String,
    pub commits: Vec<ClassifiedCommit>,
    pub resolved: Vec<ResolvedIssue>,
    pub changelog: String,
    pub dirty: bool,
}

/// Assemble a release plan. Read-only: inspects the commit log, the
/// completed partition, and the working tree, and renders the changelog.
pub fn plan(root: &Path, cfg: &Config, version_override: Option<&str>) -> Result<ReleasePlan> {
    let last_tag = git::last_tag(root)?;
    let raw = git::commits_since(root, last_tag.as_deref())?;

    let commits: Vec<ClassifiedCommit> = raw
        .iter()
        .map(|c: &Commit| ClassifiedCommit {
            kind: classify_commit(&c.subject, &c.body),
            hash: c.hash.chars().take(8).collect(),
            subject: c.subject.clone(),
        })
        .collect();

    let kinds: Vec<CommitKind> = commits.iter().map(|c| c.kind).collect();
    let bump = compute_bump(&kinds);

    let version = match version_override {
        Some(v) => {
            let requested = parse_tag(v)?;
            if let Some(tag) = &last_tag {
                let last = parse_tag(tag)?;
                if requested <= last {
                    return Err(BacklogError::InvalidVersion {
                        version: v.to_string(),
                        reason: format!("must exceed last tag {tag}"),
                    });
                }
            }
            requested
        }
        None => next_version(last_tag.as_deref(), bump)?,
    };

    let since = match &last_tag {
        Some(tag) => Some(git::tag_date(root, tag)?),
        None => None,
    };
    let resolved = resolved_since(root, cfg, since)?;

    let tag = format_tag(&version);
    let changelog = changelog(&tag, Utc::now(), &commits, &resolved);

    Ok(ReleasePlan {
        last_tag,
        bump,
        tag,
        commits,
        resolved,
        changelog,
        dirty: git::is_dirty(root)?,
    })
}

/// Completed issues whose `completed_at` postdates the last tag (all of
/// them when no tag exists).
fn resolved_since(
    root: &Path,
    cfg: &Config,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<ResolvedIssue>> {
    let scan = store::scan_completed(root, cfg)?;
    Ok(scan
        .issues
        .iter()
        .filter(|i| match (i.completed_at(), since) {
            (Some(done), Some(cutoff)) => done > cutoff,
            (Some(_), None) => true,
            (None, _) => false,
        })
        .map(|i| ResolvedIssue {
            id: i.id,
            title: i.title.clone(),
        })
        .collect())
}

/// Render one changelog section. Only populated categories appear.
pub fn changelog(
    tag: &str,
    date: DateTime<Utc>,
    commits: &[ClassifiedCommit],
    resolved: &[ResolvedIssue],
) -> String {
    let mut out = format!("## {tag} — {}\n", date.format("%Y-%m-%d"));
    for kind in CommitKind::all() {
        let entries: Vec<&ClassifiedCommit> =
            commits.iter().filter(|c| c.kind == *kind).collect();
        if entries.is_empty() {
            continue;
        }
        out.push_str(&format!("\n### {}\n\n", kind.heading()));
        for c in entries {
            out.push_str(&format!("- {} ({})\n", c.subject, c.hash));
        }
    }
    if !resolved.is_empty() {
        out.push_str("\n### Resolved issues\n\n");
        for issue in resolved {
            out.push_str(&format!("- {}: {}\n", issue.id, issue.title));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Cut
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
pub struct CutOptions {
    /// Non-interactive override for the dirty-worktree gate.
    pub allow_dirty: bool,
}

/// Create the release tag locally. The dirty-worktree check is a safety
/// gate: it aborts unless explicitly overridden, it is not retryable.
pub fn cut(root: &Path, plan: &ReleasePlan, opts: CutOptions) -> Result<()> {
    if plan.dirty && !opts.allow_dirty {
        return Err(BacklogError::DirtyWorktree);
    }
    git::create_tag(root, &plan.tag, &plan.changelog)?;
    Ok(())
}

/// Publish a release on the remote tracker. Split from `cut` so tagging
/// works offline and the remote call stays behind its own flag.
pub fn publish(
    api_base: &str,
    repo: &str,
    token: &str,
    plan: &ReleasePlan,
    draft: bool,
) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .user_agent("backlog-cli")
        .build()?;
    let url = format!("{api_base}/repos/{repo}/releases");
    let response = client
        .post(&url)
        .bearer_auth(token)
        .json(&serde_json::json!({
            "tag_name": plan.tag,
            "name": plan.tag,
            "body": plan.changelog,
            "draft": draft,
        }))
        .send()?;

    let status = response.status();
    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(BacklogError::RemoteAuth(status.to_string()));
    }
    if !status.is_success() {
        return Err(BacklogError::Remote(format!(
            "release creation failed: {status}"
        )));
    }
    let body: serde_json::Value = response.json()?;
    Ok(body["html_url"].as_str().unwrap_or_default().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
