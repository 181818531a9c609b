//! Thin wrappers over the `git` binary. Release management only needs a
//! handful of read operations plus tag creation, so shelling out keeps
//! the dependency surface flat.

use crate::error::{BacklogError, Result};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::process::Command;

fn run(root: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(root)
        .output()
        .map_err(|e| BacklogError::Git {
            op: args.first().unwrap_or(&"").to_string(),
            stderr: e.to_string(),
        })?;
    if !output.status.success() {
        return Err(BacklogError::Git {
            op: args.first().unwrap_or(&"").to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub fn is_repo(root: &Path) -> bool {
    run(root, &["rev-parse", "--git-dir"]).is_ok()
}

/// Most recent tag reachable from HEAD, or None in an untagged repo.
pub fn last_tag(root: &Path) -> Result<Option<String>> {
    match run(root, &["describe", "--tags", "--abbrev=0"]) {
        Ok(tag) => Ok(Some(tag.trim().to_string())),
        Err(BacklogError::Git { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

#[derive(Debug, Clone)]
pub struct Commit {
    pub hash: String,
    pub subject: String,
    pub body: String,
}

/// Commits since `tag` (exclusive), newest first; the full log when no
/// tag exists yet.
pub fn commits_since(root: &Path, tag: Option<&str>) -> Result<Vec<Commit>> {
    let range = tag.map(|t| format!("{t}..HEAD"));
    let mut args = vec!["log", "--pretty=format:%H%x1f%s%x1f%b%x1e"];
    if let Some(range) = &range {
        args.push(range);
    }
    let out = run(root, &args)?;

    let mut commits = Vec::new();
    for record in out.split('\x1e') {
        let record = record.trim_start_matches(['\n', '\r']);
        if record.is_empty() {
            continue;
        }
        let mut fields = record.split('\x1f');
        let (Some(hash), Some(subject)) = (fields.next(), fields.next()) else {
            continue;
        };
        commits.push(Commit {
            hash: hash.to_string(),
            subject: subject.to_string(),
            body: fields.next().unwrap_or("").trim().to_string(),
        });
    }
    Ok(commits)
}

/// True when the working tree has uncommitted or untracked changes.
pub fn is_dirty(root: &Path) -> Result<bool> {
    let out = run(root, &["status", "--porcelain"])?;
    Ok(!out.trim().is_empty())
}

/// Committer date of the commit a tag points at.
pub fn tag_date(root: &Path, tag: &str) -> Result<DateTime<Utc>> {
    let out = run(root, &["log", "-1", "--format=%cI", tag])?;
    let parsed: DateTime<chrono::FixedOffset> =
        out.trim().parse().map_err(|e| BacklogError::Git {
            op: "log".to_string(),
            stderr: format!("unparsable commit date '{}': {e}", out.trim()),
        })?;
    Ok(parsed.with_timezone(&Utc))
}

pub fn create_tag(root: &Path, tag: &str, message: &str) -> Result<()> {
    run(root, &["tag", "-a", tag, "-m", message])?;
    Ok(())
}

pub fn origin_url(root: &Path) -> Result<Option<String>> {
    match run(root, &["remote", "get-url", "origin"]) {
        Ok(url) => Ok(Some(url.trim().to_string())),
        Err(BacklogError::Git { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Extract `owner/name` from a GitHub remote URL (https or ssh form).
pub fn parse_github_repo(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("http://github.com/"))
        .or_else(|| url.strip_prefix("git@github.com:"))
        .or_else(|| url.strip_prefix("ssh://git@github.com/"))?;
    let repo = rest.trim_end_matches('/').trim_end_matches(".git");
    let mut parts = repo.splitn(2, '/');
    let owner = parts.next()?;
    let name = parts.next()?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
        return None;
    }
    Some(format!("{owner}/{name}"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
