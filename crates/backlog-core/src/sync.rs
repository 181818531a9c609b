//! Bidirectional reconciliation between local issue files and a remote
//! tracker. The remote side sits behind the narrow [`RemoteTracker`]
//! trait; `GithubTracker` is the shipped implementation.

use crate::config::Config;
use crate::error::{BacklogError, Result};
use crate::git;
use crate::issue::Issue;
use crate::store;
use crate::types::{IssueId, IssueKind, Priority};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ---------------------------------------------------------------------------
// RemoteTracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteIssue {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub labels: Vec<RemoteLabel>,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteLabel {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewRemoteIssue {
    pub title: String,
    pub body: String,
    pub labels: Vec<String>,
}

/// List/create/update/view against the remote tracker, keyed by issue
/// number. Implementations map service errors into the error taxonomy.
pub trait RemoteTracker {
    fn list_open(&self) -> Result<Vec<RemoteIssue>>;
    fn create(&self, new: &NewRemoteIssue) -> Result<RemoteIssue>;
    fn update_state(&self, number: u64, state: &str) -> Result<()>;
    fn view(&self, number: u64) -> Result<RemoteIssue>;
}

// ---------------------------------------------------------------------------
// GithubTracker
// ---------------------------------------------------------------------------

pub const GITHUB_API: &str = "https://api.github.com";

pub struct GithubTracker {
    client: reqwest::blocking::Client,
    api_base: String,
    repo: String,
    token: String,
}

impl GithubTracker {
    pub fn new(repo: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        Self::with_base(GITHUB_API, repo, token)
    }

    /// Base URL override for tests.
    pub fn with_base(
        api_base: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent("backlog-cli")
            .build()?;
        Ok(Self {
            client,
            api_base: api_base.into(),
            repo: repo.into(),
            token: token.into(),
        })
    }

    fn issues_url(&self) -> String {
        format!("{}/repos/{}/issues", self.api_base, self.repo)
    }

    fn check(&self, response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response> {
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(BacklogError::RemoteAuth(status.to_string()));
        }
        if status == reqwest::StatusCode::FORBIDDEN {
            let exhausted = response
                .headers()
                .get("x-ratelimit-remaining")
                .and_then(|v| v.to_str().ok())
                == Some("0");
            if exhausted {
                let reset = response
                    .headers()
                    .get("x-ratelimit-reset")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown")
                    .to_string();
                return Err(BacklogError::RemoteRateLimited(reset));
            }
            return Err(BacklogError::RemoteAuth(status.to_string()));
        }
        if !status.is_success() {
            return Err(BacklogError::Remote(format!("{status} from {}", self.repo)));
        }
        Ok(response)
    }
}

impl RemoteTracker for GithubTracker {
    fn list_open(&self) -> Result<Vec<RemoteIssue>> {
        let mut all = Vec::new();
        let mut page = 1;
        loop {
            let response = self
                .client
                .get(self.issues_url())
                .query(&[
                    ("state", "open"),
                    ("per_page", "100"),
                    ("page", &page.to_string()),
                ])
                .bearer_auth(&self.token)
                .send()?;
            let batch: Vec<serde_json::Value> = self.check(response)?.json()?;
            if batch.is_empty() {
                break;
            }
            let len = batch.len();
            for item in batch {
                // The issues endpoint also returns pull requests.
                if item.get("pull_request").is_some() {
                    continue;
                }
                all.push(serde_json::from_value(item)?);
            }
            if len < 100 {
                break;
            }
            page += 1;
        }
        Ok(all)
    }

    fn create(&self, new: &NewRemoteIssue) -> Result<RemoteIssue> {
        let response = self
            .client
            .post(self.issues_url())
            .bearer_auth(&self.token)
            .json(new)
            .send()?;
        Ok(self.check(response)?.json()?)
    }

    fn update_state(&self, number: u64, state: &str) -> Result<()> {
        let response = self
            .client
            .patch(format!("{}/{number}", self.issues_url()))
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "state": state }))
            .send()?;
        self.check(response)?;
        Ok(())
    }

    fn view(&self, number: u64) -> Result<RemoteIssue> {
        let response = self
            .client
            .get(format!("{}/{number}", self.issues_url()))
            .bearer_auth(&self.token)
            .send()?;
        Ok(self.check(response)?.json()?)
    }
}

// ---------------------------------------------------------------------------
// Configuration plumbing
// ---------------------------------------------------------------------------

pub fn ensure_enabled(cfg: &Config) -> Result<()> {
    if !cfg.sync.enabled {
        return Err(BacklogError::SyncDisabled);
    }
    Ok(())
}

/// Resolve `owner/name`: explicit config first, then the git origin remote.
pub fn resolve_repo(root: &Path, cfg: &Config) -> Result<String> {
    if let Some(repo) = &cfg.sync.github.repo {
        return Ok(repo.clone());
    }
    if let Some(url) = git::origin_url(root)? {
        if let Some(repo) = git::parse_github_repo(&url) {
            return Ok(repo);
        }
    }
    Err(BacklogError::NoRemoteRepo)
}

fn labels_for(cfg: &Config, issue: &Issue) -> Vec<String> {
    let mapping = &cfg.sync.github.label_mapping;
    let mut labels = Vec::new();
    if let Some(label) = mapping.get(issue.id.kind.as_str()) {
        labels.push(label.clone());
    }
    if let Some(label) = mapping.get(issue.priority.as_str()) {
        labels.push(label.clone());
    }
    labels
}

/// Infer the local kind of a pulled issue from its remote labels, through
/// the configured mapping first and the bare label names second.
/// Unlabeled remote issues default to bugs.
fn kind_from_labels(cfg: &Config, remote: &RemoteIssue) -> IssueKind {
    let mapping = &cfg.sync.github.label_mapping;
    for kind in IssueKind::all() {
        if let Some(mapped) = mapping.get(kind.as_str()) {
            if remote.labels.iter().any(|l| &l.name == mapped) {
                return *kind;
            }
        }
    }
    for kind in IssueKind::all() {
        if remote.labels.iter().any(|l| l.name == kind.as_str()) {
            return *kind;
        }
    }
    IssueKind::Bug
}

fn priority_from_labels(cfg: &Config, remote: &RemoteIssue) -> Priority {
    let mapping = &cfg.sync.github.label_mapping;
    for p in Priority::all() {
        if let Some(mapped) = mapping.get(p.as_str()) {
            if remote.labels.iter().any(|l| &l.name == mapped) {
                return *p;
            }
        }
    }
    Priority::P3
}

/// Remote numbers already linked to a local issue, across both
/// partitions. Completed issues keep their links, so a closed issue can
/// never be pulled back in as new.
fn linked_numbers(root: &Path, cfg: &Config) -> Result<HashSet<u64>> {
    let mut linked = HashSet::new();
    for scan in [store::scan(root, cfg)?, store::scan_completed(root, cfg)?] {
        for issue in &scan.issues {
            if let Some(n) = issue.github_issue() {
                linked.insert(n);
            }
        }
    }
    Ok(linked)
}

// ---------------------------------------------------------------------------
// Push / pull / status
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
pub struct PushOutcome {
    /// (local id, remote number) pairs created this run.
    pub created: Vec<(IssueId, u64)>,
    /// Issues already linked, left untouched.
    pub already_linked: usize,
    /// Dry-run: ids that would be pushed.
    pub would_create: Vec<IssueId>,
}

/// Create remote issues for local issues lacking a sync link and record
/// the returned number. Idempotent: a second run with no intervening
/// local changes creates nothing.
pub fn push(
    root: &Path,
    cfg: &Config,
    tracker: &dyn RemoteTracker,
    dry_run: bool,
) -> Result<PushOutcome> {
    ensure_enabled(cfg)?;
    let scan = store::scan(root, cfg)?;
    let mut outcome = PushOutcome::default();

    for mut issue in scan.issues {
        if issue.github_issue().is_some() {
            outcome.already_linked += 1;
            continue;
        }
        if dry_run {
            outcome.would_create.push(issue.id);
            continue;
        }
        let created = tracker.create(&NewRemoteIssue {
            title: issue.title.clone(),
            body: issue.body_without_heading().to_string(),
            labels: labels_for(cfg, &issue),
        })?;
        issue.set_github_link(created.number, &created.html_url, Utc::now());
        issue.save()?;
        outcome.created.push((issue.id, created.number));
    }
    Ok(outcome)
}

#[derive(Debug, Default, Serialize)]
pub struct PullOutcome {
    /// (remote number, local id) pairs materialized this run.
    pub created: Vec<(u64, IssueId)>,
    pub already_linked: usize,
    /// Dry-run: remote numbers that would be materialized.
    pub would_create: Vec<u64>,
}

/// Materialize local files for open remote issues with no local
/// counterpart, allocating the next global sequential id for each.
pub fn pull(
    root: &Path,
    cfg: &Config,
    tracker: &dyn RemoteTracker,
    dry_run: bool,
) -> Result<PullOutcome> {
    ensure_enabled(cfg)?;
    let linked = linked_numbers(root, cfg)?;
    let mut outcome = PullOutcome::default();

    for remote in tracker.list_open()? {
        if linked.contains(&remote.number) {
            outcome.already_linked += 1;
            continue;
        }
        if dry_run {
            outcome.would_create.push(remote.number);
            continue;
        }
        let kind = kind_from_labels(cfg, &remote);
        let priority = priority_from_labels(cfg, &remote);
        let mut issue = store::create(
            root,
            cfg,
            kind,
            priority,
            &remote.title,
            remote.body.as_deref().unwrap_or(""),
            None,
        )?;
        issue.set_github_link(remote.number, &remote.html_url, Utc::now());
        issue.save()?;
        outcome.created.push((remote.number, issue.id));
    }
    Ok(outcome)
}

#[derive(Debug, Default, Serialize)]
pub struct StatusReport {
    /// Active local issues with no remote counterpart.
    pub local_unsynced: usize,
    /// Open remote issues with no local counterpart.
    pub remote_unmatched: usize,
    /// Sync links across both partitions.
    pub linked: usize,
}

/// Non-mutating count comparison. Never creates or updates anything on
/// either side.
pub fn status(root: &Path, cfg: &Config, tracker: &dyn RemoteTracker) -> Result<StatusReport> {
    ensure_enabled(cfg)?;
    let linked = linked_numbers(root, cfg)?;
    let active = store::scan(root, cfg)?;

    let local_unsynced = active
        .issues
        .iter()
        .filter(|i| i.github_issue().is_none())
        .count();
    let remote_unmatched = tracker
        .list_open()?
        .iter()
        .filter(|r| !linked.contains(&r.number))
        .count();

    Ok(StatusReport {
        local_unsynced,
        remote_unmatched,
        linked: linked.len(),
    })
}

/// Close the remote counterpart of a completed issue. Returns false when
/// the issue has no sync link.
pub fn close_remote(cfg: &Config, tracker: &dyn RemoteTracker, issue: &Issue) -> Result<bool> {
    ensure_enabled(cfg)?;
    let Some(number) = issue.github_issue() else {
        return Ok(false);
    };
    tracker.update_state(number, "closed")?;
    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
