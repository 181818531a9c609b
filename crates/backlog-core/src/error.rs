use thiserror::Error;

#[derive(Debug, Error)]
pub enum BacklogError {
    #[error("not initialized: run 'backlog init'")]
    NotInitialized,

    #[error("sync is disabled: set sync.enabled=true in .backlog/config.json")]
    SyncDisabled,

    #[error("document categories are disabled: set documents.enabled=true in .backlog/config.json")]
    DocumentsDisabled,

    #[error("issue not found: {0}")]
    IssueNotFound(String),

    #[error("issue already exists: {0}")]
    IssueExists(String),

    #[error("document category not found: {0}")]
    CategoryNotFound(String),

    #[error("invalid issue id '{0}': expected <TYPE>-<NNN> (e.g. BUG-042)")]
    InvalidIssueId(String),

    #[error("invalid priority '{0}': expected P0..P5")]
    InvalidPriority(String),

    #[error("invalid issue kind '{0}': expected bug, feature, or enhancement")]
    InvalidKind(String),

    #[error("invalid issue filename '{0}': expected P<0-5>-<TYPE>-<NNN>-<slug>.md")]
    InvalidFilename(String),

    #[error("invalid slug '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("unknown section '{0}': expected resolution, verification, or tradeoff")]
    InvalidSection(String),

    #[error("malformed issue file {path}: {reason}")]
    MalformedIssue { path: String, reason: String },

    #[error("working tree has uncommitted changes: commit, stash, or pass --yes to proceed")]
    DirtyWorktree,

    #[error("invalid version '{version}': {reason}")]
    InvalidVersion { version: String, reason: String },

    #[error("no remote repository configured: set sync.github.repo or add a git 'origin' remote")]
    NoRemoteRepo,

    #[error("git {op} failed: {stderr}")]
    Git { op: String, stderr: String },

    #[error("remote tracker rejected credentials: set GITHUB_TOKEN to a token with 'repo' scope ({0})")]
    RemoteAuth(String),

    #[error("remote tracker rate limit exceeded: retry after {0}")]
    RemoteRateLimited(String),

    #[error("remote tracker error: {0}")]
    Remote(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Semver(#[from] semver::Error),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, BacklogError>;
