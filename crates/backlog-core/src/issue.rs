use crate::error::{BacklogError, Result};
use crate::frontmatter;
use crate::paths;
use crate::types::{IssueId, Priority};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_yaml::Mapping;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Trailer sections
// ---------------------------------------------------------------------------

/// Trailer sections that may be appended to an issue body, never inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Resolution,
    VerificationNotes,
    TradeoffReviewNote,
}

impl Section {
    pub fn heading(self) -> &'static str {
        match self {
            Section::Resolution => "Resolution",
            Section::VerificationNotes => "Verification Notes",
            Section::TradeoffReviewNote => "Tradeoff Review Note",
        }
    }
}

impl std::str::FromStr for Section {
    type Err = BacklogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "resolution" => Ok(Section::Resolution),
            "verification" | "verification-notes" => Ok(Section::VerificationNotes),
            "tradeoff" | "tradeoff-review" => Ok(Section::TradeoffReviewNote),
            _ => Err(BacklogError::InvalidSection(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Issue
// ---------------------------------------------------------------------------

static HEADING_RE: OnceLock<Regex> = OnceLock::new();

fn heading_re() -> &'static Regex {
    HEADING_RE.get_or_init(|| Regex::new(r"(?m)^# ([A-Z]+-\d+): (.+)$").unwrap())
}

/// A tracked unit of work, persisted as one Markdown file with optional
/// YAML frontmatter. The frontmatter mapping carries every key found in
/// the file, recognized or not, in original order.
#[derive(Debug, Clone)]
pub struct Issue {
    pub id: IssueId,
    pub priority: Priority,
    pub slug: String,
    pub title: String,
    /// Everything after the frontmatter block, heading included.
    pub body: String,
    pub meta: Mapping,
    /// File the issue was loaded from; empty for not-yet-saved issues.
    pub path: PathBuf,
}

impl Issue {
    pub fn new(
        id: IssueId,
        priority: Priority,
        title: impl Into<String>,
        body_text: &str,
    ) -> Self {
        let title = title.into();
        let slug = paths::slugify(&title);
        let mut body = format!("# {id}: {title}\n");
        if !body_text.trim().is_empty() {
            body.push('\n');
            body.push_str(body_text.trim_end());
            body.push('\n');
        }
        Self {
            id,
            priority,
            slug,
            title,
            body,
            meta: Mapping::new(),
            path: PathBuf::new(),
        }
    }

    pub fn filename(&self) -> String {
        paths::issue_filename(self.priority, self.id, &self.slug)
    }

    // -----------------------------------------------------------------------
    // Parsing / rendering
    // -----------------------------------------------------------------------

    /// Parse a full issue document. Priority and slug come from the
    /// filename; id and title come from the `# ID: Title` heading, which
    /// must agree with the filename.
    pub fn parse(text: &str, path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (priority, file_id, slug) = paths::parse_issue_filename(&name)
            .map_err(|_| BacklogError::MalformedIssue {
                path: path.display().to_string(),
                reason: "filename does not match P<0-5>-<TYPE>-<NNN>-<slug>.md".to_string(),
            })?;

        let (meta, body) = frontmatter::parse(text, &path.display().to_string())?;

        let caps = heading_re()
            .captures(&body)
            .ok_or_else(|| BacklogError::MalformedIssue {
                path: path.display().to_string(),
                reason: "missing '# <ID>: <Title>' heading".to_string(),
            })?;
        let id: IssueId = caps[1]
            .parse()
            .map_err(|_| BacklogError::MalformedIssue {
                path: path.display().to_string(),
                reason: format!("unparsable id '{}' in heading", &caps[1]),
            })?;
        if id != file_id {
            return Err(BacklogError::MalformedIssue {
                path: path.display().to_string(),
                reason: format!("heading id {id} does not match filename id {file_id}"),
            });
        }
        let title = caps[2].trim().to_string();

        Ok(Self {
            id,
            priority,
            slug,
            title,
            body,
            meta,
            path: path.to_path_buf(),
        })
    }

    pub fn render(&self) -> Result<String> {
        frontmatter::render(&self.meta, &self.body)
    }

    // -----------------------------------------------------------------------
    // Persistence
    // -----------------------------------------------------------------------

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text, path)
    }

    /// Write the issue back to the file it was loaded from.
    pub fn save(&self) -> Result<()> {
        let text = self.render()?;
        crate::io::atomic_write(&self.path, text.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Frontmatter accessors
    // -----------------------------------------------------------------------

    pub fn github_issue(&self) -> Option<u64> {
        frontmatter::get_u64(&self.meta, "github_issue")
    }

    pub fn github_url(&self) -> Option<&str> {
        frontmatter::get_str(&self.meta, "github_url")
    }

    pub fn discovered_by(&self) -> Option<&str> {
        frontmatter::get_str(&self.meta, "discovered_by")
    }

    pub fn confidence(&self) -> Option<&str> {
        frontmatter::get_str(&self.meta, "confidence")
    }

    pub fn last_synced(&self) -> Option<DateTime<Utc>> {
        frontmatter::get_str(&self.meta, "last_synced")
            .and_then(|s| s.parse::<DateTime<Utc>>().ok())
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        frontmatter::get_str(&self.meta, "completed_at")
            .and_then(|s| s.parse::<DateTime<Utc>>().ok())
    }

    pub fn set_github_link(&mut self, number: u64, url: &str, when: DateTime<Utc>) {
        frontmatter::set(&mut self.meta, "github_issue", serde_yaml::Value::from(number));
        frontmatter::set(&mut self.meta, "github_url", serde_yaml::Value::from(url));
        self.set_last_synced(when);
    }

    pub fn set_last_synced(&mut self, when: DateTime<Utc>) {
        frontmatter::set(
            &mut self.meta,
            "last_synced",
            serde_yaml::Value::from(when.to_rfc3339()),
        );
    }

    pub fn set_completed_at(&mut self, when: DateTime<Utc>) {
        frontmatter::set(
            &mut self.meta,
            "completed_at",
            serde_yaml::Value::from(when.to_rfc3339()),
        );
    }

    pub fn set_discovered_by(&mut self, who: &str) {
        frontmatter::set(&mut self.meta, "discovered_by", serde_yaml::Value::from(who));
    }

    /// Body text without the heading line, for remote issue bodies.
    pub fn body_without_heading(&self) -> &str {
        match self.body.split_once('\n') {
            Some((_, rest)) => rest.trim_start_matches('\n'),
            None => "",
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
