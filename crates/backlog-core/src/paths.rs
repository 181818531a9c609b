use crate::error::{BacklogError, Result};
use crate::types::{IssueId, IssueKind, Priority};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const BACKLOG_DIR: &str = ".backlog";
pub const CONFIG_FILE: &str = ".backlog/config.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn backlog_dir(root: &Path) -> PathBuf {
    root.join(BACKLOG_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Issue filename convention: P<0-5>-<TYPE>-<NNN>-<slug>.md
// ---------------------------------------------------------------------------

static FILENAME_RE: OnceLock<Regex> = OnceLock::new();

fn filename_re() -> &'static Regex {
    FILENAME_RE.get_or_init(|| {
        Regex::new(r"^P([0-5])-([A-Z]+)-(\d+)-([a-z0-9][a-z0-9\-]*)\.md$").unwrap()
    })
}

pub fn issue_filename(priority: Priority, id: IssueId, slug: &str) -> String {
    format!("{priority}-{}-{:03}-{slug}.md", id.kind.code(), id.number)
}

/// Parse `P2-BUG-042-login-timeout.md` into its parts.
pub fn parse_issue_filename(name: &str) -> Result<(Priority, IssueId, String)> {
    let caps = filename_re()
        .captures(name)
        .ok_or_else(|| BacklogError::InvalidFilename(name.to_string()))?;
    let priority: Priority = format!("P{}", &caps[1]).parse()?;
    let kind = IssueKind::from_code(&caps[2])
        .ok_or_else(|| BacklogError::InvalidFilename(name.to_string()))?;
    let number: u32 = caps[3]
        .parse()
        .map_err(|_| BacklogError::InvalidFilename(name.to_string()))?;
    Ok((priority, IssueId::new(kind, number), caps[4].to_string()))
}

// ---------------------------------------------------------------------------
// Slug validation
// ---------------------------------------------------------------------------

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 64 || !slug_re().is_match(slug) {
        return Err(BacklogError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

/// Derive a filename slug from an issue title. Truncated at 48 characters
/// on a hyphen boundary so filenames stay readable.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.len() > 48 {
        let cut = slug[..48].rfind('-').unwrap_or(48);
        slug.truncate(cut);
    }
    if slug.is_empty() {
        slug.push_str("untitled");
    }
    slug
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_roundtrip() {
        let id = IssueId::new(IssueKind::Bug, 42);
        let name = issue_filename(Priority::P2, id, "login-timeout");
        assert_eq!(name, "P2-BUG-042-login-timeout.md");
        let (p, parsed_id, slug) = parse_issue_filename(&name).unwrap();
        assert_eq!(p, Priority::P2);
        assert_eq!(parsed_id, id);
        assert_eq!(slug, "login-timeout");
    }

    #[test]
    fn filename_rejects_malformed() {
        for name in [
            "BUG-042-x.md",
            "P6-BUG-042-x.md",
            "P2-TICKET-042-x.md",
            "P2-BUG-042-X.md",
            "P2-BUG-042-x.txt",
            "readme.md",
        ] {
            assert!(parse_issue_filename(name).is_err(), "expected invalid: {name}");
        }
    }

    #[test]
    fn valid_slugs() {
        for slug in ["login-timeout", "a", "fix-42", "x1"] {
            validate_slug(slug).unwrap_or_else(|_| panic!("expected valid: {slug}"));
        }
    }

    #[test]
    fn invalid_slugs() {
        for slug in ["", "-leading", "trailing-", "has spaces", "UPPER", "a_b"] {
            assert!(validate_slug(slug).is_err(), "expected invalid: {slug}");
        }
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Login timeout on SSO!"), "login-timeout-on-sso");
        assert_eq!(slugify("  weird -- spacing  "), "weird-spacing");
        assert_eq!(slugify("!!!"), "untitled");
    }

    #[test]
    fn slugify_truncates_on_hyphen() {
        let long = "a very long title that keeps going and going and going forever";
        let slug = slugify(long);
        assert!(slug.len() <= 48);
        assert!(!slug.ends_with('-'));
        validate_slug(&slug).unwrap();
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.backlog/config.json")
        );
    }
}
