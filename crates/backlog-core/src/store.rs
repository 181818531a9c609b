//! File-system issue store. Enumerates issue files under the configured
//! base directory, skipping (and warning about) anything malformed rather
//! than aborting the scan.

use crate::config::Config;
use crate::error::{BacklogError, Result};
use crate::frontmatter;
use crate::io;
use crate::issue::{Issue, Section};
use crate::paths;
use crate::types::{IssueId, IssueKind, Priority};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SkipWarning {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct Scan {
    pub issues: Vec<Issue>,
    pub skipped: Vec<SkipWarning>,
}

fn base_dir(root: &Path, cfg: &Config) -> PathBuf {
    root.join(&cfg.issues.base_dir)
}

fn completed_dir(root: &Path, cfg: &Config) -> PathBuf {
    root.join(&cfg.issues.completed_dir)
}

/// Scan the active partition: every `*.md` under `issues.base_dir`,
/// excluding the completed partition. Malformed files are skipped with a
/// warning; the scan itself never fails on file content.
pub fn scan(root: &Path, cfg: &Config) -> Result<Scan> {
    let mut out = Scan::default();
    let base = base_dir(root, cfg);
    if !base.exists() {
        return Err(BacklogError::NotInitialized);
    }
    walk(&base, &completed_dir(root, cfg), &mut out)?;
    sort_issues(&mut out.issues);
    Ok(out)
}

/// Scan the completed partition only.
pub fn scan_completed(root: &Path, cfg: &Config) -> Result<Scan> {
    let mut out = Scan::default();
    let done = completed_dir(root, cfg);
    if done.exists() {
        walk(&done, Path::new(""), &mut out)?;
    }
    sort_issues(&mut out.issues);
    Ok(out)
}

fn walk(dir: &Path, exclude: &Path, out: &mut Scan) -> Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            if path == exclude {
                continue;
            }
            walk(&path, exclude, out)?;
        } else if path.extension().is_some_and(|e| e == "md") {
            match Issue::load(&path) {
                Ok(issue) => out.issues.push(issue),
                Err(e) => {
                    let reason = e.to_string();
                    tracing::warn!(path = %path.display(), %reason, "skipping issue file");
                    out.skipped.push(SkipWarning { path, reason });
                }
            }
        }
    }
    Ok(())
}

/// Priority tier first, then ascending id number. The number tie-break is
/// deliberate: ids are globally unique, so the order is total.
pub fn sort_issues(issues: &mut [Issue]) {
    issues.sort_by_key(|i| (i.priority, i.id.number));
}

// ---------------------------------------------------------------------------
// Lookup / allocation
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Located {
    pub issue: Issue,
    pub completed: bool,
}

/// Find an issue by id, searching the active partition first and then the
/// completed one.
pub fn find(root: &Path, cfg: &Config, id: IssueId) -> Result<Located> {
    for (scan_result, completed) in [(scan(root, cfg)?, false), (scan_completed(root, cfg)?, true)]
    {
        if let Some(issue) = scan_result.issues.into_iter().find(|i| i.id == id) {
            return Ok(Located { issue, completed });
        }
    }
    Err(BacklogError::IssueNotFound(id.to_string()))
}

/// Next number in the single global sequence, derived from every issue
/// filename in both partitions. Malformed files don't hold numbers.
pub fn next_number(root: &Path, cfg: &Config) -> Result<u32> {
    let mut max = 0;
    let mut collect = |scan: &Scan| {
        for issue in &scan.issues {
            max = max.max(issue.id.number);
        }
    };
    collect(&scan(root, cfg)?);
    collect(&scan_completed(root, cfg)?);
    Ok(max + 1)
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

fn default_category(kind: IssueKind) -> &'static str {
    match kind {
        IssueKind::Bug => "bugs",
        IssueKind::Feature => "features",
        IssueKind::Enhancement => "enhancements",
    }
}

/// Directory a new issue of `kind` lands in: the matching configured
/// category subdirectory when present, the base directory otherwise.
pub fn category_dir(root: &Path, cfg: &Config, kind: IssueKind, category: Option<&str>) -> Result<PathBuf> {
    let base = base_dir(root, cfg);
    if let Some(cat) = category {
        if !cfg.issues.categories.iter().any(|c| c == cat) {
            return Err(BacklogError::CategoryNotFound(cat.to_string()));
        }
        return Ok(base.join(cat));
    }
    let default = default_category(kind);
    if cfg.issues.categories.iter().any(|c| c == default) {
        Ok(base.join(default))
    } else {
        Ok(base)
    }
}

/// Create a new issue file with the next global id. Returns the saved issue.
pub fn create(
    root: &Path,
    cfg: &Config,
    kind: IssueKind,
    priority: Priority,
    title: &str,
    body: &str,
    category: Option<&str>,
) -> Result<Issue> {
    let number = next_number(root, cfg)?;
    let id = IssueId::new(kind, number);
    let mut issue = Issue::new(id, priority, title, body);
    paths::validate_slug(&issue.slug)?;

    let dir = category_dir(root, cfg, kind, category)?;
    let path = dir.join(issue.filename());
    if path.exists() {
        return Err(BacklogError::IssueExists(id.to_string()));
    }
    issue.path = path;
    issue.save()?;
    Ok(issue)
}

// ---------------------------------------------------------------------------
// Mutation
// ---------------------------------------------------------------------------

/// Append a trailer section to an issue file in place. Works on the raw
/// file text, so everything already present round-trips byte-for-byte.
pub fn append_section(path: &Path, section: Section, content: &str) -> Result<()> {
    let text = std::fs::read_to_string(path)?;
    let updated = frontmatter::append_section(&text, section.heading(), content);
    io::atomic_write(path, updated.as_bytes())
}

/// Resolve an issue: optionally append a `## Resolution` section, stamp
/// `completed_at`, and relocate the file into the completed partition.
/// Issues are never deleted.
pub fn complete(
    root: &Path,
    cfg: &Config,
    id: IssueId,
    resolution: Option<&str>,
    when: DateTime<Utc>,
) -> Result<PathBuf> {
    let located = find(root, cfg, id)?;
    if located.completed {
        return Err(BacklogError::IssueExists(format!("{id} is already completed")));
    }
    let mut issue = located.issue;

    if let Some(text) = resolution {
        append_section(&issue.path, Section::Resolution, text)?;
        issue = Issue::load(&issue.path)?;
    }
    issue.set_completed_at(when);
    issue.save()?;

    let done = completed_dir(root, cfg);
    io::ensure_dir(&done)?;
    let dest = done.join(issue.filename());
    std::fs::rename(&issue.path, &dest)?;
    Ok(dest)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        let cfg = Config::default();
        for cat in &cfg.issues.categories {
            io::ensure_dir(&dir.path().join(&cfg.issues.base_dir).join(cat)).unwrap();
        }
        io::ensure_dir(&dir.path().join(&cfg.issues.completed_dir)).unwrap();
        (dir, cfg)
    }

    #[test]
    fn create_allocates_sequential_global_ids() {
        let (dir, cfg) = setup();
        let a = create(dir.path(), &cfg, IssueKind::Bug, Priority::P1, "First bug", "", None)
            .unwrap();
        let b = create(
            dir.path(),
            &cfg,
            IssueKind::Feature,
            Priority::P3,
            "First feature",
            "",
            None,
        )
        .unwrap();
        assert_eq!(a.id.to_string(), "BUG-001");
        // Numbers are global across kinds, not per-kind.
        assert_eq!(b.id.to_string(), "FEAT-002");
        assert!(a.path.ends_with("issues/bugs/P1-BUG-001-first-bug.md"));
        assert!(b.path.ends_with("issues/features/P3-FEAT-002-first-feature.md"));
    }

    #[test]
    fn create_rejects_unknown_category() {
        let (dir, cfg) = setup();
        let err = create(
            dir.path(),
            &cfg,
            IssueKind::Bug,
            Priority::P2,
            "x",
            "",
            Some("nonexistent"),
        )
        .unwrap_err();
        assert!(matches!(err, BacklogError::CategoryNotFound(_)));
    }

    #[test]
    fn scan_skips_malformed_without_aborting() {
        let (dir, cfg) = setup();
        for i in 0..9 {
            create(
                dir.path(),
                &cfg,
                IssueKind::Bug,
                Priority::P2,
                &format!("Bug number {i}"),
                "",
                None,
            )
            .unwrap();
        }
        // One file with unparsable frontmatter.
        let bad = dir
            .path()
            .join("issues/bugs/P2-BUG-099-broken.md");
        std::fs::write(&bad, "---\n: [unbalanced\n---\n# BUG-099: broken\n").unwrap();

        let scan = scan(dir.path(), &cfg).unwrap();
        assert_eq!(scan.issues.len(), 9);
        assert_eq!(scan.skipped.len(), 1);
        assert!(scan.skipped[0].path.ends_with("P2-BUG-099-broken.md"));
    }

    #[test]
    fn scan_excludes_completed_partition() {
        let (dir, cfg) = setup();
        let issue = create(dir.path(), &cfg, IssueKind::Bug, Priority::P0, "Crash", "", None)
            .unwrap();
        complete(dir.path(), &cfg, issue.id, Some("fixed"), Utc::now()).unwrap();

        let active = scan(dir.path(), &cfg).unwrap();
        assert!(active.issues.is_empty());
        let done = scan_completed(dir.path(), &cfg).unwrap();
        assert_eq!(done.issues.len(), 1);
        assert_eq!(done.issues[0].id, issue.id);
    }

    #[test]
    fn complete_appends_resolution_and_stamps_time() {
        let (dir, cfg) = setup();
        let issue = create(
            dir.path(),
            &cfg,
            IssueKind::Enhancement,
            Priority::P4,
            "Polish logs",
            "Details here.",
            None,
        )
        .unwrap();
        let when = Utc::now();
        let dest = complete(dir.path(), &cfg, issue.id, Some("Done in 1a2b3c."), when).unwrap();

        let done = Issue::load(&dest).unwrap();
        assert!(done.body.contains("## Resolution"));
        assert!(done.body.contains("Done in 1a2b3c."));
        assert!(done.completed_at().is_some());
        // Original file gone, never deleted from the completed partition.
        assert!(!issue.path.exists());
        assert!(dest.exists());
    }

    #[test]
    fn complete_twice_fails() {
        let (dir, cfg) = setup();
        let issue = create(dir.path(), &cfg, IssueKind::Bug, Priority::P2, "Once", "", None)
            .unwrap();
        complete(dir.path(), &cfg, issue.id, None, Utc::now()).unwrap();
        assert!(complete(dir.path(), &cfg, issue.id, None, Utc::now()).is_err());
    }

    #[test]
    fn next_number_counts_completed_issues() {
        let (dir, cfg) = setup();
        let a = create(dir.path(), &cfg, IssueKind::Bug, Priority::P2, "One", "", None).unwrap();
        complete(dir.path(), &cfg, a.id, None, Utc::now()).unwrap();
        assert_eq!(next_number(dir.path(), &cfg).unwrap(), 2);
    }

    #[test]
    fn append_section_round_trips_rest_of_file() {
        let (dir, _cfg) = setup();
        let path = dir.path().join("issues/bugs/P2-BUG-001-styled.md");
        let original = "---\ndiscovered_by: audit\ncustom_key: kept\n---\n# BUG-001: Styled\n\nBody stays put.\n";
        std::fs::write(&path, original).unwrap();

        append_section(&path, Section::VerificationNotes, "All checks ran.").unwrap();

        let updated = std::fs::read_to_string(&path).unwrap();
        assert!(updated.starts_with(original));
        assert!(updated.ends_with("## Verification Notes\n\nAll checks ran.\n"));

        // Unrecognized frontmatter survives a reparse.
        let issue = Issue::load(&path).unwrap();
        assert_eq!(
            frontmatter::get_str(&issue.meta, "custom_key"),
            Some("kept")
        );
    }

    #[test]
    fn sort_is_priority_then_number() {
        let (dir, cfg) = setup();
        create(dir.path(), &cfg, IssueKind::Bug, Priority::P3, "Later", "", None).unwrap();
        create(dir.path(), &cfg, IssueKind::Bug, Priority::P0, "Urgent", "", None).unwrap();
        create(dir.path(), &cfg, IssueKind::Feature, Priority::P3, "Tie", "", None).unwrap();

        let scan = scan(dir.path(), &cfg).unwrap();
        let order: Vec<String> = scan.issues.iter().map(|i| i.id.to_string()).collect();
        assert_eq!(order, vec!["BUG-002", "BUG-001", "FEAT-003"]);
    }

    #[test]
    fn find_searches_both_partitions() {
        let (dir, cfg) = setup();
        let issue = create(dir.path(), &cfg, IssueKind::Bug, Priority::P2, "Hidden", "", None)
            .unwrap();
        complete(dir.path(), &cfg, issue.id, None, Utc::now()).unwrap();
        let located = find(dir.path(), &cfg, issue.id).unwrap();
        assert!(located.completed);
        assert!(matches!(
            find(dir.path(), &cfg, "BUG-999".parse().unwrap()),
            Err(BacklogError::IssueNotFound(_))
        ));
    }
}
