use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn backlog(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("backlog").unwrap();
    cmd.current_dir(dir.path()).env("BACKLOG_ROOT", dir.path());
    cmd
}

fn init_project(dir: &TempDir) {
    backlog(dir).arg("init").assert().success();
}

fn new_issue(dir: &TempDir, kind: &str, title: &str, priority: &str) {
    backlog(dir)
        .args(["issue", "new", kind, title, "--priority", priority])
        .assert()
        .success();
}

// ---------------------------------------------------------------------------
// backlog init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_directory_tree() {
    let dir = TempDir::new().unwrap();
    backlog(&dir).arg("init").assert().success();

    assert!(dir.path().join(".backlog/config.json").exists());
    assert!(dir.path().join("issues/bugs").is_dir());
    assert!(dir.path().join("issues/features").is_dir());
    assert!(dir.path().join("issues/enhancements").is_dir());
    assert!(dir.path().join("issues/completed").is_dir());
}

#[test]
fn init_is_idempotent() {
    let dir = TempDir::new().unwrap();
    backlog(&dir).arg("init").assert().success();
    backlog(&dir).arg("init").assert().success();
}

#[test]
fn commands_fail_before_init() {
    let dir = TempDir::new().unwrap();
    backlog(&dir)
        .args(["issue", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("backlog init"));
}

// ---------------------------------------------------------------------------
// backlog issue
// ---------------------------------------------------------------------------

#[test]
fn issue_new_and_list() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    new_issue(&dir, "bug", "Login timeout on SSO", "P1");

    assert!(dir
        .path()
        .join("issues/bugs/P1-BUG-001-login-timeout-on-sso.md")
        .exists());

    backlog(&dir)
        .args(["issue", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BUG-001"))
        .stdout(predicate::str::contains("Login timeout on SSO"));
}

#[test]
fn issue_ids_are_global_across_kinds() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    new_issue(&dir, "bug", "First", "P2");
    new_issue(&dir, "feature", "Second", "P2");
    new_issue(&dir, "enhancement", "Third", "P2");

    let out = backlog(&dir)
        .args(["issue", "list", "-j"])
        .assert()
        .success();
    let stdout = String::from_utf8_lossy(&out.get_output().stdout).to_string();
    assert!(stdout.contains("BUG-001"));
    assert!(stdout.contains("FEAT-002"));
    assert!(stdout.contains("ENH-003"));
}

#[test]
fn issue_new_rejects_bad_kind() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    backlog(&dir)
        .args(["issue", "new", "task", "Not a kind"])
        .assert()
        .failure();
}

#[test]
fn issue_show_displays_metadata() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    backlog(&dir)
        .args([
            "issue",
            "new",
            "bug",
            "Crash on resize",
            "--priority",
            "P0",
            "--body",
            "Repro: shrink window.",
            "--discovered-by",
            "fuzzer",
        ])
        .assert()
        .success();

    backlog(&dir)
        .args(["issue", "show", "BUG-001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Priority: P0"))
        .stdout(predicate::str::contains("Found by: fuzzer"))
        .stdout(predicate::str::contains("Repro: shrink window."));
}

#[test]
fn issue_show_unknown_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    backlog(&dir)
        .args(["issue", "show", "BUG-999"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn issue_complete_moves_to_completed_partition() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    new_issue(&dir, "bug", "Fix me", "P2");

    backlog(&dir)
        .args([
            "issue",
            "complete",
            "BUG-001",
            "--resolution",
            "Fixed in 1a2b3c.",
        ])
        .assert()
        .success();

    // Gone from the active listing, present in the completed one.
    backlog(&dir)
        .args(["issue", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BUG-001").not());
    backlog(&dir)
        .args(["issue", "list", "--completed"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BUG-001"));

    let moved = dir.path().join("issues/completed/P2-BUG-001-fix-me.md");
    let content = std::fs::read_to_string(moved).unwrap();
    assert!(content.contains("## Resolution"));
    assert!(content.contains("Fixed in 1a2b3c."));
    assert!(content.contains("completed_at:"));
}

#[test]
fn issue_note_appends_without_touching_rest() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    // A file with frontmatter the tool doesn't recognize.
    let path = dir.path().join("issues/bugs/P2-BUG-001-styled.md");
    let original = "---\ndiscovered_by: audit\ncustom_key: kept\n---\n# BUG-001: Styled\n\nOriginal body.\n";
    std::fs::write(&path, original).unwrap();

    backlog(&dir)
        .args(["issue", "note", "BUG-001", "verification", "All checks ran."])
        .assert()
        .success();

    let updated = std::fs::read_to_string(&path).unwrap();
    assert!(updated.starts_with(original), "prefix must be byte-identical");
    assert!(updated.ends_with("## Verification Notes\n\nAll checks ran.\n"));
}

#[test]
fn malformed_issue_does_not_abort_listing() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    for i in 1..=9 {
        new_issue(&dir, "bug", &format!("Valid issue {i}"), "P3");
    }
    std::fs::write(
        dir.path().join("issues/bugs/P3-BUG-099-broken.md"),
        "---\n: [unbalanced\n---\n# BUG-099: broken\n",
    )
    .unwrap();

    let out = backlog(&dir)
        .args(["issue", "list", "-j"])
        .assert()
        .success();
    let json: serde_json::Value =
        serde_json::from_slice(&out.get_output().stdout).unwrap();
    assert_eq!(json["issues"].as_array().unwrap().len(), 9);
    assert_eq!(json["skipped"], 1);
}

// ---------------------------------------------------------------------------
// backlog review
// ---------------------------------------------------------------------------

#[test]
fn review_dry_run_reports_without_writing() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    new_issue(&dir, "bug", "Crash on save", "P0");

    backlog(&dir)
        .args(["review", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BUG-001"))
        .stdout(predicate::str::contains("RECOMMENDATION"))
        .stdout(predicate::str::contains("Dry run"));

    let content = std::fs::read_to_string(
        dir.path().join("issues/bugs/P0-BUG-001-crash-on-save.md"),
    )
    .unwrap();
    assert!(!content.contains("Tradeoff Review Note"));
}

#[test]
fn review_appends_tradeoff_notes() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    new_issue(&dir, "enhancement", "Nicer spinner", "P5");

    backlog(&dir).arg("review").assert().success();

    let content = std::fs::read_to_string(
        dir.path().join("issues/enhancements/P5-ENH-001-nicer-spinner.md"),
    )
    .unwrap();
    assert!(content.contains("## Tradeoff Review Note"));
    assert!(content.contains("Recommendation:"));
}

// ---------------------------------------------------------------------------
// backlog sync (disabled refusal; the wire paths are covered by core tests)
// ---------------------------------------------------------------------------

#[test]
fn sync_refuses_when_disabled() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    for action in ["push", "pull", "status"] {
        backlog(&dir)
            .args(["sync", action])
            .assert()
            .failure()
            .stderr(predicate::str::contains("sync is disabled"));
    }
}

// ---------------------------------------------------------------------------
// backlog docs
// ---------------------------------------------------------------------------

#[test]
fn docs_refuse_when_disabled() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    backlog(&dir)
        .args(["docs", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("documents.enabled"));
}

#[test]
fn docs_check_reports_missing_files() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let config = serde_json::json!({
        "documents": {
            "enabled": true,
            "categories": [{
                "name": "architecture",
                "description": "Design docs",
                "files": ["ARCHITECTURE.md", "docs/missing.md"],
            }],
        },
    });
    std::fs::write(
        dir.path().join(".backlog/config.json"),
        serde_json::to_string_pretty(&config).unwrap(),
    )
    .unwrap();
    std::fs::write(dir.path().join("ARCHITECTURE.md"), "# arch").unwrap();

    backlog(&dir)
        .args(["docs", "check", "architecture"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 present, 1 missing"))
        .stdout(predicate::str::contains("missing: docs/missing.md"));

    backlog(&dir)
        .args(["docs", "check", "nonexistent"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("category not found"));
}

// ---------------------------------------------------------------------------
// backlog config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_clean() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    backlog(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No warnings"));
}

#[test]
fn config_validate_reports_errors() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let config = serde_json::json!({
        "sync": { "enabled": true, "github": { "repo": "not-a-repo" } },
    });
    std::fs::write(
        dir.path().join(".backlog/config.json"),
        serde_json::to_string_pretty(&config).unwrap(),
    )
    .unwrap();

    backlog(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"))
        .stdout(predicate::str::contains("sync.github.repo"));
}

// ---------------------------------------------------------------------------
// backlog release (needs a git repo; skipped when git is unavailable)
// ---------------------------------------------------------------------------

fn git_available() -> bool {
    std::process::Command::new("git")
        .arg("--version")
        .output()
        .is_ok()
}

fn git(dir: &TempDir, args: &[&str]) {
    let out = std::process::Command::new("git")
        .args(args)
        .current_dir(dir.path())
        .env("GIT_AUTHOR_NAME", "t")
        .env("GIT_AUTHOR_EMAIL", "t@example.com")
        .env("GIT_COMMITTER_NAME", "t")
        .env("GIT_COMMITTER_EMAIL", "t@example.com")
        .output()
        .unwrap();
    assert!(out.status.success(), "git {args:?} failed: {out:?}");
}

fn commit_all(dir: &TempDir, message: &str) {
    git(dir, &["add", "."]);
    git(dir, &["commit", "-q", "-m", message]);
}

#[test]
fn release_preview_computes_minor_bump() {
    if !git_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    git(&dir, &["init", "-q"]);
    commit_all(&dir, "chore: scaffold");
    git(&dir, &["tag", "-a", "v1.2.3", "-m", "v1.2.3"]);

    std::fs::write(dir.path().join("x.txt"), "x").unwrap();
    commit_all(&dir, "fix: x");
    std::fs::write(dir.path().join("y.txt"), "y").unwrap();
    commit_all(&dir, "feat: y");

    backlog(&dir)
        .args(["release", "preview"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Next tag:  v1.3.0"))
        .stdout(predicate::str::contains("### Features"))
        .stdout(predicate::str::contains("feat: y"));
}

#[test]
fn release_cut_refuses_dirty_tree_without_yes() {
    if !git_available() {
        return;
    }
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    git(&dir, &["init", "-q"]);
    commit_all(&dir, "feat: first");

    // Uncommitted change → gate trips.
    std::fs::write(dir.path().join("dirty.txt"), "dirty").unwrap();
    backlog(&dir)
        .args(["release", "cut"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("uncommitted changes"));

    // Explicit override proceeds and tags v0.1.0.
    backlog(&dir)
        .args(["release", "cut", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Tagged v0.1.0"));
}
