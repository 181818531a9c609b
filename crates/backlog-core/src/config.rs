use crate::error::{BacklogError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// DocumentsConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub files: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub categories: Vec<DocumentCategory>,
}

// ---------------------------------------------------------------------------
// IssuesConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuesConfig {
    #[serde(default = "default_base_dir")]
    pub base_dir: String,
    #[serde(default = "default_issue_categories")]
    pub categories: Vec<String>,
    #[serde(default = "default_completed_dir")]
    pub completed_dir: String,
}

fn default_base_dir() -> String {
    "issues".to_string()
}

fn default_issue_categories() -> Vec<String> {
    vec![
        "bugs".to_string(),
        "features".to_string(),
        "enhancements".to_string(),
    ]
}

fn default_completed_dir() -> String {
    "issues/completed".to_string()
}

impl Default for IssuesConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            categories: default_issue_categories(),
            completed_dir: default_completed_dir(),
        }
    }
}

// ---------------------------------------------------------------------------
// ProjectConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_src_dir")]
    pub src_dir: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_cmd: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lint_cmd: Option<String>,
}

fn default_src_dir() -> String {
    "src".to_string()
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            src_dir: default_src_dir(),
            test_cmd: None,
            lint_cmd: None,
        }
    }
}

// ---------------------------------------------------------------------------
// SyncConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubConfig {
    /// "owner/name". When absent the git 'origin' remote is parsed instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    /// Maps issue kind ("bug", "feature", "enhancement") or priority
    /// ("P0".."P5") to a remote label.
    #[serde(default)]
    pub label_mapping: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub github: GithubConfig,
}

// ---------------------------------------------------------------------------
// ContinuationConfig / PromptOptimizationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuationConfig {
    #[serde(default = "default_prompt_expiry_hours")]
    pub prompt_expiry_hours: u32,
}

fn default_prompt_expiry_hours() -> u32 {
    24
}

impl Default for ContinuationConfig {
    fn default() -> Self {
        Self {
            prompt_expiry_hours: default_prompt_expiry_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptOptimizationConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_prompt_mode")]
    pub mode: String,
    #[serde(default = "default_true")]
    pub confirm: bool,
}

fn default_prompt_mode() -> String {
    "conservative".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for PromptOptimizationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: default_prompt_mode(),
            confirm: default_true(),
        }
    }
}

pub const PROMPT_MODES: &[&str] = &["conservative", "balanced", "aggressive"];

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub documents: DocumentsConfig,
    #[serde(default)]
    pub issues: IssuesConfig,
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub continuation: ContinuationConfig,
    #[serde(default)]
    pub prompt_optimization: PromptOptimizationConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            documents: DocumentsConfig::default(),
            issues: IssuesConfig::default(),
            project: ProjectConfig::default(),
            sync: SyncConfig::default(),
            continuation: ContinuationConfig::default(),
            prompt_optimization: PromptOptimizationConfig::default(),
        }
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(BacklogError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_json::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let mut data = serde_json::to_string_pretty(self)?;
        data.push('\n');
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        // Category names must be unique within the configuration.
        let mut seen = std::collections::HashSet::new();
        for cat in &self.documents.categories {
            if !seen.insert(cat.name.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("duplicate document category '{}'", cat.name),
                });
            }
            for file in &cat.files {
                if Path::new(file).is_absolute() || file.contains("..") {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "category '{}' references a file outside the project tree: {}",
                            cat.name, file
                        ),
                    });
                }
            }
        }

        if !PROMPT_MODES.contains(&self.prompt_optimization.mode.as_str()) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "unknown prompt_optimization.mode '{}' (expected one of: {})",
                    self.prompt_optimization.mode,
                    PROMPT_MODES.join(", ")
                ),
            });
        }

        if self.continuation.prompt_expiry_hours == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "continuation.prompt_expiry_hours is 0: continuation prompts never expire"
                    .to_string(),
            });
        }

        if let Some(repo) = &self.sync.github.repo {
            if !repo_is_wellformed(repo) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("malformed sync.github.repo '{repo}': expected owner/name"),
                });
            }
        }

        for key in self.sync.github.label_mapping.keys() {
            let is_kind = matches!(key.as_str(), "bug" | "feature" | "enhancement");
            let is_priority = key.parse::<crate::types::Priority>().is_ok();
            if !is_kind && !is_priority {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "unknown label_mapping key '{key}' (expected an issue kind or P0..P5)"
                    ),
                });
            }
        }

        // The completed partition must live under base_dir so the store's
        // exclusion rule can see it.
        if !Path::new(&self.issues.completed_dir).starts_with(&self.issues.base_dir) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "issues.completed_dir '{}' is outside issues.base_dir '{}'",
                    self.issues.completed_dir, self.issues.base_dir
                ),
            });
        }

        warnings
    }
}

fn repo_is_wellformed(repo: &str) -> bool {
    match repo.split_once('/') {
        Some((owner, name)) => {
            !owner.is_empty() && !name.is_empty() && !name.contains('/')
        }
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
