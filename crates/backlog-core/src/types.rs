use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Priority tier. P0 is the most urgent; ordering follows urgency,
/// so `P0 < P1` in the derived sort order means P0 sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Priority {
    P0,
    P1,
    P2,
    P3,
    P4,
    P5,
}

impl Priority {
    pub fn all() -> &'static [Priority] {
        &[
            Priority::P0,
            Priority::P1,
            Priority::P2,
            Priority::P3,
            Priority::P4,
            Priority::P5,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::P0 => "P0",
            Priority::P1 => "P1",
            Priority::P2 => "P2",
            Priority::P3 => "P3",
            Priority::P4 => "P4",
            Priority::P5 => "P5",
        }
    }

    pub fn tier(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = crate::error::BacklogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "P0" => Ok(Priority::P0),
            "P1" => Ok(Priority::P1),
            "P2" => Ok(Priority::P2),
            "P3" => Ok(Priority::P3),
            "P4" => Ok(Priority::P4),
            "P5" => Ok(Priority::P5),
            _ => Err(crate::error::BacklogError::InvalidPriority(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// IssueKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Bug,
    Feature,
    Enhancement,
}

impl IssueKind {
    pub fn all() -> &'static [IssueKind] {
        &[IssueKind::Bug, IssueKind::Feature, IssueKind::Enhancement]
    }

    /// Short code used in issue IDs and filenames.
    pub fn code(self) -> &'static str {
        match self {
            IssueKind::Bug => "BUG",
            IssueKind::Feature => "FEAT",
            IssueKind::Enhancement => "ENH",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IssueKind::Bug => "bug",
            IssueKind::Feature => "feature",
            IssueKind::Enhancement => "enhancement",
        }
    }

    pub fn from_code(code: &str) -> Option<IssueKind> {
        match code {
            "BUG" => Some(IssueKind::Bug),
            "FEAT" => Some(IssueKind::Feature),
            "ENH" => Some(IssueKind::Enhancement),
            _ => None,
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IssueKind {
    type Err = crate::error::BacklogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bug" => Ok(IssueKind::Bug),
            "feature" | "feat" => Ok(IssueKind::Feature),
            "enhancement" | "enh" => Ok(IssueKind::Enhancement),
            _ => Err(crate::error::BacklogError::InvalidKind(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// IssueId
// ---------------------------------------------------------------------------

/// Type-prefixed numeric identifier, e.g. `BUG-042`. Numbers are allocated
/// from one global sequence, so an id is unique across all kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IssueId {
    pub kind: IssueKind,
    pub number: u32,
}

impl IssueId {
    pub fn new(kind: IssueKind, number: u32) -> Self {
        Self { kind, number }
    }
}

impl fmt::Display for IssueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:03}", self.kind.code(), self.number)
    }
}

impl std::str::FromStr for IssueId {
    type Err = crate::error::BacklogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || crate::error::BacklogError::InvalidIssueId(s.to_string());
        let (code, num) = s.split_once('-').ok_or_else(err)?;
        let kind = IssueKind::from_code(code).ok_or_else(err)?;
        let number: u32 = num.parse().map_err(|_| err())?;
        Ok(IssueId { kind, number })
    }
}

impl Serialize for IssueId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for IssueId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// Categorical magnitude used by the tradeoff scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Low => "LOW",
            Level::Medium => "MEDIUM",
            Level::High => "HIGH",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Recommendation
// ---------------------------------------------------------------------------

/// Tri-state verdict of a tradeoff review, ordered from "keep and build"
/// to "drop". Promotion moves one step toward `Implement`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recommendation {
    Implement,
    UpdateFirst,
    CloseDefer,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::Implement => "Implement",
            Recommendation::UpdateFirst => "Update first",
            Recommendation::CloseDefer => "Close/Defer",
        }
    }

    /// One tier toward `Implement`; `Implement` is a fixed point.
    pub fn promote(self) -> Recommendation {
        match self {
            Recommendation::CloseDefer => Recommendation::UpdateFirst,
            Recommendation::UpdateFirst => Recommendation::Implement,
            Recommendation::Implement => Recommendation::Implement,
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// CommitKind / Bump
// ---------------------------------------------------------------------------

/// Changelog category of a commit, derived from its conventional prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitKind {
    Breaking,
    Feature,
    Fix,
    Improvement,
    Docs,
    Maintenance,
}

impl CommitKind {
    pub fn all() -> &'static [CommitKind] {
        &[
            CommitKind::Breaking,
            CommitKind::Feature,
            CommitKind::Fix,
            CommitKind::Improvement,
            CommitKind::Docs,
            CommitKind::Maintenance,
        ]
    }

    pub fn heading(self) -> &'static str {
        match self {
            CommitKind::Breaking => "Breaking changes",
            CommitKind::Feature => "Features",
            CommitKind::Fix => "Fixes",
            CommitKind::Improvement => "Improvements",
            CommitKind::Docs => "Documentation",
            CommitKind::Maintenance => "Maintenance",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bump {
    Major,
    Minor,
    Patch,
}

impl fmt::Display for Bump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Bump::Major => "major",
            Bump::Minor => "minor",
            Bump::Patch => "patch",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
