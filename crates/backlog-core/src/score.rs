//! Tradeoff scoring: utility vs. implementation and maintenance cost.
//!
//! The judgment itself is an injected capability behind the [`Scorer`]
//! trait; everything around it (the decision table, the promotion rule,
//! the fan-out batch runner) is deterministic and tested.

use crate::error::Result;
use crate::issue::Issue;
use crate::types::{IssueId, Level, Recommendation};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// TradeoffScore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TradeoffScore {
    pub utility: Level,
    pub effort: Level,
    pub complexity: Level,
    pub tech_debt_risk: Level,
    pub maintenance_overhead: Level,
    /// Number of other issues this one blocks.
    pub blocks: u32,
}

impl TradeoffScore {
    /// Worst of the four cost dimensions.
    pub fn cost(&self) -> Level {
        self.effort
            .max(self.complexity)
            .max(self.tech_debt_risk)
            .max(self.maintenance_overhead)
    }

    /// Deterministic verdict: utility above cost implements, utility at
    /// cost updates first, utility below cost closes or defers. An issue
    /// blocking three or more others is promoted one tier toward
    /// `Implement`.
    pub fn recommendation(&self) -> Recommendation {
        let base = match self.utility.cmp(&self.cost()) {
            std::cmp::Ordering::Greater => Recommendation::Implement,
            std::cmp::Ordering::Equal => Recommendation::UpdateFirst,
            std::cmp::Ordering::Less => Recommendation::CloseDefer,
        };
        if self.blocks >= 3 {
            base.promote()
        } else {
            base
        }
    }
}

/// Blocking edges declared in frontmatter: `blocks: [BUG-001, FEAT-002]`
/// or a bare count.
pub fn declared_blocks(issue: &Issue) -> u32 {
    match issue.meta.get("blocks") {
        Some(serde_yaml::Value::Sequence(ids)) => ids.len() as u32,
        Some(v) => v.as_u64().unwrap_or(0) as u32,
        None => 0,
    }
}

// ---------------------------------------------------------------------------
// Scorer
// ---------------------------------------------------------------------------

/// The injected reasoning capability: maps an issue's text to a scoring
/// tuple. Implementations must be `Sync` so the batch runner can fan out.
pub trait Scorer: Sync {
    fn name(&self) -> &str;
    fn score(&self, issue: &Issue) -> Result<TradeoffScore>;
}

// ---------------------------------------------------------------------------
// HeuristicScorer
// ---------------------------------------------------------------------------

/// Deterministic keyword/length heuristic. A crude stand-in for the real
/// reasoning backend that keeps the scaffolding testable offline.
#[derive(Debug, Default)]
pub struct HeuristicScorer;

const HIGH_UTILITY_MARKERS: &[&str] = &["crash", "data loss", "security", "corrupt"];
const HIGH_COMPLEXITY_MARKERS: &[&str] = &["refactor", "migration", "architecture", "concurren"];
const MEDIUM_COMPLEXITY_MARKERS: &[&str] = &["api", "schema", "protocol", "format"];
const DEBT_MARKERS: &[&str] = &["workaround", "hack", "temporary", "stopgap"];

fn mentions(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|m| text.contains(m))
}

impl Scorer for HeuristicScorer {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn score(&self, issue: &Issue) -> Result<TradeoffScore> {
        let text = issue.body.to_lowercase();

        let utility = if issue.priority.tier() <= 1 || mentions(&text, HIGH_UTILITY_MARKERS) {
            Level::High
        } else if issue.priority.tier() <= 3 {
            Level::Medium
        } else {
            Level::Low
        };

        let effort = match text.len() {
            0..=400 => Level::Low,
            401..=1500 => Level::Medium,
            _ => Level::High,
        };

        let complexity = if mentions(&text, HIGH_COMPLEXITY_MARKERS) {
            Level::High
        } else if mentions(&text, MEDIUM_COMPLEXITY_MARKERS) {
            Level::Medium
        } else {
            Level::Low
        };

        let tech_debt_risk = if mentions(&text, DEBT_MARKERS) {
            Level::High
        } else {
            Level::Low
        };

        // Long-lived surface (config, flags, new commands) costs upkeep.
        let maintenance_overhead = if mentions(&text, &["config", "flag", "command", "option"]) {
            Level::Medium
        } else {
            Level::Low
        };

        Ok(TradeoffScore {
            utility,
            effort,
            complexity,
            tech_debt_risk,
            maintenance_overhead,
            blocks: declared_blocks(issue),
        })
    }
}

// ---------------------------------------------------------------------------
// Batch runner
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ScoredIssue {
    pub id: IssueId,
    pub title: String,
    pub score: TradeoffScore,
    pub recommendation: Recommendation,
}

#[derive(Debug, Clone, Serialize)]
pub struct Unevaluated {
    pub id: IssueId,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct ScoreReport {
    pub scored: Vec<ScoredIssue>,
    pub unevaluated: Vec<Unevaluated>,
}

/// Score every issue: fan out across worker threads (each unit is
/// independent), fan in after all units finish. A failed unit is retried
/// once, then reported as unevaluated. Output preserves input order.
pub fn score_all(scorer: &dyn Scorer, issues: &[Issue]) -> ScoreReport {
    let workers = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(issues.len().max(1));

    let next = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<std::result::Result<TradeoffScore, String>>>> =
        Mutex::new(vec![None; issues.len()]);

    std::thread::scope(|s| {
        for _ in 0..workers {
            s.spawn(|| loop {
                let i = next.fetch_add(1, Ordering::Relaxed);
                if i >= issues.len() {
                    break;
                }
                let result = scorer
                    .score(&issues[i])
                    .or_else(|_| scorer.score(&issues[i]))
                    .map_err(|e| e.to_string());
                slots.lock().unwrap()[i] = Some(result);
            });
        }
    });

    let mut report = ScoreReport::default();
    for (issue, slot) in issues.iter().zip(slots.into_inner().unwrap()) {
        match slot {
            Some(Ok(score)) => report.scored.push(ScoredIssue {
                id: issue.id,
                title: issue.title.clone(),
                recommendation: score.recommendation(),
                score,
            }),
            Some(Err(reason)) => report.unevaluated.push(Unevaluated {
                id: issue.id,
                reason,
            }),
            None => report.unevaluated.push(Unevaluated {
                id: issue.id,
                reason: "not scheduled".to_string(),
            }),
        }
    }
    report
}

/// Render one scored issue as the note appended by a tradeoff review.
pub fn review_note(scored: &ScoredIssue, scorer_name: &str) -> String {
    let s = &scored.score;
    format!(
        "Recommendation: {}\n\n\
         - Utility: {}\n\
         - Effort: {}\n\
         - Complexity: {}\n\
         - Tech-debt risk: {}\n\
         - Maintenance overhead: {}\n\
         - Blocks: {}\n\n\
         Scored by: {scorer_name}",
        scored.recommendation, s.utility, s.effort, s.complexity, s.tech_debt_risk,
        s.maintenance_overhead, s.blocks,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
