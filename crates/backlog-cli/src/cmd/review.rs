use crate::output::{print_json, print_table};
use anyhow::Context;
use backlog_core::config::Config;
use backlog_core::issue::Section;
use backlog_core::score::{self, HeuristicScorer, Scorer};
use backlog_core::store;
use std::path::Path;

/// Run the tradeoff scorer over every active issue. Read-only with
/// `--dry-run`; otherwise each scored issue gets a review note appended.
pub fn run(root: &Path, dry_run: bool, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load(root).context("failed to load config")?;
    let scan = store::scan(root, &cfg).context("failed to scan issues")?;

    let scorer = HeuristicScorer;
    let report = score::score_all(&scorer, &scan.issues);

    if !dry_run {
        for scored in &report.scored {
            let Some(issue) = scan.issues.iter().find(|i| i.id == scored.id) else {
                continue;
            };
            store::append_section(
                &issue.path,
                Section::TradeoffReviewNote,
                &score::review_note(scored, scorer.name()),
            )
            .with_context(|| format!("failed to annotate {}", scored.id))?;
        }
    }

    if json {
        print_json(&report)?;
        return Ok(());
    }

    if report.scored.is_empty() && report.unevaluated.is_empty() {
        println!("No active issues to review.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = report
        .scored
        .iter()
        .map(|s| {
            vec![
                s.id.to_string(),
                s.recommendation.to_string(),
                s.score.utility.to_string(),
                s.score.cost().to_string(),
                s.score.blocks.to_string(),
                s.title.clone(),
            ]
        })
        .collect();
    print_table(
        &["ID", "RECOMMENDATION", "UTILITY", "COST", "BLOCKS", "TITLE"],
        rows,
    );

    for u in &report.unevaluated {
        println!("unevaluated: {} ({})", u.id, u.reason);
    }
    for skip in &scan.skipped {
        println!("warning: skipped {}: {}", skip.path.display(), skip.reason);
    }
    if dry_run {
        println!("\nDry run: no review notes written.");
    } else {
        println!("\nAppended review notes to {} issue(s).", report.scored.len());
    }
    Ok(())
}
