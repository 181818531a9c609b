use crate::output::{print_json, print_table};
use anyhow::Context;
use backlog_core::config::Config;
use backlog_core::docs;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum DocsSubcommand {
    /// List document categories
    List,
    /// Verify that category files exist
    Check {
        /// Category name (omit to check all)
        category: Option<String>,
    },
}

pub fn run(root: &Path, subcmd: DocsSubcommand, json: bool) -> anyhow::Result<()> {
    let cfg = Config::load(root).context("failed to load config")?;
    match subcmd {
        DocsSubcommand::List => list(&cfg, json),
        DocsSubcommand::Check { category } => check(root, &cfg, category.as_deref(), json),
    }
}

fn list(cfg: &Config, json: bool) -> anyhow::Result<()> {
    docs::ensure_enabled(cfg)?;

    if json {
        print_json(&cfg.documents.categories)?;
        return Ok(());
    }

    if cfg.documents.categories.is_empty() {
        println!("No document categories configured.");
        return Ok(());
    }

    let rows: Vec<Vec<String>> = cfg
        .documents
        .categories
        .iter()
        .map(|c| {
            vec![
                c.name.clone(),
                c.description.clone(),
                c.files.len().to_string(),
            ]
        })
        .collect();
    print_table(&["NAME", "DESCRIPTION", "FILES"], rows);
    Ok(())
}

fn check(root: &Path, cfg: &Config, category: Option<&str>, json: bool) -> anyhow::Result<()> {
    let reports = docs::check(root, cfg, category)?;

    if json {
        print_json(&reports)?;
        return Ok(());
    }

    for report in &reports {
        println!(
            "{}: {} present, {} missing",
            report.name,
            report.present.len(),
            report.missing.len()
        );
        for file in &report.missing {
            println!("  missing: {file}");
        }
    }
    Ok(())
}
