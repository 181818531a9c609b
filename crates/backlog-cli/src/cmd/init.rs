use anyhow::Context;
use backlog_core::{config::Config, io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing backlog in: {}", root.display());

    io::ensure_dir(&paths::backlog_dir(root)).context("failed to create .backlog/")?;

    // Write config.json if missing, then load whatever is there so custom
    // directory layouts are respected on re-runs.
    let config_path = paths::config_path(root);
    if !config_path.exists() {
        Config::default()
            .save(root)
            .context("failed to write config.json")?;
        println!("  created: .backlog/config.json");
    } else {
        println!("  exists:  .backlog/config.json");
    }
    let cfg = Config::load(root)?;

    let base = root.join(&cfg.issues.base_dir);
    for cat in &cfg.issues.categories {
        let dir = base.join(cat);
        io::ensure_dir(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
    }
    io::ensure_dir(&root.join(&cfg.issues.completed_dir))
        .context("failed to create completed directory")?;
    println!("  created: {}/ (+ categories, completed)", cfg.issues.base_dir);

    println!("\nBacklog initialized.");
    println!("Next: backlog issue new bug \"...\" --priority P2");
    Ok(())
}
