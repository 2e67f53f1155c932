use crate::locate;
use anyhow::Context;
use doorlock_core::config::Config;
use std::path::Path;

pub fn run(explicit: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = locate::config_path(explicit);

    if path.exists() && !force {
        println!("  exists:  {}", path.display());
        return Ok(());
    }

    Config::default()
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("  created: {}", path.display());
    Ok(())
}
