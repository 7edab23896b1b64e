use super::Context;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;

pub fn run(override_home_folder: Option<PathBuf>) -> Result<()> {
    let ctx = Context::load(override_home_folder)?;

    if ctx.manifest.repos().is_empty() {
        println!("No repositories registered in {}", ctx.manifest.manifest_path().display());
        return Ok(());
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Refreshing repositories...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let refreshed = o3de_fetch::refresh_repos(&ctx.manifest, &ctx.fetcher, &ctx.settings.resolver);
    spinner.finish_and_clear();
    let summary = refreshed?;

    println!(
        "✓ Refreshed {} repositor{} ({} object descriptor{})",
        summary.repositories,
        if summary.repositories == 1 { "y" } else { "ies" },
        summary.descriptors,
        if summary.descriptors == 1 { "" } else { "s" }
    );

    Ok(())
}
