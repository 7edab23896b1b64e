//! Content cache maintenance
//!
//! - `cache path` - Show cache location
//! - `cache clear` - Remove every cached entry
//! - `cache info` - Show cache statistics

use anyhow::Result;
use o3de_fetch::{ContentCache, Manifest};
use std::path::PathBuf;

/// Format bytes as human-readable size
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

fn open_cache(override_home_folder: Option<PathBuf>) -> Result<ContentCache> {
    let home_folder = match override_home_folder {
        Some(folder) => folder,
        None => Manifest::default_home_folder()?,
    };
    let manifest = Manifest::load(home_folder)?;
    Ok(ContentCache::new(manifest.cache_folder())?)
}

pub fn run_path(override_home_folder: Option<PathBuf>) -> Result<()> {
    let cache = open_cache(override_home_folder)?;
    println!("{}", cache.root().display());
    Ok(())
}

pub fn run_clear(override_home_folder: Option<PathBuf>) -> Result<()> {
    let cache = open_cache(override_home_folder)?;
    let stats = cache.stats()?;
    cache.clear()?;

    println!(
        "Cleared {} ({})",
        cache.root().display(),
        format_size(stats.total_bytes)
    );
    Ok(())
}

pub fn run_info(override_home_folder: Option<PathBuf>) -> Result<()> {
    let cache = open_cache(override_home_folder)?;
    let stats = cache.stats()?;

    println!("Content cache: {}", cache.root().display());
    println!();
    println!("  Documents:  {}", stats.documents);
    println!("  Bundles:    {}", stats.bundles);
    println!("  Checkouts:  {}", stats.checkouts);
    println!("  Total size: {}", format_size(stats.total_bytes));

    Ok(())
}
