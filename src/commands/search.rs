use super::Context;
use anyhow::Result;
use o3de_fetch::{ObjectKind, Resolver};
use std::path::PathBuf;

pub fn run(kind: ObjectKind, query: String, override_home_folder: Option<PathBuf>) -> Result<()> {
    println!("Searching {}s for: {}", kind, query);
    println!();

    let ctx = Context::load(override_home_folder)?;
    let resolver = Resolver::new(&ctx.manifest, &ctx.fetcher, &ctx.settings.resolver);
    let results = resolver.search(kind, &query)?;

    if results.is_empty() {
        println!("No {}s found matching '{}'", kind, query);
        println!();
        println!("Try a different search term or run `o3de-fetch refresh-repos`.");
        return Ok(());
    }

    println!(
        "Found {} {}{}:",
        results.len(),
        kind,
        if results.len() == 1 { "" } else { "s" }
    );
    for descriptor in &results {
        let summary = descriptor
            .document
            .get("summary")
            .and_then(|v| v.as_str());
        match (&descriptor.repo_name, summary) {
            (Some(repo), Some(desc)) => println!("  {} ({}) - {}", descriptor.name, repo, desc),
            (Some(repo), None) => println!("  {} ({})", descriptor.name, repo),
            (None, Some(desc)) => println!("  {} - {}", descriptor.name, desc),
            (None, None) => println!("  {}", descriptor.name),
        }
    }
    println!();

    Ok(())
}
