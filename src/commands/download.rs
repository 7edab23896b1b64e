use super::Context;
use anyhow::{Context as _, Result};
use indicatif::{ProgressBar, ProgressStyle};
use o3de_fetch::{
    DescriptorShape, GitCheckout, ManifestRegistrar, ObjectKind, ProgressCallback, Resolver,
    RetrieveOptions, Retriever,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Create an indicatif-based progress callback for CLI display
fn create_spinner_callback() -> ProgressCallback {
    let spinner = Arc::new(Mutex::new(ProgressBar::new_spinner()));
    if let Ok(s) = spinner.lock() {
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            s.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
        }
        s.enable_steady_tick(std::time::Duration::from_millis(80));
    }

    let spinner_clone = spinner.clone();
    Arc::new(move |msg: &str, current: u64, total: u64| {
        if let Ok(s) = spinner_clone.lock() {
            if current >= total && total > 0 {
                s.finish_with_message(format!("✓ {}", msg));
            } else {
                s.set_message(msg.to_string());
            }
        }
    })
}

pub fn run(
    kind: ObjectKind,
    name: String,
    dest_path: Option<PathBuf>,
    skip_auto_register: bool,
    override_home_folder: Option<PathBuf>,
) -> Result<()> {
    let ctx = Context::load(override_home_folder)?;
    let dest_path = match dest_path {
        Some(path) if path.is_relative() => Some(
            std::env::current_dir()
                .context("Failed to read the current directory")?
                .join(path),
        ),
        other => other,
    };

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.blue} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(format!("Resolving {} {}...", kind, name));
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let resolver = Resolver::new(&ctx.manifest, &ctx.fetcher, &ctx.settings.resolver);
    let resolved = resolver.resolve(kind, &name);
    spinner.finish_and_clear();
    let descriptor = resolved?;

    match descriptor.shape() {
        DescriptorShape::Bundle => println!(
            "Found {} {} in repository {}",
            kind,
            descriptor.name,
            descriptor.repo_name.as_deref().unwrap_or_default()
        ),
        DescriptorShape::Checkout => println!(
            "Found {} {} at {}",
            kind, descriptor.name, descriptor.o3de_object_uri
        ),
    }

    let checkout = GitCheckout::new(ctx.settings.checkout.program.clone());
    let registrar = ManifestRegistrar::new(ctx.manifest.home_folder());
    let retriever = Retriever::new(&ctx.manifest, &ctx.fetcher, &checkout, &registrar);

    let options = RetrieveOptions {
        skip_registration: skip_auto_register,
        progress: Some(create_spinner_callback()),
    };
    let dest = retriever.retrieve(&descriptor, dest_path.as_deref(), options)?;

    println!();
    println!("✓ Downloaded {} {} to {}", kind, descriptor.name, dest.display());
    if skip_auto_register {
        println!("  Skipped registration in o3de_manifest.json");
    } else {
        println!("  Registered in {}", ctx.manifest.manifest_path().display());
    }

    Ok(())
}
