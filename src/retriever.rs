//! Retrieving resolved objects into a destination folder
//!
//! Bundle-backed descriptors are downloaded as `<origin>/<kind>.zip` into the
//! content cache (keyed by their checksum), verified, and extracted.
//! Checkout-backed descriptors are cloned or updated in a cache directory
//! keyed by their canonical URI, then copied. Either way the destination must
//! not exist beforehand, and a failed retrieval leaves nothing behind in it.
//!
//! # Examples
//!
//! ```no_run
//! use o3de_fetch::{
//!     ContentCache, Fetcher, GitCheckout, Manifest, ManifestRegistrar, ObjectKind, Resolver,
//!     RetrieveOptions, Retriever, Settings,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load()?;
//! let manifest = Manifest::load(Manifest::default_home_folder()?)?;
//! let fetcher = Fetcher::new(ContentCache::new(manifest.cache_folder())?, &settings)?;
//! let descriptor = Resolver::new(&manifest, &fetcher, &settings.resolver)
//!     .resolve(ObjectKind::Gem, "Foo")?;
//!
//! let checkout = GitCheckout::default();
//! let registrar = ManifestRegistrar::new(manifest.home_folder());
//! let retriever = Retriever::new(&manifest, &fetcher, &checkout, &registrar);
//! let installed = retriever.retrieve(&descriptor, None, RetrieveOptions::default())?;
//! println!("Installed to {}", installed.display());
//! # Ok(())
//! # }
//! ```

use crate::descriptor::join_uri;
use crate::fetcher::ProgressCallback;
use crate::integrity::{verify_bundle_with_progress, Verification};
use crate::{
    Checkout, ContentCache, DescriptorShape, Error, Fetcher, Manifest, ObjectDescriptor,
    Registrar, Result,
};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Clone, Default)]
pub struct RetrieveOptions {
    /// Do not record the destination with the registrar
    pub skip_registration: bool,
    /// Optional callback for download and verification progress
    pub progress: Option<ProgressCallback>,
}

pub struct Retriever<'a> {
    manifest: &'a Manifest,
    fetcher: &'a Fetcher,
    checkout: &'a dyn Checkout,
    registrar: &'a dyn Registrar,
}

/// Normalized form of a checkout URI: parsed, with trailing slashes trimmed
pub fn canonical_uri(uri: &str) -> String {
    let normalized = match url::Url::parse(uri) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => uri.to_string(),
    };
    normalized.trim_end_matches('/').to_string()
}

fn is_sha256_hex(value: &str) -> bool {
    value.len() == 64 && value.chars().all(|c| c.is_ascii_hexdigit())
}

fn dir_is_empty(path: &Path) -> bool {
    match fs::read_dir(path) {
        Ok(mut entries) => entries.next().is_none(),
        Err(_) => true,
    }
}

/// Extract every entry of a zip into `dest`
///
/// Entries whose names would escape `dest` are rejected.
pub fn extract_bundle(bundle_path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(bundle_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| Error::Extraction(format!("{}: {}", bundle_path.display(), e)))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| Error::Extraction(format!("{}: {}", bundle_path.display(), e)))?;

        let relative = entry.enclosed_name().map(Path::to_path_buf).ok_or_else(|| {
            Error::Extraction(format!("entry '{}' escapes the destination", entry.name()))
        })?;
        let out_path = dest.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut out_file = File::create(&out_path)?;
        io::copy(&mut entry, &mut out_file)?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&out_path, fs::Permissions::from_mode(mode))?;
        }
    }

    Ok(())
}

/// Copy a directory tree into `dest`, which must not exist yet
pub fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    for entry in walkdir::WalkDir::new(source) {
        let entry = entry.map_err(|e| Error::Io(io::Error::other(e.to_string())))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| Error::Io(io::Error::other(e.to_string())))?;
        let target = dest.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Recreate the link itself; its target is not followed
#[cfg(unix)]
fn copy_symlink(link: &Path, target: &Path) -> Result<()> {
    std::os::unix::fs::symlink(fs::read_link(link)?, target)?;
    Ok(())
}

#[cfg(not(unix))]
fn copy_symlink(link: &Path, _target: &Path) -> Result<()> {
    tracing::warn!(path = %link.display(), "symlinks are not supported here, skipping");
    Ok(())
}

fn remove_partial(dest: &Path) {
    if let Err(e) = fs::remove_dir_all(dest) {
        tracing::warn!(path = %dest.display(), error = %e, "failed to remove partial destination");
    }
}

impl<'a> Retriever<'a> {
    pub fn new(
        manifest: &'a Manifest,
        fetcher: &'a Fetcher,
        checkout: &'a dyn Checkout,
        registrar: &'a dyn Registrar,
    ) -> Self {
        Self {
            manifest,
            fetcher,
            checkout,
            registrar,
        }
    }

    fn cache(&self) -> &ContentCache {
        self.fetcher.cache()
    }

    /// Retrieve `descriptor` into `destination` (or its default folder)
    ///
    /// Returns the populated destination.
    pub fn retrieve(
        &self,
        descriptor: &ObjectDescriptor,
        destination: Option<&Path>,
        options: RetrieveOptions,
    ) -> Result<PathBuf> {
        let dest = match descriptor.shape() {
            DescriptorShape::Bundle => self.retrieve_bundle(descriptor, destination, &options)?,
            DescriptorShape::Checkout => self.retrieve_checkout(descriptor, destination)?,
        };

        if options.skip_registration {
            tracing::debug!(path = %dest.display(), "skipping registration");
        } else {
            self.registrar.register(descriptor.kind, &dest)?;
        }

        Ok(dest)
    }

    /// Cache file a bundle-backed descriptor is downloaded to
    pub fn bundle_cache_path(&self, descriptor: &ObjectDescriptor) -> Result<PathBuf> {
        match descriptor.sha256.as_deref() {
            Some(sum) if is_sha256_hex(sum) => {
                Ok(self.cache().entry_path(&sum.to_ascii_lowercase(), Some("zip")))
            }
            Some(sum) => Err(Error::InvalidDescriptor(format!(
                "'{}' is not a SHA256 checksum",
                sum
            ))),
            None => {
                let bundle_uri = self.bundle_uri(descriptor)?;
                Ok(self
                    .cache()
                    .entry_path(&ContentCache::key_for(&bundle_uri), Some("zip")))
            }
        }
    }

    fn bundle_uri(&self, descriptor: &ObjectDescriptor) -> Result<String> {
        let origin = descriptor.origin.as_deref().ok_or_else(|| {
            Error::InvalidDescriptor(format!(
                "Downloadable {} {} has no origin",
                descriptor.kind, descriptor.name
            ))
        })?;
        Ok(join_uri(origin, &descriptor.kind.bundle_file()))
    }

    fn retrieve_bundle(
        &self,
        descriptor: &ObjectDescriptor,
        destination: Option<&Path>,
        options: &RetrieveOptions,
    ) -> Result<PathBuf> {
        let bundle_uri = self.bundle_uri(descriptor)?;
        let cache_path = self.bundle_cache_path(descriptor)?;

        let downloaded = self.cache().get_or_insert_with(&cache_path, |tmp| {
            self.fetcher
                .download_to(&bundle_uri, tmp, options.progress.clone())
        })?;
        if downloaded {
            tracing::info!(uri = %bundle_uri, path = %cache_path.display(), "bundle downloaded");
        } else {
            tracing::info!(path = %cache_path.display(), "using cached bundle");
        }

        let verification = verify_bundle_with_progress(
            descriptor,
            &cache_path,
            &descriptor.kind.descriptor_file(),
            options.progress.clone(),
        )?;
        if verification == Verification::Unverified {
            tracing::warn!(name = %descriptor.name, "continuing with an unverified bundle");
        }

        let dest = match destination {
            Some(path) => path.to_path_buf(),
            None => {
                let repo_name = descriptor.repo_name.as_deref().unwrap_or_default();
                self.manifest
                    .default_folder(descriptor.kind)
                    .join(repo_name)
                    .join(&descriptor.name)
            }
        };
        if dest.exists() {
            return Err(Error::DestinationConflict(dest));
        }

        fs::create_dir_all(&dest)?;
        if let Err(e) = extract_bundle(&cache_path, &dest) {
            tracing::error!(
                bundle = %cache_path.display(),
                dest = %dest.display(),
                error = %e,
                "extraction failed, removing destination"
            );
            remove_partial(&dest);
            return Err(match e {
                Error::Extraction(_) => e,
                other => Error::Extraction(other.to_string()),
            });
        }

        Ok(dest)
    }

    /// Default destination of a checkout: `<default folder>/<host>/<path segments>`
    fn default_checkout_destination(&self, descriptor: &ObjectDescriptor, uri: &str) -> PathBuf {
        let mut dest = self.manifest.default_folder(descriptor.kind);
        match url::Url::parse(uri) {
            Ok(parsed) if parsed.has_host() => {
                dest.push(parsed.host_str().unwrap_or_default());
                if let Some(segments) = parsed.path_segments() {
                    for segment in segments.filter(|s| !s.trim().is_empty()) {
                        dest.push(segment);
                    }
                }
            }
            _ => dest.push(&descriptor.name),
        }
        dest
    }

    fn retrieve_checkout(
        &self,
        descriptor: &ObjectDescriptor,
        destination: Option<&Path>,
    ) -> Result<PathBuf> {
        let uri = canonical_uri(&descriptor.o3de_object_uri);
        let cache_dir = self.cache().entry_path(&ContentCache::key_for(&uri), None);

        let result = if self.cache().contains(&cache_dir) {
            self.checkout.update(&uri, &cache_dir)
        } else {
            self.checkout.clone_fresh(&uri, &cache_dir)
        };

        let empty = dir_is_empty(&cache_dir);
        if empty {
            self.cache().invalidate(&cache_dir)?;
        }
        result?;
        if empty {
            return Err(Error::Checkout(format!(
                "checkout of {} produced an empty directory",
                uri
            )));
        }

        let dest = match destination {
            Some(path) => path.to_path_buf(),
            None => self.default_checkout_destination(descriptor, &uri),
        };
        if dest.exists() {
            return Err(Error::DestinationConflict(dest));
        }

        if let Err(e) = copy_tree(&cache_dir, &dest) {
            tracing::error!(
                source = %cache_dir.display(),
                dest = %dest.display(),
                error = %e,
                "copy failed, removing destination"
            );
            remove_partial(&dest);
            return Err(Error::Checkout(format!(
                "failed to copy {} => {}: {}",
                cache_dir.display(),
                dest.display(),
                e
            )));
        }

        Ok(dest)
    }
}
