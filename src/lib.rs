//! o3de-fetch - Resolve and retrieve objects from federated O3DE repositories
//!
//! Engines, projects, gems, templates and restricted platform folders are
//! advertised by remote repositories. A repository publishes a `repo.json`
//! index that lists object descriptors and may nest further repositories.
//! This crate walks those indexes, downloads and verifies the object you ask
//! for, and registers it in the local o3de manifest:
//!
//! - Depth-first resolution across nested repositories, tolerant of cycles
//! - Content-addressed cache of indexes, descriptors and bundles
//! - SHA256 verification of downloaded bundles and their embedded descriptor
//! - Version-control checkouts for objects listed directly in the manifest
//!
//! # Examples
//!
//! ```no_run
//! use o3de_fetch::{ContentCache, Fetcher, Manifest, ObjectKind, Resolver, Settings};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = Settings::load()?;
//! let manifest = Manifest::load(Manifest::default_home_folder()?)?;
//! let fetcher = Fetcher::new(ContentCache::new(manifest.cache_folder())?, &settings)?;
//!
//! let resolver = Resolver::new(&manifest, &fetcher, &settings.resolver);
//! let gem = resolver.resolve(ObjectKind::Gem, "Foo")?;
//! println!("Found {} in {:?}", gem.name, gem.repo_name);
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`manifest`] - Read and update o3de_manifest.json
//! - [`cache`] - Content cache of fetched documents, bundles and checkouts
//! - [`fetcher`] - Fetch documents and bundles over HTTP or from local paths
//! - [`descriptor`] - Repository index and object descriptor documents
//! - [`resolver`] - Find an object by kind and name across repositories
//! - [`integrity`] - Verify bundles against their advertised descriptor
//! - [`retriever`] - Download, extract or check out an object into place
//! - [`registrar`] - Record retrieved objects in the manifest
//! - [`repo`] - Refresh every cached repository
//! - [`config`] - Tool settings
//! - [`error`] - Error types and result handling

pub mod cache;
pub mod checkout;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod fetcher;
pub mod integrity;
pub mod kind;
pub mod manifest;
pub mod registrar;
pub mod repo;
pub mod resolver;
pub mod retriever;

pub use cache::{sha256_hex, CacheStats, ContentCache};
pub use checkout::{Checkout, GitCheckout};
pub use config::{ResolverConfig, Settings};
pub use descriptor::{DescriptorShape, ObjectDescriptor, RepositoryIndex};
pub use error::{Error, Result};
pub use fetcher::{Fetcher, ProgressCallback};
pub use integrity::{verify_bundle, Verification};
pub use kind::ObjectKind;
pub use manifest::Manifest;
pub use registrar::{ManifestRegistrar, Registrar};
pub use repo::{refresh_repos, RefreshSummary};
pub use resolver::{Resolver, VisitedSet};
pub use retriever::{RetrieveOptions, Retriever};
