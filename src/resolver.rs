//! Object resolution across federated repositories
//!
//! Repositories form a directed graph: each `repo.json` lists object URIs by
//! kind and may list nested repositories, which may in turn point back. The
//! resolver walks that graph depth-first in declared order and returns the
//! first descriptor whose name matches exactly.
//!
//! Search order for `resolve(kind, name)`:
//!
//! 1. every top-level `repos` entry of the manifest, each expanded
//!    recursively into its nested repositories;
//! 2. the manifest's `git_<kind>_repos` list, whose entries serve a
//!    `<kind>.json` directly and resolve to checkout-backed descriptors.
//!
//! A single [`VisitedSet`] is threaded through the whole pass so each
//! repository is fetched and expanded at most once, however the graph is
//! wired.
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
//! let descriptor = resolver.resolve(ObjectKind::Gem, "Foo")?;
//! println!("{} found at {}", descriptor.name, descriptor.o3de_object_uri);
//! # Ok(())
//! # }
//! ```

use crate::descriptor::{join_uri, REPO_INDEX_FILE};
use crate::{
    Error, Fetcher, Manifest, ObjectDescriptor, ObjectKind, RepositoryIndex, ResolverConfig, Result,
};
use std::collections::HashSet;
use std::time::Instant;

/// Repository URIs already expanded during one pass
pub type VisitedSet = HashSet<String>;

/// Whether the walk should stop at the descriptor just offered
enum Visit {
    Stop,
    Continue,
}

struct Deadline {
    at: Option<Instant>,
    seconds: u64,
}

impl Deadline {
    fn start(config: &ResolverConfig) -> Self {
        Self {
            at: config.deadline().map(|budget| Instant::now() + budget),
            seconds: config.resolution_timeout_seconds,
        }
    }

    fn check(&self) -> Result<()> {
        match self.at {
            Some(at) if Instant::now() >= at => Err(Error::Timeout(self.seconds)),
            _ => Ok(()),
        }
    }
}

pub struct Resolver<'a> {
    manifest: &'a Manifest,
    fetcher: &'a Fetcher,
    config: &'a ResolverConfig,
}

impl<'a> Resolver<'a> {
    pub fn new(manifest: &'a Manifest, fetcher: &'a Fetcher, config: &'a ResolverConfig) -> Self {
        Self {
            manifest,
            fetcher,
            config,
        }
    }

    /// Find the first descriptor of `kind` named exactly `name`
    pub fn resolve(&self, kind: ObjectKind, name: &str) -> Result<ObjectDescriptor> {
        let mut visited = VisitedSet::new();
        self.resolve_in(kind, name, &mut visited)
    }

    /// [`Resolver::resolve`] with a caller-owned visited set
    ///
    /// Repositories already in `visited` are skipped; every repository
    /// expanded by this call is added to it.
    pub fn resolve_in(
        &self,
        kind: ObjectKind,
        name: &str,
        visited: &mut VisitedSet,
    ) -> Result<ObjectDescriptor> {
        if name.is_empty() {
            return Err(Error::InvalidName(kind.to_string()));
        }

        tracing::debug!(kind = %kind, name = %name, "resolving");
        let mut found = None;
        self.walk(kind, visited, &mut |descriptor| {
            if descriptor.name == name {
                found = Some(descriptor);
                Visit::Stop
            } else {
                Visit::Continue
            }
        })?;

        match found {
            Some(descriptor) => {
                tracing::info!(
                    kind = %kind,
                    name = %name,
                    uri = %descriptor.o3de_object_uri,
                    repo = descriptor.repo_name.as_deref().unwrap_or("<git>"),
                    "resolved"
                );
                Ok(descriptor)
            }
            None => Err(Error::NotFound {
                kind: kind.to_string(),
                name: name.to_string(),
            }),
        }
    }

    /// Every reachable descriptor of `kind` whose name contains `query`
    /// (case-insensitive), in traversal order
    pub fn search(&self, kind: ObjectKind, query: &str) -> Result<Vec<ObjectDescriptor>> {
        let query = query.to_lowercase();
        let mut visited = VisitedSet::new();
        let mut matches = Vec::new();

        self.walk(kind, &mut visited, &mut |descriptor| {
            if descriptor.name.to_lowercase().contains(&query) {
                matches.push(descriptor);
            }
            Visit::Continue
        })?;

        Ok(matches)
    }

    /// Offer every reachable descriptor of `kind` to `visit` until it stops
    fn walk<F>(&self, kind: ObjectKind, visited: &mut VisitedSet, visit: &mut F) -> Result<()>
    where
        F: FnMut(ObjectDescriptor) -> Visit,
    {
        let deadline = Deadline::start(self.config);

        for repo_uri in self.manifest.repos() {
            if let Visit::Stop =
                self.walk_repository(repo_uri, kind, 0, visited, &deadline, &mut *visit)?
            {
                return Ok(());
            }
        }

        for object_uri in self.manifest.git_repos(kind) {
            deadline.check()?;
            if let Some(descriptor) = self.fetch_descriptor(kind, object_uri) {
                if let Visit::Stop = visit(descriptor) {
                    return Ok(());
                }
            }
        }

        Ok(())
    }

    fn walk_repository<F>(
        &self,
        repo_uri: &str,
        kind: ObjectKind,
        depth: usize,
        visited: &mut VisitedSet,
        deadline: &Deadline,
        visit: &mut F,
    ) -> Result<Visit>
    where
        F: FnMut(ObjectDescriptor) -> Visit,
    {
        // Too-deep branches stay unmarked so a shallower path can still expand them
        if depth > self.config.max_depth {
            tracing::warn!(
                repo = %repo_uri,
                max_depth = self.config.max_depth,
                "repository nesting exceeds max_depth, skipping"
            );
            return Ok(Visit::Continue);
        }
        if !visited.insert(repo_uri.to_string()) {
            tracing::trace!(repo = %repo_uri, "already visited");
            return Ok(Visit::Continue);
        }
        deadline.check()?;

        let index_uri = join_uri(repo_uri, REPO_INDEX_FILE);
        let index: RepositoryIndex = match self.fetcher.fetch_document(&index_uri) {
            Ok(index) => index,
            Err(e) => {
                tracing::warn!(repo = %repo_uri, error = %e, "skipping unreadable repository");
                return Ok(Visit::Continue);
            }
        };

        for object_uri in index.objects(kind) {
            deadline.check()?;
            if let Some(descriptor) = self.fetch_descriptor(kind, object_uri) {
                if let Visit::Stop = visit(descriptor.with_repo_name(&index.repo_name)) {
                    return Ok(Visit::Stop);
                }
            }
        }

        for nested_uri in &index.repos {
            if let Visit::Stop =
                self.walk_repository(nested_uri, kind, depth + 1, visited, deadline, &mut *visit)?
            {
                return Ok(Visit::Stop);
            }
        }

        Ok(Visit::Continue)
    }

    /// Fetch `<object_uri>/<kind>.json`; unreadable descriptors are skipped
    fn fetch_descriptor(&self, kind: ObjectKind, object_uri: &str) -> Option<ObjectDescriptor> {
        let descriptor_uri = join_uri(object_uri, &kind.descriptor_file());
        let document = match self.fetcher.fetch_json(&descriptor_uri) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(uri = %descriptor_uri, error = %e, "skipping unreadable descriptor");
                return None;
            }
        };

        match ObjectDescriptor::from_document(kind, document, object_uri) {
            Ok(descriptor) => Some(descriptor),
            Err(e) => {
                tracing::warn!(uri = %descriptor_uri, error = %e, "skipping invalid descriptor");
                None
            }
        }
    }
}
