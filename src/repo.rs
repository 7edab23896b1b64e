//! Refreshing the repository cache
//!
//! [`refresh_repos`] discards every cached document and walks all top-level
//! repositories again, validating each `repo.json` and prefetching the object
//! descriptors it lists. The first invalid repository ends the pass.

use crate::descriptor::{join_uri, validate_repository, REPO_INDEX_FILE};
use crate::resolver::VisitedSet;
use crate::{Error, Fetcher, Manifest, ObjectKind, RepositoryIndex, ResolverConfig, Result};

/// Counts of what a refresh pass fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshSummary {
    pub repositories: usize,
    pub descriptors: usize,
}

/// Clear the content cache and re-fetch every reachable repository
pub fn refresh_repos(
    manifest: &Manifest,
    fetcher: &Fetcher,
    config: &ResolverConfig,
) -> Result<RefreshSummary> {
    fetcher.cache().clear()?;

    let mut visited = VisitedSet::new();
    let mut summary = RefreshSummary::default();
    for repo_uri in manifest.repos() {
        refresh_repository(fetcher, config, repo_uri, 0, &mut visited, &mut summary)?;
    }

    tracing::info!(
        repositories = summary.repositories,
        descriptors = summary.descriptors,
        "repositories refreshed"
    );
    Ok(summary)
}

fn refresh_repository(
    fetcher: &Fetcher,
    config: &ResolverConfig,
    repo_uri: &str,
    depth: usize,
    visited: &mut VisitedSet,
    summary: &mut RefreshSummary,
) -> Result<()> {
    if depth > config.max_depth {
        tracing::warn!(
            repo = %repo_uri,
            max_depth = config.max_depth,
            "repository nesting exceeds max_depth, skipping"
        );
        return Ok(());
    }
    if !visited.insert(repo_uri.to_string()) {
        return Ok(());
    }

    let index_uri = join_uri(repo_uri, REPO_INDEX_FILE);
    let document = fetcher.fetch_json(&index_uri)?;

    if let Err(e) = validate_repository(&document, repo_uri) {
        tracing::error!(repo = %repo_uri, error = %e, "invalid repository");
        fetcher
            .cache()
            .invalidate(&fetcher.cache().document_path(&index_uri))?;
        return Err(e);
    }

    let index: RepositoryIndex =
        serde_json::from_value(document).map_err(|e| Error::InvalidRepository {
            uri: repo_uri.to_string(),
            reason: e.to_string(),
        })?;
    summary.repositories += 1;
    tracing::debug!(repo = %repo_uri, name = %index.repo_name, "repository refreshed");

    for kind in ObjectKind::ALL {
        for object_uri in index.objects(kind) {
            fetcher.fetch_json(&join_uri(object_uri, &kind.descriptor_file()))?;
            summary.descriptors += 1;
        }
    }

    for nested_uri in &index.repos {
        refresh_repository(fetcher, config, nested_uri, depth + 1, visited, summary)?;
    }

    Ok(())
}
