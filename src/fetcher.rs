//! Fetching repository documents and bundles
//!
//! JSON documents always go through the [`ContentCache`]: the first request
//! for a URI downloads it, every later request in this or a following pass
//! reads the cached copy until the cache is cleared. Bundles are streamed to
//! a caller-chosen path so the retriever can key them by checksum.
//!
//! `http`, `https` and `file` URIs are supported; a URI without a scheme is
//! treated as a local path.

use crate::{ContentCache, Error, Result, Settings};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Progress callback for downloads
///
/// Called with:
/// - `message`: Description of current operation (e.g., "Downloading gem.zip...")
/// - `current`: Bytes processed so far
/// - `total`: Total bytes, or 0 when the server does not say
pub type ProgressCallback = Arc<dyn Fn(&str, u64, u64) + Send + Sync>;

/// Where a URI's bytes come from
#[derive(Debug, Clone, PartialEq)]
enum Source {
    Http(String),
    Local(PathBuf),
}

fn classify(uri: &str) -> Result<Source> {
    match url::Url::parse(uri) {
        Ok(parsed) => match parsed.scheme() {
            "http" | "https" => Ok(Source::Http(parsed.to_string())),
            "file" => parsed
                .to_file_path()
                .map(Source::Local)
                .map_err(|_| Error::Fetch {
                    uri: uri.to_string(),
                    reason: "file URI does not name a local path".to_string(),
                }),
            // Windows drive letters parse as one-letter schemes
            scheme if scheme.len() == 1 => Ok(Source::Local(PathBuf::from(uri))),
            scheme => Err(Error::Fetch {
                uri: uri.to_string(),
                reason: format!("unsupported scheme '{}'", scheme),
            }),
        },
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Source::Local(PathBuf::from(uri))),
        Err(e) => Err(Error::Fetch {
            uri: uri.to_string(),
            reason: e.to_string(),
        }),
    }
}

pub struct Fetcher {
    client: reqwest::blocking::Client,
    cache: ContentCache,
}

impl Fetcher {
    pub fn new(cache: ContentCache, settings: &Settings) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(settings.network.user_agent.clone())
            .timeout(settings.request_timeout())
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, cache })
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Fetch and parse a JSON document, reading it from the cache when present
    ///
    /// A cached copy that no longer parses is dropped from the cache so the
    /// next pass fetches it again.
    pub fn fetch_json(&self, uri: &str) -> Result<Value> {
        let path = self
            .cache
            .get_or_fetch(uri, |dest| self.download_to(uri, dest, None))?;

        let content = fs::read(&path)?;
        match serde_json::from_slice(&content) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(uri = %uri, path = %path.display(), error = %e, "cached document is not valid JSON");
                self.cache.invalidate(&path)?;
                Err(Error::Fetch {
                    uri: uri.to_string(),
                    reason: format!("malformed JSON: {}", e),
                })
            }
        }
    }

    /// Fetch a JSON document and deserialize it into `T`
    pub fn fetch_document<T: DeserializeOwned>(&self, uri: &str) -> Result<T> {
        let value = self.fetch_json(uri)?;
        serde_json::from_value(value).map_err(|e| Error::Fetch {
            uri: uri.to_string(),
            reason: format!("unexpected document structure: {}", e),
        })
    }

    /// Write the bytes at `uri` to `dest`, bypassing the cache
    pub fn download_to(
        &self,
        uri: &str,
        dest: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<()> {
        match classify(uri)? {
            Source::Local(path) => {
                tracing::debug!(uri = %uri, "reading local file");
                fs::copy(&path, dest).map_err(|e| Error::Fetch {
                    uri: uri.to_string(),
                    reason: e.to_string(),
                })?;
                Ok(())
            }
            Source::Http(url) => self.download_http(&url, dest, progress),
        }
    }

    fn download_http(
        &self,
        url: &str,
        dest: &Path,
        progress: Option<ProgressCallback>,
    ) -> Result<()> {
        tracing::debug!(url = %url, "downloading");
        let fetch_error = |reason: String| Error::Fetch {
            uri: url.to_string(),
            reason,
        };

        let mut response = self.client.get(url).send().map_err(|e| {
            if e.is_connect() {
                fetch_error("cannot connect to host".to_string())
            } else if e.is_timeout() {
                fetch_error("request timed out".to_string())
            } else {
                fetch_error(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(format!("HTTP {}", status.as_u16())));
        }

        let total = response.content_length().unwrap_or(0);
        let file_name = url.rsplit('/').next().unwrap_or(url).to_string();
        let message = format!("Downloading {}...", file_name);

        let mut file = File::create(dest)?;
        let mut buffer = vec![0; 8192];
        let mut bytes_processed: u64 = 0;

        loop {
            let bytes_read = response
                .read(&mut buffer)
                .map_err(|e| fetch_error(format!("failed to read response: {}", e)))?;
            if bytes_read == 0 {
                break;
            }
            file.write_all(&buffer[..bytes_read])?;
            bytes_processed += bytes_read as u64;

            if let Some(ref cb) = progress {
                cb(&message, bytes_processed, total);
            }
        }
        file.flush()?;

        if let Some(ref cb) = progress {
            cb(&format!("Downloaded {}", file_name), bytes_processed, bytes_processed);
        }

        Ok(())
    }
}
