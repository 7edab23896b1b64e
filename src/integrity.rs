//! Bundle integrity verification
//!
//! A downloaded bundle is accepted only when two independent checks pass:
//!
//! 1. The SHA256 of the zip bytes equals the advertised `sha256`.
//! 2. The descriptor embedded in the zip matches the advertised descriptor
//!    (minus its `sha256`) after both are normalized to canonical JSON.
//!
//! A descriptor without `sha256` skips the first check with a security
//! warning; the result is then [`Verification::Unverified`]. Any failure
//! deletes the bundle so a poisoned file never stays in the cache.
//!
//! # Examples
//!
//! ```no_run
//! use o3de_fetch::{verify_bundle, ObjectDescriptor, ObjectKind};
//! use std::path::Path;
//!
//! # fn run(descriptor: &ObjectDescriptor) -> Result<(), Box<dyn std::error::Error>> {
//! let bundle = Path::new("/home/me/.o3de/Cache/abc.zip");
//! verify_bundle(descriptor, bundle, &ObjectKind::Gem.descriptor_file())?;
//! # Ok(())
//! # }
//! ```

use crate::fetcher::ProgressCallback;
use crate::{sha256_hex, Error, ObjectDescriptor, Result};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;

/// Outcome of a successful verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    /// Checksum and embedded descriptor both matched
    Verified,
    /// The descriptor advertised no checksum; only the embedded descriptor was compared
    Unverified,
}

/// Rebuild `value` with every object's keys in sorted order
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (key, item) in entries {
                sorted.insert(key.clone(), canonicalize(item));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Canonical serialization: sorted keys, fixed indentation
pub fn canonical_json(value: &Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(&canonicalize(value))?)
}

/// SHA256 of the canonical serialization of `value`
pub fn canonical_digest(value: &Value) -> Result<String> {
    Ok(sha256_hex(&canonical_json(value)?))
}

/// Verify a file's SHA256 checksum
///
/// # Arguments
///
/// * `path` - File to hash
/// * `expected_checksum` - Expected SHA256 checksum (hex string, any case)
/// * `progress` - Optional callback for progress updates
pub fn verify_checksum<P: AsRef<Path>>(
    path: P,
    expected_checksum: &str,
    progress: Option<ProgressCallback>,
) -> Result<()> {
    let path = path.as_ref();

    if expected_checksum.is_empty() {
        return Err(Error::Integrity("Empty checksum".to_string()));
    }

    if let Some(ref cb) = progress {
        cb("Verifying checksum...", 0, 100);
    }

    let file_size = fs::metadata(path)?.len();
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0; 8192];
    let mut bytes_processed: u64 = 0;

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        bytes_processed += bytes_read as u64;

        if let Some(ref cb) = progress {
            cb("Verifying checksum...", bytes_processed, file_size);
        }
    }

    let computed_hash = hex::encode(hasher.finalize());

    if computed_hash.eq_ignore_ascii_case(expected_checksum) {
        if let Some(ref cb) = progress {
            cb("Checksum verified", file_size, file_size);
        }
        Ok(())
    } else {
        Err(Error::Integrity(format!(
            "Downloaded zip sha256 does not match the advertised sha256\nExpected: {}\nComputed: {}",
            expected_checksum, computed_hash
        )))
    }
}

/// Read and parse one JSON file from the root of a zip bundle
pub fn read_embedded_descriptor(bundle_path: &Path, file_name: &str) -> Result<Value> {
    let file = File::open(bundle_path)?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| Error::Integrity(format!("{} is not a valid zip: {}", bundle_path.display(), e)))?;

    let mut entry = archive.by_name(file_name).map_err(|_| {
        Error::Integrity(format!(
            "{} is missing from {}",
            file_name,
            bundle_path.display()
        ))
    })?;

    let mut content = Vec::new();
    entry.read_to_end(&mut content)?;
    serde_json::from_slice(&content)
        .map_err(|e| Error::Integrity(format!("embedded {} is not valid JSON: {}", file_name, e)))
}

fn check_bundle(
    descriptor: &ObjectDescriptor,
    bundle_path: &Path,
    embedded_name: &str,
    progress: Option<ProgressCallback>,
) -> Result<Verification> {
    let verification = match descriptor.sha256.as_deref() {
        Some(expected) => {
            verify_checksum(bundle_path, expected, progress)?;
            Verification::Verified
        }
        None => {
            tracing::warn!(
                object = %descriptor.name,
                uri = %descriptor.o3de_object_uri,
                "SECURITY WARNING: the advertised object has no \"sha256\"; \
                 it cannot be verified to be the advertised object"
            );
            Verification::Unverified
        }
    };

    let mut embedded = read_embedded_descriptor(bundle_path, embedded_name)?;
    if let Some(map) = embedded.as_object_mut() {
        map.remove("sha256");
    }
    let advertised_digest = canonical_digest(&descriptor.document_without_checksum())?;
    let embedded_digest = canonical_digest(&embedded)?;

    if advertised_digest != embedded_digest {
        return Err(Error::Integrity(format!(
            "{} inside the bundle does not match the advertised {}",
            embedded_name, embedded_name
        )));
    }

    Ok(verification)
}

/// Verify a downloaded bundle against its descriptor
///
/// On failure the bundle file is deleted before the error is returned.
pub fn verify_bundle(
    descriptor: &ObjectDescriptor,
    bundle_path: &Path,
    embedded_name: &str,
) -> Result<Verification> {
    verify_bundle_with_progress(descriptor, bundle_path, embedded_name, None)
}

pub fn verify_bundle_with_progress(
    descriptor: &ObjectDescriptor,
    bundle_path: &Path,
    embedded_name: &str,
    progress: Option<ProgressCallback>,
) -> Result<Verification> {
    match check_bundle(descriptor, bundle_path, embedded_name, progress) {
        Ok(verification) => Ok(verification),
        Err(e) => {
            tracing::error!(path = %bundle_path.display(), error = %e, "bundle failed verification, deleting it");
            if let Err(remove_err) = fs::remove_file(bundle_path) {
                if remove_err.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(path = %bundle_path.display(), error = %remove_err, "failed to delete bundle");
                }
            }
            Err(e)
        }
    }
}
