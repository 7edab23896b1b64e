//! Test utilities and helpers for o3de-fetch integration tests.
//!
//! This module provides isolated home folders, file-backed repositories and
//! bundle builders shared by the integration tests.

#![allow(dead_code)]

use o3de_fetch::{sha256_hex, ContentCache, Fetcher, Manifest, ObjectKind, Settings};
use serde_json::{json, Value};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An isolated o3de home folder
pub struct TestHome {
    pub temp_dir: TempDir,
    pub home: PathBuf,
    pub config_dir: PathBuf,
}

impl TestHome {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let home = temp_dir.path().join("home");
        let config_dir = home.join(".o3de");

        fs::create_dir_all(&config_dir).expect("Failed to create config directory");

        Self {
            temp_dir,
            home,
            config_dir,
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write an o3de_manifest.json registering `repos`
    pub fn register_repos(&self, repos: &[String]) {
        let manifest = json!({
            "o3de_manifest_name": "test",
            "repos": repos,
        });
        fs::write(
            self.config_dir.join("o3de_manifest.json"),
            serde_json::to_string_pretty(&manifest).unwrap(),
        )
        .expect("Failed to write manifest");
    }

    pub fn manifest(&self) -> Manifest {
        Manifest::load(&self.home).expect("Failed to load manifest")
    }

    pub fn fetcher(&self) -> Fetcher {
        let manifest = self.manifest();
        let cache = ContentCache::new(manifest.cache_folder()).expect("Failed to create cache");
        Fetcher::new(cache, &Settings::default()).expect("Failed to create fetcher")
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.config_dir.join("Cache")
    }

    /// Every file under the home folder, relative to it
    pub fn files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&self.home)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| e.path().strip_prefix(&self.home).unwrap().to_path_buf())
            .collect();
        files.sort();
        files
    }
}

impl Default for TestHome {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a zip bundle holding `<kind>.json` plus `files`
pub fn build_bundle(kind: ObjectKind, embedded: &Value, files: &[(&str, &str)]) -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::FileOptions::default();

    zip.start_file(kind.descriptor_file(), options).unwrap();
    zip.write_all(serde_json::to_string_pretty(embedded).unwrap().as_bytes())
        .unwrap();
    for (name, content) in files {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }

    zip.finish().unwrap().into_inner()
}

/// Advertised descriptor and matching bundle for an object served at `origin`
pub fn object_with_bundle(
    kind: ObjectKind,
    name: &str,
    origin: &str,
    files: &[(&str, &str)],
) -> (Value, Vec<u8>) {
    let mut descriptor = json!({
        kind.name_field(): name,
        "origin": origin,
        "summary": format!("The {} {}", name, kind),
    });
    let bundle = build_bundle(kind, &descriptor, files);
    descriptor["sha256"] = json!(sha256_hex(&bundle));
    (descriptor, bundle)
}

/// A repository laid out on the local file system
pub struct TestRepository {
    pub root: PathBuf,
    index: Value,
}

impl TestRepository {
    pub fn new(root: &Path, repo_name: &str) -> Self {
        fs::create_dir_all(root).expect("Failed to create repository dir");
        let repo = Self {
            root: root.to_path_buf(),
            index: json!({
                "repo_name": repo_name,
                "origin": format!("https://{}.example", repo_name.to_lowercase()),
                "gems": [],
                "projects": [],
                "engines": [],
                "templates": [],
                "restricted": [],
                "repos": [],
            }),
        };
        repo.write_index();
        repo
    }

    pub fn uri(&self) -> String {
        self.root.to_string_lossy().to_string()
    }

    /// Publish an object with a bundle; returns its folder
    pub fn add_object(&mut self, kind: ObjectKind, name: &str, files: &[(&str, &str)]) -> PathBuf {
        let object_dir = self.root.join(name);
        fs::create_dir_all(&object_dir).expect("Failed to create object dir");
        let origin = object_dir.to_string_lossy().to_string();

        let (descriptor, bundle) = object_with_bundle(kind, name, &origin, files);
        fs::write(
            object_dir.join(kind.descriptor_file()),
            serde_json::to_string_pretty(&descriptor).unwrap(),
        )
        .expect("Failed to write descriptor");
        fs::write(object_dir.join(kind.bundle_file()), bundle).expect("Failed to write bundle");

        self.push(kind.index_key(), origin);
        object_dir
    }

    pub fn add_nested(&mut self, uri: &str) {
        self.push("repos", uri.to_string());
    }

    /// Overwrite the bundle of an object with different bytes
    pub fn tamper_bundle(&self, kind: ObjectKind, name: &str) {
        let path = self.root.join(name).join(kind.bundle_file());
        let mut bytes = fs::read(&path).expect("Failed to read bundle");
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        fs::write(&path, bytes).expect("Failed to write bundle");
    }

    pub fn set_index(&mut self, index: Value) {
        self.index = index;
        self.write_index();
    }

    fn push(&mut self, key: &str, value: String) {
        self.index[key]
            .as_array_mut()
            .expect("index list")
            .push(json!(value));
        self.write_index();
    }

    fn write_index(&self) {
        fs::write(
            self.root.join("repo.json"),
            serde_json::to_string_pretty(&self.index).unwrap(),
        )
        .expect("Failed to write repo.json");
    }
}

/// Assertions for test results
pub mod assertions {
    use std::path::Path;

    /// Assert directory exists
    pub fn dir_exists(path: &Path) {
        assert!(
            path.exists() && path.is_dir(),
            "Directory should exist: {:?}",
            path
        );
    }

    /// Assert directory does not exist
    pub fn dir_not_exists(path: &Path) {
        assert!(!path.exists(), "Directory should not exist: {:?}", path);
    }

    /// Assert file exists
    pub fn file_exists(path: &Path) {
        assert!(
            path.exists() && path.is_file(),
            "File should exist: {:?}",
            path
        );
    }

    /// Assert that a file contains a specific string
    pub fn file_contains(path: &Path, expected: &str) {
        let content = std::fs::read_to_string(path)
            .unwrap_or_else(|_| panic!("Failed to read file: {:?}", path));
        assert!(
            content.contains(expected),
            "File {:?} should contain '{}', but content was:\n{}",
            path,
            expected,
            content
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_creation() {
        let home = TestHome::new();
        assert!(home.config_dir.exists());
        assert!(home.manifest().repos().is_empty());
    }

    #[test]
    fn test_repository_layout() {
        let home = TestHome::new();
        let mut repo = TestRepository::new(&home.path().join("remote/r"), "R");
        let foo = repo.add_object(ObjectKind::Gem, "Foo", &[("Code/foo.cpp", "// foo")]);

        assert!(foo.join("gem.json").is_file());
        assert!(foo.join("gem.zip").is_file());

        let index: Value =
            serde_json::from_str(&fs::read_to_string(repo.root.join("repo.json")).unwrap())
                .unwrap();
        assert_eq!(index["gems"][0], json!(foo.to_string_lossy()));
    }
}
