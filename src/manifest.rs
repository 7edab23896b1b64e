//! The o3de manifest (`~/.o3de/o3de_manifest.json`)
//!
//! The manifest is the local state this crate reads: which repositories are
//! configured, where new objects land by default, and which object instances
//! are already registered. Resolution only reads it; the registrar is the one
//! component that writes it back.
//!
//! # Examples
//!
//! ```no_run
//! use o3de_fetch::{Manifest, ObjectKind};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manifest = Manifest::load(Manifest::default_home_folder()?)?;
//!
//! for repo in manifest.repos() {
//!     println!("repo: {}", repo);
//! }
//! println!("gems land in {}", manifest.default_folder(ObjectKind::Gem).display());
//! # Ok(())
//! # }
//! ```

use crate::{Error, ObjectKind, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const MANIFEST_FILE_NAME: &str = "o3de_manifest.json";

/// Serialized form of `o3de_manifest.json`
///
/// Fields this crate does not interpret are kept in `other` so a save never
/// drops them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManifestData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub o3de_manifest_name: Option<String>,

    /// Top-level repository URIs (each serves a `repo.json`)
    #[serde(default)]
    pub repos: Vec<String>,

    #[serde(default)]
    pub git_engine_repos: Vec<String>,
    #[serde(default)]
    pub git_project_repos: Vec<String>,
    #[serde(default)]
    pub git_gem_repos: Vec<String>,
    #[serde(default)]
    pub git_template_repos: Vec<String>,
    #[serde(default)]
    pub git_restricted_repos: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_engines_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_projects_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_gems_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_templates_folder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_restricted_folder: Option<String>,

    /// Registered object instances
    #[serde(default)]
    pub engines: Vec<String>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub external_subdirectories: Vec<String>,
    #[serde(default)]
    pub templates: Vec<String>,
    #[serde(default)]
    pub restricted: Vec<String>,

    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

/// A loaded manifest bound to the home folder it was read from
#[derive(Debug, Clone)]
pub struct Manifest {
    home_folder: PathBuf,
    pub data: ManifestData,
}

impl Manifest {
    /// Home folder used when none is given on the command line
    ///
    /// Uses O3DE_HOME if set, otherwise the user's home directory
    pub fn default_home_folder() -> Result<PathBuf> {
        if let Ok(home) = std::env::var("O3DE_HOME") {
            return Ok(PathBuf::from(shellexpand::tilde(&home).into_owned()));
        }

        dirs::home_dir().ok_or_else(|| Error::ManifestLoad {
            path: PathBuf::from(MANIFEST_FILE_NAME),
            reason: "Could not find home directory".to_string(),
        })
    }

    /// Create an empty manifest for a home folder without touching disk
    pub fn new<P: AsRef<Path>>(home_folder: P) -> Self {
        Self {
            home_folder: home_folder.as_ref().to_path_buf(),
            data: ManifestData::default(),
        }
    }

    /// Load `<home>/.o3de/o3de_manifest.json`
    ///
    /// A missing manifest is treated as an empty one; an unreadable or
    /// malformed one is a [`Error::ManifestLoad`].
    pub fn load<P: AsRef<Path>>(home_folder: P) -> Result<Self> {
        let home_folder = home_folder.as_ref().to_path_buf();
        let path = Self::manifest_path_for(&home_folder);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "no o3de manifest, using an empty one");
            return Ok(Self::new(home_folder));
        }

        let content = fs::read_to_string(&path).map_err(|e| Error::ManifestLoad {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let data: ManifestData =
            serde_json::from_str(&content).map_err(|e| Error::ManifestLoad {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self { home_folder, data })
    }

    /// Write the manifest back to `<home>/.o3de/o3de_manifest.json`
    pub fn save(&self) -> Result<()> {
        let path = self.manifest_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.data)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn manifest_path_for(home_folder: &Path) -> PathBuf {
        home_folder.join(".o3de").join(MANIFEST_FILE_NAME)
    }

    pub fn manifest_path(&self) -> PathBuf {
        Self::manifest_path_for(&self.home_folder)
    }

    pub fn home_folder(&self) -> &Path {
        &self.home_folder
    }

    /// Content cache directory (`<home>/.o3de/Cache`)
    pub fn cache_folder(&self) -> PathBuf {
        self.home_folder.join(".o3de").join("Cache")
    }

    /// Top-level repository URIs
    pub fn repos(&self) -> &[String] {
        &self.data.repos
    }

    /// Repositories that host objects of `kind` directly in version control
    pub fn git_repos(&self, kind: ObjectKind) -> &[String] {
        match kind {
            ObjectKind::Engine => &self.data.git_engine_repos,
            ObjectKind::Project => &self.data.git_project_repos,
            ObjectKind::Gem => &self.data.git_gem_repos,
            ObjectKind::Template => &self.data.git_template_repos,
            ObjectKind::Restricted => &self.data.git_restricted_repos,
        }
    }

    /// Folder new objects of `kind` are placed in when no destination is given
    pub fn default_folder(&self, kind: ObjectKind) -> PathBuf {
        let configured = match kind {
            ObjectKind::Engine => &self.data.default_engines_folder,
            ObjectKind::Project => &self.data.default_projects_folder,
            ObjectKind::Gem => &self.data.default_gems_folder,
            ObjectKind::Template => &self.data.default_templates_folder,
            ObjectKind::Restricted => &self.data.default_restricted_folder,
        };

        match configured {
            Some(folder) if !folder.is_empty() => {
                PathBuf::from(shellexpand::tilde(folder).into_owned())
            }
            _ => self
                .home_folder
                .join("O3DE")
                .join(kind.default_folder_name()),
        }
    }

    /// Registered instance paths of `kind`
    pub fn registered(&self, kind: ObjectKind) -> &[String] {
        match kind {
            ObjectKind::Engine => &self.data.engines,
            ObjectKind::Project => &self.data.projects,
            ObjectKind::Gem => &self.data.external_subdirectories,
            ObjectKind::Template => &self.data.templates,
            ObjectKind::Restricted => &self.data.restricted,
        }
    }

    /// Record a path under the list for `kind`; returns false if it was already there
    pub fn add_registered(&mut self, kind: ObjectKind, path: &Path) -> bool {
        let entry = path.to_string_lossy().replace('\\', "/");
        let list = match kind {
            ObjectKind::Engine => &mut self.data.engines,
            ObjectKind::Project => &mut self.data.projects,
            ObjectKind::Gem => &mut self.data.external_subdirectories,
            ObjectKind::Template => &mut self.data.templates,
            ObjectKind::Restricted => &mut self.data.restricted,
        };

        if list.iter().any(|existing| *existing == entry) {
            return false;
        }
        list.push(entry);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_manifest(home: &Path, content: &str) {
        let dir = home.join(".o3de");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(MANIFEST_FILE_NAME), content).unwrap();
    }

    #[test]
    fn test_load_missing_manifest_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = Manifest::load(temp_dir.path()).unwrap();
        assert!(manifest.repos().is_empty());
        assert!(manifest.git_repos(ObjectKind::Gem).is_empty());
        assert_eq!(
            manifest.cache_folder(),
            temp_dir.path().join(".o3de").join("Cache")
        );
    }

    #[test]
    fn test_load_manifest_lists() {
        let temp_dir = TempDir::new().unwrap();
        write_manifest(
            temp_dir.path(),
            r#"{
                "o3de_manifest_name": "me",
                "repos": ["https://a.example/repo", "https://b.example/repo"],
                "git_gem_repos": ["https://github.com/o3de/SomeGem"],
                "default_gems_folder": "/opt/gems",
                "external_subdirectories": ["/opt/gems/Existing"]
            }"#,
        );

        let manifest = Manifest::load(temp_dir.path()).unwrap();
        assert_eq!(manifest.repos().len(), 2);
        assert_eq!(
            manifest.git_repos(ObjectKind::Gem),
            &["https://github.com/o3de/SomeGem".to_string()]
        );
        assert!(manifest.git_repos(ObjectKind::Engine).is_empty());
        assert_eq!(
            manifest.default_folder(ObjectKind::Gem),
            PathBuf::from("/opt/gems")
        );
        assert_eq!(manifest.registered(ObjectKind::Gem).len(), 1);
    }

    #[test]
    fn test_default_folder_falls_back_to_home() {
        let temp_dir = TempDir::new().unwrap();
        let manifest = Manifest::new(temp_dir.path());
        assert_eq!(
            manifest.default_folder(ObjectKind::Project),
            temp_dir.path().join("O3DE").join("Projects")
        );
    }

    #[test]
    fn test_malformed_manifest() {
        let temp_dir = TempDir::new().unwrap();
        write_manifest(temp_dir.path(), "{ \"repos\": [");

        let err = Manifest::load(temp_dir.path()).unwrap_err();
        assert!(matches!(err, Error::ManifestLoad { .. }));
    }

    #[test]
    fn test_save_preserves_unknown_fields() {
        let temp_dir = TempDir::new().unwrap();
        write_manifest(
            temp_dir.path(),
            r#"{"repos": [], "default_third_party_folder": "/3p"}"#,
        );

        let mut manifest = Manifest::load(temp_dir.path()).unwrap();
        assert!(manifest.add_registered(ObjectKind::Template, Path::new("/t/One")));
        assert!(!manifest.add_registered(ObjectKind::Template, Path::new("/t/One")));
        manifest.save().unwrap();

        let reloaded = Manifest::load(temp_dir.path()).unwrap();
        assert_eq!(reloaded.registered(ObjectKind::Template), &["/t/One".to_string()]);
        assert_eq!(
            reloaded.data.other.get("default_third_party_folder"),
            Some(&serde_json::json!("/3p"))
        );
    }
}
