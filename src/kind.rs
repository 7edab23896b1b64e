//! Object kinds advertised by repositories
//!
//! Every lookup is parameterised by an [`ObjectKind`]. The kind knows which
//! manifest list holds its version-control repositories, which document a
//! repository index lists it under, and what the descriptor and bundle files
//! are called.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    Engine,
    Project,
    Gem,
    Template,
    Restricted,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 5] = [
        ObjectKind::Engine,
        ObjectKind::Project,
        ObjectKind::Gem,
        ObjectKind::Template,
        ObjectKind::Restricted,
    ];

    /// Singular name used in file names (`gem.json`, `gem.zip`)
    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Engine => "engine",
            ObjectKind::Project => "project",
            ObjectKind::Gem => "gem",
            ObjectKind::Template => "template",
            ObjectKind::Restricted => "restricted",
        }
    }

    /// Field of the descriptor holding the object's name
    pub fn name_field(self) -> &'static str {
        match self {
            ObjectKind::Engine => "engine_name",
            ObjectKind::Project => "project_name",
            ObjectKind::Gem => "gem_name",
            ObjectKind::Template => "template_name",
            ObjectKind::Restricted => "restricted_name",
        }
    }

    /// Descriptor document published next to every object
    pub fn descriptor_file(self) -> String {
        format!("{}.json", self.as_str())
    }

    /// Archive published under the descriptor's origin
    pub fn bundle_file(self) -> String {
        format!("{}.zip", self.as_str())
    }

    /// List key inside a repository index (`repo.json`)
    pub fn index_key(self) -> &'static str {
        match self {
            ObjectKind::Engine => "engines",
            ObjectKind::Project => "projects",
            ObjectKind::Gem => "gems",
            ObjectKind::Template => "templates",
            ObjectKind::Restricted => "restricted",
        }
    }

    /// Manifest list of repositories that host this kind directly in version control
    pub fn git_repos_key(self) -> &'static str {
        match self {
            ObjectKind::Engine => "git_engine_repos",
            ObjectKind::Project => "git_project_repos",
            ObjectKind::Gem => "git_gem_repos",
            ObjectKind::Template => "git_template_repos",
            ObjectKind::Restricted => "git_restricted_repos",
        }
    }

    /// Manifest list that registered instances of this kind are recorded in
    pub fn registration_key(self) -> &'static str {
        match self {
            ObjectKind::Engine => "engines",
            ObjectKind::Project => "projects",
            ObjectKind::Gem => "external_subdirectories",
            ObjectKind::Template => "templates",
            ObjectKind::Restricted => "restricted",
        }
    }

    /// Manifest field overriding where new instances land by default
    pub fn default_folder_key(self) -> &'static str {
        match self {
            ObjectKind::Engine => "default_engines_folder",
            ObjectKind::Project => "default_projects_folder",
            ObjectKind::Gem => "default_gems_folder",
            ObjectKind::Template => "default_templates_folder",
            ObjectKind::Restricted => "default_restricted_folder",
        }
    }

    /// Folder under `<home>/O3DE` used when the manifest has no override
    pub fn default_folder_name(self) -> &'static str {
        match self {
            ObjectKind::Engine => "Engines",
            ObjectKind::Project => "Projects",
            ObjectKind::Gem => "Gems",
            ObjectKind::Template => "Templates",
            ObjectKind::Restricted => "Restricted",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let lowered = s.to_ascii_lowercase();
        let trimmed = lowered.strip_suffix('s').unwrap_or(&lowered);
        ObjectKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == trimmed || kind.as_str() == lowered)
            .ok_or_else(|| crate::Error::Config(format!("Unknown object kind '{}'", s)))
    }
}
