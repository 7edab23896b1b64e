//! Repository index and object descriptor documents
//!
//! A repository serves a `repo.json` index listing object URIs per kind plus
//! nested repository URIs. Each object URI serves a `<kind>.json` descriptor.
//!
//! # Examples
//!
//! ```
//! use o3de_fetch::{ObjectDescriptor, ObjectKind, RepositoryIndex};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let index: RepositoryIndex = serde_json::from_str(
//!     r#"{"repo_name": "community", "gems": ["https://example.com/gems/Foo"]}"#,
//! )?;
//! assert_eq!(index.objects(ObjectKind::Gem).len(), 1);
//!
//! let descriptor = ObjectDescriptor::from_document(
//!     ObjectKind::Gem,
//!     serde_json::json!({"gem_name": "Foo", "origin": "https://example.com/gems/Foo"}),
//!     "https://example.com/gems/Foo",
//! )?;
//! assert_eq!(descriptor.name, "Foo");
//! # Ok(())
//! # }
//! ```

use crate::{Error, ObjectKind, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Index document every repository serves
pub const REPO_INDEX_FILE: &str = "repo.json";

/// Join a repository or object URI with a file name
pub fn join_uri(base: &str, file_name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), file_name)
}

/// Parsed `repo.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryIndex {
    pub repo_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default)]
    pub engines: Vec<String>,
    #[serde(default)]
    pub projects: Vec<String>,
    #[serde(default)]
    pub gems: Vec<String>,
    #[serde(default)]
    pub templates: Vec<String>,
    #[serde(default)]
    pub restricted: Vec<String>,
    /// Nested repository URIs
    #[serde(default)]
    pub repos: Vec<String>,
}

impl RepositoryIndex {
    /// Object URIs advertised for `kind`, in declared order
    pub fn objects(&self, kind: ObjectKind) -> &[String] {
        match kind {
            ObjectKind::Engine => &self.engines,
            ObjectKind::Project => &self.projects,
            ObjectKind::Gem => &self.gems,
            ObjectKind::Template => &self.templates,
            ObjectKind::Restricted => &self.restricted,
        }
    }
}

/// Structural check of a raw `repo.json` before it is expanded
///
/// The document must be an object with string `repo_name` and `origin`
/// fields; every object list and `repos`, when present, must be an array of
/// strings.
pub fn validate_repository(document: &Value, uri: &str) -> Result<()> {
    let invalid = |reason: String| Error::InvalidRepository {
        uri: uri.to_string(),
        reason,
    };

    let object = document
        .as_object()
        .ok_or_else(|| invalid("repo.json is not a JSON object".to_string()))?;

    for required in ["repo_name", "origin"] {
        match object.get(required) {
            Some(Value::String(_)) => {}
            Some(_) => return Err(invalid(format!("\"{}\" must be a string", required))),
            None => return Err(invalid(format!("missing \"{}\"", required))),
        }
    }

    let list_keys = ObjectKind::ALL
        .iter()
        .map(|kind| kind.index_key())
        .chain(std::iter::once("repos"));
    for key in list_keys {
        if let Some(value) = object.get(key) {
            let all_strings = value
                .as_array()
                .map(|items| items.iter().all(Value::is_string))
                .unwrap_or(false);
            if !all_strings {
                return Err(invalid(format!("\"{}\" must be a list of URIs", key)));
            }
        }
    }

    Ok(())
}

/// How a resolved object is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorShape {
    /// Advertised through a repository index; retrieved as a zip bundle
    Bundle,
    /// Listed directly as a version-controlled source; retrieved by checkout
    Checkout,
}

/// A resolved object descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectDescriptor {
    pub kind: ObjectKind,
    pub name: String,
    pub origin: Option<String>,
    pub sha256: Option<String>,
    /// Name of the repository index the object was found in
    pub repo_name: Option<String>,
    /// Location the descriptor was found at
    pub o3de_object_uri: String,
    /// The descriptor exactly as advertised
    pub document: Map<String, Value>,
}

impl ObjectDescriptor {
    /// Build a descriptor from a fetched `<kind>.json` document
    pub fn from_document(kind: ObjectKind, document: Value, o3de_object_uri: &str) -> Result<Self> {
        let mut document = match document {
            Value::Object(map) => map,
            _ => {
                return Err(Error::InvalidDescriptor(format!(
                    "{} at {} is not a JSON object",
                    kind.descriptor_file(),
                    o3de_object_uri
                )))
            }
        };

        // Attached by resolution, never part of the advertised document
        document.remove("repo_name");
        document.remove("o3de_object_uri");

        let name = document
            .get(kind.name_field())
            .and_then(Value::as_str)
            .ok_or_else(|| {
                Error::InvalidDescriptor(format!(
                    "{} at {} has no \"{}\"",
                    kind.descriptor_file(),
                    o3de_object_uri,
                    kind.name_field()
                ))
            })?
            .to_string();

        let text_field = |key: &str| document.get(key).and_then(Value::as_str).map(String::from);
        let origin = text_field("origin");
        let sha256 = text_field("sha256");

        Ok(Self {
            kind,
            name,
            origin,
            sha256,
            repo_name: None,
            o3de_object_uri: o3de_object_uri.to_string(),
            document,
        })
    }

    pub fn with_repo_name(mut self, repo_name: &str) -> Self {
        self.repo_name = Some(repo_name.to_string());
        self
    }

    pub fn shape(&self) -> DescriptorShape {
        if self.repo_name.is_some() {
            DescriptorShape::Bundle
        } else {
            DescriptorShape::Checkout
        }
    }

    /// The advertised document without its checksum field
    pub fn document_without_checksum(&self) -> Value {
        let mut document = self.document.clone();
        document.remove("sha256");
        Value::Object(document)
    }
}
