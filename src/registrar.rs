//! Registration of retrieved objects
//!
//! After a successful retrieval the destination path is recorded so the rest
//! of the toolchain can find the new object. [`ManifestRegistrar`] appends it
//! to the matching list in `o3de_manifest.json`.

use crate::{Error, Manifest, ObjectKind, Result};
use std::path::{Path, PathBuf};

pub trait Registrar {
    fn register(&self, kind: ObjectKind, path: &Path) -> Result<()>;
}

/// Records registrations in the o3de manifest of a home folder
#[derive(Debug, Clone)]
pub struct ManifestRegistrar {
    home_folder: PathBuf,
}

impl ManifestRegistrar {
    pub fn new<P: AsRef<Path>>(home_folder: P) -> Self {
        Self {
            home_folder: home_folder.as_ref().to_path_buf(),
        }
    }
}

impl Registrar for ManifestRegistrar {
    fn register(&self, kind: ObjectKind, path: &Path) -> Result<()> {
        // Reload so registrations made since the manifest was first read survive
        let mut manifest = Manifest::load(&self.home_folder)
            .map_err(|e| Error::Registration(e.to_string()))?;

        if manifest.add_registered(kind, path) {
            manifest
                .save()
                .map_err(|e| Error::Registration(format!("{}: {}", path.display(), e)))?;
            tracing::info!(kind = %kind, path = %path.display(), "registered");
        } else {
            tracing::debug!(kind = %kind, path = %path.display(), "already registered");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_manifest_registrar_records_path() {
        let temp_dir = TempDir::new().unwrap();
        let registrar = ManifestRegistrar::new(temp_dir.path());
        let gem_path = temp_dir.path().join("O3DE/Gems/R/Foo");

        registrar.register(ObjectKind::Gem, &gem_path).unwrap();
        registrar.register(ObjectKind::Gem, &gem_path).unwrap();

        let manifest = Manifest::load(temp_dir.path()).unwrap();
        assert_eq!(manifest.registered(ObjectKind::Gem).len(), 1);
        assert!(manifest.registered(ObjectKind::Gem)[0].ends_with("O3DE/Gems/R/Foo"));
        assert!(manifest.registered(ObjectKind::Project).is_empty());
    }

    #[test]
    fn test_manifest_registrar_malformed_manifest() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join(".o3de");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(crate::manifest::MANIFEST_FILE_NAME), "[").unwrap();

        let registrar = ManifestRegistrar::new(temp_dir.path());
        let err = registrar
            .register(ObjectKind::Engine, Path::new("/engines/o3de"))
            .unwrap_err();
        assert!(matches!(err, Error::Registration(_)));
    }
}
