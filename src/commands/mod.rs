pub mod cache;
pub mod download;
pub mod refresh;
pub mod search;

use anyhow::Result;
use o3de_fetch::{ContentCache, Fetcher, Manifest, Settings};
use std::path::PathBuf;

/// Settings, manifest and fetcher shared by every command
pub struct Context {
    pub settings: Settings,
    pub manifest: Manifest,
    pub fetcher: Fetcher,
}

impl Context {
    pub fn load(override_home_folder: Option<PathBuf>) -> Result<Self> {
        let settings = Settings::load()?;
        let home_folder = match override_home_folder {
            Some(folder) => folder,
            None => Manifest::default_home_folder()?,
        };
        let manifest = Manifest::load(&home_folder)?;
        let cache = ContentCache::new(manifest.cache_folder())?;
        let fetcher = Fetcher::new(cache, &settings)?;

        Ok(Self {
            settings,
            manifest,
            fetcher,
        })
    }
}
