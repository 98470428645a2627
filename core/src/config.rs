//! Sync engine configuration.
//!
//! Every externally-tunable knob lives here and is passed explicitly into
//! the sync entry points, rather than being read ambiently from deep inside
//! entity code. Field names double as the identifiers quoted in data-error
//! messages, so an operator can go straight from a log line to the setting.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::AssetKind;

const CONFIG_FILE: &str = "bynder-sync.json";
const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BynderConfig {
    /// Bynder instance domain, e.g. `org.bynder.com`
    pub domain: String,
    /// Permanent API token, passed through as a bearer credential
    pub api_token: String,

    /// Directory holding the database, media store and this file
    pub data_dir: PathBuf,

    /// Size ceilings for downloaded files, in bytes
    pub max_image_file_size: u64,
    pub max_document_file_size: u64,

    /// Bounding box converted source images must fit within
    pub max_source_image_width: u32,
    pub max_source_image_height: u32,

    /// Named thumbnail derivative used as the image source file. Bynder
    /// instances customise derivative naming, so this must match yours.
    pub image_source_derivative: String,
    /// Named video derivatives (streamable primary, optional fallback,
    /// poster image)
    pub video_primary_derivative: String,
    pub video_fallback_derivative: String,
    pub video_poster_derivative: String,

    /// Format conversion overrides, source extension to target extension,
    /// e.g. `"tiff": "png"`. Take precedence over the built-in table.
    pub format_conversions: HashMap<String, String>,

    /// Collection newly synced assets are filed under
    pub default_collection_name: String,

    /// Whether picking an already-synced asset triggers a freshness check
    pub sync_images_on_choose: bool,
    pub sync_documents_on_choose: bool,
    pub sync_videos_on_choose: bool,

    /// Wall-clock bound on any single HTTP call
    pub download_timeout_secs: u64,
}

impl Default for BynderConfig {
    fn default() -> Self {
        Self {
            domain: String::new(),
            api_token: String::new(),
            data_dir: PathBuf::from("bynder-sync-data"),
            max_image_file_size: 5 * MIB,
            max_document_file_size: 5 * MIB,
            max_source_image_width: bynder_sync_images::DEFAULT_MAX_SOURCE_WIDTH,
            max_source_image_height: bynder_sync_images::DEFAULT_MAX_SOURCE_HEIGHT,
            image_source_derivative: "WebSource".to_owned(),
            video_primary_derivative: "WebPrimary".to_owned(),
            video_fallback_derivative: "WebFallback".to_owned(),
            video_poster_derivative: "webimage".to_owned(),
            format_conversions: HashMap::new(),
            default_collection_name: "Imported from Bynder".to_owned(),
            sync_images_on_choose: false,
            sync_documents_on_choose: false,
            sync_videos_on_choose: false,
            download_timeout_secs: 20,
        }
    }
}

impl BynderConfig {
    /// Load configuration from the default data directory.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default().data_dir)
    }

    /// Load configuration from `data_dir`, creating a default file if none
    /// exists yet.
    pub fn load_from(data_dir: &Path) -> Result<Self> {
        let config_path = data_dir.join(CONFIG_FILE);
        if config_path.exists() {
            info!("Loading config from {:?}", config_path);
            let json = fs::read_to_string(&config_path)?;
            let mut config: Self = serde_json::from_str(&json)?;
            config.data_dir = data_dir.to_path_buf();
            Ok(config)
        } else {
            warn!("No config found, creating default at {:?}", config_path);
            let config = Self {
                data_dir: data_dir.to_path_buf(),
                ..Self::default()
            };
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to disk.
    pub fn save(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        let config_path = self.data_dir.join(CONFIG_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, json)?;
        info!("Saved config to {:?}", config_path);
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("library.db")
    }

    pub fn media_dir(&self) -> PathBuf {
        self.data_dir.join("media")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        fs::create_dir_all(self.media_dir())?;
        Ok(())
    }

    pub fn api_base_url(&self) -> String {
        format!("https://{}/api/v4", self.domain)
    }

    /// Whether a pick of an existing entity of `kind` should trigger a
    /// freshness check against Bynder.
    #[must_use]
    pub fn sync_on_choose(&self, kind: AssetKind) -> bool {
        match kind {
            AssetKind::Image => self.sync_images_on_choose,
            AssetKind::Document => self.sync_documents_on_choose,
            AssetKind::Video => self.sync_videos_on_choose,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_sensible() {
        let config = BynderConfig::default();
        assert_eq!(config.max_image_file_size, 5 * MIB);
        assert_eq!(config.max_source_image_width, 3500);
        assert_eq!(config.image_source_derivative, "WebSource");
        assert_eq!(config.video_poster_derivative, "webimage");
        assert!(!config.sync_on_choose(AssetKind::Image));
    }

    #[test]
    fn save_and_reload_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = BynderConfig::load_from(dir.path()).unwrap();
        config.domain = "org.bynder.com".to_owned();
        config.sync_videos_on_choose = true;
        config.save().unwrap();

        let reloaded = BynderConfig::load_from(dir.path()).unwrap();
        assert_eq!(reloaded.domain, "org.bynder.com");
        assert!(reloaded.sync_on_choose(AssetKind::Video));
        assert_eq!(reloaded.db_path(), dir.path().join("library.db"));
    }
}
