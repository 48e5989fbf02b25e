use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Result, WallcraftError};
use crate::models::WallpaperMode;
use crate::paths::WallcraftPaths;

/// Client-side configuration. Application settings proper (provider, keys,
/// upscaling) belong to the backend; see [`crate::settings`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub backend: BackendConfig,
    pub logging: LoggingConfig,
    pub generation: GenerationConfig,
}

impl ClientConfig {
    pub fn load(paths: &WallcraftPaths) -> Result<Self> {
        Self::load_from(&paths.config_file())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WallcraftError::Config(format!("failed to read {}: {e}", path.display())))?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file, or defaults when it is missing or invalid.
    pub fn load_or_default(paths: &WallcraftPaths) -> Self {
        let path = paths.config_file();
        if !path.exists() {
            debug!(path = %path.display(), "no client config, using defaults");
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), "invalid client config, using defaults: {e}");
                Self::default()
            }
        }
    }

    /// Write a default config file, creating the config directory. An
    /// existing file is only replaced with `force`.
    pub fn init(paths: &WallcraftPaths, force: bool) -> Result<PathBuf> {
        let path = paths.config_file();
        if path.exists() && !force {
            return Err(WallcraftError::Config(format!(
                "{} already exists",
                path.display()
            )));
        }
        paths.ensure_dirs()?;
        Self::default().save(paths)?;
        info!(path = %path.display(), "wrote default client config");
        Ok(path)
    }

    pub fn save(&self, paths: &WallcraftPaths) -> Result<()> {
        self.save_to(&paths.config_file())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| WallcraftError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, content)
            .map_err(|e| WallcraftError::Config(format!("failed to write {}: {e}", path.display())))
    }

    /// Configured socket, or the per-user default.
    pub fn socket_path(&self) -> PathBuf {
        self.backend
            .socket
            .clone()
            .unwrap_or_else(WallcraftPaths::socket_path)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub socket: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "wallcraft=info,wallcraft_core=info".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Canvas the provider renders at before any upscaling.
    pub width: u32,
    pub height: u32,
    pub wallpaper_mode: Option<WallpaperMode>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            wallpaper_mode: None,
        }
    }
}
