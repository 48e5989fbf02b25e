use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::backend::Backend;
use crate::error::Result;
use crate::models::AiProvider;

/// Application settings persisted by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppSettings {
    pub ai_provider: String,
    pub openai_api_key: Option<String>,
    pub save_directory: Option<PathBuf>,
    pub upscale_enabled: bool,
    pub upscale_factor: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            ai_provider: AiProvider::Pollinations.settings_key().to_string(),
            openai_api_key: None,
            save_directory: None,
            upscale_enabled: true,
            upscale_factor: 4,
        }
    }
}

impl AppSettings {
    /// Configured provider; unrecognised values fall back to the default.
    pub fn provider(&self) -> AiProvider {
        self.ai_provider.parse().unwrap_or_else(|e| {
            warn!("{e}, using {}", AiProvider::default());
            AiProvider::default()
        })
    }
}

/// Partial update; `None` leaves a field untouched. Nullable fields take
/// `Some(None)` to clear them.
#[derive(Debug, Clone, Default)]
pub struct SettingsPatch {
    pub ai_provider: Option<String>,
    pub openai_api_key: Option<Option<String>>,
    pub save_directory: Option<Option<PathBuf>>,
    pub upscale_enabled: Option<bool>,
    pub upscale_factor: Option<u32>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        self.ai_provider.is_none()
            && self.openai_api_key.is_none()
            && self.save_directory.is_none()
            && self.upscale_enabled.is_none()
            && self.upscale_factor.is_none()
    }
}

/// Live settings cache. Loaded once from the backend, written back only on
/// [`SettingsStore::save`].
#[derive(Debug, Default)]
pub struct SettingsStore {
    settings: AppSettings,
    loaded: bool,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn loaded(&self) -> bool {
        self.loaded
    }

    /// Fetch settings from the backend, using defaults when that fails.
    pub async fn load(&mut self, backend: &dyn Backend) {
        self.settings = match backend.get_settings().await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("failed to load settings, using defaults: {e}");
                AppSettings::default()
            }
        };
        self.loaded = true;
    }

    pub async fn save(&self, backend: &dyn Backend) -> Result<()> {
        backend.save_settings(&self.settings).await?;
        info!("settings saved");
        Ok(())
    }

    pub fn update(&mut self, patch: SettingsPatch) {
        let s = &mut self.settings;
        if let Some(provider) = patch.ai_provider {
            s.ai_provider = provider;
        }
        if let Some(key) = patch.openai_api_key {
            s.openai_api_key = key;
        }
        if let Some(dir) = patch.save_directory {
            s.save_directory = dir;
        }
        if let Some(enabled) = patch.upscale_enabled {
            s.upscale_enabled = enabled;
        }
        if let Some(factor) = patch.upscale_factor {
            s.upscale_factor = factor;
        }
    }
}
