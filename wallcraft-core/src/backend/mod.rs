pub mod ipc;

use std::future::Future;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::warn;

use crate::error::Result;
use crate::models::{GenerationRequest, GenerationResult, MonitorLayout, WallpaperMode};
use crate::settings::AppSettings;

/// Name of the out-of-band event carrying generation status strings.
pub const GENERATION_PROGRESS_EVENT: &str = "generation-progress";

/// Operations the external backend performs on behalf of the client.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn generate_image(&self, request: &GenerationRequest) -> Result<GenerationResult>;
    async fn upscale_image(&self, input_path: &Path, scale: u32) -> Result<PathBuf>;
    async fn get_monitors(&self) -> Result<MonitorLayout>;
    async fn get_settings(&self) -> Result<AppSettings>;
    async fn save_settings(&self, settings: &AppSettings) -> Result<()>;
    /// Also makes the backend remember this wallpaper for `restore_wallpaper`.
    async fn get_current_wallpaper(&self) -> Result<PathBuf>;
    async fn set_wallpaper(&self, path: &Path, mode: Option<WallpaperMode>) -> Result<()>;
    async fn restore_wallpaper(&self) -> Result<()>;
    /// Stream of `generation-progress` payloads.
    async fn subscribe_progress(&self) -> Result<mpsc::Receiver<String>>;
    fn name(&self) -> &str;
}

/// Run an operation whose failure must not affect the caller: errors are
/// logged and turned into `None`.
pub async fn best_effort<T, F>(operation: &str, fut: F) -> Option<T>
where
    F: Future<Output = Result<T>>,
{
    match fut.await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(operation, "best-effort call failed: {e}");
            None
        }
    }
}
