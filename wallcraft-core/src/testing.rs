//! In-memory backend for unit tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};

use crate::backend::Backend;
use crate::error::{Result, WallcraftError};
use crate::models::{
    GenerationRequest, GenerationResult, MonitorInfo, MonitorLayout, WallpaperMode,
};
use crate::settings::AppSettings;

pub(crate) const DEFAULT_WALLPAPER: &str = "/usr/share/backgrounds/default.png";

pub(crate) fn dual_monitor_layout() -> MonitorLayout {
    MonitorLayout::from_monitors(vec![
        MonitorInfo {
            name: "DP-1".into(),
            width: 3840,
            height: 2160,
            x: 0,
            y: 0,
            scale_factor: 1.5,
            is_primary: true,
        },
        MonitorInfo {
            name: "HDMI-A-1".into(),
            width: 2560,
            height: 1440,
            x: 3840,
            y: 0,
            scale_factor: 1.0,
            is_primary: false,
        },
    ])
}

pub(crate) fn square_result(side: u32) -> GenerationResult {
    GenerationResult {
        image_path: PathBuf::from("/cache/wallcraft/gen.png"),
        original_width: side,
        original_height: side,
        final_width: side,
        final_height: side,
        was_upscaled: false,
    }
}

pub(crate) struct FakeState {
    pub generate: std::result::Result<GenerationResult, String>,
    pub upscale: std::result::Result<PathBuf, String>,
    pub monitors: std::result::Result<MonitorLayout, String>,
    pub settings: AppSettings,
    pub fail_get_settings: bool,
    pub fail_snapshot: bool,
    pub fail_set_wallpaper: bool,
    pub fail_restore: bool,
    /// Time `restore_wallpaper` takes before touching the screen.
    pub restore_delay: Option<Duration>,

    /// Wallpaper currently shown.
    pub screen: PathBuf,
    /// What `get_current_wallpaper` last remembered for a restore.
    pub snapshot: Option<PathBuf>,
    pub calls: Vec<&'static str>,
    pub generate_requests: Vec<GenerationRequest>,
    pub upscale_requests: Vec<(PathBuf, u32)>,
    pub wallpapers_set: Vec<(PathBuf, Option<WallpaperMode>)>,
    pub saved_settings: Vec<AppSettings>,
    pub progress: Option<mpsc::Sender<String>>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            generate: Ok(square_result(1024)),
            upscale: Ok(PathBuf::from("/cache/wallcraft/gen_upscaled.png")),
            monitors: Ok(dual_monitor_layout()),
            settings: AppSettings::default(),
            fail_get_settings: false,
            fail_snapshot: false,
            fail_set_wallpaper: false,
            fail_restore: false,
            restore_delay: None,
            screen: PathBuf::from(DEFAULT_WALLPAPER),
            snapshot: None,
            calls: Vec::new(),
            generate_requests: Vec::new(),
            upscale_requests: Vec::new(),
            wallpapers_set: Vec::new(),
            saved_settings: Vec::new(),
            progress: None,
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    state: Mutex<FakeState>,
    /// When set, `generate_image` waits for a permit before answering.
    pub generate_gate: Option<Arc<Notify>>,
    /// When set, `upscale_image` waits for a permit before answering.
    pub upscale_gate: Option<Arc<Notify>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn count(&self, op: &str) -> usize {
        self.state().calls.iter().filter(|c| **c == op).count()
    }

    /// Push a notification on the subscribed progress channel.
    pub async fn push_progress(&self, payload: &str) {
        let tx = self.state().progress.clone().expect("no progress subscriber");
        tx.send(payload.to_string()).await.expect("progress receiver gone");
    }

    fn record(&self, op: &'static str) {
        self.state().calls.push(op);
    }
}

fn fail(message: &str) -> WallcraftError {
    WallcraftError::Backend(message.to_string())
}

#[async_trait]
impl Backend for FakeBackend {
    async fn generate_image(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        self.record("generate_image");
        self.state().generate_requests.push(request.clone());
        if let Some(gate) = &self.generate_gate {
            gate.notified().await;
        }
        self.state().generate.clone().map_err(|m| fail(&m))
    }

    async fn upscale_image(&self, input_path: &Path, scale: u32) -> Result<PathBuf> {
        self.record("upscale_image");
        self.state()
            .upscale_requests
            .push((input_path.to_path_buf(), scale));
        if let Some(gate) = &self.upscale_gate {
            gate.notified().await;
        }
        self.state().upscale.clone().map_err(|m| fail(&m))
    }

    async fn get_monitors(&self) -> Result<MonitorLayout> {
        self.record("get_monitors");
        self.state().monitors.clone().map_err(|m| fail(&m))
    }

    async fn get_settings(&self) -> Result<AppSettings> {
        self.record("get_settings");
        let state = self.state();
        if state.fail_get_settings {
            return Err(fail("Failed to read settings"));
        }
        Ok(state.settings.clone())
    }

    async fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        self.record("save_settings");
        self.state().saved_settings.push(settings.clone());
        Ok(())
    }

    async fn get_current_wallpaper(&self) -> Result<PathBuf> {
        self.record("get_current_wallpaper");
        let mut state = self.state();
        if state.fail_snapshot {
            return Err(fail("Failed to get wallpaper"));
        }
        state.snapshot = Some(state.screen.clone());
        Ok(state.screen.clone())
    }

    async fn set_wallpaper(&self, path: &Path, mode: Option<WallpaperMode>) -> Result<()> {
        self.record("set_wallpaper");
        let mut state = self.state();
        if state.fail_set_wallpaper {
            return Err(fail("Failed to set wallpaper"));
        }
        state.wallpapers_set.push((path.to_path_buf(), mode));
        state.screen = path.to_path_buf();
        Ok(())
    }

    async fn restore_wallpaper(&self) -> Result<()> {
        self.record("restore_wallpaper");
        let delay = self.state().restore_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let mut state = self.state();
        if state.fail_restore {
            return Err(fail("No previous wallpaper saved"));
        }
        if let Some(previous) = state.snapshot.clone() {
            state.screen = previous;
        }
        Ok(())
    }

    async fn subscribe_progress(&self) -> Result<mpsc::Receiver<String>> {
        self.record("subscribe_progress");
        let (tx, rx) = mpsc::channel(8);
        self.state().progress = Some(tx);
        Ok(rx)
    }

    fn name(&self) -> &str {
        "fake"
    }
}
