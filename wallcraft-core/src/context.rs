use std::sync::Arc;

use crate::backend::Backend;
use crate::error::Result;
use crate::generation::GenerationOrchestrator;
use crate::models::{AiProvider, GenerationRequest};
use crate::monitors::MonitorStore;
use crate::navigation::Navigation;
use crate::request::RequestBuilder;
use crate::settings::SettingsStore;
use crate::trial::TrialOrchestrator;

/// Everything a shell needs, built around one backend.
///
/// Callers must not start a new generation while one is running; the
/// orchestrator rejects the overlap with [`crate::error::WallcraftError::Busy`].
pub struct AppContext {
    pub backend: Arc<dyn Backend>,
    pub settings: SettingsStore,
    pub monitors: MonitorStore,
    pub navigation: Navigation,
    pub generation: GenerationOrchestrator,
    pub trial: TrialOrchestrator,
}

impl AppContext {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            generation: GenerationOrchestrator::new(Arc::clone(&backend)),
            trial: TrialOrchestrator::new(Arc::clone(&backend)),
            settings: SettingsStore::new(),
            monitors: MonitorStore::new(),
            navigation: Navigation::default(),
            backend,
        }
    }

    /// Load settings and detect monitors.
    pub async fn initialize(&mut self) {
        self.settings.load(self.backend.as_ref()).await;
        self.monitors.detect(self.backend.as_ref()).await;
    }

    /// Request builder preset with the configured provider and the monitor
    /// store's target resolution.
    pub fn request_builder(&self) -> RequestBuilder {
        let (target_width, target_height) = self.monitors.target_resolution();
        RequestBuilder::new()
            .provider(self.settings.settings().provider())
            .target(target_width, target_height)
    }

    /// Generate with the upscale settings from the settings store.
    pub async fn generate(&self, request: GenerationRequest) -> Result<()> {
        let settings = self.settings.settings();
        self.generation
            .generate(request, settings.upscale_enabled, settings.upscale_factor)
            .await
    }

    pub fn provider(&self) -> AiProvider {
        self.settings.settings().provider()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GenerationStatus;
    use crate::monitors::MonitorSelection;
    use crate::settings::SettingsPatch;
    use crate::testing::FakeBackend;

    #[tokio::test]
    async fn test_initialize_and_generate() {
        let backend = Arc::new(FakeBackend::new());
        let mut ctx = AppContext::new(backend.clone());
        ctx.initialize().await;
        assert!(ctx.settings.loaded());
        assert!(ctx.monitors.layout().is_some());

        ctx.monitors.set_selection(MonitorSelection::Spanning);
        ctx.settings.update(SettingsPatch {
            upscale_factor: Some(2),
            ..SettingsPatch::default()
        });

        let request = ctx
            .request_builder()
            .styles(["gradient"])
            .build()
            .unwrap();
        assert_eq!((request.target_width, request.target_height), (6400, 2160));
        assert_eq!(request.provider, ctx.provider());

        ctx.generate(request).await.unwrap();
        assert_eq!(ctx.generation.status(), GenerationStatus::Complete);
        assert_eq!(backend.state().upscale_requests[0].1, 2);
        assert_eq!(ctx.generation.result().unwrap().final_width, 2048);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_then_try() {
        let backend = Arc::new(FakeBackend::new());
        let mut ctx = AppContext::new(backend.clone());
        ctx.initialize().await;

        let request = ctx.request_builder().build().unwrap();
        ctx.generate(request).await.unwrap();
        let result = ctx.generation.result().unwrap();

        ctx.trial.try_wallpaper(result.path(), None).await.unwrap();
        assert!(ctx.trial.is_trying());
        ctx.trial.approve_try();
        assert_eq!(
            backend.state().wallpapers_set[0].0,
            result.image_path
        );
    }
}
