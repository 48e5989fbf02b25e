//! Generation pipeline: generate, optionally upscale, complete.
//!
//! Status lives in a single `watch` cell with two writers: the pipeline
//! driver and the progress listener fed by the backend's notification
//! channel. Whichever writes last wins, so a late notification may
//! overwrite `complete` or `error`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::{Result, WallcraftError};
use crate::models::{GenerationRequest, GenerationResult, GenerationStatus};
use crate::request::prompt_text;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Generation,
    Upscale,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generation => write!(f, "generation"),
            Self::Upscale => write!(f, "upscale"),
        }
    }
}

/// Failure of one pipeline step, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    pub message: String,
}

#[derive(Debug)]
struct PipelineState {
    result: Option<GenerationResult>,
    error: Option<PipelineError>,
    last_request: Option<GenerationRequest>,
    last_upscale_enabled: bool,
    last_upscale_factor: u32,
    in_flight: bool,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            result: None,
            error: None,
            last_request: None,
            last_upscale_enabled: false,
            last_upscale_factor: 4,
            in_flight: false,
        }
    }
}

struct Inner {
    backend: Arc<dyn Backend>,
    status: watch::Sender<GenerationStatus>,
    state: Mutex<PipelineState>,
    listening: AtomicBool,
}

/// Drives generation requests through the backend. Cloning yields another
/// handle to the same state.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    inner: Arc<Inner>,
}

/// Clears the in-flight flag however the pipeline future ends.
struct InFlight<'a>(&'a GenerationOrchestrator);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.state().in_flight = false;
    }
}

impl GenerationOrchestrator {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (status, _) = watch::channel(GenerationStatus::Idle);
        Self {
            inner: Arc::new(Inner {
                backend,
                status,
                state: Mutex::new(PipelineState::default()),
                listening: AtomicBool::new(false),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, PipelineState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, status: GenerationStatus) {
        self.inner.status.send_replace(status);
    }

    pub fn status(&self) -> GenerationStatus {
        *self.inner.status.borrow()
    }

    /// Watch status changes from either writer.
    pub fn subscribe(&self) -> watch::Receiver<GenerationStatus> {
        self.inner.status.subscribe()
    }

    pub fn result(&self) -> Option<GenerationResult> {
        self.state().result.clone()
    }

    pub fn error(&self) -> Option<PipelineError> {
        self.state().error.clone()
    }

    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.state().last_request.clone()
    }

    pub fn can_regenerate(&self) -> bool {
        self.state().last_request.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.state().in_flight
    }

    /// Run the pipeline for `request`.
    ///
    /// Step failures end up in [`Self::error`] with status `error`; the only
    /// `Err` returned is [`WallcraftError::Busy`] when another pipeline of
    /// this orchestrator is still running, in which case nothing changes.
    pub async fn generate(
        &self,
        request: GenerationRequest,
        upscale_enabled: bool,
        upscale_factor: u32,
    ) -> Result<()> {
        {
            let mut state = self.state();
            if state.in_flight {
                return Err(WallcraftError::Busy);
            }
            state.in_flight = true;
            state.last_request = Some(request.clone());
            state.last_upscale_enabled = upscale_enabled;
            state.last_upscale_factor = upscale_factor;
            state.result = None;
            state.error = None;
        }
        let _in_flight = InFlight(self);
        self.set_status(GenerationStatus::Starting);
        debug!(prompt = %prompt_text(&request), "generation prompt");
        info!(
            backend = self.inner.backend.name(),
            provider = %request.provider,
            width = request.width,
            height = request.height,
            upscale_enabled,
            upscale_factor,
            "generation started"
        );

        let backend = &self.inner.backend;
        let generated = match backend.generate_image(&request).await {
            Ok(result) => result,
            Err(e) => {
                self.fail(PipelineStage::Generation, e);
                return Ok(());
            }
        };
        self.state().result = Some(generated.clone());

        if upscale_enabled {
            self.set_status(GenerationStatus::Upscaling);
            match backend
                .upscale_image(generated.path(), upscale_factor)
                .await
            {
                Ok(path) => {
                    self.state().result = Some(generated.upscaled(path, upscale_factor));
                }
                Err(e) => {
                    self.fail(PipelineStage::Upscale, e);
                    return Ok(());
                }
            }
        }

        self.set_status(GenerationStatus::Complete);
        if let Some(result) = self.result() {
            info!(
                path = %result.image_path.display(),
                width = result.final_width,
                height = result.final_height,
                upscaled = result.was_upscaled,
                "generation complete"
            );
        }
        Ok(())
    }

    fn fail(&self, stage: PipelineStage, error: WallcraftError) {
        warn!(%stage, "generation failed: {error}");
        {
            let mut state = self.state();
            state.result = None;
            state.error = Some(PipelineError {
                stage,
                message: error.to_string(),
            });
        }
        self.set_status(GenerationStatus::Error);
    }

    /// Replay the last request with its upscale settings. No-op when nothing
    /// has been generated yet.
    pub async fn regenerate(&self) -> Result<()> {
        let replay = {
            let state = self.state();
            state.last_request.clone().map(|request| {
                (request, state.last_upscale_enabled, state.last_upscale_factor)
            })
        };
        let Some((request, upscale_enabled, upscale_factor)) = replay else {
            debug!("regenerate requested without a previous request");
            return Ok(());
        };
        self.generate(request, upscale_enabled, upscale_factor).await
    }

    /// Back to `idle`. The last request is kept so a retry stays possible.
    pub fn reset(&self) {
        {
            let mut state = self.state();
            state.result = None;
            state.error = None;
        }
        self.set_status(GenerationStatus::Idle);
    }

    /// Apply one progress notification to the status cell.
    pub fn apply_progress(&self, payload: &str) {
        match payload.parse::<GenerationStatus>() {
            Ok(status) => {
                debug!(%status, "progress notification");
                self.set_status(status);
            }
            Err(e) => warn!("ignoring progress notification: {e}"),
        }
    }

    /// Subscribe to the backend's progress notifications. Only the first call
    /// subscribes; later calls return `Ok(None)`.
    pub async fn listen_progress(&self) -> Result<Option<JoinHandle<()>>> {
        if self.inner.listening.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }

        let mut rx = match self.inner.backend.subscribe_progress().await {
            Ok(rx) => rx,
            Err(e) => {
                self.inner.listening.store(false, Ordering::SeqCst);
                return Err(e);
            }
        };

        let this = self.clone();
        let handle = tokio::spawn(async move {
            while let Some(payload) = rx.recv().await {
                this.apply_progress(&payload);
            }
            debug!("progress channel closed");
        });
        Ok(Some(handle))
    }
}
