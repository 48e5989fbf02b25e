//! Time-boxed trial of a candidate wallpaper.
//!
//! A successful [`TrialOrchestrator::try_wallpaper`] applies the image and
//! starts a countdown. [`TrialOrchestrator::approve_try`] keeps the image;
//! [`TrialOrchestrator::cancel_try`] or the countdown reaching zero restores
//! the wallpaper the backend snapshotted before the trial.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::AbortHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::backend::{best_effort, Backend};
use crate::error::Result;
use crate::models::WallpaperMode;

/// Seconds the user has to approve a trial wallpaper.
pub const TRIAL_SECONDS: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrialState {
    pub active: bool,
    pub countdown: u32,
    /// A rollback to the previous wallpaper is still running.
    pub restoring: bool,
}

/// Recurring one-second tick of an active trial. Dropping the handle stops
/// the tick.
struct TrialTimer {
    task: AbortHandle,
}

impl TrialTimer {
    fn start(trial: TrialOrchestrator) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(1));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if trial.tick() == 0 {
                    trial.cancel_try().await;
                    return;
                }
            }
        });
        Self {
            task: handle.abort_handle(),
        }
    }
}

impl Drop for TrialTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct Inner {
    backend: Arc<dyn Backend>,
    state: watch::Sender<TrialState>,
    timer: Mutex<Option<TrialTimer>>,
    error: Mutex<Option<String>>,
}

#[derive(Clone)]
pub struct TrialOrchestrator {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TrialOrchestrator {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (state, _) = watch::channel(TrialState::default());
        Self {
            inner: Arc::new(Inner {
                backend,
                state,
                timer: Mutex::new(None),
                error: Mutex::new(None),
            }),
        }
    }

    pub fn is_trying(&self) -> bool {
        self.inner.state.borrow().active
    }

    pub fn countdown(&self) -> u32 {
        self.inner.state.borrow().countdown
    }

    pub fn error(&self) -> Option<String> {
        lock(&self.inner.error).clone()
    }

    pub fn is_restoring(&self) -> bool {
        self.inner.state.borrow().restoring
    }

    pub fn subscribe(&self) -> watch::Receiver<TrialState> {
        self.inner.state.subscribe()
    }

    /// Wait until no trial is active and no rollback is running.
    pub async fn wait_idle(&self) {
        let mut state = self.subscribe();
        let _ = state.wait_for(|s| !s.active && !s.restoring).await;
    }

    /// Apply `image_path` and start the approval countdown.
    ///
    /// The backend is first asked to snapshot the current wallpaper; that
    /// step may fail without consequence. A failure to set the wallpaper is
    /// returned and no trial starts.
    ///
    /// While a trial is running the new image replaces its candidate: the
    /// snapshot taken before the first candidate stays the restore target
    /// and the countdown starts over. If the replacement cannot be applied
    /// the running trial is cancelled.
    pub async fn try_wallpaper(&self, image_path: &Path, mode: Option<WallpaperMode>) -> Result<()> {
        // a rollback still in flight would land on top of the new candidate
        let _ = self.subscribe().wait_for(|s| !s.restoring).await;
        *lock(&self.inner.error) = None;

        let backend = &self.inner.backend;
        let replacing = self.is_trying();
        if replacing {
            debug!("replacing candidate of running trial");
            let previous = lock(&self.inner.timer).take();
            drop(previous);
        } else {
            best_effort("snapshot current wallpaper", backend.get_current_wallpaper()).await;
        }

        if let Err(e) = backend.set_wallpaper(image_path, mode).await {
            *lock(&self.inner.error) = Some(e.to_string());
            if replacing {
                self.cancel_try().await;
            }
            return Err(e);
        }

        self.inner.state.send_replace(TrialState {
            active: true,
            countdown: TRIAL_SECONDS,
            restoring: false,
        });
        *lock(&self.inner.timer) = Some(TrialTimer::start(self.clone()));
        info!(path = %image_path.display(), seconds = TRIAL_SECONDS, "wallpaper trial started");
        Ok(())
    }

    /// Keep the trial wallpaper.
    pub fn approve_try(&self) {
        self.end_session(false);
        info!("wallpaper trial approved");
    }

    /// Roll back to the snapshotted wallpaper. Also reached when the
    /// countdown expires.
    pub async fn cancel_try(&self) {
        self.end_session(true);
        info!("wallpaper trial cancelled, restoring previous wallpaper");

        // On expiry this runs inside the tick task, which end_session has
        // just aborted; the restore gets its own task so it still completes.
        let inner = Arc::clone(&self.inner);
        let restore = tokio::spawn(async move {
            best_effort("restore wallpaper", inner.backend.restore_wallpaper()).await;
            inner.state.send_modify(|s| s.restoring = false);
        });
        let _ = restore.await;
    }

    /// Release the timer and leave the trial state.
    fn end_session(&self, restoring: bool) {
        let timer = lock(&self.inner.timer).take();
        drop(timer);
        self.inner.state.send_replace(TrialState {
            active: false,
            countdown: 0,
            restoring,
        });
    }

    /// One countdown step; returns the seconds left.
    fn tick(&self) -> u32 {
        let mut remaining = 0;
        self.inner.state.send_modify(|s| {
            s.countdown = s.countdown.saturating_sub(1);
            remaining = s.countdown;
        });
        debug!(remaining, "trial tick");
        remaining
    }
}
