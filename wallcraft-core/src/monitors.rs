use tracing::{info, warn};

use crate::backend::Backend;
use crate::models::{MonitorInfo, MonitorLayout};

pub const FALLBACK_RESOLUTION: (u32, u32) = (1920, 1080);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorSelection {
    /// Target a single monitor by index.
    #[default]
    Individual,
    /// Target the bounding box of all monitors.
    Spanning,
}

/// Cached monitor layout plus the user's target selection.
#[derive(Debug, Default)]
pub struct MonitorStore {
    layout: Option<MonitorLayout>,
    loading: bool,
    error: Option<String>,
    selection: MonitorSelection,
    selected_index: usize,
    resolution_override: Option<(u32, u32)>,
}

impl MonitorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layout(&self) -> Option<&MonitorLayout> {
        self.layout.as_ref()
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selection(&self) -> MonitorSelection {
        self.selection
    }

    pub fn set_selection(&mut self, selection: MonitorSelection) {
        self.selection = selection;
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn select_monitor(&mut self, index: usize) {
        self.selected_index = index;
    }

    /// An explicit resolution that wins over any monitor selection.
    pub fn set_resolution_override(&mut self, resolution: Option<(u32, u32)>) {
        self.resolution_override = resolution;
    }

    /// Re-detect monitors. A failure keeps the previous layout and is exposed
    /// through [`MonitorStore::error`].
    pub async fn detect(&mut self, backend: &dyn Backend) {
        self.loading = true;
        self.error = None;

        match backend.get_monitors().await {
            Ok(layout) => {
                info!(
                    count = layout.monitors.len(),
                    total_width = layout.total_width,
                    total_height = layout.total_height,
                    "monitors detected"
                );
                self.layout = Some(layout);
            }
            Err(e) => {
                warn!("monitor detection failed: {e}");
                self.error = Some(e.to_string());
            }
        }

        self.loading = false;
    }

    pub fn selected_monitor(&self) -> Option<&MonitorInfo> {
        self.layout
            .as_ref()
            .and_then(|l| l.monitors.get(self.selected_index))
    }

    /// Resolution the generated wallpaper should end up at.
    pub fn target_resolution(&self) -> (u32, u32) {
        if let Some(resolution) = self.resolution_override {
            return resolution;
        }
        let Some(layout) = &self.layout else {
            return FALLBACK_RESOLUTION;
        };
        match self.selection {
            MonitorSelection::Spanning => (layout.total_width, layout.total_height),
            MonitorSelection::Individual => self
                .selected_monitor()
                .map(|m| (m.width, m.height))
                .unwrap_or(FALLBACK_RESOLUTION),
        }
    }
}
