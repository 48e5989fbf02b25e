use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum AiProvider {
    #[default]
    Pollinations,
    OpenAi,
}

impl AiProvider {
    pub const ALL: &[AiProvider] = &[AiProvider::Pollinations, AiProvider::OpenAi];

    /// Key used for this provider in the persisted settings.
    pub fn settings_key(self) -> &'static str {
        match self {
            Self::Pollinations => "pollinations",
            Self::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for AiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.settings_key())
    }
}

impl std::str::FromStr for AiProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pollinations" => Ok(Self::Pollinations),
            "openai" | "open_ai" => Ok(Self::OpenAi),
            other => Err(format!("unknown ai provider: {other}")),
        }
    }
}

/// Payload handed to the backend's image generation operation.
///
/// `width`/`height` is the canvas the provider renders at; `target_width`/
/// `target_height` is the resolution the user finally wants, which may be
/// reached through upscaling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub styles: Vec<String>,
    pub color_schemes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    pub custom_prompt: Option<String>,
    pub width: u32,
    pub height: u32,
    pub provider: AiProvider,
    pub target_width: u32,
    pub target_height: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationResult {
    pub image_path: PathBuf,
    pub original_width: u32,
    pub original_height: u32,
    pub final_width: u32,
    pub final_height: u32,
    pub was_upscaled: bool,
}

impl GenerationResult {
    /// Result of upscaling this image by `factor` into `path`.
    ///
    /// Final dimensions derive from the original ones, not from the current
    /// final size.
    pub fn upscaled(&self, path: impl Into<PathBuf>, factor: u32) -> Self {
        Self {
            image_path: path.into(),
            original_width: self.original_width,
            original_height: self.original_height,
            final_width: self.original_width.saturating_mul(factor),
            final_height: self.original_height.saturating_mul(factor),
            was_upscaled: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.image_path
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    #[default]
    Idle,
    Starting,
    Generating,
    Upscaling,
    Complete,
    Error,
}

impl GenerationStatus {
    pub const ALL: &[GenerationStatus] = &[
        GenerationStatus::Idle,
        GenerationStatus::Starting,
        GenerationStatus::Generating,
        GenerationStatus::Upscaling,
        GenerationStatus::Complete,
        GenerationStatus::Error,
    ];
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Starting => write!(f, "starting"),
            Self::Generating => write!(f, "generating"),
            Self::Upscaling => write!(f, "upscaling"),
            Self::Complete => write!(f, "complete"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for GenerationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "starting" => Ok(Self::Starting),
            "generating" => Ok(Self::Generating),
            "upscaling" => Ok(Self::Upscaling),
            "complete" => Ok(Self::Complete),
            "error" => Ok(Self::Error),
            other => Err(format!("unknown generation status: {other}")),
        }
    }
}

/// How the OS should lay out the wallpaper image.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WallpaperMode {
    Span,
    Fit,
    Center,
    Crop,
}

impl WallpaperMode {
    pub const ALL: &[WallpaperMode] = &[
        WallpaperMode::Span,
        WallpaperMode::Fit,
        WallpaperMode::Center,
        WallpaperMode::Crop,
    ];
}

impl std::fmt::Display for WallpaperMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Span => write!(f, "span"),
            Self::Fit => write!(f, "fit"),
            Self::Center => write!(f, "center"),
            Self::Crop => write!(f, "crop"),
        }
    }
}

impl std::str::FromStr for WallpaperMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "span" => Ok(Self::Span),
            "fit" => Ok(Self::Fit),
            "center" => Ok(Self::Center),
            "crop" => Ok(Self::Crop),
            other => Err(format!("unknown wallpaper mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorInfo {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
    pub scale_factor: f64,
    pub is_primary: bool,
}

impl MonitorInfo {
    /// Reduced aspect ratio string like "16:9".
    pub fn aspect_ratio(&self) -> String {
        let g = gcd(self.width, self.height).max(1);
        format!("{}:{}", self.width / g, self.height / g)
    }
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonitorLayout {
    pub monitors: Vec<MonitorInfo>,
    pub total_width: u32,
    pub total_height: u32,
}

impl MonitorLayout {
    /// Build a layout, computing the bounding box used for spanning mode.
    /// The box always includes the origin.
    pub fn from_monitors(monitors: Vec<MonitorInfo>) -> Self {
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (0i64, 0i64, 0i64, 0i64);
        for m in &monitors {
            min_x = min_x.min(m.x as i64);
            min_y = min_y.min(m.y as i64);
            max_x = max_x.max(m.x as i64 + m.width as i64);
            max_y = max_y.max(m.y as i64 + m.height as i64);
        }

        Self {
            monitors,
            total_width: (max_x - min_x) as u32,
            total_height: (max_y - min_y) as u32,
        }
    }

    /// The primary monitor, or the first one when none is flagged.
    pub fn primary(&self) -> Option<&MonitorInfo> {
        self.monitors
            .iter()
            .find(|m| m.is_primary)
            .or_else(|| self.monitors.first())
    }
}
