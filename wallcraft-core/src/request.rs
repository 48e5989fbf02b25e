use crate::catalog::CatalogKind;
use crate::error::{Result, WallcraftError};
use crate::models::{AiProvider, GenerationRequest};

const QUALITY_SUFFIX: &str = "masterpiece, best quality, ultra-detailed, sharp focus, \
    desktop wallpaper, no text, no watermark, no logo, no signature";

/// Turns UI selections into a validated [`GenerationRequest`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    styles: Vec<String>,
    color_schemes: Vec<String>,
    categories: Vec<String>,
    custom_prompt: Option<String>,
    size: (u32, u32),
    target: Option<(u32, u32)>,
    provider: AiProvider,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self {
            styles: Vec::new(),
            color_schemes: Vec::new(),
            categories: Vec::new(),
            custom_prompt: None,
            size: (1024, 1024),
            target: None,
            provider: AiProvider::default(),
        }
    }
}

impl RequestBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn styles<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.styles = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn color_schemes<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.color_schemes = ids.into_iter().map(Into::into).collect();
        self
    }

    /// Legacy flat category selection.
    pub fn categories<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn custom_prompt(mut self, prompt: Option<impl Into<String>>) -> Self {
        self.custom_prompt = prompt.map(Into::into);
        self
    }

    /// Canvas size the provider renders at.
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.size = (width, height);
        self
    }

    /// Final resolution; defaults to the canvas size.
    pub fn target(mut self, width: u32, height: u32) -> Self {
        self.target = Some((width, height));
        self
    }

    pub fn provider(mut self, provider: AiProvider) -> Self {
        self.provider = provider;
        self
    }

    pub fn build(self) -> Result<GenerationRequest> {
        let (width, height) = self.size;
        let (target_width, target_height) = self.target.unwrap_or(self.size);
        if width == 0 || height == 0 {
            return Err(WallcraftError::InvalidRequest(format!(
                "generation size must be non-zero, got {width}x{height}"
            )));
        }
        if target_width == 0 || target_height == 0 {
            return Err(WallcraftError::InvalidRequest(format!(
                "target size must be non-zero, got {target_width}x{target_height}"
            )));
        }

        Ok(GenerationRequest {
            styles: normalize_ids(CatalogKind::Style, self.styles)?,
            color_schemes: normalize_ids(CatalogKind::ColorScheme, self.color_schemes)?,
            categories: normalize_ids(CatalogKind::Category, self.categories)?,
            custom_prompt: normalize_prompt(self.custom_prompt.as_deref()),
            width,
            height,
            provider: self.provider,
            target_width,
            target_height,
        })
    }
}

/// Trim, drop blanks and duplicates (first occurrence wins), reject ids the
/// catalog does not know.
fn normalize_ids(kind: CatalogKind, ids: Vec<String>) -> Result<Vec<String>> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        let id = id.trim();
        if id.is_empty() || out.iter().any(|seen| seen == id) {
            continue;
        }
        if kind.lookup(id).is_none() {
            return Err(WallcraftError::UnknownCatalogId {
                kind: kind.name(),
                id: id.to_string(),
            });
        }
        out.push(id.to_string());
    }
    Ok(out)
}

pub fn normalize_prompt(prompt: Option<&str>) -> Option<String> {
    prompt
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
}

/// Text prompt for providers that take free text.
///
/// A custom prompt wins; otherwise the catalog fragments of every selection
/// are joined, falling back to a generic abstract wallpaper.
pub fn prompt_text(request: &GenerationRequest) -> String {
    if let Some(custom) = normalize_prompt(request.custom_prompt.as_deref()) {
        return format!("{custom}, {QUALITY_SUFFIX}");
    }

    let fragments: Vec<&str> = [
        (CatalogKind::Style, &request.styles),
        (CatalogKind::ColorScheme, &request.color_schemes),
        (CatalogKind::Category, &request.categories),
    ]
    .into_iter()
    .flat_map(|(kind, ids)| ids.iter().filter_map(move |id| kind.lookup(id)))
    .map(|e| e.prompt_fragment)
    .collect();

    if fragments.is_empty() {
        format!("A beautiful abstract desktop wallpaper, {QUALITY_SUFFIX}")
    } else {
        format!("{}, {QUALITY_SUFFIX}", fragments.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_defaults() {
        let req = RequestBuilder::new().build().unwrap();
        assert!(req.styles.is_empty());
        assert!(req.color_schemes.is_empty());
        assert!(req.categories.is_empty());
        assert_eq!(req.custom_prompt, None);
        assert_eq!((req.width, req.height), (1024, 1024));
        assert_eq!((req.target_width, req.target_height), (1024, 1024));
        assert_eq!(req.provider, AiProvider::Pollinations);
    }

    #[test]
    fn test_build_keeps_order_and_drops_duplicates() {
        let req = RequestBuilder::new()
            .styles(["waves", "geometric", "waves", " ", "dots"])
            .color_schemes(["neon", "retro"])
            .size(1024, 1024)
            .target(1920, 1080)
            .provider(AiProvider::OpenAi)
            .build()
            .unwrap();
        assert_eq!(req.styles, vec!["waves", "geometric", "dots"]);
        assert_eq!(req.color_schemes, vec!["neon", "retro"]);
        assert_eq!((req.target_width, req.target_height), (1920, 1080));
        assert_eq!(req.provider, AiProvider::OpenAi);
    }

    #[test]
    fn test_custom_prompt_trimmed() {
        let req = RequestBuilder::new()
            .custom_prompt(Some("  misty forest at dawn  "))
            .build()
            .unwrap();
        assert_eq!(req.custom_prompt.as_deref(), Some("misty forest at dawn"));

        let req = RequestBuilder::new().custom_prompt(Some("   ")).build().unwrap();
        assert_eq!(req.custom_prompt, None);
    }

    #[test]
    fn test_unknown_id_rejected() {
        let err = RequestBuilder::new()
            .styles(["geometric", "baroque"])
            .build()
            .unwrap_err();
        match err {
            WallcraftError::UnknownCatalogId { kind, id } => {
                assert_eq!(kind, "style");
                assert_eq!(id, "baroque");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_zero_size_rejected() {
        assert!(matches!(
            RequestBuilder::new().size(0, 1080).build(),
            Err(WallcraftError::InvalidRequest(_))
        ));
        assert!(matches!(
            RequestBuilder::new().target(1920, 0).build(),
            Err(WallcraftError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_legacy_categories() {
        let req = RequestBuilder::new()
            .categories(["space", "ocean"])
            .build()
            .unwrap();
        assert_eq!(req.categories, vec!["space", "ocean"]);
        // legacy field stays off the wire when unused
        let plain = RequestBuilder::new().build().unwrap();
        let json = serde_json::to_value(&plain).unwrap();
        assert!(json.get("categories").is_none());
    }

    #[test]
    fn test_prompt_text() {
        let req = RequestBuilder::new()
            .styles(["waves"])
            .color_schemes(["neon"])
            .build()
            .unwrap();
        let prompt = prompt_text(&req);
        assert!(prompt.starts_with("layered waves, smooth curves, vivid neon colors"));
        assert!(prompt.ends_with("no signature"));

        let req = RequestBuilder::new()
            .styles(["waves"])
            .custom_prompt(Some("a lighthouse"))
            .build()
            .unwrap();
        assert!(prompt_text(&req).starts_with("a lighthouse, masterpiece"));

        let req = RequestBuilder::new().build().unwrap();
        assert!(prompt_text(&req).starts_with("A beautiful abstract desktop wallpaper"));
    }
}
