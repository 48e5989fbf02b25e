//! Static lookup tables for the selectable styles, color schemes and legacy
//! categories.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub id: &'static str,
    pub label: &'static str,
    pub icon: &'static str,
    pub prompt_fragment: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    Style,
    ColorScheme,
    Category,
}

impl CatalogKind {
    pub const ALL: &[CatalogKind] = &[Self::Style, Self::ColorScheme, Self::Category];

    pub fn entries(self) -> &'static [CatalogEntry] {
        match self {
            Self::Style => STYLES,
            Self::ColorScheme => COLOR_SCHEMES,
            Self::Category => CATEGORIES,
        }
    }

    pub fn lookup(self, id: &str) -> Option<&'static CatalogEntry> {
        self.entries().iter().find(|e| e.id == id)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Style => "style",
            Self::ColorScheme => "color scheme",
            Self::Category => "category",
        }
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

const fn entry(
    id: &'static str,
    label: &'static str,
    icon: &'static str,
    prompt_fragment: &'static str,
) -> CatalogEntry {
    CatalogEntry {
        id,
        label,
        icon,
        prompt_fragment,
    }
}

pub const STYLES: &[CatalogEntry] = &[
    entry("geometric", "Geometric", "🔷", "geometric shapes, polygons, sharp edges"),
    entry("gradient", "Gradient", "🌈", "smooth color gradients, soft blends"),
    entry("minimal", "Minimal", "⬜", "minimal composition, negative space"),
    entry("lineart", "Line Art", "✏️", "thin continuous lines, line art"),
    entry("isometric", "Isometric", "🧊", "isometric blocks, 3d grid"),
    entry("abstract", "Abstract", "🎨", "abstract organic forms, flowing colors"),
    entry("waves", "Waves", "🌊", "layered waves, smooth curves"),
    entry("dots", "Dots", "⚫", "dot patterns, halftone circles"),
    entry("silkflow", "Silk Flow", "🎐", "flowing silk ribbons, soft folds"),
    entry("sunburst", "Sunburst", "☀️", "radiating sunburst rays"),
];

pub const COLOR_SCHEMES: &[CatalogEntry] = &[
    entry("retro", "Retro", "📼", "warm retro palette, muted oranges and teals"),
    entry("neon", "Neon", "💡", "vivid neon colors on a dark background"),
    entry("cyberpunk", "Cyberpunk", "🤖", "cyberpunk magenta and cyan"),
    entry("synthwave", "Synthwave", "🌆", "synthwave pinks and purples"),
];

pub const CATEGORIES: &[CatalogEntry] = &[
    entry("nature", "Nature", "🌿", "lush nature landscape, forests, rivers"),
    entry("abstract", "Abstract", "🎨", "abstract art, geometric shapes, flowing colors"),
    entry("space", "Space", "🌌", "outer space, galaxies, nebulae, stars"),
    entry("cityscape", "Cityscape", "🏙️", "urban skyline, city lights, architecture"),
    entry("fantasy", "Fantasy", "🐉", "fantasy landscape, magical, mythical"),
    entry("minimalist", "Minimalist", "⬜", "minimalist design, clean lines, simple colors"),
    entry("ocean", "Ocean", "🌊", "ocean waves, underwater, coral reef, sea"),
    entry("mountains", "Mountains", "🏔️", "mountain peaks, alpine landscape, snow-capped"),
    entry("cyberpunk", "Cyberpunk", "🤖", "cyberpunk city, neon lights, futuristic"),
    entry("seasons", "Seasons", "🍂", "seasonal landscape, autumn leaves, spring bloom"),
];

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_ids_unique_per_kind() {
        for kind in CatalogKind::ALL {
            let ids: HashSet<_> = kind.entries().iter().map(|e| e.id).collect();
            assert_eq!(ids.len(), kind.entries().len(), "duplicate id in {kind}");
        }
    }

    #[test]
    fn test_lookup() {
        let neon = CatalogKind::ColorScheme.lookup("neon").unwrap();
        assert_eq!(neon.label, "Neon");
        assert!(CatalogKind::Style.lookup("neon").is_none());
        // same id may exist in different tables
        assert!(CatalogKind::Style.lookup("abstract").is_some());
        assert!(CatalogKind::Category.lookup("abstract").is_some());
    }

    #[test]
    fn test_entries_have_fragments() {
        for kind in CatalogKind::ALL {
            for e in kind.entries() {
                assert!(!e.label.is_empty());
                assert!(!e.prompt_fragment.is_empty(), "{kind} {} has no fragment", e.id);
            }
        }
    }
}
