#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Home,
    Generate,
    Preview,
    Settings,
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Home => write!(f, "home"),
            Self::Generate => write!(f, "generate"),
            Self::Preview => write!(f, "preview"),
            Self::Settings => write!(f, "settings"),
        }
    }
}

#[derive(Debug, Default)]
pub struct Navigation {
    current: View,
}

impl Navigation {
    pub fn current(&self) -> View {
        self.current
    }

    pub fn navigate(&mut self, view: View) {
        tracing::debug!(from = %self.current, to = %view, "navigate");
        self.current = view;
    }
}
