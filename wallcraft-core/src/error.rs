#[derive(Debug, thiserror::Error)]
pub enum WallcraftError {
    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("toml parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("ipc error: {0}")]
    Ipc(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("unknown {kind} id: {id}")]
    UnknownCatalogId { kind: &'static str, id: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("a generation is already in progress")]
    Busy,
}

pub type Result<T> = std::result::Result<T, WallcraftError>;
