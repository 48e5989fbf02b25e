use std::path::PathBuf;

use crate::error::{Result, WallcraftError};

#[derive(Debug, Clone)]
pub struct WallcraftPaths {
    pub config_dir: PathBuf,
}

impl WallcraftPaths {
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| WallcraftError::Config("cannot resolve XDG config dir".into()))?
            .join("wallcraft");

        Ok(Self { config_dir })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("client.toml")
    }

    /// Default location of the backend's IPC socket.
    pub fn socket_path() -> PathBuf {
        let uid = unsafe { libc::getuid() };
        PathBuf::from(format!("/tmp/wallcraft-{uid}.sock"))
    }

    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        Ok(())
    }
}
