use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::ipc::{self, IpcEvent, IpcRequest};
use crate::models::{GenerationRequest, GenerationResult, MonitorLayout, WallpaperMode};
use crate::settings::AppSettings;

use super::{Backend, GENERATION_PROGRESS_EVENT};

/// Backend reached over the Unix socket JSON-lines protocol.
pub struct IpcBackend {
    socket_path: PathBuf,
}

impl IpcBackend {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    async fn call<T: DeserializeOwned>(&self, request: IpcRequest) -> Result<T> {
        ipc::send_request(&self.socket_path, &request)
            .await?
            .into_data()
    }
}

#[async_trait]
impl Backend for IpcBackend {
    async fn generate_image(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        self.call(IpcRequest::GenerateImage {
            request: request.clone(),
        })
        .await
    }

    async fn upscale_image(&self, input_path: &Path, scale: u32) -> Result<PathBuf> {
        self.call(IpcRequest::UpscaleImage {
            input_path: input_path.to_path_buf(),
            scale,
        })
        .await
    }

    async fn get_monitors(&self) -> Result<MonitorLayout> {
        self.call(IpcRequest::GetMonitors).await
    }

    async fn get_settings(&self) -> Result<AppSettings> {
        self.call(IpcRequest::GetSettings).await
    }

    async fn save_settings(&self, settings: &AppSettings) -> Result<()> {
        self.call(IpcRequest::SaveSettings {
            settings: settings.clone(),
        })
        .await
    }

    async fn get_current_wallpaper(&self) -> Result<PathBuf> {
        self.call(IpcRequest::GetCurrentWallpaper).await
    }

    async fn set_wallpaper(&self, path: &Path, mode: Option<WallpaperMode>) -> Result<()> {
        self.call(IpcRequest::SetWallpaper {
            path: path.to_path_buf(),
            mode,
        })
        .await
    }

    async fn restore_wallpaper(&self) -> Result<()> {
        self.call(IpcRequest::RestoreWallpaper).await
    }

    async fn subscribe_progress(&self) -> Result<mpsc::Receiver<String>> {
        let mut lines = ipc::open_subscription(&self.socket_path).await?.lines();
        let (tx, rx) = mpsc::channel(32);

        tokio::spawn(async move {
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        debug!("backend closed progress subscription");
                        break;
                    }
                    Err(e) => {
                        warn!("progress subscription read error: {e}");
                        break;
                    }
                };

                let event: IpcEvent = match serde_json::from_str(line.trim()) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!("malformed backend event: {e}");
                        continue;
                    }
                };
                if event.event != GENERATION_PROGRESS_EVENT {
                    continue;
                }
                if tx.send(event.payload).await.is_err() {
                    debug!("progress receiver dropped, closing subscription");
                    break;
                }
            }
        });

        Ok(rx)
    }

    fn name(&self) -> &str {
        "ipc"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WallcraftError;
    use crate::ipc::IpcResponse;
    use tokio::io::{AsyncWriteExt, BufReader};
    use tokio::net::UnixListener;

    /// Serve one connection, answering with `response` and then writing
    /// `trailing` lines.
    fn serve_once(
        listener: UnixListener,
        response: IpcResponse,
        trailing: Vec<String>,
    ) -> tokio::task::JoinHandle<IpcRequest> {
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut line = String::new();
            BufReader::new(reader).read_line(&mut line).await.unwrap();
            let request: IpcRequest = serde_json::from_str(line.trim()).unwrap();

            let mut out = serde_json::to_string(&response).unwrap();
            out.push('\n');
            for extra in trailing {
                out.push_str(&extra);
                out.push('\n');
            }
            writer.write_all(out.as_bytes()).await.unwrap();
            request
        })
    }

    #[tokio::test]
    async fn test_upscale_decodes_path() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("b.sock");
        let server = serve_once(
            UnixListener::bind(&socket).unwrap(),
            IpcResponse::ok_with_data(serde_json::json!("/cache/a_upscaled.png")),
            Vec::new(),
        );

        let backend = IpcBackend::new(&socket);
        let out = backend
            .upscale_image(Path::new("/cache/a.png"), 2)
            .await
            .unwrap();
        assert_eq!(out, PathBuf::from("/cache/a_upscaled.png"));

        match server.await.unwrap() {
            IpcRequest::UpscaleImage { input_path, scale } => {
                assert_eq!(input_path, PathBuf::from("/cache/a.png"));
                assert_eq!(scale, 2);
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_backend_error_message_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("b.sock");
        let server = serve_once(
            UnixListener::bind(&socket).unwrap(),
            IpcResponse::error("Wallpaper operation failed: no session"),
            Vec::new(),
        );

        let backend = IpcBackend::new(&socket);
        let err = backend
            .set_wallpaper(Path::new("/cache/a.png"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, WallcraftError::Backend(ref m) if m.contains("no session")));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_subscription_forwards_progress_only() {
        let dir = tempfile::tempdir().unwrap();
        let socket = dir.path().join("b.sock");
        let events = vec![
            r#"{"event":"generation-progress","payload":"starting"}"#.to_string(),
            r#"{"event":"upscale-model-download","payload":"42"}"#.to_string(),
            "not json".to_string(),
            r#"{"event":"generation-progress","payload":"generating"}"#.to_string(),
        ];
        let server = serve_once(UnixListener::bind(&socket).unwrap(), IpcResponse::ok(), events);

        let backend = IpcBackend::new(&socket);
        let mut rx = backend.subscribe_progress().await.unwrap();
        assert_eq!(rx.recv().await.as_deref(), Some("starting"));
        assert_eq!(rx.recv().await.as_deref(), Some("generating"));
        // server hung up after its last event
        assert_eq!(rx.recv().await, None);

        assert!(matches!(server.await.unwrap(), IpcRequest::Subscribe));
    }
}
