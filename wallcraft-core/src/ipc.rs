use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedReadHalf;
use tokio::net::UnixStream;

use crate::error::{Result, WallcraftError};
use crate::models::{GenerationRequest, WallpaperMode};
use crate::settings::AppSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum IpcRequest {
    GenerateImage { request: GenerationRequest },
    UpscaleImage { input_path: PathBuf, scale: u32 },
    GetMonitors,
    GetSettings,
    SaveSettings { settings: AppSettings },
    GetCurrentWallpaper,
    SetWallpaper {
        path: PathBuf,
        mode: Option<WallpaperMode>,
    },
    RestoreWallpaper,
    /// Keep the connection open and stream [`IpcEvent`] lines.
    Subscribe,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IpcResponse {
    Ok {
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
    Error {
        message: String,
    },
}

impl IpcResponse {
    pub fn ok() -> Self {
        Self::Ok { data: None }
    }

    pub fn ok_with_data(data: serde_json::Value) -> Self {
        Self::Ok { data: Some(data) }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self::Error {
            message: msg.into(),
        }
    }

    /// Decode the payload of a successful response; an error response
    /// becomes [`WallcraftError::Backend`] carrying the backend's message.
    pub fn into_data<T: DeserializeOwned>(self) -> Result<T> {
        match self {
            Self::Ok { data } => Ok(serde_json::from_value(
                data.unwrap_or(serde_json::Value::Null),
            )?),
            Self::Error { message } => Err(WallcraftError::Backend(message)),
        }
    }
}

/// Notification pushed by the backend on a subscribed connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IpcEvent {
    pub event: String,
    pub payload: String,
}

async fn write_request(socket_path: &Path, request: &IpcRequest) -> Result<OwnedReadHalf> {
    let stream = UnixStream::connect(socket_path).await.map_err(|e| {
        WallcraftError::Ipc(format!(
            "failed to connect to backend at {}: {e}",
            socket_path.display()
        ))
    })?;

    let (reader, mut writer) = stream.into_split();

    let mut line = serde_json::to_string(request)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.shutdown().await?;

    Ok(reader)
}

/// Send a request to the backend and receive a response.
pub async fn send_request(socket_path: &Path, request: &IpcRequest) -> Result<IpcResponse> {
    let reader = write_request(socket_path, request).await?;

    let mut buf_reader = BufReader::new(reader);
    let mut response_line = String::new();
    let read = buf_reader.read_line(&mut response_line).await?;
    if read == 0 {
        return Err(WallcraftError::Ipc(
            "backend closed the connection without responding".into(),
        ));
    }

    let response: IpcResponse = serde_json::from_str(response_line.trim())?;
    Ok(response)
}

/// Open a subscription and return the line reader positioned after the
/// backend's acknowledgement.
pub async fn open_subscription(socket_path: &Path) -> Result<BufReader<OwnedReadHalf>> {
    let reader = write_request(socket_path, &IpcRequest::Subscribe).await?;

    let mut buf_reader = BufReader::new(reader);
    let mut ack = String::new();
    buf_reader.read_line(&mut ack).await?;
    let response: IpcResponse = serde_json::from_str(ack.trim())?;
    response.into_data::<serde_json::Value>()?;

    Ok(buf_reader)
}
