//! IPC Server for the Pomodoro Timer.
//!
//! This module provides Unix Domain Socket IPC functionality:
//! - Server that listens on a Unix socket
//! - Request/response handling for timer commands
//! - Integration with TimerEngine and the live configuration

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex, Notify};
use tokio::time::{timeout, Duration};

use crate::config::{ConfigSource, SharedConfig};
use crate::types::{ConfigPatch, IpcRequest, IpcResponse, ResponseData, RunState};

use super::timer::TimerEngine;

// ============================================================================
// Constants
// ============================================================================

/// Socket directory under the home directory
const SOCKET_DIR: &str = ".pomodoro";

/// Socket file name
const SOCKET_FILE: &str = "pomodoro.sock";

/// Maximum request size in bytes (4KB)
const MAX_REQUEST_SIZE: usize = 4096;

/// Read timeout in seconds
const READ_TIMEOUT_SECS: u64 = 5;

/// Returns the default socket path (`~/.pomodoro/pomodoro.sock`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_socket_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to get home directory")?;
    Ok(home.join(SOCKET_DIR).join(SOCKET_FILE))
}

// ============================================================================
// IpcError
// ============================================================================

/// IPC-specific error types.
#[derive(Debug, thiserror::Error)]
pub enum IpcError {
    /// Read error
    #[error("Failed to read request: {0}")]
    ReadError(String),

    /// Timeout error
    #[error("Operation timed out")]
    Timeout,

    /// Request too large
    #[error("Request too large (max {MAX_REQUEST_SIZE} bytes)")]
    RequestTooLarge,

    /// Peer closed the connection before sending anything
    #[error("Connection closed by client")]
    ConnectionClosed,
}

// ============================================================================
// IpcServer
// ============================================================================

/// Unix Domain Socket IPC server.
pub struct IpcServer {
    /// Unix socket listener
    listener: UnixListener,
    /// Socket path (for cleanup)
    socket_path: PathBuf,
}

impl IpcServer {
    /// Creates a new IPC server bound to the specified socket path.
    ///
    /// If the socket file already exists, it will be removed before binding.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub fn new(socket_path: &Path) -> Result<Self> {
        // Remove existing socket file if present
        if socket_path.exists() {
            std::fs::remove_file(socket_path)
                .with_context(|| format!("Failed to remove existing socket: {:?}", socket_path))?;
        }

        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create socket directory: {:?}", parent))?;
        }

        let listener = UnixListener::bind(socket_path)
            .with_context(|| format!("Failed to bind Unix socket: {:?}", socket_path))?;

        tracing::info!(path = ?socket_path, "listening for commands");

        Ok(Self {
            listener,
            socket_path: socket_path.to_path_buf(),
        })
    }

    /// Accepts an incoming client connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be accepted.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self
            .listener
            .accept()
            .await
            .context("Failed to accept connection")?;
        Ok(stream)
    }

    /// Receives and deserializes an IPC request from the stream.
    ///
    /// Applies a read timeout to prevent blocking indefinitely. The client
    /// sends one JSON document and then shuts down its write half, so the
    /// request is everything up to end of stream.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or deserialization fails, or the request
    /// exceeds the size limit.
    pub async fn receive_request(stream: &mut UnixStream) -> Result<IpcRequest> {
        let read_result = timeout(
            Duration::from_secs(READ_TIMEOUT_SECS),
            read_bounded(stream),
        )
        .await;

        let buffer = match read_result {
            Ok(result) => result?,
            Err(_) => return Err(IpcError::Timeout.into()),
        };

        if buffer.is_empty() {
            return Err(IpcError::ConnectionClosed.into());
        }

        let request: IpcRequest = serde_json::from_slice(&buffer)
            .with_context(|| "Failed to deserialize IPC request")?;

        Ok(request)
    }

    /// Serializes and sends an IPC response to the stream.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub async fn send_response(stream: &mut UnixStream, response: &IpcResponse) -> Result<()> {
        let json = serde_json::to_vec(response).context("Failed to serialize IPC response")?;

        stream
            .write_all(&json)
            .await
            .context("Failed to write response")?;
        stream.flush().await.context("Failed to flush response")?;

        Ok(())
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Drop for IpcServer {
    fn drop(&mut self) {
        // Clean up socket file on drop
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Reads until end of stream, failing past [`MAX_REQUEST_SIZE`].
async fn read_bounded(stream: &mut UnixStream) -> Result<Vec<u8>, IpcError> {
    let mut buffer = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];

    loop {
        let n = stream
            .read(&mut chunk)
            .await
            .map_err(|e| IpcError::ReadError(e.to_string()))?;
        if n == 0 {
            return Ok(buffer);
        }
        if buffer.len() + n > MAX_REQUEST_SIZE {
            return Err(IpcError::RequestTooLarge);
        }
        buffer.extend_from_slice(&chunk[..n]);
    }
}

// ============================================================================
// RequestHandler
// ============================================================================

/// Handles IPC requests by dispatching to TimerEngine.
#[derive(Clone)]
pub struct RequestHandler {
    /// Shared reference to the timer engine
    engine: Arc<Mutex<TimerEngine>>,
    /// Live configuration the engine reads at session boundaries
    config: SharedConfig,
    /// Signalled when a client asks the daemon to stop
    shutdown: Arc<Notify>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(engine: Arc<Mutex<TimerEngine>>, config: SharedConfig, shutdown: Arc<Notify>) -> Self {
        Self {
            engine,
            config,
            shutdown,
        }
    }

    /// Reads one request from `stream`, handles it and writes the response.
    ///
    /// Malformed requests are answered with an error response.
    ///
    /// # Errors
    ///
    /// Returns an error if the response cannot be written.
    pub async fn serve(&self, mut stream: UnixStream) -> Result<()> {
        let response = match IpcServer::receive_request(&mut stream).await {
            Ok(request) => {
                tracing::debug!(command = request.as_command(), "request received");
                self.handle(request).await
            }
            Err(e) => {
                tracing::warn!("rejected request: {:#}", e);
                IpcResponse::error(format!("Invalid request: {}", e))
            }
        };
        IpcServer::send_response(&mut stream, &response).await
    }

    /// Handles an IPC request and returns the appropriate response.
    pub async fn handle(&self, request: IpcRequest) -> IpcResponse {
        match request {
            IpcRequest::Start => self.handle_start().await,
            IpcRequest::Pause => self.handle_pause().await,
            IpcRequest::Reset => self.handle_reset().await,
            IpcRequest::Skip => self.handle_skip().await,
            IpcRequest::Status => self.handle_status().await,
            IpcRequest::Configure { patch } => self.handle_configure(patch).await,
            IpcRequest::Shutdown => self.handle_shutdown().await,
        }
    }

    /// Handles the start command.
    async fn handle_start(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;

        let message = match engine.snapshot().run_state {
            RunState::Running => "Timer is already running",
            RunState::Paused => {
                engine.start();
                "Timer resumed"
            }
            RunState::Idle => {
                engine.start();
                "Timer started"
            }
        };

        IpcResponse::success(message, Some(ResponseData::from_snapshot(engine.snapshot())))
    }

    /// Handles the pause command.
    async fn handle_pause(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;

        let message = if engine.snapshot().is_running() {
            engine.pause();
            "Timer paused"
        } else {
            "Timer is not running"
        };

        IpcResponse::success(message, Some(ResponseData::from_snapshot(engine.snapshot())))
    }

    /// Handles the reset command.
    async fn handle_reset(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        engine.reset();

        IpcResponse::success(
            "Session reset",
            Some(ResponseData::from_snapshot(engine.snapshot())),
        )
    }

    /// Handles the skip command.
    async fn handle_skip(&self) -> IpcResponse {
        let mut engine = self.engine.lock().await;
        let skipped = engine.snapshot().session_type;
        engine.skip();

        IpcResponse::success(
            format!("Skipped {}", skipped.label()),
            Some(ResponseData::from_snapshot(engine.snapshot())),
        )
    }

    /// Handles the status command.
    async fn handle_status(&self) -> IpcResponse {
        let engine = self.engine.lock().await;

        IpcResponse::success(
            "",
            Some(ResponseData::from_snapshot(engine.snapshot()).with_config(self.config.current())),
        )
    }

    /// Handles the configure command.
    async fn handle_configure(&self, patch: ConfigPatch) -> IpcResponse {
        let result = self.config.update(|config| patch.apply_to(config));
        let engine = self.engine.lock().await;

        match result {
            Ok(config) => {
                let message = if patch.is_empty() {
                    "Configuration unchanged"
                } else {
                    "Configuration updated; takes effect from the next session"
                };
                IpcResponse::success(
                    message,
                    Some(ResponseData::from_snapshot(engine.snapshot()).with_config(config)),
                )
            }
            Err(e) => IpcResponse::error(e.to_string()),
        }
    }

    /// Handles the shutdown command.
    async fn handle_shutdown(&self) -> IpcResponse {
        let engine = self.engine.lock().await;
        // notify_one stores a permit, so the daemon loop sees it even if it
        // is not waiting yet.
        self.shutdown.notify_one();

        IpcResponse::success(
            "Daemon shutting down",
            Some(ResponseData::from_snapshot(engine.snapshot())),
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
