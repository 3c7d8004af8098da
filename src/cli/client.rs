//! IPC Client for communicating with the Pomodoro Timer daemon.
//!
//! This module provides:
//! - Unix Domain Socket client
//! - Request/response handling
//! - Connection retry logic
//! - Timeout handling

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tokio::time::timeout;

use crate::daemon::default_socket_path;
use crate::types::{ConfigPatch, IpcRequest, IpcResponse};

// ============================================================================
// Constants
// ============================================================================

/// Connection timeout in seconds
const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Read/write timeout in seconds
const IO_TIMEOUT_SECS: u64 = 5;

/// Maximum response size in bytes (64KB)
const MAX_RESPONSE_SIZE: u64 = 65536;

/// Maximum connection attempts
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds (base delay, multiplied by attempt number)
const RETRY_DELAY_MS: u64 = 500;

// ============================================================================
// IpcClient
// ============================================================================

/// IPC client for daemon communication.
pub struct IpcClient {
    /// Socket path
    socket_path: PathBuf,
    /// Connection timeout
    timeout: Duration,
}

impl IpcClient {
    /// Creates a new IPC client with the default socket path.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        Ok(Self::with_socket_path(default_socket_path()?))
    }

    /// Creates a new IPC client with a custom socket path.
    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: Duration::from_secs(CONNECTION_TIMEOUT_SECS),
        }
    }

    /// Returns the socket path.
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Sends a start command to the daemon.
    pub async fn start(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Start).await
    }

    /// Sends a pause command to the daemon.
    pub async fn pause(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Pause).await
    }

    /// Sends a reset command to the daemon.
    pub async fn reset(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Reset).await
    }

    /// Sends a skip command to the daemon.
    pub async fn skip(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Skip).await
    }

    /// Sends a status query to the daemon.
    pub async fn status(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Status).await
    }

    /// Pushes a configuration change to the daemon.
    pub async fn configure(&self, patch: ConfigPatch) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Configure { patch }).await
    }

    /// Asks the daemon to stop.
    pub async fn shutdown(&self) -> Result<IpcResponse> {
        self.send_request(&IpcRequest::Shutdown).await
    }

    /// Returns true if a daemon answers on the socket.
    pub async fn is_daemon_running(&self) -> bool {
        self.connect_once().await.is_ok()
    }

    /// Connects to the daemon, retrying with a growing delay.
    ///
    /// Only the connection is retried; a request that reached the daemon is
    /// never sent twice.
    async fn connect(&self) -> Result<UnixStream> {
        let mut attempt = 1;
        loop {
            match self.connect_once().await {
                Ok(stream) => return Ok(stream),
                Err(e) if attempt < MAX_RETRIES => {
                    tracing::debug!(
                        "Connection failed (attempt {}/{}): {:#}",
                        attempt,
                        MAX_RETRIES,
                        e
                    );
                    let delay = Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt));
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn connect_once(&self) -> Result<UnixStream> {
        timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("Connection timed out")?
            .with_context(|| {
                format!(
                    "Cannot connect to the daemon at {:?}. Start it with 'pomodoro daemon'",
                    self.socket_path
                )
            })
    }

    /// Sends a single request to the daemon.
    ///
    /// # Errors
    ///
    /// Returns an error if the daemon is unreachable, the exchange fails, or
    /// the daemon answers with an error response.
    pub async fn send_request(&self, request: &IpcRequest) -> Result<IpcResponse> {
        let mut stream = self.connect().await?;

        let request_json =
            serde_json::to_string(request).context("Failed to serialize request")?;

        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            stream.write_all(request_json.as_bytes()),
        )
        .await
        .context("Write timed out")?
        .context("Failed to send request")?;

        // Shutdown write side to signal end of request
        stream
            .shutdown()
            .await
            .context("Failed to shut down write side")?;

        let mut buffer = Vec::new();
        timeout(
            Duration::from_secs(IO_TIMEOUT_SECS),
            (&mut stream).take(MAX_RESPONSE_SIZE).read_to_end(&mut buffer),
        )
        .await
        .context("Read timed out")?
        .context("Failed to receive response")?;

        if buffer.is_empty() {
            anyhow::bail!("No response from daemon");
        }

        let response: IpcResponse =
            serde_json::from_slice(&buffer).context("Failed to parse response")?;

        if response.is_error() {
            anyhow::bail!("{}", response.message);
        }

        Ok(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
