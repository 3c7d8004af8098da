//! Pomodoro Timer Library
//!
//! This library provides the core functionality for the Pomodoro Timer CLI.
//! It includes:
//! - Timer engine that sequences work sessions and breaks
//! - Countdown driver and IPC server for the daemon
//! - CLI command parsing, IPC client and display utilities
//! - Live and persisted configuration
//! - Session-completion notifications

pub mod cli;
pub mod config;
pub mod daemon;
pub mod notification;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{ConfigSource, Settings, SettingsError, SettingsStore, SharedConfig};
pub use daemon::{Countdown, TimerEngine};
pub use notification::{
    MockNotificationSink, NotificationContent, NotificationError, NotificationSink,
};
pub use types::{
    ConfigError, ConfigPatch, EngineConfig, IpcRequest, IpcResponse, ResponseData, RunState,
    SessionType, TimerSnapshot,
};
