//! Core data types for the Pomodoro Timer.
//!
//! This module defines the data structures used for:
//! - Session kinds and run states of the timer engine
//! - The externally observable timer snapshot
//! - Engine configuration with validation
//! - IPC request/response serialization

use serde::{Deserialize, Serialize};

/// Longest accepted session, in minutes (one day).
pub const MAX_SESSION_MINUTES: u32 = 24 * 60;

// ============================================================================
// SessionType
// ============================================================================

/// Kind of timed interval the engine is counting down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SessionType {
    /// Focused work session
    Work,
    /// Short rest between work sessions
    ShortBreak,
    /// Long rest after every N work sessions
    LongBreak,
}

impl SessionType {
    /// Returns the string representation of the session type.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Work => "work",
            SessionType::ShortBreak => "short-break",
            SessionType::LongBreak => "long-break",
        }
    }

    /// Returns the human-readable label shown by the presentation layer.
    pub fn label(&self) -> &'static str {
        match self {
            SessionType::Work => "Work Session",
            SessionType::ShortBreak => "Short Break",
            SessionType::LongBreak => "Long Break",
        }
    }

    /// Returns true for short and long breaks.
    pub fn is_break(&self) -> bool {
        matches!(self, SessionType::ShortBreak | SessionType::LongBreak)
    }
}

impl Default for SessionType {
    fn default() -> Self {
        SessionType::Work
    }
}

// ============================================================================
// RunState
// ============================================================================

/// Whether the countdown is advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    /// No countdown is advancing
    Idle,
    /// Countdown decrements once per second
    Running,
    /// Countdown suspended with remaining time preserved
    Paused,
}

impl RunState {
    /// Returns the string representation of the run state.
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Paused => "paused",
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        RunState::Idle
    }
}

// ============================================================================
// TimerSnapshot
// ============================================================================

/// Immutable read of the engine's observable state.
///
/// `0 <= seconds_remaining <= seconds_total` and `seconds_total > 0` hold for
/// every snapshot the engine hands out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSnapshot {
    /// Current run state
    pub run_state: RunState,
    /// Current session kind
    pub session_type: SessionType,
    /// Seconds left in the current session
    pub seconds_remaining: u32,
    /// Length of the current session in seconds
    pub seconds_total: u32,
    /// Work sessions finished so far (skipped ones included)
    pub completed_work_sessions: u32,
}

impl TimerSnapshot {
    /// Creates the snapshot of a freshly constructed engine.
    pub fn initial(work_seconds: u32) -> Self {
        Self {
            run_state: RunState::Idle,
            session_type: SessionType::Work,
            seconds_remaining: work_seconds,
            seconds_total: work_seconds,
            completed_work_sessions: 0,
        }
    }

    /// Seconds already elapsed in the current session.
    pub fn seconds_elapsed(&self) -> u32 {
        self.seconds_total.saturating_sub(self.seconds_remaining)
    }

    /// Elapsed fraction of the current session, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.seconds_total == 0 {
            return 0.0;
        }
        f64::from(self.seconds_elapsed()) / f64::from(self.seconds_total)
    }

    /// Returns true if the countdown is advancing.
    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }
}

/// Formats a number of seconds as `MM:SS`.
///
/// Minutes are not wrapped into hours, so 90 minutes renders as `90:00`.
pub fn format_clock(total_seconds: u32) -> String {
    format!("{:02}:{:02}", total_seconds / 60, total_seconds % 60)
}

// ============================================================================
// EngineConfig
// ============================================================================

/// Invalid engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Session duration outside `1..=MAX_SESSION_MINUTES`
    #[error("{label} duration must be between 1 and {max} minutes (got {minutes})", label = .session.label(), max = MAX_SESSION_MINUTES)]
    InvalidDuration {
        /// Session whose duration is invalid
        session: SessionType,
        /// Offending value
        minutes: u32,
    },

    /// Cadence of zero
    #[error("sessions per long break must be at least 1")]
    InvalidCadence,
}

/// Durations, cadence and auto-continuation flags read by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Work duration in minutes
    pub work_minutes: u32,
    /// Short break duration in minutes
    pub short_break_minutes: u32,
    /// Long break duration in minutes
    pub long_break_minutes: u32,
    /// Completed work sessions between long breaks
    pub sessions_per_long_break: u32,
    /// Start the break that follows a work session without user action
    pub auto_start_breaks: bool,
    /// Start the work session that follows a break without user action
    pub auto_start_work: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            work_minutes: 25,
            short_break_minutes: 5,
            long_break_minutes: 15,
            sessions_per_long_break: 4,
            auto_start_breaks: false,
            auto_start_work: false,
        }
    }
}

impl EngineConfig {
    /// Creates a new configuration with the specified work duration.
    pub fn with_work_minutes(mut self, minutes: u32) -> Self {
        self.work_minutes = minutes;
        self
    }

    /// Creates a new configuration with the specified short break duration.
    pub fn with_short_break_minutes(mut self, minutes: u32) -> Self {
        self.short_break_minutes = minutes;
        self
    }

    /// Creates a new configuration with the specified long break duration.
    pub fn with_long_break_minutes(mut self, minutes: u32) -> Self {
        self.long_break_minutes = minutes;
        self
    }

    /// Creates a new configuration with the specified long break cadence.
    pub fn with_sessions_per_long_break(mut self, sessions: u32) -> Self {
        self.sessions_per_long_break = sessions;
        self
    }

    /// Creates a new configuration with the specified auto-start flags.
    pub fn with_auto_start(mut self, breaks: bool, work: bool) -> Self {
        self.auto_start_breaks = breaks;
        self.auto_start_work = work;
        self
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for session in [
            SessionType::Work,
            SessionType::ShortBreak,
            SessionType::LongBreak,
        ] {
            let minutes = self.duration_minutes(session);
            if minutes < 1 || minutes > MAX_SESSION_MINUTES {
                return Err(ConfigError::InvalidDuration { session, minutes });
            }
        }
        if self.sessions_per_long_break < 1 {
            return Err(ConfigError::InvalidCadence);
        }
        Ok(())
    }

    /// Returns a copy with every field forced into its valid range.
    pub fn clamped(&self) -> Self {
        Self {
            work_minutes: self.work_minutes.clamp(1, MAX_SESSION_MINUTES),
            short_break_minutes: self.short_break_minutes.clamp(1, MAX_SESSION_MINUTES),
            long_break_minutes: self.long_break_minutes.clamp(1, MAX_SESSION_MINUTES),
            sessions_per_long_break: self.sessions_per_long_break.max(1),
            ..self.clone()
        }
    }

    /// Configured duration of a session kind, in minutes.
    pub fn duration_minutes(&self, session: SessionType) -> u32 {
        match session {
            SessionType::Work => self.work_minutes,
            SessionType::ShortBreak => self.short_break_minutes,
            SessionType::LongBreak => self.long_break_minutes,
        }
    }

    /// Configured duration of a session kind, in seconds.
    ///
    /// Only meaningful on a validated (or clamped) configuration.
    pub fn session_seconds(&self, session: SessionType) -> u32 {
        self.duration_minutes(session) * 60
    }

    /// Break that follows the given number of completed work sessions.
    pub fn break_after(&self, completed_work_sessions: u32) -> SessionType {
        if completed_work_sessions % self.sessions_per_long_break.max(1) == 0 {
            SessionType::LongBreak
        } else {
            SessionType::ShortBreak
        }
    }

    /// Auto-continue flag that gates the start of the given session.
    pub fn auto_starts(&self, next: SessionType) -> bool {
        if next.is_break() {
            self.auto_start_breaks
        } else {
            self.auto_start_work
        }
    }
}

// ============================================================================
// ConfigPatch
// ============================================================================

/// Partial update of an [`EngineConfig`]; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigPatch {
    /// Work duration in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_minutes: Option<u32>,
    /// Short break duration in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_break_minutes: Option<u32>,
    /// Long break duration in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_break_minutes: Option<u32>,
    /// Long break cadence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sessions_per_long_break: Option<u32>,
    /// Auto-start breaks flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start_breaks: Option<bool>,
    /// Auto-start work flag
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_start_work: Option<bool>,
}

impl ConfigPatch {
    /// Returns true if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Writes every present field into `config`.
    pub fn apply_to(&self, config: &mut EngineConfig) {
        if let Some(minutes) = self.work_minutes {
            config.work_minutes = minutes;
        }
        if let Some(minutes) = self.short_break_minutes {
            config.short_break_minutes = minutes;
        }
        if let Some(minutes) = self.long_break_minutes {
            config.long_break_minutes = minutes;
        }
        if let Some(sessions) = self.sessions_per_long_break {
            config.sessions_per_long_break = sessions;
        }
        if let Some(flag) = self.auto_start_breaks {
            config.auto_start_breaks = flag;
        }
        if let Some(flag) = self.auto_start_work {
            config.auto_start_work = flag;
        }
    }
}

// ============================================================================
// IPC Types
// ============================================================================

/// IPC request from client to daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum IpcRequest {
    /// Start or resume the countdown
    Start,
    /// Pause the countdown
    Pause,
    /// Restart the current session from its full length
    Reset,
    /// Complete the current session immediately
    Skip,
    /// Query the current status
    Status,
    /// Change the live configuration (applies from the next session)
    Configure {
        /// Fields to change
        #[serde(flatten)]
        patch: ConfigPatch,
    },
    /// Destroy the engine and stop the daemon
    Shutdown,
}

impl IpcRequest {
    /// Returns the wire name of the request.
    pub fn as_command(&self) -> &'static str {
        match self {
            IpcRequest::Start => "start",
            IpcRequest::Pause => "pause",
            IpcRequest::Reset => "reset",
            IpcRequest::Skip => "skip",
            IpcRequest::Status => "status",
            IpcRequest::Configure { .. } => "configure",
            IpcRequest::Shutdown => "shutdown",
        }
    }
}

/// Response data for IPC responses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseData {
    /// Timer snapshot after the request was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer: Option<TimerSnapshot>,
    /// Live engine configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<EngineConfig>,
}

impl ResponseData {
    /// Creates response data carrying a timer snapshot.
    pub fn from_snapshot(snapshot: TimerSnapshot) -> Self {
        Self {
            timer: Some(snapshot),
            config: None,
        }
    }

    /// Attaches the live configuration.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// IPC response from daemon to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IpcResponse {
    /// Response status ("success" or "error")
    pub status: String,
    /// Human-readable message
    pub message: String,
    /// Optional response data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<ResponseData>,
}

impl IpcResponse {
    /// Creates a success response.
    pub fn success(message: impl Into<String>, data: Option<ResponseData>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data,
        }
    }

    /// Creates an error response.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            data: None,
        }
    }

    /// Returns true for error responses.
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }

    /// Returns the timer snapshot, if the response carries one.
    pub fn snapshot(&self) -> Option<TimerSnapshot> {
        self.data.as_ref().and_then(|data| data.timer)
    }
}

// ============================================================================
// Tests
// ============================================================================
