//! Display utilities for the Pomodoro Timer CLI.
//!
//! This module provides formatted output for:
//! - Command results
//! - Error messages
//! - Status display with a progress bar
//! - Settings

use crate::config::Settings;
use crate::types::{format_clock, EngineConfig, IpcResponse, RunState, TimerSnapshot};

/// Width of the status progress bar in cells
const PROGRESS_WIDTH: usize = 20;

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows the outcome of a control command (start, pause, reset, skip).
    pub fn show_command_result(response: &IpcResponse) {
        println!("{}", response.message);
        if let Some(snapshot) = response.snapshot() {
            println!("  {}", Self::summary_line(&snapshot));
        }
    }

    /// Shows the current timer status.
    pub fn show_status(response: &IpcResponse) {
        match response.snapshot() {
            Some(snapshot) => {
                for line in Self::status_lines(&snapshot) {
                    println!("{}", line);
                }
            }
            None => println!("No timer status available"),
        }
    }

    /// Shows the result of a shutdown request.
    pub fn show_shutdown(response: &IpcResponse) {
        println!("{}", response.message);
    }

    /// Shows the persisted settings.
    pub fn show_settings(settings: &Settings) {
        for line in Self::settings_lines(settings) {
            println!("{}", line);
        }
    }

    /// Reports a saved settings change and whether a daemon picked it up.
    pub fn show_settings_saved(pushed_to_daemon: bool) {
        println!("Settings saved");
        if pushed_to_daemon {
            println!("  Running daemon updated; changes apply from the next session");
        }
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("Error: {}", message);
    }

    /// Lines of the status view.
    pub fn status_lines(snapshot: &TimerSnapshot) -> Vec<String> {
        vec![
            format!(
                "{} [{}]",
                snapshot.session_type.label(),
                Self::state_label(snapshot.run_state)
            ),
            format!(
                "{} {} / {}",
                render_progress(snapshot.progress(), PROGRESS_WIDTH),
                format_clock(snapshot.seconds_remaining),
                format_clock(snapshot.seconds_total)
            ),
            format!("Completed: {} 🍅", snapshot.completed_work_sessions),
        ]
    }

    /// One-line summary used after control commands.
    pub fn summary_line(snapshot: &TimerSnapshot) -> String {
        format!(
            "{} {} ({})",
            snapshot.session_type.label(),
            format_clock(snapshot.seconds_remaining),
            Self::state_label(snapshot.run_state)
        )
    }

    /// Lines of the settings view.
    pub fn settings_lines(settings: &Settings) -> Vec<String> {
        let EngineConfig {
            work_minutes,
            short_break_minutes,
            long_break_minutes,
            sessions_per_long_break,
            auto_start_breaks,
            auto_start_work,
        } = settings.engine;

        vec![
            format!("Work:                    {} min", work_minutes),
            format!("Short break:             {} min", short_break_minutes),
            format!("Long break:              {} min", long_break_minutes),
            format!("Sessions per long break: {}", sessions_per_long_break),
            format!("Auto-start breaks:       {}", on_off(auto_start_breaks)),
            format!("Auto-start work:         {}", on_off(auto_start_work)),
            format!("Auto-start on load:      {}", on_off(settings.auto_start_on_load)),
            format!("Notifications:           {}", on_off(settings.show_notifications)),
            format!("Sound:                   {}", on_off(settings.play_sound)),
        ]
    }

    fn state_label(state: RunState) -> &'static str {
        match state {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Paused => "paused",
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag {
        "on"
    } else {
        "off"
    }
}

/// Renders `progress` (0.0 to 1.0) as a bar of `width` cells.
pub fn render_progress(progress: f64, width: usize) -> String {
    let progress = if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    };
    // Truncation is intended: a cell fills only once fully reached.
    let filled = ((progress * width as f64) as usize).min(width);
    format!("[{}{}]", "█".repeat(filled), "░".repeat(width - filled))
}

// ============================================================================
// Tests
// ============================================================================
