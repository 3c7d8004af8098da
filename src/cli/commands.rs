//! Command definitions for the Pomodoro Timer CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::types::{ConfigPatch, MAX_SESSION_MINUTES};

// ============================================================================
// CLI Structure
// ============================================================================

/// Pomodoro Timer CLI
#[derive(Parser, Debug)]
#[command(
    name = "pomodoro",
    version,
    about = "Pomodoro session timer with a background daemon",
    long_about = "A Pomodoro timer that alternates work sessions with short breaks \
                  and a long break every few sessions.\n\
                  Run 'pomodoro daemon' once, then control it with the other commands.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Daemon socket path [default: ~/.pomodoro/pomodoro.sock]
    #[arg(long, global = true, value_name = "PATH")]
    pub socket: Option<PathBuf>,

    /// Settings file path [default: ~/.pomodoro/settings.json]
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start or resume the current session
    Start,

    /// Pause the running session
    Pause,

    /// Restart the current session from its full length
    Reset,

    /// Finish the current session now and move to the next one
    Skip,

    /// Show current timer status
    Status,

    /// Stop the daemon
    Shutdown,

    /// Run the timer daemon in the foreground
    Daemon,

    /// Show or change settings
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Settings subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Print the current settings
    Show,

    /// Print the settings file path
    Path,

    /// Change one or more settings
    Set(ConfigSetArgs),

    /// Restore the default settings
    Reset,
}

// ============================================================================
// Config Set Arguments
// ============================================================================

/// Arguments for `config set`
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigSetArgs {
    /// Work duration in minutes
    #[arg(long, value_parser = minutes_parser())]
    pub work: Option<u32>,

    /// Short break duration in minutes
    #[arg(long, value_parser = minutes_parser())]
    pub short_break: Option<u32>,

    /// Long break duration in minutes
    #[arg(long, value_parser = minutes_parser())]
    pub long_break: Option<u32>,

    /// Work sessions before each long break
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub sessions_per_long_break: Option<u32>,

    /// Start breaks automatically when a work session ends
    #[arg(long, value_name = "BOOL")]
    pub auto_start_breaks: Option<bool>,

    /// Start work automatically when a break ends
    #[arg(long, value_name = "BOOL")]
    pub auto_start_work: Option<bool>,

    /// Start the first work session when the daemon launches
    #[arg(long, value_name = "BOOL")]
    pub auto_start_on_load: Option<bool>,

    /// Show a message when a session completes
    #[arg(long, value_name = "BOOL")]
    pub notifications: Option<bool>,

    /// Play a chime when a session completes
    #[arg(long, value_name = "BOOL")]
    pub sound: Option<bool>,
}

impl ConfigSetArgs {
    /// Returns true if no option was given.
    pub fn is_empty(&self) -> bool {
        self.engine_patch().is_empty()
            && self.auto_start_on_load.is_none()
            && self.notifications.is_none()
            && self.sound.is_none()
    }

    /// Engine fields to push to a running daemon.
    pub fn engine_patch(&self) -> ConfigPatch {
        ConfigPatch {
            work_minutes: self.work,
            short_break_minutes: self.short_break,
            long_break_minutes: self.long_break,
            sessions_per_long_break: self.sessions_per_long_break,
            auto_start_breaks: self.auto_start_breaks,
            auto_start_work: self.auto_start_work,
        }
    }
}

fn minutes_parser() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=i64::from(MAX_SESSION_MINUTES))
}

// ============================================================================
// Tests
// ============================================================================
