//! Daemon module for the Pomodoro Timer.
//!
//! This module contains the core daemon functionality:
//! - `timer`: Timer engine with state transitions and session sequencing
//! - `countdown`: Task that waits for the engine's deadlines and fires them
//! - `ipc`: Unix socket server and request handling

pub mod countdown;
pub mod ipc;
pub mod timer;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{Mutex, Notify};

pub use ipc::{default_socket_path, IpcServer, RequestHandler};
pub use timer::{Countdown, TimerEngine, TICK_INTERVAL};

use crate::config::{SettingsStore, SharedConfig};
use crate::notification::{self, ConsoleSink, NotificationPrefs};

/// Where the daemon listens and which settings it loads.
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    /// Unix socket path
    pub socket_path: PathBuf,
    /// Settings store
    pub settings: SettingsStore,
}

/// Runs the daemon until a shutdown request or Ctrl-C.
///
/// # Errors
///
/// Returns an error if the settings are invalid or the socket cannot be
/// bound.
pub async fn run(options: DaemonOptions) -> Result<()> {
    let settings = options
        .settings
        .load()
        .with_context(|| format!("Failed to load settings from {:?}", options.settings.path()))?;

    let config = SharedConfig::new(settings.engine.clone())?;
    let mut engine = TimerEngine::new(config.clone())?;

    notification::attach(
        &mut engine,
        Arc::new(ConsoleSink),
        NotificationPrefs::from(&settings),
    );
    engine.subscribe_tick(|snapshot| {
        tracing::trace!(
            state = snapshot.run_state.as_str(),
            session = snapshot.session_type.as_str(),
            remaining = snapshot.seconds_remaining,
            "tick"
        );
    });

    if settings.auto_start_on_load {
        tracing::info!("auto-starting first work session");
        engine.start();
    }

    let engine = Arc::new(Mutex::new(engine));
    let driver = tokio::spawn(countdown::drive(engine.clone()));

    let server = IpcServer::new(&options.socket_path)?;
    let shutdown = Arc::new(Notify::new());
    let handler = RequestHandler::new(engine.clone(), config, shutdown.clone());

    tracing::info!("daemon started");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            accepted = server.accept() => match accepted {
                Ok(stream) => {
                    if let Err(e) = handler.serve(stream).await {
                        tracing::warn!("Failed to answer client: {:#}", e);
                    }
                }
                Err(e) => tracing::error!("{:#}", e),
            },
            _ = shutdown.notified() => {
                tracing::info!("shutdown requested");
                break;
            }
            _ = &mut ctrl_c => {
                tracing::info!("interrupted");
                break;
            }
        }
    }

    engine.lock().await.destroy();
    driver.await.context("Countdown driver panicked")?;
    drop(server);

    tracing::info!("daemon stopped");
    Ok(())
}
