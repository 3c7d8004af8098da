//! Pomodoro Timer CLI
//!
//! This tool helps you stay focused using the Pomodoro Technique:
//! - 25 minutes of focused work
//! - 5 minutes of short break
//! - 15 minutes of long break after every 4 work sessions

use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser};

use pomodoro_cycle::cli::{Cli, Commands, ConfigCommand, ConfigSetArgs, Display, IpcClient};
use pomodoro_cycle::config::{Settings, SettingsStore};
use pomodoro_cycle::daemon::{self, DaemonOptions};
use pomodoro_cycle::types::ConfigPatch;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Start => {
            let response = client(&cli.socket)?.start().await?;
            Display::show_command_result(&response);
        }
        Commands::Pause => {
            let response = client(&cli.socket)?.pause().await?;
            Display::show_command_result(&response);
        }
        Commands::Reset => {
            let response = client(&cli.socket)?.reset().await?;
            Display::show_command_result(&response);
        }
        Commands::Skip => {
            let response = client(&cli.socket)?.skip().await?;
            Display::show_command_result(&response);
        }
        Commands::Status => {
            let response = client(&cli.socket)?.status().await?;
            Display::show_status(&response);
        }
        Commands::Shutdown => {
            let response = client(&cli.socket)?.shutdown().await?;
            Display::show_shutdown(&response);
        }
        Commands::Daemon => {
            let socket_path = match cli.socket {
                Some(path) => path,
                None => daemon::default_socket_path()?,
            };
            daemon::run(DaemonOptions {
                socket_path,
                settings: settings_store(&cli.config)?,
            })
            .await?;
        }
        Commands::Config(command) => {
            execute_config(command, &cli.config, &cli.socket).await?;
        }
        Commands::Completions { shell } => {
            generate_completions(shell);
        }
    }

    Ok(())
}

/// Executes a `config` subcommand.
async fn execute_config(
    command: ConfigCommand,
    config: &Option<PathBuf>,
    socket: &Option<PathBuf>,
) -> Result<()> {
    let store = settings_store(config)?;

    match command {
        ConfigCommand::Show => {
            Display::show_settings(&store.load()?);
        }
        ConfigCommand::Path => {
            println!("{}", store.path().display());
        }
        ConfigCommand::Set(args) => {
            if args.is_empty() {
                anyhow::bail!("No settings given. See 'pomodoro config set --help'");
            }
            let mut settings = store.load()?;
            apply_settings(&mut settings, &args);
            store.save(&settings)?;

            let pushed = push_to_daemon(socket, args.engine_patch()).await?;
            Display::show_settings_saved(pushed);
        }
        ConfigCommand::Reset => {
            let settings = Settings::default();
            store.save(&settings)?;

            let engine = settings.engine;
            let patch = ConfigPatch {
                work_minutes: Some(engine.work_minutes),
                short_break_minutes: Some(engine.short_break_minutes),
                long_break_minutes: Some(engine.long_break_minutes),
                sessions_per_long_break: Some(engine.sessions_per_long_break),
                auto_start_breaks: Some(engine.auto_start_breaks),
                auto_start_work: Some(engine.auto_start_work),
            };
            let pushed = push_to_daemon(socket, patch).await?;
            Display::show_settings_saved(pushed);
        }
    }

    Ok(())
}

/// Writes every option given on the command line into `settings`.
fn apply_settings(settings: &mut Settings, args: &ConfigSetArgs) {
    args.engine_patch().apply_to(&mut settings.engine);
    if let Some(flag) = args.auto_start_on_load {
        settings.auto_start_on_load = flag;
    }
    if let Some(flag) = args.notifications {
        settings.show_notifications = flag;
    }
    if let Some(flag) = args.sound {
        settings.play_sound = flag;
    }
}

/// Sends engine changes to a running daemon.
///
/// Returns false when no daemon is listening; the saved file is picked up
/// on the next start.
async fn push_to_daemon(socket: &Option<PathBuf>, patch: ConfigPatch) -> Result<bool> {
    if patch.is_empty() {
        return Ok(false);
    }

    let client = client(socket)?;
    if !client.is_daemon_running().await {
        tracing::info!("no daemon running; settings apply on next start");
        return Ok(false);
    }

    client.configure(patch).await?;
    Ok(true)
}

fn client(socket: &Option<PathBuf>) -> Result<IpcClient> {
    match socket {
        Some(path) => Ok(IpcClient::with_socket_path(path.clone())),
        None => IpcClient::new(),
    }
}

fn settings_store(config: &Option<PathBuf>) -> Result<SettingsStore> {
    match config {
        Some(path) => Ok(SettingsStore::new(path.clone())),
        None => Ok(SettingsStore::open_default()?),
    }
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
