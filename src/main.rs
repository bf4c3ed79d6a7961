//! Entry point for **wscycle**.
//!
//! `wscycle listen` runs the daemon: every [`EventSource`] runs on a
//! background thread and the [`Daemon`] processes their events on the main
//! thread.  Every other verb is a one-shot command that queries the window
//! manager, acts once and exits.

use std::path::Path;
use std::process::ExitCode;
use std::sync::mpsc;

use log::{error, info};
use wscycle::command::Command;
use wscycle::config::{config_dir, Config};
use wscycle::daemon::{Daemon, DaemonError};
use wscycle::dispatcher::{DispatchError, Dispatcher, Outcome};
use wscycle::i3::events::I3EventSource;
use wscycle::i3::wm::I3Wm;
use wscycle::ipc::client::ControlClient;
use wscycle::ipc::listener::ControlListener;
use wscycle::signals::SignalWatcher;
use wscycle::traits::{DaemonEvent, EventSource};

const EXIT_NOOP: u8 = 1;
const EXIT_USAGE: u8 = 2;
const EXIT_NO_DAEMON: u8 = 3;
const EXIT_FAILURE: u8 = 4;

fn usage() -> String {
    let verbs: Vec<&str> = Command::ALL.iter().map(|c| c.verb()).collect();
    format!(
        "usage: wscycle <{}>\n\n\
         \x20 listen   track per-output focus history (daemon)\n\
         \x20 next     focus the next workspace on the current output\n\
         \x20 prev     focus the previous workspace on the current output\n\
         \x20 toggle   move the focused workspace to the next output\n\
         \x20 back     return to the previous workspace on the current output\n\
         \x20 status   print the daemon's per-output history\n\
         \x20 help     show this message",
        verbs.join("|")
    )
}

/// Load `$XDG_CONFIG_HOME/wscycle/config.json`, falling back to compiled-in
/// defaults when the file does not exist.
fn load_config() -> Result<Config, ExitCode> {
    let path = config_dir().join("config.json");
    if !path.exists() {
        info!("no config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }
    match Config::load(&path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            Ok(cfg)
        }
        Err(e) => {
            eprintln!("wscycle: {}", e);
            Err(ExitCode::from(EXIT_FAILURE))
        }
    }
}

//  Main

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = match args.as_slice() {
        [verb] => match verb.parse::<Command>() {
            Ok(cmd) => cmd,
            Err(e) => {
                eprintln!("wscycle: {}\n{}", e, usage());
                return ExitCode::from(EXIT_USAGE);
            }
        },
        _ => {
            eprintln!("{}", usage());
            return ExitCode::from(EXIT_USAGE);
        }
    };

    if command == Command::Help {
        println!("{}", usage());
        return ExitCode::SUCCESS;
    }

    let config = match load_config() {
        Ok(cfg) => cfg,
        Err(code) => return code,
    };

    match command {
        Command::Listen => match run_daemon(&config) {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                error!("{}", e);
                eprintln!("wscycle: {}", e);
                ExitCode::from(EXIT_FAILURE)
            }
        },
        Command::Status => run_status(&config),
        _ => run_command(command, &config),
    }
}

//  Daemon

/// Daemon mode.  Returns once a shutdown event was processed.
fn run_daemon(config: &Config) -> Result<(), DaemonError> {
    // Must happen before any thread exists so every thread inherits the mask.
    let signals = SignalWatcher::install()?;

    let wm = I3Wm::from_env(config.wm_socket.as_deref())
        .map_err(|e| DaemonError::WindowManager(e.to_string()))?
        .with_timeout(config.wm_timeout());
    let socket = wm.socket().to_path_buf();

    let listener = ControlListener::bind(config.control_socket_path(), config.request_timeout())?;
    let _cleanup = listener.cleanup_guard();

    let mut daemon = Daemon::new(wm, config.history_depth);
    daemon.start();

    let (tx, rx) = mpsc::channel::<DaemonEvent>();
    spawn_source("signal watcher", signals, tx.clone());
    spawn_source("control listener", listener, tx.clone());
    spawn_source(
        "event stream",
        I3EventSource::new(&socket, config.reconnect.clone()).with_timeout(config.wm_timeout()),
        tx,
    );

    daemon.run(rx);
    Ok(())
}

fn spawn_source<S: EventSource + 'static>(name: &'static str, mut source: S, tx: mpsc::Sender<DaemonEvent>) {
    std::thread::spawn(move || {
        if let Err(e) = source.run(tx.clone()) {
            error!("{} error: {}", name, e);
            let _ = tx.send(DaemonEvent::Shutdown {
                reason: format!("{} failed", name),
            });
        }
    });
}

//  One-shot commands

fn run_command(command: Command, config: &Config) -> ExitCode {
    let wm = match I3Wm::from_env(config.wm_socket.as_deref()) {
        Ok(wm) => wm.with_timeout(config.wm_timeout()),
        Err(e) => {
            eprintln!("wscycle: {}", e);
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    let dispatcher = Dispatcher::new(wm);
    let mut client = ControlClient::new(config.control_socket_path(), config.request_timeout());

    match dispatcher.handle(command, &mut client) {
        Ok(outcome @ Outcome::Skipped(_)) => {
            eprintln!("wscycle: {}", outcome);
            ExitCode::from(EXIT_NOOP)
        }
        Ok(outcome) => {
            info!("{}", outcome);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("wscycle: {}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn exit_code(e: &DispatchError) -> u8 {
    match e {
        DispatchError::Engine(_) => EXIT_NOOP,
        DispatchError::NoDaemon(_) => EXIT_NO_DAEMON,
        DispatchError::Transport(_) => EXIT_FAILURE,
    }
}

fn run_status(config: &Config) -> ExitCode {
    let client = ControlClient::new(config.control_socket_path(), config.request_timeout());
    match client.status() {
        Ok(history) => {
            print!("{}", format_status(client.path(), &history));
            ExitCode::SUCCESS
        }
        Err(e) => {
            let e = DispatchError::from(e);
            eprintln!("wscycle: {}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

fn format_status(socket: &Path, history: &std::collections::BTreeMap<String, Vec<String>>) -> String {
    let mut out = format!("daemon on {}\n", socket.display());
    if history.is_empty() {
        out.push_str("  (no history yet)\n");
    }
    for (output, entries) in history {
        out.push_str(&format!("  {}: [{}]\n", output, entries.join(", ")));
    }
    out
}
