mod cli;
mod config;
mod storage;
mod tasks;
mod theme;
mod tui;

use std::{
    fs::{self, OpenOptions},
    path::Path,
    sync::Mutex,
};

use crate::cli::ConfigCommand;
use clap::Parser;
use color_eyre::Result;
use daybook_core::{clock::SystemClock, storage::KeyValueStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE: &str = "daybook.log";

/// Entry point wiring the CLI to the TUI and the task subcommands.
fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = cli::Cli::parse();
    let config = config::load()?;
    let command = cli.command.unwrap_or(cli::Command::Tui);

    match command {
        cli::Command::Tui => {
            // The TUI owns the screen, so diagnostics go to a file.
            let data_dir = storage::data_dir_from_config(&config)?;
            init_tracing(Some(&data_dir.join(LOG_FILE)))?;
            let tasks = storage::open_tasks(storage::store_from_config(&config)?, SystemClock);
            tui::launch(tui::App::new(tasks, &config))?
        }
        cli::Command::Version => print_version(),
        cli::Command::Health => {
            init_tracing(None)?;
            run_health_check(&config)?
        }
        cli::Command::Config(ConfigCommand::Init) => init_config(&config)?,
        cli::Command::Task(cmd) => {
            init_tracing(None)?;
            tasks::handle(cmd, &config)?
        }
        cli::Command::Theme { choice } => {
            init_tracing(None)?;
            theme::handle(choice, &config)?
        }
    }

    Ok(())
}

/// Logs to stderr (default level `warn`) or to `log_file` (default `info`).
/// `RUST_LOG` overrides either default.
fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let default_level = if log_file.is_some() { "info" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let registry = tracing_subscriber::registry().with(env_filter);

    match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(Mutex::new(file));
            registry.with(fmt_layer).init();
        }
        None => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr);
            registry.with(fmt_layer).init();
        }
    }
    Ok(())
}

fn print_version() {
    println!("daybook {}", env!("CARGO_PKG_VERSION"));
}

/// Runs a quick health check of the storage directory.
fn run_health_check(config: &config::Config) -> Result<()> {
    let store = storage::store_from_config(config)?;
    run_store_health(&store)?;
    println!("Storage: ok ({})", store.root().display());
    Ok(())
}

fn run_store_health<S: KeyValueStore>(store: &S) -> Result<()> {
    let probe_key = "health/probe";
    let payload = b"ok";
    store
        .put(probe_key, payload)
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;
    let round_trip = store
        .get(probe_key)
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;
    store
        .delete(probe_key)
        .map_err(|e| color_eyre::eyre::eyre!(e.to_string()))?;

    if round_trip != payload {
        color_eyre::eyre::bail!("storage round-trip failed");
    }
    Ok(())
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use daybook_core::storage::InMemoryStore;

    use super::*;

    #[test]
    fn health_check_with_test_store_succeeds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = storage::test_store(dir.path());
        run_store_health(&store).expect("health check should succeed");
    }

    #[test]
    fn health_check_reports_unwritable_store() {
        let store = InMemoryStore::new();
        store.set_fail_writes(true);
        assert!(run_store_health(&store).is_err());
    }
}
