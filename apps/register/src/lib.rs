//! # Tally Register Library
//!
//! Terminal front end for the Tally POS sales engine.
//!
//! ## Module Organization
//! ```text
//! tally_register/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   └── config.rs   ◄─── Configuration state
//! ├── commands/
//! │   ├── mod.rs      ◄─── Parsing and dispatch
//! │   ├── product.rs  ◄─── Product search/add
//! │   ├── sale.rs     ◄─── Commit, modify, void, list
//! │   └── quote.rs    ◄─── Quotation numbers
//! └── error.rs        ◄─── API error type for commands
//! ```

pub mod commands;
pub mod error;
pub mod state;

use anyhow::Context;
use directories::ProjectDirs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use commands::Command;
use error::ApiError;
use state::{ConfigState, DbState};
use tally_db::{Database, DbConfig};

/// Runs one register invocation.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  1. Initialize Logging (stderr, RUST_LOG or default filter)             │
/// │  2. Parse the subcommand (clap) ── help? print it and stop              │
/// │  3. Load ConfigState from TALLY_* variables                             │
/// │  4. Determine Database Path                                             │
/// │     • TALLY_DB_PATH when set                                            │
/// │     • otherwise the platform data directory (tally.db)                  │
/// │  5. Connect, run pending migrations                                     │
/// │  6. Execute ── JSON on stdout, or JSON error on stderr + exit 1         │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// Failures the cashier can act on are reported as [`ApiError`] JSON with a
/// failing exit code. Only environment problems (no data directory) surface
/// as `Err`.
pub async fn run(args: Vec<String>) -> anyhow::Result<ExitCode> {
    init_tracing();

    let command = match Command::parse(&args) {
        Ok(Command::Help) => {
            println!("{}", commands::help_text());
            return Ok(ExitCode::SUCCESS);
        }
        Ok(command) => command,
        Err(err) if !err.use_stderr() => {
            err.print()?;
            return Ok(ExitCode::SUCCESS);
        }
        Err(err) => return Ok(fail(&ApiError::from(err))),
    };

    let config = ConfigState::from_env();
    let db_path = get_database_path(&config)?;
    info!(?db_path, "Database path determined");

    let db = match Database::new(DbConfig::new(db_path)).await {
        Ok(db) => db,
        Err(err) => return Ok(fail(&ApiError::from(err))),
    };
    let state = DbState::new(db);

    let outcome = commands::execute(&state, &config, command).await;
    state.inner().close().await;

    Ok(match outcome {
        Ok(output) => {
            println!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => fail(&err),
    })
}

fn fail(err: &ApiError) -> ExitCode {
    warn!(code = ?err.code, message = %err.message, "Command failed");
    eprintln!("{}", err.to_json());
    ExitCode::FAILURE
}

/// Initializes the tracing subscriber for structured logging.
///
/// Logs go to stderr so stdout stays machine-readable.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tally=trace` - Show trace for tally crates only
/// - Default: `info,tally=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tally=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Determines the database file path.
///
/// ## Platform-Specific Paths
/// - **macOS**: `~/Library/Application Support/com.tally.pos/tally.db`
/// - **Windows**: `%APPDATA%\tally\pos\data\tally.db`
/// - **Linux**: `~/.local/share/pos/tally.db`
///
/// `TALLY_DB_PATH` overrides all of these.
fn get_database_path(config: &ConfigState) -> anyhow::Result<PathBuf> {
    if let Some(path) = &config.db_path {
        return Ok(path.clone());
    }

    let proj_dirs = ProjectDirs::from("com", "tally", "pos")
        .context("Could not determine app data directory")?;

    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Could not create {}", data_dir.display()))?;

    Ok(data_dir.join("tally.db"))
}
