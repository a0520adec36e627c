//! lifecycle-waiter: block until an FSx resource reaches the requested lifecycle state.
//!
//! Exit codes:
//! - 0: the resource settled
//! - 1: bad arguments or configuration, or the FSx API failed
//! - 2: the resource entered a state the wait does not accept
//! - 3: the wait timed out
//! - 130: interrupted with Ctrl-C

mod cli;

use std::process::ExitCode;

use anyhow::{Context, Result};
use aws_sdk_fsx::types::FileSystem;
use clap::Parser;
use lifecycle_waiter_engine::{CancellationToken, FailureKind};
use lifecycle_waiter_fsx::{FsxError, FsxWaiterService, WaiterConfig};
use log::{debug, warn};
use serde_json::{json, Value};

use cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // help and version go to stdout and are not failures
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging(cli.debug);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling wait");
                cancel.cancel();
            }
        }
    });

    match run(cli, &cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            exit_code(&err)
        }
    }
}

fn init_logging(debug: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

async fn run(cli: Cli, cancel: &CancellationToken) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => WaiterConfig::from_file(path).context("Failed to load waiter config")?,
        None => WaiterConfig::default(),
    };
    cli.command.apply_timeout(&mut config);
    config.validate().context("Invalid timeout")?;
    debug!("Using {config:?}");

    let service = FsxWaiterService::new(cli.region, config)
        .await
        .context("Failed to initialize FSx client")?;
    let file_system_id = cli.command.target().file_system_id.as_str();

    let report = match &cli.command {
        Command::FileSystemAvailable { after_update, .. } => {
            let settled = if *after_update {
                service.file_system_updated(file_system_id, cancel).await
            } else {
                service.file_system_created(file_system_id, cancel).await
            };
            summarize(file_system_id, settled.map_err(with_last_state)?.as_ref())
        }
        Command::FileSystemDeleted { .. } => {
            let settled = service.file_system_deleted(file_system_id, cancel).await;
            summarize(file_system_id, settled.map_err(with_last_state)?.as_ref())
        }
        Command::AdminAction { action_type, .. } => {
            let settled = service
                .administrative_action_completed(file_system_id, action_type.clone(), cancel)
                .await;
            summarize(file_system_id, settled.map_err(with_last_state)?.as_ref())
        }
        Command::AliasAvailable { aliases, .. } => {
            let settled = service
                .windows_aliases_available(file_system_id, aliases, cancel)
                .await
                .map_err(with_last_state)?;
            summarize_aliases(file_system_id, &settled)
        }
        Command::AliasDeleted { aliases, .. } => {
            let settled = service
                .windows_aliases_deleted(file_system_id, aliases, cancel)
                .await
                .map_err(with_last_state)?;
            summarize_aliases(file_system_id, &settled)
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Attach the last observed lifecycle to a failed wait for the error report.
fn with_last_state(err: FsxError) -> anyhow::Error {
    let lifecycle = err
        .last_file_system()
        .and_then(FileSystem::lifecycle)
        .map(|lifecycle| lifecycle.as_str().to_string());
    match lifecycle {
        Some(lifecycle) => {
            anyhow::Error::new(err).context(format!("File system was last seen {lifecycle}"))
        }
        None => anyhow::Error::new(err),
    }
}

fn summarize(file_system_id: &str, settled: Option<&FileSystem>) -> Value {
    match settled {
        Some(fs) => json!({
            "FileSystemId": file_system_id,
            "Lifecycle": fs.lifecycle().map(|lifecycle| lifecycle.as_str()),
        }),
        None => json!({
            "FileSystemId": file_system_id,
            "Deleted": true,
        }),
    }
}

fn summarize_aliases(file_system_id: &str, settled: &[(String, Option<FileSystem>)]) -> Value {
    let aliases: Vec<&str> = settled.iter().map(|(alias, _)| alias.as_str()).collect();
    json!({
        "FileSystemId": file_system_id,
        "Aliases": aliases,
    })
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    let kind = err.downcast_ref::<FsxError>().and_then(FsxError::kind);
    match kind {
        Some(FailureKind::UnexpectedState) => ExitCode::from(2),
        Some(FailureKind::Timeout) => ExitCode::from(3),
        Some(FailureKind::Cancelled) => ExitCode::from(130),
        Some(FailureKind::Transport) | None => ExitCode::from(1),
    }
}
