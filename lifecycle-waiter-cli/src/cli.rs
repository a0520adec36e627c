use std::path::PathBuf;

use aws_sdk_fsx::types::AdministrativeActionType;
use clap::{Args, Parser, Subcommand};
use lifecycle_waiter_fsx::WaiterConfig;

#[derive(Debug, Parser)]
#[command(
    name = "lifecycle-waiter",
    version,
    about = "Wait for Amazon FSx resources to settle after create, update, and delete calls"
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// JSON file overriding the default timeouts and poll delays
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// AWS region, defaults to the standard provider chain
    #[arg(long, global = true, env = "AWS_REGION")]
    pub region: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct Target {
    /// File system to wait on, e.g. fs-0123456789abcdef0
    #[arg(long, value_name = "ID")]
    pub file_system_id: String,

    /// Override the configured timeout for this wait
    #[arg(long, value_name = "SECONDS")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Wait for a file system to become AVAILABLE
    FileSystemAvailable {
        #[command(flatten)]
        target: Target,

        /// The file system is being updated rather than created
        #[arg(long)]
        after_update: bool,
    },

    /// Wait for a file system to be deleted
    FileSystemDeleted {
        #[command(flatten)]
        target: Target,
    },

    /// Wait for Windows DNS aliases to become AVAILABLE
    AliasAvailable {
        #[command(flatten)]
        target: Target,

        /// Alias to wait on; repeat for several
        #[arg(long = "alias", value_name = "DNS_NAME", required = true)]
        aliases: Vec<String>,
    },

    /// Wait for Windows DNS aliases to be removed
    AliasDeleted {
        #[command(flatten)]
        target: Target,

        /// Alias to wait on; repeat for several
        #[arg(long = "alias", value_name = "DNS_NAME", required = true)]
        aliases: Vec<String>,
    },

    /// Wait for an administrative action to complete or reach UPDATED_OPTIMIZING
    AdminAction {
        #[command(flatten)]
        target: Target,

        #[arg(
            long,
            value_name = "TYPE",
            default_value = "FILE_SYSTEM_UPDATE",
            value_parser = parse_action_type
        )]
        action_type: AdministrativeActionType,
    },
}

impl Command {
    pub fn target(&self) -> &Target {
        match self {
            Self::FileSystemAvailable { target, .. }
            | Self::FileSystemDeleted { target }
            | Self::AliasAvailable { target, .. }
            | Self::AliasDeleted { target, .. }
            | Self::AdminAction { target, .. } => target,
        }
    }

    /// Write `--timeout-secs` into the config field this command's wait is bounded by.
    pub fn apply_timeout(&self, config: &mut WaiterConfig) {
        let Some(secs) = self.target().timeout_secs else {
            return;
        };
        let field = match self {
            Self::FileSystemAvailable {
                after_update: false,
                ..
            } => &mut config.create_timeout_secs,
            Self::FileSystemAvailable {
                after_update: true, ..
            }
            | Self::AdminAction { .. } => &mut config.update_timeout_secs,
            Self::FileSystemDeleted { .. } => &mut config.delete_timeout_secs,
            Self::AliasAvailable { .. } => &mut config.alias_available_timeout_secs,
            Self::AliasDeleted { .. } => &mut config.alias_deleted_timeout_secs,
        };
        *field = secs;
    }
}

fn parse_action_type(raw: &str) -> Result<AdministrativeActionType, String> {
    if AdministrativeActionType::values().contains(&raw) {
        Ok(AdministrativeActionType::from(raw))
    } else {
        Err(format!(
            "unknown administrative action type '{raw}', expected one of: {}",
            AdministrativeActionType::values().join(", ")
        ))
    }
}
