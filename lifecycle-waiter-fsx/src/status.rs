//! FSx status probes.
//!
//! Every probe looks the file system up by ID and labels it differently:
//!
//! - [`file_system_status`]: the file system lifecycle (`CREATING`, `AVAILABLE`, ...)
//! - [`windows_alias_status`]: the lifecycle of one DNS alias of a Windows file system,
//!   [`ALIAS_NOT_FOUND`] when that alias is not listed
//! - [`administrative_actions_status`]: the status of the first administrative action of a
//!   given type, `COMPLETED` when no action of that type is listed
//!
//! All three keep the whole file system as the snapshot, so a failed wait can still report
//! what the file system looked like last.

use aws_sdk_fsx::types::{AdministrativeAction, AdministrativeActionType, Alias, FileSystem, Status};
use lifecycle_waiter_engine::{nested_label, LookupProbe, StateLabel, StatusProbe};

use crate::aws::FileSystemApi;
use crate::finder::file_system_lookup;

/// Label reported when the file system exists but does not list the requested alias.
pub const ALIAS_NOT_FOUND: &str = "AliasNotFound";

/// The lifecycle of the file system itself.
pub fn lifecycle_label(file_system: &FileSystem) -> StateLabel {
    file_system
        .lifecycle()
        .map(|lifecycle| StateLabel::from(lifecycle.as_str()))
        .unwrap_or_else(StateLabel::unknown)
}

/// The lifecycle of the alias named `alias`.
///
/// A file system without a Windows configuration cannot carry aliases at all and is
/// labeled `Unknown`, which no waiter accepts.
pub fn alias_label(file_system: &FileSystem, alias: &str) -> StateLabel {
    let Some(windows) = file_system.windows_configuration() else {
        return StateLabel::unknown();
    };
    nested_label(
        windows.aliases(),
        |candidate: &Alias| candidate.name() == Some(alias),
        |found: &Alias| {
            found
                .lifecycle()
                .map(|lifecycle| StateLabel::from(lifecycle.as_str()))
                .unwrap_or_else(StateLabel::unknown)
        },
        StateLabel::from(ALIAS_NOT_FOUND),
    )
}

/// The status of the first administrative action of `action_type`.
///
/// When none is listed the file system is taken to be settled and labeled
/// `treat_no_match_as` (`COMPLETED` for the stock probe).
pub fn administrative_action_label(
    file_system: &FileSystem,
    action_type: &AdministrativeActionType,
    treat_no_match_as: &Status,
) -> StateLabel {
    nested_label(
        file_system.administrative_actions(),
        |action: &AdministrativeAction| action.administrative_action_type() == Some(action_type),
        |action: &AdministrativeAction| {
            action
                .status()
                .map(|status| StateLabel::from(status.as_str()))
                .unwrap_or_else(StateLabel::unknown)
        },
        StateLabel::from(treat_no_match_as.as_str()),
    )
}

pub fn file_system_status<'a, A>(
    api: &'a A,
    file_system_id: &str,
) -> impl StatusProbe<Snapshot = FileSystem> + 'a
where
    A: FileSystemApi + ?Sized + 'a,
{
    LookupProbe::new(file_system_lookup(api, file_system_id), lifecycle_label)
}

/// Probe one alias; the snapshot is the parent file system.
pub fn windows_alias_status<'a, A>(
    api: &'a A,
    file_system_id: &str,
    alias: &str,
) -> impl StatusProbe<Snapshot = FileSystem> + 'a
where
    A: FileSystemApi + ?Sized + 'a,
{
    let alias = alias.to_string();
    LookupProbe::new(
        file_system_lookup(api, file_system_id),
        move |file_system: &FileSystem| alias_label(file_system, &alias),
    )
}

pub fn administrative_actions_status<'a, A>(
    api: &'a A,
    file_system_id: &str,
    action_type: AdministrativeActionType,
) -> impl StatusProbe<Snapshot = FileSystem> + 'a
where
    A: FileSystemApi + ?Sized + 'a,
{
    LookupProbe::new(
        file_system_lookup(api, file_system_id),
        move |file_system: &FileSystem| {
            administrative_action_label(file_system, &action_type, &Status::Completed)
        },
    )
}
