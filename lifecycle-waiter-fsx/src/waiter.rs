//! Named FSx waiters.
//!
//! Each waiter pairs one of the probes in [`crate::status`] with the pending and target
//! states of the lifecycle transition it confirms. Timeouts come from the caller (they
//! depend on which resource operation is being confirmed); poll cadences come from the
//! [`WaiterConfig`].

use std::time::Duration;

use aws_sdk_fsx::types::{
    AdministrativeActionType, AliasLifecycle, FileSystem, FileSystemLifecycle, Status,
};
use lifecycle_waiter_engine::{
    wait_all, wait_for_state, CancellationToken, OnFailure, PollPolicy, StatusProbe, WaitSpec,
    WaitSpecError, NOT_FOUND,
};
use log::info;

use crate::aws::FileSystemApi;
use crate::config::WaiterConfig;
use crate::error::FsxResult;
use crate::status::{
    administrative_actions_status, file_system_status, windows_alias_status, ALIAS_NOT_FOUND,
};

pub fn file_system_available_spec(
    timeout: Duration,
    poll_delay: Duration,
) -> Result<WaitSpec, WaitSpecError> {
    WaitSpec::builder()
        .pending([
            FileSystemLifecycle::Creating.as_str(),
            FileSystemLifecycle::Updating.as_str(),
        ])
        .target([FileSystemLifecycle::Available.as_str()])
        .timeout(timeout)
        .poll_delay(poll_delay)
        .build()
}

/// Succeeds once the file system is no longer listed.
pub fn file_system_deleted_spec(
    timeout: Duration,
    poll_delay: Duration,
) -> Result<WaitSpec, WaitSpecError> {
    WaitSpec::builder()
        .pending([
            FileSystemLifecycle::Available.as_str(),
            FileSystemLifecycle::Deleting.as_str(),
        ])
        .target(Vec::<&str>::new())
        .timeout(timeout)
        .poll_delay(poll_delay)
        .build()
}

/// A freshly associated alias may not be listed yet, so `AliasNotFound` is pending here.
pub fn windows_alias_available_spec(timeout: Duration) -> Result<WaitSpec, WaitSpecError> {
    WaitSpec::builder()
        .pending([AliasLifecycle::Creating.as_str(), ALIAS_NOT_FOUND])
        .target([AliasLifecycle::Available.as_str()])
        .timeout(timeout)
        .poll(PollPolicy::default())
        .build()
}

/// The alias is gone once it is no longer listed, or its whole file system is.
pub fn windows_alias_deleted_spec(timeout: Duration) -> Result<WaitSpec, WaitSpecError> {
    WaitSpec::builder()
        .pending([AliasLifecycle::Deleting.as_str()])
        .target(Vec::<&str>::new())
        .absence_labels([NOT_FOUND, ALIAS_NOT_FOUND])
        .timeout(timeout)
        .poll(PollPolicy::default())
        .build()
}

pub fn administrative_action_completed_or_optimizing_spec(
    timeout: Duration,
    poll_delay: Duration,
) -> Result<WaitSpec, WaitSpecError> {
    WaitSpec::builder()
        .pending([Status::InProgress.as_str(), Status::Pending.as_str()])
        .target([Status::Completed.as_str(), Status::UpdatedOptimizing.as_str()])
        .timeout(timeout)
        .poll_delay(poll_delay)
        .build()
}

async fn run<P>(
    probe: &P,
    spec: &WaitSpec,
    cancel: &CancellationToken,
) -> FsxResult<Option<FileSystem>>
where
    P: StatusProbe<Snapshot = FileSystem> + ?Sized,
{
    Ok(wait_for_state(probe, spec, cancel).await?)
}

/// Wait for a new or updated file system to become `AVAILABLE`.
pub async fn file_system_available<A>(
    api: &A,
    file_system_id: &str,
    timeout: Duration,
    config: &WaiterConfig,
    cancel: &CancellationToken,
) -> FsxResult<Option<FileSystem>>
where
    A: FileSystemApi + ?Sized,
{
    let spec = file_system_available_spec(timeout, config.available_delay())?;
    info!("Waiting up to {timeout:?} for FSx file system {file_system_id} to become available");
    run(&file_system_status(api, file_system_id), &spec, cancel).await
}

/// Wait for a file system to disappear. Settles with `None` once it is gone.
pub async fn file_system_deleted<A>(
    api: &A,
    file_system_id: &str,
    timeout: Duration,
    config: &WaiterConfig,
    cancel: &CancellationToken,
) -> FsxResult<Option<FileSystem>>
where
    A: FileSystemApi + ?Sized,
{
    let spec = file_system_deleted_spec(timeout, config.deleted_delay())?;
    info!("Waiting up to {timeout:?} for FSx file system {file_system_id} to be deleted");
    run(&file_system_status(api, file_system_id), &spec, cancel).await
}

/// Wait for one DNS alias of a Windows file system to become `AVAILABLE`.
///
/// Returns the parent file system as last observed.
pub async fn windows_alias_available<A>(
    api: &A,
    file_system_id: &str,
    alias: &str,
    config: &WaiterConfig,
    cancel: &CancellationToken,
) -> FsxResult<Option<FileSystem>>
where
    A: FileSystemApi + ?Sized,
{
    let spec = windows_alias_available_spec(config.alias_available_timeout())?;
    info!("Waiting for alias {alias} on FSx file system {file_system_id} to become available");
    run(&windows_alias_status(api, file_system_id, alias), &spec, cancel).await
}

pub async fn windows_alias_deleted<A>(
    api: &A,
    file_system_id: &str,
    alias: &str,
    config: &WaiterConfig,
    cancel: &CancellationToken,
) -> FsxResult<Option<FileSystem>>
where
    A: FileSystemApi + ?Sized,
{
    let spec = windows_alias_deleted_spec(config.alias_deleted_timeout())?;
    info!("Waiting for alias {alias} on FSx file system {file_system_id} to be removed");
    run(&windows_alias_status(api, file_system_id, alias), &spec, cancel).await
}

/// Wait for the first administrative action of `action_type` to complete, or to reach
/// the optimizing phase that follows a storage update.
///
/// A file system that lists no such action is treated as already completed.
pub async fn administrative_action_completed_or_optimizing<A>(
    api: &A,
    file_system_id: &str,
    action_type: AdministrativeActionType,
    timeout: Duration,
    config: &WaiterConfig,
    cancel: &CancellationToken,
) -> FsxResult<Option<FileSystem>>
where
    A: FileSystemApi + ?Sized,
{
    let spec =
        administrative_action_completed_or_optimizing_spec(timeout, config.admin_action_delay())?;
    info!(
        "Waiting up to {timeout:?} for {} on FSx file system {file_system_id}",
        action_type.as_str()
    );
    let probe = administrative_actions_status(api, file_system_id, action_type);
    run(&probe, &spec, cancel).await
}

/// Wait for every alias in `aliases` to become available, one session per alias.
///
/// The first failing alias cancels the others and is reported.
pub async fn windows_aliases_available<A>(
    api: &A,
    file_system_id: &str,
    aliases: &[String],
    config: &WaiterConfig,
    cancel: &CancellationToken,
) -> FsxResult<Vec<(String, Option<FileSystem>)>>
where
    A: FileSystemApi + ?Sized,
{
    let spec = windows_alias_available_spec(config.alias_available_timeout())?;
    info!(
        "Waiting for {} alias(es) on FSx file system {file_system_id} to become available",
        aliases.len()
    );
    wait_for_aliases(api, file_system_id, aliases, &spec, cancel).await
}

pub async fn windows_aliases_deleted<A>(
    api: &A,
    file_system_id: &str,
    aliases: &[String],
    config: &WaiterConfig,
    cancel: &CancellationToken,
) -> FsxResult<Vec<(String, Option<FileSystem>)>>
where
    A: FileSystemApi + ?Sized,
{
    let spec = windows_alias_deleted_spec(config.alias_deleted_timeout())?;
    info!(
        "Waiting for {} alias(es) on FSx file system {file_system_id} to be removed",
        aliases.len()
    );
    wait_for_aliases(api, file_system_id, aliases, &spec, cancel).await
}

async fn wait_for_aliases<A>(
    api: &A,
    file_system_id: &str,
    aliases: &[String],
    spec: &WaitSpec,
    cancel: &CancellationToken,
) -> FsxResult<Vec<(String, Option<FileSystem>)>>
where
    A: FileSystemApi + ?Sized,
{
    let settled = wait_all(
        aliases.iter().cloned(),
        cancel,
        OnFailure::CancelRemaining,
        |alias: String, token: CancellationToken| async move {
            let probe = windows_alias_status(api, file_system_id, &alias);
            wait_for_state(&probe, spec, &token).await
        },
    )
    .await?;
    Ok(settled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FsxError;
    use crate::test_utils::{
        file_system, file_system_with_actions, windows_file_system, Reply, ScriptedFsx,
    };
    use aws_sdk_fsx::types::FileSystemLifecycle as Lifecycle;
    use lifecycle_waiter_engine::{FailureKind, Page};
    use rstest::rstest;
    use tokio::time::Instant;

    fn aliased(aliases: &[(&str, AliasLifecycle)]) -> FileSystem {
        windows_file_system("fs-1", Lifecycle::Available, aliases)
    }

    fn names(aliases: &[&str]) -> Vec<String> {
        aliases.iter().map(|alias| alias.to_string()).collect()
    }

    #[rstest]
    #[case::create(Lifecycle::Creating)]
    #[case::update(Lifecycle::Updating)]
    #[tokio::test(start_paused = true)]
    async fn test_file_system_available_after_pending(#[case] pending: Lifecycle) {
        let api = ScriptedFsx::listings(vec![
            vec![file_system("fs-1", pending.clone())],
            vec![file_system("fs-1", pending)],
            vec![file_system("fs-1", Lifecycle::Available)],
        ]);
        let start = Instant::now();

        let settled = file_system_available(
            &api,
            "fs-1",
            Duration::from_secs(45 * 60),
            &WaiterConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("becomes available");

        let fs = settled.expect("available file systems are returned");
        assert_eq!(fs.lifecycle(), Some(&Lifecycle::Available));
        assert_eq!(api.calls(), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_file_system_available_failed_lifecycle_is_unexpected() {
        let api = ScriptedFsx::listings(vec![
            vec![file_system("fs-1", Lifecycle::Creating)],
            vec![file_system("fs-1", Lifecycle::Failed)],
        ]);

        let err = file_system_available(
            &api,
            "fs-1",
            Duration::from_secs(600),
            &WaiterConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .expect_err("FAILED is neither pending nor target");

        assert_eq!(err.kind(), Some(FailureKind::UnexpectedState));
        assert_eq!(
            err.last_file_system().and_then(FileSystem::lifecycle),
            Some(&Lifecycle::Failed)
        );
        assert!(err.to_string().contains("unexpected state 'FAILED'"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_file_system_available_times_out_with_last_snapshot() {
        let api = ScriptedFsx::steady(file_system("fs-1", Lifecycle::Creating));
        let start = Instant::now();

        let err = file_system_available(
            &api,
            "fs-1",
            Duration::from_secs(95),
            &WaiterConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .expect_err("never leaves CREATING");

        assert_eq!(err.kind(), Some(FailureKind::Timeout));
        assert_eq!(start.elapsed(), Duration::from_secs(95));
        assert_eq!(api.calls(), 4);
        assert!(err.last_file_system().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_file_system_available_transport_error_stops_polling() {
        let api = ScriptedFsx::replies(vec![
            Reply::Page(Page::last(vec![file_system("fs-1", Lifecycle::Creating)])),
            Reply::Transport("ThrottlingException: rate exceeded"),
        ]);

        let err = file_system_available(
            &api,
            "fs-1",
            Duration::from_secs(600),
            &WaiterConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .expect_err("transport errors are fatal");

        assert_eq!(err.kind(), Some(FailureKind::Transport));
        assert_eq!(api.calls(), 2);
        assert!(err.last_file_system().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_file_system_deleted_settles_on_absence() {
        let api = ScriptedFsx::replies(vec![
            Reply::Page(Page::last(vec![file_system("fs-1", Lifecycle::Available)])),
            Reply::Page(Page::last(vec![file_system("fs-1", Lifecycle::Deleting)])),
            Reply::NotFound,
        ]);

        let settled = file_system_deleted(
            &api,
            "fs-1",
            Duration::from_secs(30 * 60),
            &WaiterConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("deleted");

        assert!(settled.is_none());
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_file_system_deleted_empty_listing_counts_as_gone() {
        let api = ScriptedFsx::listings(vec![vec![]]);

        let settled = file_system_deleted(
            &api,
            "fs-1",
            Duration::from_secs(60),
            &WaiterConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("already gone");

        assert!(settled.is_none());
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_timeout_is_rejected_before_probing() {
        let api = ScriptedFsx::not_found();

        let err = file_system_deleted(
            &api,
            "fs-1",
            Duration::ZERO,
            &WaiterConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .expect_err("zero timeout");

        assert!(matches!(err, FsxError::Spec(WaitSpecError::ZeroTimeout)));
        assert_eq!(err.kind(), None);
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_windows_alias_available_waits_for_listing() {
        let api = ScriptedFsx::listings(vec![
            vec![aliased(&[])],
            vec![aliased(&[("fs.example.com", AliasLifecycle::Creating)])],
            vec![aliased(&[("fs.example.com", AliasLifecycle::Available)])],
        ]);

        let settled = windows_alias_available(
            &api,
            "fs-1",
            "fs.example.com",
            &WaiterConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("alias becomes available");

        assert_eq!(settled.and_then(|fs| fs.file_system_id), Some("fs-1".to_string()));
        assert_eq!(api.calls(), 3);
    }

    #[rstest]
    #[case::alias_removed(ScriptedFsx::listings(vec![
        vec![aliased(&[("fs.example.com", AliasLifecycle::Deleting)])],
        vec![aliased(&[])],
    ]))]
    #[case::file_system_removed(ScriptedFsx::replies(vec![
        Reply::Page(Page::last(vec![aliased(&[("fs.example.com", AliasLifecycle::Deleting)])])),
        Reply::NotFound,
    ]))]
    #[tokio::test(start_paused = true)]
    async fn test_windows_alias_deleted(#[case] api: ScriptedFsx) {
        windows_alias_deleted(
            &api,
            "fs-1",
            "fs.example.com",
            &WaiterConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("alias is gone");

        assert_eq!(api.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_windows_alias_deleted_times_out_after_configured_limit() {
        let api = ScriptedFsx::steady(aliased(&[("fs.example.com", AliasLifecycle::Deleting)]));
        let start = Instant::now();

        let err = windows_alias_deleted(
            &api,
            "fs-1",
            "fs.example.com",
            &WaiterConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .expect_err("alias never goes away");

        assert_eq!(err.kind(), Some(FailureKind::Timeout));
        assert_eq!(start.elapsed(), Duration::from_secs(5 * 60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_administrative_action_settles_when_action_disappears() {
        let api = ScriptedFsx::listings(vec![
            vec![file_system_with_actions(
                "fs-1",
                &[(AdministrativeActionType::FileSystemUpdate, Status::Pending)],
            )],
            vec![file_system_with_actions(
                "fs-1",
                &[(AdministrativeActionType::FileSystemUpdate, Status::InProgress)],
            )],
            vec![file_system_with_actions("fs-1", &[])],
        ]);

        let settled = administrative_action_completed_or_optimizing(
            &api,
            "fs-1",
            AdministrativeActionType::FileSystemUpdate,
            Duration::from_secs(45 * 60),
            &WaiterConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("update finished");

        assert!(settled.is_some());
        assert_eq!(api.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_administrative_action_optimizing_is_a_target() {
        let api = ScriptedFsx::steady(file_system_with_actions(
            "fs-1",
            &[(AdministrativeActionType::FileSystemUpdate, Status::UpdatedOptimizing)],
        ));

        administrative_action_completed_or_optimizing(
            &api,
            "fs-1",
            AdministrativeActionType::FileSystemUpdate,
            Duration::from_secs(60),
            &WaiterConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("optimizing counts as done");

        assert_eq!(api.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_before_first_probe() {
        let api = ScriptedFsx::steady(file_system("fs-1", Lifecycle::Creating));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = file_system_available(
            &api,
            "fs-1",
            Duration::from_secs(600),
            &WaiterConfig::default(),
            &cancel,
        )
        .await
        .expect_err("cancelled");

        assert_eq!(err.kind(), Some(FailureKind::Cancelled));
        assert_eq!(api.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_windows_aliases_available_joins_all_in_order() {
        let api = ScriptedFsx::steady(aliased(&[
            ("b.example.com", AliasLifecycle::Available),
            ("a.example.com", AliasLifecycle::Available),
        ]));

        let settled = windows_aliases_available(
            &api,
            "fs-1",
            &names(&["a.example.com", "b.example.com"]),
            &WaiterConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("both available");

        let keys: Vec<&str> = settled.iter().map(|(alias, _)| alias.as_str()).collect();
        assert_eq!(keys, vec!["a.example.com", "b.example.com"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_windows_aliases_available_first_failure_cancels_the_rest() {
        let api = ScriptedFsx::steady(aliased(&[
            ("a.example.com", AliasLifecycle::Creating),
            ("b.example.com", AliasLifecycle::CreateFailed),
        ]));

        let err = windows_aliases_available(
            &api,
            "fs-1",
            &names(&["a.example.com", "b.example.com"]),
            &WaiterConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .expect_err("b failed");

        let FsxError::Batch(failure) = &err else {
            panic!("expected a batch failure, got {err:?}");
        };
        assert_eq!(failure.key, "b.example.com");
        assert_eq!(failure.error().kind(), FailureKind::UnexpectedState);
        assert_eq!(failure.succeeded, 0);
        assert_eq!(failure.failed, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_windows_aliases_deleted() {
        let api = ScriptedFsx::listings(vec![
            vec![aliased(&[
                ("a.example.com", AliasLifecycle::Deleting),
                ("b.example.com", AliasLifecycle::Deleting),
            ])],
            vec![aliased(&[])],
        ]);

        let settled = windows_aliases_deleted(
            &api,
            "fs-1",
            &names(&["a.example.com", "b.example.com"]),
            &WaiterConfig::default(),
            &CancellationToken::new(),
        )
        .await
        .expect("both removed");

        assert_eq!(settled.len(), 2);
    }
}
