//! FSx waiter service.
//!
//! Holds one FSx client shared by every waiting session and the [`WaiterConfig`] that
//! decides how long each kind of wait may take. Adapters (the CLI) call these methods
//! instead of the free functions in [`crate::waiter`].

use aws_config::{BehaviorVersion, Region};
use aws_sdk_fsx::types::{AdministrativeActionType, FileSystem};
use aws_sdk_fsx::Client as FsxClient;
use lifecycle_waiter_engine::CancellationToken;
use log::debug;

use crate::aws::FileSystemApi;
use crate::config::WaiterConfig;
use crate::error::FsxResult;
use crate::waiter;

pub struct FsxWaiterService<A = FsxClient> {
    api: A,
    config: WaiterConfig,
}

impl FsxWaiterService<FsxClient> {
    /// Create a service backed by a real FSx client.
    ///
    /// Credentials and the default region come from the standard provider chain;
    /// `region` overrides the latter.
    pub async fn new(region: Option<String>, config: WaiterConfig) -> FsxResult<Self> {
        config.validate()?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            debug!("Using region override {region}");
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;

        Ok(Self::with_api(FsxClient::new(&sdk_config), config))
    }
}

impl<A: FileSystemApi> FsxWaiterService<A> {
    pub fn with_api(api: A, config: WaiterConfig) -> Self {
        Self { api, config }
    }

    pub fn config(&self) -> &WaiterConfig {
        &self.config
    }

    /// Wait for a newly created file system, bounded by the create timeout.
    pub async fn file_system_created(
        &self,
        file_system_id: &str,
        cancel: &CancellationToken,
    ) -> FsxResult<Option<FileSystem>> {
        waiter::file_system_available(
            &self.api,
            file_system_id,
            self.config.create_timeout(),
            &self.config,
            cancel,
        )
        .await
    }

    /// Wait for an updated file system, bounded by the update timeout.
    pub async fn file_system_updated(
        &self,
        file_system_id: &str,
        cancel: &CancellationToken,
    ) -> FsxResult<Option<FileSystem>> {
        waiter::file_system_available(
            &self.api,
            file_system_id,
            self.config.update_timeout(),
            &self.config,
            cancel,
        )
        .await
    }

    pub async fn file_system_deleted(
        &self,
        file_system_id: &str,
        cancel: &CancellationToken,
    ) -> FsxResult<Option<FileSystem>> {
        waiter::file_system_deleted(
            &self.api,
            file_system_id,
            self.config.delete_timeout(),
            &self.config,
            cancel,
        )
        .await
    }

    /// Administrative actions follow an update, so they share its timeout.
    pub async fn administrative_action_completed(
        &self,
        file_system_id: &str,
        action_type: AdministrativeActionType,
        cancel: &CancellationToken,
    ) -> FsxResult<Option<FileSystem>> {
        waiter::administrative_action_completed_or_optimizing(
            &self.api,
            file_system_id,
            action_type,
            self.config.update_timeout(),
            &self.config,
            cancel,
        )
        .await
    }

    pub async fn windows_aliases_available(
        &self,
        file_system_id: &str,
        aliases: &[String],
        cancel: &CancellationToken,
    ) -> FsxResult<Vec<(String, Option<FileSystem>)>> {
        waiter::windows_aliases_available(&self.api, file_system_id, aliases, &self.config, cancel)
            .await
    }

    pub async fn windows_aliases_deleted(
        &self,
        file_system_id: &str,
        aliases: &[String],
        cancel: &CancellationToken,
    ) -> FsxResult<Vec<(String, Option<FileSystem>)>> {
        waiter::windows_aliases_deleted(&self.api, file_system_id, aliases, &self.config, cancel)
            .await
    }
}
