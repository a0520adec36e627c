//! FSx client wrapper for file system listings

use async_trait::async_trait;
use aws_sdk_fsx::error::{DisplayErrorContext, SdkError};
use aws_sdk_fsx::operation::describe_file_systems::DescribeFileSystemsError;
use aws_sdk_fsx::types::FileSystem;
use aws_sdk_fsx::Client as FsxClient;
use lifecycle_waiter_engine::{FindError, Page};

/// The slice of the FSx API the waiters depend on.
///
/// Implementations are shared by concurrent waiting sessions and must be safe to
/// call from several of them at once.
#[async_trait]
pub trait FileSystemApi: Send + Sync {
    /// One page of `DescribeFileSystems` filtered to `file_system_id`.
    ///
    /// A `FileSystemNotFound` service error must surface as [`FindError::NotFound`].
    async fn describe_file_systems_page(
        &self,
        file_system_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<FileSystem>, FindError>;
}

#[async_trait]
impl FileSystemApi for FsxClient {
    async fn describe_file_systems_page(
        &self,
        file_system_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<FileSystem>, FindError> {
        let response = self
            .describe_file_systems()
            .file_system_ids(file_system_id)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| classify_describe_error(file_system_id, &e))?;

        Ok(Page {
            items: response.file_systems.unwrap_or_default(),
            next_token: response.next_token,
        })
    }
}

/// Separate the classified absence from every other SDK failure
fn classify_describe_error(
    file_system_id: &str,
    err: &SdkError<DescribeFileSystemsError>,
) -> FindError {
    if is_file_system_not_found(err.as_service_error()) {
        return FindError::not_found(format!("FSx file system {file_system_id}"));
    }
    FindError::transport(format!(
        "Failed to describe FSx file system '{file_system_id}': {}",
        DisplayErrorContext(err)
    ))
}

fn is_file_system_not_found(service_err: Option<&DescribeFileSystemsError>) -> bool {
    service_err.is_some_and(DescribeFileSystemsError::is_file_system_not_found)
}
