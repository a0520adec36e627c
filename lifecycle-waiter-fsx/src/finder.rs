//! File system lookups by ID

use async_trait::async_trait;
use aws_sdk_fsx::types::FileSystem;
use lifecycle_waiter_engine::{find_first, FindError, Lookup, Page, PageSource, PagedLookup};

use crate::aws::FileSystemApi;

/// DescribeFileSystems pages for one file system ID.
pub struct FileSystemPages<'a, A: ?Sized> {
    api: &'a A,
    file_system_id: String,
}

impl<'a, A: ?Sized> FileSystemPages<'a, A> {
    pub fn new(api: &'a A, file_system_id: impl Into<String>) -> Self {
        Self {
            api,
            file_system_id: file_system_id.into(),
        }
    }
}

#[async_trait]
impl<A> PageSource for FileSystemPages<'_, A>
where
    A: FileSystemApi + ?Sized,
{
    type Item = FileSystem;

    async fn fetch_page(&self, next_token: Option<String>) -> Result<Page<FileSystem>, FindError> {
        self.api
            .describe_file_systems_page(&self.file_system_id, next_token)
            .await
    }
}

fn describe(file_system_id: &str) -> String {
    format!("FSx file system {file_system_id}")
}

/// A reusable lookup of one file system, suitable for repeated probing.
pub fn file_system_lookup<'a, A>(
    api: &'a A,
    file_system_id: &str,
) -> impl Lookup<Resource = FileSystem> + 'a
where
    A: FileSystemApi + ?Sized + 'a,
{
    let wanted = file_system_id.to_string();
    PagedLookup::new(
        FileSystemPages::new(api, file_system_id),
        describe(file_system_id),
        move |fs: &FileSystem| fs.file_system_id() == Some(wanted.as_str()),
    )
}

/// Returns the file system with the given ID, or [`FindError::NotFound`].
pub async fn file_system_by_id<A>(api: &A, file_system_id: &str) -> Result<FileSystem, FindError>
where
    A: FileSystemApi + ?Sized,
{
    find_first(
        &FileSystemPages::new(api, file_system_id),
        &describe(file_system_id),
        |fs: &FileSystem| fs.file_system_id() == Some(file_system_id),
    )
    .await
}
