//! AWS SDK integration: the paginated DescribeFileSystems call behind every FSx probe.

pub(crate) mod fsx_client;

pub use fsx_client::FileSystemApi;
