//! Scripted FSx responses and file system fixtures for tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use aws_sdk_fsx::types::{
    AdministrativeAction, AdministrativeActionType, Alias, AliasLifecycle, FileSystem,
    FileSystemLifecycle, Status, WindowsFileSystemConfiguration,
};
use lifecycle_waiter_engine::{FindError, Page};

use crate::aws::FileSystemApi;

/// One scripted reply to `describe_file_systems_page`.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    Page(Page<FileSystem>),
    NotFound,
    Transport(&'static str),
}

/// Serves replies in order; the final reply repeats forever.
#[derive(Debug)]
pub(crate) struct ScriptedFsx {
    replies: Mutex<VecDeque<Reply>>,
    tokens: Mutex<Vec<Option<String>>>,
    calls: AtomicUsize,
}

impl ScriptedFsx {
    pub(crate) fn replies(replies: Vec<Reply>) -> Self {
        assert!(!replies.is_empty(), "script needs at least one reply");
        Self {
            replies: Mutex::new(replies.into()),
            tokens: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn pages(pages: Vec<Page<FileSystem>>) -> Self {
        Self::replies(pages.into_iter().map(Reply::Page).collect())
    }

    /// One single-page listing per call.
    pub(crate) fn listings(listings: Vec<Vec<FileSystem>>) -> Self {
        Self::replies(
            listings
                .into_iter()
                .map(|items| Reply::Page(Page::last(items)))
                .collect(),
        )
    }

    /// The same file system on every call.
    pub(crate) fn steady(file_system: FileSystem) -> Self {
        Self::listings(vec![vec![file_system]])
    }

    pub(crate) fn not_found() -> Self {
        Self::replies(vec![Reply::NotFound])
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn tokens(&self) -> Vec<Option<String>> {
        self.tokens.lock().expect("tokens lock").clone()
    }
}

#[async_trait]
impl FileSystemApi for ScriptedFsx {
    async fn describe_file_systems_page(
        &self,
        file_system_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<FileSystem>, FindError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.tokens.lock().expect("tokens lock").push(next_token);

        let reply = {
            let mut replies = self.replies.lock().expect("replies lock");
            if replies.len() > 1 {
                replies.pop_front()
            } else {
                replies.front().cloned()
            }
        };

        match reply.expect("script is never empty") {
            Reply::Page(page) => Ok(page),
            Reply::NotFound => Err(FindError::not_found(format!(
                "FSx file system {file_system_id}"
            ))),
            Reply::Transport(message) => Err(FindError::transport(message)),
        }
    }
}

pub(crate) fn file_system(id: &str, lifecycle: FileSystemLifecycle) -> FileSystem {
    FileSystem::builder()
        .file_system_id(id)
        .lifecycle(lifecycle)
        .build()
}

/// A Windows file system carrying the given DNS aliases.
pub(crate) fn windows_file_system(
    id: &str,
    lifecycle: FileSystemLifecycle,
    aliases: &[(&str, AliasLifecycle)],
) -> FileSystem {
    let mut windows = WindowsFileSystemConfiguration::builder();
    for (name, alias_lifecycle) in aliases {
        windows = windows.aliases(
            Alias::builder()
                .name(*name)
                .lifecycle(alias_lifecycle.clone())
                .build(),
        );
    }
    FileSystem::builder()
        .file_system_id(id)
        .lifecycle(lifecycle)
        .windows_configuration(windows.build())
        .build()
}

/// An available file system with the given administrative actions, in order.
pub(crate) fn file_system_with_actions(
    id: &str,
    actions: &[(AdministrativeActionType, Status)],
) -> FileSystem {
    let mut builder = FileSystem::builder()
        .file_system_id(id)
        .lifecycle(FileSystemLifecycle::Available);
    for (action_type, status) in actions {
        builder = builder.administrative_actions(
            AdministrativeAction::builder()
                .administrative_action_type(action_type.clone())
                .status(status.clone())
                .build(),
        );
    }
    builder.build()
}
