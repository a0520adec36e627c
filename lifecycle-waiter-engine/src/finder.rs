//! Point lookups of a resource by identifier against a paginated listing API.

use async_trait::async_trait;
use log::{debug, trace, warn};

use crate::error::FindError;

/// One page of a listing and the token for the next page, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    /// The final page of a listing.
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }

    pub fn with_next(items: Vec<T>, next_token: impl Into<String>) -> Self {
        Self {
            items,
            next_token: Some(next_token.into()),
        }
    }
}

/// A paginated listing. Implementations must be safe to share across concurrent sessions.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    /// Fetch the page identified by `next_token` (`None` for the first page).
    async fn fetch_page(&self, next_token: Option<String>) -> Result<Page<Self::Item>, FindError>;
}

/// A point lookup bound to one resource identifier.
#[async_trait]
pub trait Lookup: Send + Sync {
    type Resource: Send;

    async fn lookup(&self) -> Result<Self::Resource, FindError>;
}

/// Walk `source` page by page and return the first item accepted by `predicate`.
///
/// Pagination stops at the first match; later pages are never fetched, so duplicate
/// identifiers across pages go undetected. An exhausted listing yields
/// [`FindError::NotFound`] naming `resource`.
pub async fn find_first<S, P>(source: &S, resource: &str, predicate: P) -> Result<S::Item, FindError>
where
    S: PageSource + ?Sized,
    P: Fn(&S::Item) -> bool + Send,
{
    let mut token: Option<String> = None;
    let mut pages = 0_usize;

    loop {
        let page = source.fetch_page(token.clone()).await?;
        pages += 1;
        trace!("{resource}: page {pages} returned {} item(s)", page.items.len());

        if let Some(found) = page.items.into_iter().find(|item| predicate(item)) {
            return Ok(found);
        }

        match page.next_token {
            Some(next) if token.as_deref() == Some(next.as_str()) => {
                warn!("{resource}: listing repeated page token '{next}', stopping pagination");
                break;
            }
            Some(next) => token = Some(next),
            None => break,
        }
    }

    debug!("{resource}: no match after {pages} page(s)");
    Err(FindError::not_found(resource))
}

/// Adapts a [`PageSource`] and a match predicate into a [`Lookup`].
pub struct PagedLookup<S, F> {
    source: S,
    resource: String,
    predicate: F,
}

impl<S, F> PagedLookup<S, F> {
    /// `resource` names the target in not-found errors and logs, e.g. `"file system fs-123"`.
    pub fn new(source: S, resource: impl Into<String>, predicate: F) -> Self {
        Self {
            source,
            resource: resource.into(),
            predicate,
        }
    }
}

#[async_trait]
impl<S, F> Lookup for PagedLookup<S, F>
where
    S: PageSource,
    F: Fn(&S::Item) -> bool + Send + Sync,
{
    type Resource = S::Item;

    async fn lookup(&self) -> Result<S::Item, FindError> {
        find_first(&self.source, &self.resource, &self.predicate).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves fixed pages keyed by token index ("0", "1", ...).
    struct StaticPages {
        pages: Vec<Page<&'static str>>,
        fetched: AtomicUsize,
    }

    impl StaticPages {
        fn new(pages: Vec<Page<&'static str>>) -> Self {
            Self {
                pages,
                fetched: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PageSource for StaticPages {
        type Item = &'static str;

        async fn fetch_page(&self, next_token: Option<String>) -> Result<Page<&'static str>, FindError> {
            self.fetched.fetch_add(1, Ordering::SeqCst);
            let index = match next_token {
                None => 0,
                Some(token) => token.parse::<usize>().map_err(FindError::transport)?,
            };
            self.pages
                .get(index)
                .cloned()
                .ok_or_else(|| FindError::transport(format!("no page {index}")))
        }
    }

    struct FailingSource;

    #[async_trait]
    impl PageSource for FailingSource {
        type Item = String;

        async fn fetch_page(&self, _next_token: Option<String>) -> Result<Page<String>, FindError> {
            Err(FindError::transport("connection reset by peer"))
        }
    }

    #[tokio::test]
    async fn test_find_first_stops_at_first_matching_page() {
        let source = StaticPages::new(vec![
            Page::with_next(vec!["fs-1", "fs-2"], "1"),
            Page::with_next(vec!["fs-3"], "2"),
            Page::last(vec!["fs-3"]),
        ]);

        let found = find_first(&source, "file system fs-3", |id| *id == "fs-3")
            .await
            .expect("fs-3 is on the second page");

        assert_eq!(found, "fs-3");
        assert_eq!(source.fetched.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_find_first_exhausted_listing_is_not_found() {
        let source = StaticPages::new(vec![
            Page::with_next(vec!["fs-1"], "1"),
            Page::last(vec!["fs-2"]),
        ]);

        let err = find_first(&source, "file system fs-9", |id| *id == "fs-9")
            .await
            .expect_err("fs-9 is not listed");

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "file system fs-9 not found");
        assert_eq!(source.fetched.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_find_first_repeated_token_terminates() {
        let source = StaticPages::new(vec![
            Page::with_next(vec![], "1"),
            Page::with_next(vec![], "1"),
        ]);

        let err = find_first(&source, "file system fs-1", |id| *id == "fs-1")
            .await
            .expect_err("empty listing");

        assert!(err.is_not_found());
        assert_eq!(source.fetched.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_find_first_propagates_transport_errors() {
        let err = find_first(&FailingSource, "file system fs-1", |_| true)
            .await
            .expect_err("source always fails");

        assert!(!err.is_not_found());
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_paged_lookup_binds_identifier() {
        let lookup = PagedLookup::new(
            StaticPages::new(vec![Page::last(vec!["fs-1", "fs-2"])]),
            "file system fs-2",
            |id: &&'static str| *id == "fs-2",
        );

        assert_eq!(lookup.lookup().await.expect("listed"), "fs-2");
    }
}
