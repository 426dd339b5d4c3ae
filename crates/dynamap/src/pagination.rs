//! Lazy pagination over continuation-token APIs.

use std::future::Future;

use async_stream::try_stream;
use futures_util::Stream;

use dynamap_core::store::{Page, PagedRequest, StoreResult};
use dynamap_core::Result;

use crate::executor::Executor;

/// Streams every item of a paged store call.
///
/// Each page is fetched through the executor only when the previous one
/// has been consumed. With a `limit` the stream ends as soon as that many
/// items were yielded; the rest of the last page is dropped and no further
/// page is requested. Polling a fresh stream issues all calls again.
pub fn paginate<Req, P, F, Fut>(
    executor: Executor,
    op: &'static str,
    request: Req,
    fetch: F,
    limit: Option<usize>,
) -> impl Stream<Item = Result<P::Item>> + Send + 'static
where
    Req: PagedRequest<Token = P::Token> + 'static,
    P: Page + 'static,
    F: Fn(Req) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = StoreResult<P>> + Send + 'static,
{
    try_stream! {
        let mut request = request;
        let mut yielded = 0usize;
        let mut pages = 0u32;

        'pages: loop {
            if limit.is_some_and(|limit| yielded >= limit) {
                break;
            }

            let page = executor.execute(op, || fetch(request.clone())).await?;
            pages += 1;
            let (items, token) = page.into_parts();
            tracing::trace!(op, page = pages, items = items.len(), more = token.is_some(), "Fetched page");

            for item in items {
                if limit.is_some_and(|limit| yielded >= limit) {
                    break 'pages;
                }
                yield item;
                yielded += 1;
            }

            match token {
                Some(token) => request.resume_from(token),
                None => break,
            }
        }

        tracing::debug!(op, pages, yielded, "Pagination finished");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use futures_util::{StreamExt, TryStreamExt};

    use dynamap_core::store::{
        codes, AttributeValue, Item, ItemPage, ListTablesRequest, ScanRequest, StoreError,
        TableNamePage,
    };
    use dynamap_core::Error;

    use super::*;

    fn numbered(n: usize) -> Item {
        let mut item = Item::new();
        item.insert("Id".to_string(), AttributeValue::N(n.to_string()));
        item
    }

    fn number_of(item: &Item) -> usize {
        item["Id"].as_n().unwrap().parse().unwrap()
    }

    /// Fake store of `total` items served `page_size` at a time.
    fn fetcher(
        total: usize,
        page_size: usize,
        fetches: Arc<AtomicU32>,
    ) -> impl Fn(ScanRequest) -> std::future::Ready<StoreResult<ItemPage>> + Send + Sync + 'static
    {
        move |request: ScanRequest| {
            fetches.fetch_add(1, Ordering::SeqCst);
            let start = request
                .exclusive_start_key
                .as_ref()
                .map(|key| number_of(key) + 1)
                .unwrap_or(0);
            let end = (start + page_size).min(total);
            let items: Vec<Item> = (start..end).map(numbered).collect();
            let last_evaluated_key = if end < total {
                items.last().cloned()
            } else {
                None
            };
            std::future::ready(Ok(ItemPage {
                items,
                last_evaluated_key,
            }))
        }
    }

    fn scan_request() -> ScanRequest {
        ScanRequest {
            table_name: "numbers".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_limit_stops_mid_page() {
        let fetches = Arc::new(AtomicU32::new(0));
        let stream = paginate(
            Executor::default(),
            "scan",
            scan_request(),
            fetcher(10, 3, fetches.clone()),
            Some(7),
        );

        let items: Vec<Item> = stream.try_collect().await.unwrap();

        let numbers: Vec<usize> = items.iter().map(number_of).collect();
        assert_eq!(numbers, (0..7).collect::<Vec<_>>());
        assert_eq!(fetches.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_limit_on_page_boundary_does_not_fetch_again() {
        let fetches = Arc::new(AtomicU32::new(0));
        let stream = paginate(
            Executor::default(),
            "scan",
            scan_request(),
            fetcher(10, 3, fetches.clone()),
            Some(6),
        );

        let items: Vec<Item> = stream.try_collect().await.unwrap();

        assert_eq!(items.len(), 6);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_without_limit_reads_every_page() {
        let fetches = Arc::new(AtomicU32::new(0));
        let stream = paginate(
            Executor::default(),
            "scan",
            scan_request(),
            fetcher(10, 3, fetches.clone()),
            None,
        );

        let items: Vec<Item> = stream.try_collect().await.unwrap();

        assert_eq!(items.len(), 10);
        assert_eq!(fetches.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_stream_is_lazy() {
        let fetches = Arc::new(AtomicU32::new(0));
        let stream = paginate(
            Executor::default(),
            "scan",
            scan_request(),
            fetcher(10, 3, fetches.clone()),
            None,
        );
        assert_eq!(fetches.load(Ordering::SeqCst), 0);

        let first_two: Vec<Result<Item>> = stream.take(2).collect().await;

        assert_eq!(first_two.len(), 2);
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_zero_limit_fetches_nothing() {
        let fetches = Arc::new(AtomicU32::new(0));
        let stream = paginate(
            Executor::default(),
            "scan",
            scan_request(),
            fetcher(10, 3, fetches.clone()),
            Some(0),
        );

        let items: Vec<Item> = stream.try_collect().await.unwrap();

        assert!(items.is_empty());
        assert_eq!(fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_error_ends_stream() {
        let stream = paginate(
            Executor::default(),
            "list_tables",
            ListTablesRequest::default(),
            |_request: ListTablesRequest| {
                std::future::ready(Err::<TableNamePage, _>(StoreError::validation("bad")))
            },
            None,
        );

        let results: Vec<Result<String>> = stream.collect().await;

        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(Error::ClientRejected(ref e)) if e.code == codes::VALIDATION));
    }

    #[tokio::test]
    async fn test_table_names_follow_token() {
        let stream = paginate(
            Executor::default(),
            "list_tables",
            ListTablesRequest::default(),
            |request: ListTablesRequest| {
                let page = match request.exclusive_start_table_name.as_deref() {
                    None => TableNamePage {
                        table_names: vec!["a".to_string(), "b".to_string()],
                        last_evaluated_table_name: Some("b".to_string()),
                    },
                    Some(_) => TableNamePage {
                        table_names: vec!["c".to_string()],
                        last_evaluated_table_name: None,
                    },
                };
                std::future::ready(Ok(page))
            },
            None,
        );

        let names: Vec<String> = stream.try_collect().await.unwrap();

        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
