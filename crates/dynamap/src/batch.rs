//! Windowed batch reads and writes.

use std::sync::Arc;

use async_stream::try_stream;
use futures_util::Stream;

use dynamap_core::batch::{windows, BatchLimits};
use dynamap_core::store::{BatchGetRequest, BatchWriteRequest, Item, StoreClient, WriteRequest};
use dynamap_core::Result;

use crate::executor::Executor;

/// Outcome of a batch write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchWriteSummary {
    /// Number of batch-write calls issued.
    pub calls: usize,
    /// Number of writes sent to the store.
    pub submitted: usize,
    /// Number of writes the store reported as unprocessed.
    pub unprocessed: usize,
}

/// Splits large key or write sequences into store-sized windows.
///
/// Windows are sent one after the other, in input order, each through the
/// executor. Keys and writes are not deduplicated.
#[derive(Clone)]
pub struct BatchOperator {
    store: Arc<dyn StoreClient>,
    executor: Executor,
    limits: BatchLimits,
}

impl BatchOperator {
    pub fn new(store: Arc<dyn StoreClient>, executor: Executor) -> Self {
        Self {
            store,
            executor,
            limits: BatchLimits::default(),
        }
    }

    /// Uses smaller windows than the store maximum.
    pub fn with_limits(mut self, limits: BatchLimits) -> Self {
        self.limits = limits.clamped();
        self
    }

    pub fn limits(&self) -> BatchLimits {
        self.limits
    }

    /// Streams the items found for `keys`.
    ///
    /// Keys are pulled from the iterator one window at a time. Missing keys
    /// produce nothing; unprocessed keys are logged and dropped.
    pub fn batch_get<I>(
        &self,
        table_name: impl Into<String>,
        keys: I,
        consistent_read: bool,
    ) -> impl Stream<Item = Result<Item>> + Send + 'static
    where
        I: IntoIterator<Item = Item>,
        I::IntoIter: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let executor = self.executor.clone();
        let table_name = table_name.into();
        let window_size = self.limits.get;
        let keys = keys.into_iter();

        try_stream! {
            for window in windows(keys, window_size) {
                let requested = window.len();
                let request = BatchGetRequest {
                    table_name: table_name.clone(),
                    keys: window,
                    consistent_read,
                };

                let output = executor
                    .execute("batch_get_item", || store.batch_get_item(request.clone()))
                    .await?;

                if !output.unprocessed_keys.is_empty() {
                    tracing::warn!(
                        table = %table_name,
                        requested,
                        unprocessed = output.unprocessed_keys.len(),
                        "Batch get left keys unprocessed"
                    );
                }

                for item in output.items {
                    yield item;
                }
            }
        }
    }

    /// Sends `writes` in windows and reports how many went through.
    pub async fn batch_write<I>(&self, table_name: &str, writes: I) -> Result<BatchWriteSummary>
    where
        I: IntoIterator<Item = WriteRequest>,
    {
        let mut summary = BatchWriteSummary::default();

        for window in windows(writes, self.limits.write) {
            let submitted = window.len();
            let request = BatchWriteRequest {
                table_name: table_name.to_string(),
                writes: window,
            };

            let output = self
                .executor
                .execute("batch_write_item", || {
                    self.store.batch_write_item(request.clone())
                })
                .await?;

            summary.calls += 1;
            summary.submitted += submitted;
            summary.unprocessed += output.unprocessed.len();

            if !output.unprocessed.is_empty() {
                tracing::warn!(
                    table = %table_name,
                    submitted,
                    unprocessed = output.unprocessed.len(),
                    "Batch write left items unprocessed"
                );
            }
        }

        tracing::debug!(
            table = %table_name,
            calls = summary.calls,
            submitted = summary.submitted,
            "Batch write finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures_util::TryStreamExt;

    use dynamap_core::store::{
        codes, AttributeValue, BatchGetOutput, BatchWriteOutput, CreateTableRequest,
        DeleteItemRequest, GetItemRequest, ItemPage, KeyAttribute, ListTablesRequest,
        PutItemRequest, QueryRequest, ScalarType, ScanRequest, StoreError, StoreResult,
        TableDescription, TableNamePage, UpdateItemRequest,
    };

    use super::*;
    use crate::storage::memory::{InMemoryStore, Operation};

    const TABLE: &str = "items";

    fn item(id: usize) -> Item {
        Item::from([
            ("Id".to_string(), AttributeValue::N(id.to_string())),
            ("Name".to_string(), AttributeValue::S(format!("item-{id}"))),
        ])
    }

    fn key(id: usize) -> Item {
        Item::from([("Id".to_string(), AttributeValue::N(id.to_string()))])
    }

    fn id_of(item: &Item) -> usize {
        item["Id"].as_n().unwrap().parse().unwrap()
    }

    async fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert_table(CreateTableRequest {
                table_name: TABLE.to_string(),
                hash_key: KeyAttribute::new("Id", ScalarType::N),
                range_key: None,
            })
            .await;
        store
    }

    fn operator(store: &InMemoryStore) -> BatchOperator {
        BatchOperator::new(Arc::new(store.clone()), Executor::default())
    }

    #[tokio::test]
    async fn test_write_splits_into_windows() {
        let store = store().await;

        let summary = operator(&store)
            .batch_write(TABLE, (0..60).map(|id| WriteRequest::Put(item(id))))
            .await
            .unwrap();

        assert_eq!(
            summary,
            BatchWriteSummary {
                calls: 3,
                submitted: 60,
                unprocessed: 0,
            }
        );
        assert_eq!(store.calls(Operation::BatchWriteItem), 3);
        assert_eq!(store.items(TABLE).await.len(), 60);
    }

    /// Records every batch write before handing it to the wrapped store.
    struct RecordingStore {
        inner: InMemoryStore,
        writes: Mutex<Vec<BatchWriteRequest>>,
    }

    #[async_trait]
    impl StoreClient for RecordingStore {
        async fn get_item(&self, request: GetItemRequest) -> StoreResult<Option<Item>> {
            self.inner.get_item(request).await
        }

        async fn put_item(&self, request: PutItemRequest) -> StoreResult<()> {
            self.inner.put_item(request).await
        }

        async fn update_item(&self, request: UpdateItemRequest) -> StoreResult<Option<Item>> {
            self.inner.update_item(request).await
        }

        async fn delete_item(&self, request: DeleteItemRequest) -> StoreResult<()> {
            self.inner.delete_item(request).await
        }

        async fn batch_get_item(&self, request: BatchGetRequest) -> StoreResult<BatchGetOutput> {
            self.inner.batch_get_item(request).await
        }

        async fn batch_write_item(
            &self,
            request: BatchWriteRequest,
        ) -> StoreResult<BatchWriteOutput> {
            self.writes.lock().unwrap().push(request.clone());
            self.inner.batch_write_item(request).await
        }

        async fn scan(&self, request: ScanRequest) -> StoreResult<ItemPage> {
            self.inner.scan(request).await
        }

        async fn query(&self, request: QueryRequest) -> StoreResult<ItemPage> {
            self.inner.query(request).await
        }

        async fn create_table(&self, request: CreateTableRequest) -> StoreResult<()> {
            self.inner.create_table(request).await
        }

        async fn describe_table(&self, table_name: &str) -> StoreResult<TableDescription> {
            self.inner.describe_table(table_name).await
        }

        async fn list_tables(&self, request: ListTablesRequest) -> StoreResult<TableNamePage> {
            self.inner.list_tables(request).await
        }
    }

    #[tokio::test]
    async fn test_write_windows_follow_input_order() {
        let recording = Arc::new(RecordingStore {
            inner: store().await,
            writes: Mutex::new(Vec::new()),
        });
        let operator = BatchOperator::new(recording.clone(), Executor::default());

        operator
            .batch_write(TABLE, (0..60).map(|id| WriteRequest::Put(item(id))))
            .await
            .unwrap();

        let windows: Vec<Vec<usize>> = recording
            .writes
            .lock()
            .unwrap()
            .iter()
            .map(|request| {
                request
                    .writes
                    .iter()
                    .map(|write| match write {
                        WriteRequest::Put(item) => id_of(item),
                        WriteRequest::Delete(key) => id_of(key),
                    })
                    .collect()
            })
            .collect();

        let sizes: Vec<usize> = windows.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![25, 25, 10]);
        assert_eq!(windows[0], (0..25).collect::<Vec<_>>());
        assert_eq!(windows[1], (25..50).collect::<Vec<_>>());
        assert_eq!(windows[2], (50..60).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_write_of_nothing_makes_no_call() {
        let store = store().await;

        let summary = operator(&store)
            .batch_write(TABLE, Vec::new())
            .await
            .unwrap();

        assert_eq!(summary, BatchWriteSummary::default());
        assert_eq!(store.calls(Operation::BatchWriteItem), 0);
    }

    #[tokio::test]
    async fn test_unprocessed_writes_are_reported() {
        let store = store().await.with_batch_write_capacity(20);

        let summary = operator(&store)
            .batch_write(TABLE, (0..30).map(|id| WriteRequest::Put(item(id))))
            .await
            .unwrap();

        assert_eq!(summary.calls, 2);
        assert_eq!(summary.unprocessed, 5);
        assert_eq!(store.items(TABLE).await.len(), 25);
    }

    #[tokio::test]
    async fn test_get_preserves_window_order() {
        let store = store().await;
        let operator = operator(&store).with_limits(BatchLimits { get: 4, write: 25 });
        operator
            .batch_write(TABLE, (0..10).map(|id| WriteRequest::Put(item(id))))
            .await
            .unwrap();

        let items: Vec<Item> = operator
            .batch_get(TABLE, (0..12).rev().map(key).collect::<Vec<_>>(), false)
            .try_collect()
            .await
            .unwrap();

        let ids: Vec<usize> = items.iter().map(id_of).collect();
        assert_eq!(ids, vec![9, 8, 7, 6, 5, 4, 3, 2, 1, 0]);
        assert_eq!(store.calls(Operation::BatchGetItem), 3);
    }

    #[tokio::test]
    async fn test_get_retries_throttled_window() {
        let store = store().await;
        let operator = operator(&store);
        operator
            .batch_write(TABLE, [WriteRequest::Put(item(1))])
            .await
            .unwrap();
        store.fail_next(
            Operation::BatchGetItem,
            StoreError::client(codes::PROVISIONED_THROUGHPUT_EXCEEDED, "slow down"),
        );

        let items: Vec<Item> = operator
            .batch_get(TABLE, vec![key(1)], true)
            .try_collect()
            .await
            .unwrap();

        assert_eq!(items, vec![item(1)]);
        assert_eq!(store.calls(Operation::BatchGetItem), 2);
    }
}
