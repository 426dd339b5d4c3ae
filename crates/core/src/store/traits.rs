use async_trait::async_trait;

use super::types::{
    BatchGetOutput, BatchGetRequest, BatchWriteOutput, BatchWriteRequest, CreateTableRequest,
    DeleteItemRequest, GetItemRequest, Item, ItemPage, ListTablesRequest, PutItemRequest,
    QueryRequest, ScanRequest, TableDescription, TableNamePage, UpdateItemRequest,
};
use super::StoreResult;

/// A remote hash+range key-value store.
///
/// Implementations perform exactly one remote call per method and never
/// retry; retries are the executor's job.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Gets a single item by its full key.
    async fn get_item(&self, request: GetItemRequest) -> StoreResult<Option<Item>>;

    /// Writes a whole item, replacing any previous version.
    async fn put_item(&self, request: PutItemRequest) -> StoreResult<()>;

    /// Applies update actions to an item, creating it if absent.
    ///
    /// Returns the attributes selected by `return_values`.
    async fn update_item(&self, request: UpdateItemRequest) -> StoreResult<Option<Item>>;

    /// Deletes an item by its full key.
    async fn delete_item(&self, request: DeleteItemRequest) -> StoreResult<()>;

    /// Gets up to one batch window of items.
    async fn batch_get_item(&self, request: BatchGetRequest) -> StoreResult<BatchGetOutput>;

    /// Puts or deletes up to one batch window of items.
    async fn batch_write_item(&self, request: BatchWriteRequest) -> StoreResult<BatchWriteOutput>;

    /// Reads one page of a full table (or index) scan.
    async fn scan(&self, request: ScanRequest) -> StoreResult<ItemPage>;

    /// Reads one page of a key-condition query.
    async fn query(&self, request: QueryRequest) -> StoreResult<ItemPage>;

    /// Starts creating a table.
    async fn create_table(&self, request: CreateTableRequest) -> StoreResult<()>;

    /// Describes a table; unknown tables fail with `ResourceNotFoundException`.
    async fn describe_table(&self, table_name: &str) -> StoreResult<TableDescription>;

    /// Reads one page of table names.
    async fn list_tables(&self, request: ListTablesRequest) -> StoreResult<TableNamePage>;
}
