//! In-memory `StoreClient` implementation.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::ops::Bound;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::RwLock;

use dynamap_core::batch::{MAX_BATCH_GET, MAX_BATCH_WRITE};
use dynamap_core::store::{
    codes, BatchGetOutput, BatchGetRequest, BatchWriteOutput, BatchWriteRequest,
    CreateTableRequest, DeleteItemRequest, GetItemRequest, Item, ItemPage, ListTablesRequest,
    PutItemRequest, QueryRequest, ReturnValues, ScanRequest, StoreClient, StoreError, StoreResult,
    TableDescription, TableNamePage, TableStatus, UpdateItemRequest, WriteRequest,
};

use super::table::{check_condition, matches_range, PrimaryKey, SortKey, Table};

/// Store operations, for fault injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetItem,
    PutItem,
    UpdateItem,
    DeleteItem,
    BatchGetItem,
    BatchWriteItem,
    Scan,
    Query,
    CreateTable,
    DescribeTable,
    ListTables,
}

#[derive(Debug, Clone, Copy, Default)]
struct Settings {
    page_size: Option<usize>,
    activation_describes: u32,
    batch_get_capacity: Option<usize>,
    batch_write_capacity: Option<usize>,
}

#[derive(Debug, Default)]
struct State {
    tables: RwLock<BTreeMap<String, Table>>,
    faults: Mutex<HashMap<Operation, VecDeque<StoreError>>>,
    calls: Mutex<HashMap<Operation, u32>>,
}

/// In-memory hash+range store for testing.
///
/// Tables live in a `BTreeMap` behind a `tokio::sync::RwLock`, so scans
/// and table listings come back in a deterministic order. Clones share the
/// same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<State>,
    settings: Settings,
}

impl InMemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of items per scan or query page when the request
    /// does not set a page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.settings.page_size = Some(page_size.max(1));
        self
    }

    /// Tables created through `create_table` report `Creating` for this many
    /// describe calls before turning `Active`.
    pub fn with_activation_describes(mut self, describes: u32) -> Self {
        self.settings.activation_describes = describes;
        self
    }

    /// Processes at most `capacity` keys per batch-get call; the rest come
    /// back as unprocessed keys.
    pub fn with_batch_get_capacity(mut self, capacity: usize) -> Self {
        self.settings.batch_get_capacity = Some(capacity);
        self
    }

    /// Processes at most `capacity` writes per batch-write call; the rest
    /// come back as unprocessed writes.
    pub fn with_batch_write_capacity(mut self, capacity: usize) -> Self {
        self.settings.batch_write_capacity = Some(capacity);
        self
    }

    /// Makes the next call of `operation` fail with `error`. Queued errors
    /// are returned in order, one per call.
    pub fn fail_next(&self, operation: Operation, error: StoreError) {
        self.state
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Number of calls made to `operation`, including failed ones.
    pub fn calls(&self, operation: Operation) -> u32 {
        self.state
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&operation)
            .copied()
            .unwrap_or(0)
    }

    /// Creates a table that is immediately `Active`.
    pub async fn insert_table(&self, request: CreateTableRequest) {
        let table = Table::new(request.hash_key, request.range_key, 0);
        self.state
            .tables
            .write()
            .await
            .insert(request.table_name, table);
    }

    /// Makes the next `describes` describe calls for a table answer
    /// `ResourceNotFoundException`.
    pub async fn hide_table(&self, table_name: &str, describes: u32) {
        if let Some(table) = self.state.tables.write().await.get_mut(table_name) {
            table.hidden_describes = describes;
        }
    }

    /// All items of a table in key order.
    pub async fn items(&self, table_name: &str) -> Vec<Item> {
        self.state
            .tables
            .read()
            .await
            .get(table_name)
            .map(|table| table.items.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Counts the call and pops an injected fault, if any.
    fn enter(&self, operation: Operation) -> StoreResult<()> {
        *self
            .state
            .calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(operation)
            .or_default() += 1;

        let fault = self
            .state
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get_mut(&operation)
            .and_then(VecDeque::pop_front);

        match fault {
            Some(error) => {
                tracing::debug!(?operation, code = %error.code, "Injected store fault");
                Err(error)
            }
            None => Ok(()),
        }
    }

    fn page_size(&self, requested: Option<u32>) -> Option<usize> {
        requested
            .map(|size| size.max(1) as usize)
            .or(self.settings.page_size)
    }
}

fn table<'a>(tables: &'a BTreeMap<String, Table>, name: &str) -> StoreResult<&'a Table> {
    tables.get(name).ok_or_else(|| StoreError::table_not_found(name))
}

fn table_mut<'a>(tables: &'a mut BTreeMap<String, Table>, name: &str) -> StoreResult<&'a mut Table> {
    tables
        .get_mut(name)
        .ok_or_else(|| StoreError::table_not_found(name))
}

/// Cuts one page out of `candidates`, which are already in result order.
fn page_of<'a>(
    candidates: impl Iterator<Item = &'a Item>,
    page_size: Option<usize>,
    last_key: impl Fn(&Item) -> Item,
) -> ItemPage {
    let mut candidates = candidates.peekable();
    let mut items = Vec::new();

    while let Some(item) = candidates.next() {
        items.push(item.clone());
        if page_size.is_some_and(|size| items.len() >= size) {
            let last_evaluated_key = candidates.peek().map(|_| last_key(item));
            return ItemPage {
                items,
                last_evaluated_key,
            };
        }
    }

    ItemPage {
        items,
        last_evaluated_key: None,
    }
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn get_item(&self, request: GetItemRequest) -> StoreResult<Option<Item>> {
        self.enter(Operation::GetItem)?;
        let tables = self.state.tables.read().await;
        let table = table(&tables, &request.table_name)?;
        let key = table.exact_key(&request.key)?;
        Ok(table.items.get(&key).cloned())
    }

    async fn put_item(&self, request: PutItemRequest) -> StoreResult<()> {
        self.enter(Operation::PutItem)?;
        let mut tables = self.state.tables.write().await;
        let table = table_mut(&mut tables, &request.table_name)?;
        let key = table.key_of(&request.item)?;
        check_condition(request.condition.as_ref(), table.items.get(&key))?;
        table.items.insert(key, request.item);
        Ok(())
    }

    async fn update_item(&self, request: UpdateItemRequest) -> StoreResult<Option<Item>> {
        self.enter(Operation::UpdateItem)?;
        let mut tables = self.state.tables.write().await;
        let table = table_mut(&mut tables, &request.table_name)?;
        let key = table.exact_key(&request.key)?;
        let current = table.items.get(&key);
        check_condition(request.condition.as_ref(), current)?;

        let updated = table.apply(&request.key, current, &request.actions)?;
        table.items.insert(key, updated.item.clone());

        Ok(match request.return_values {
            ReturnValues::None => None,
            ReturnValues::AllNew => Some(updated.item),
            ReturnValues::UpdatedNew if updated.changed.is_empty() => None,
            ReturnValues::UpdatedNew => Some(updated.changed),
        })
    }

    async fn delete_item(&self, request: DeleteItemRequest) -> StoreResult<()> {
        self.enter(Operation::DeleteItem)?;
        let mut tables = self.state.tables.write().await;
        let table = table_mut(&mut tables, &request.table_name)?;
        let key = table.exact_key(&request.key)?;
        check_condition(request.condition.as_ref(), table.items.get(&key))?;
        table.items.remove(&key);
        Ok(())
    }

    async fn batch_get_item(&self, request: BatchGetRequest) -> StoreResult<BatchGetOutput> {
        self.enter(Operation::BatchGetItem)?;
        if request.keys.len() > MAX_BATCH_GET {
            return Err(StoreError::validation(format!(
                "Too many items requested for the BatchGetItem call: {}",
                request.keys.len()
            )));
        }

        let tables = self.state.tables.read().await;
        let table = table(&tables, &request.table_name)?;
        let capacity = self.settings.batch_get_capacity.unwrap_or(MAX_BATCH_GET);

        let mut output = BatchGetOutput::default();
        for (index, key) in request.keys.into_iter().enumerate() {
            if index >= capacity {
                output.unprocessed_keys.push(key);
                continue;
            }
            let primary = table.exact_key(&key)?;
            if let Some(item) = table.items.get(&primary) {
                output.items.push(item.clone());
            }
        }
        Ok(output)
    }

    async fn batch_write_item(&self, request: BatchWriteRequest) -> StoreResult<BatchWriteOutput> {
        self.enter(Operation::BatchWriteItem)?;
        if request.writes.is_empty() || request.writes.len() > MAX_BATCH_WRITE {
            return Err(StoreError::validation(format!(
                "BatchWriteItem accepts 1 to {MAX_BATCH_WRITE} writes, got {}",
                request.writes.len()
            )));
        }

        let mut tables = self.state.tables.write().await;
        let table = table_mut(&mut tables, &request.table_name)?;
        let capacity = self.settings.batch_write_capacity.unwrap_or(MAX_BATCH_WRITE);

        // Validate every key first so a bad request writes nothing.
        let keys = request
            .writes
            .iter()
            .map(|write| match write {
                WriteRequest::Put(item) => table.key_of(item),
                WriteRequest::Delete(key) => table.exact_key(key),
            })
            .collect::<StoreResult<Vec<PrimaryKey>>>()?;

        let mut output = BatchWriteOutput::default();
        for (index, (write, key)) in request.writes.into_iter().zip(keys).enumerate() {
            if index >= capacity {
                output.unprocessed.push(write);
                continue;
            }
            match write {
                WriteRequest::Put(item) => {
                    table.items.insert(key, item);
                }
                WriteRequest::Delete(_) => {
                    table.items.remove(&key);
                }
            }
        }
        Ok(output)
    }

    async fn scan(&self, request: ScanRequest) -> StoreResult<ItemPage> {
        self.enter(Operation::Scan)?;
        let tables = self.state.tables.read().await;
        let table = table(&tables, &request.table_name)?;

        let start = match &request.exclusive_start_key {
            Some(key) => Bound::Excluded(table.key_of(key)?),
            None => Bound::Unbounded,
        };

        Ok(page_of(
            table.items.range((start, Bound::Unbounded)).map(|(_, item)| item),
            self.page_size(request.page_size),
            |item| table.key_item(item),
        ))
    }

    async fn query(&self, request: QueryRequest) -> StoreResult<ItemPage> {
        self.enter(Operation::Query)?;
        let tables = self.state.tables.read().await;
        let table = table(&tables, &request.table_name)?;
        let condition = &request.key_condition;

        // Items are ordered by the range attribute named in the condition,
        // falling back to the table's own range key when querying by the
        // table hash key.
        let sort_attribute = condition
            .range
            .as_ref()
            .map(|(name, _)| name.clone())
            .or_else(|| {
                (condition.hash_name == table.hash_key.name)
                    .then(|| table.range_key.as_ref().map(|range| range.name.clone()))
                    .flatten()
            });

        let mut matched: Vec<(Option<SortKey>, &PrimaryKey, &Item)> = Vec::new();
        for (key, item) in &table.items {
            let hash_matches = item
                .get(&condition.hash_name)
                .is_some_and(|value| value == &condition.hash_value);
            if !hash_matches {
                continue;
            }

            let sort = match &sort_attribute {
                Some(name) => match item.get(name).and_then(SortKey::infer) {
                    Some(sort) => Some(sort),
                    None => continue,
                },
                None => None,
            };

            if let (Some((_, range)), Some(sort)) = (&condition.range, &sort) {
                if !matches_range(sort, range)? {
                    continue;
                }
            }
            matched.push((sort, key, item));
        }

        matched.sort_by(|a, b| (&a.0, a.1).cmp(&(&b.0, b.1)));
        if !request.scan_forward {
            matched.reverse();
        }

        if let Some(start) = &request.exclusive_start_key {
            let start_sort = sort_attribute
                .as_ref()
                .and_then(|name| start.get(name))
                .and_then(SortKey::infer);
            let start_key = table.key_of(start)?;
            let start = (&start_sort, &start_key);
            matched.retain(|(sort, key, _)| {
                let position = (sort, *key).cmp(&start);
                if request.scan_forward {
                    position.is_gt()
                } else {
                    position.is_lt()
                }
            });
        }

        Ok(page_of(
            matched.into_iter().map(|(_, _, item)| item),
            self.page_size(request.page_size),
            |item| {
                let mut key = table.key_item(item);
                for name in [&condition.hash_name].into_iter().chain(sort_attribute.as_ref()) {
                    if let Some(value) = item.get(name) {
                        key.insert(name.clone(), value.clone());
                    }
                }
                key
            },
        ))
    }

    async fn create_table(&self, request: CreateTableRequest) -> StoreResult<()> {
        self.enter(Operation::CreateTable)?;
        let mut tables = self.state.tables.write().await;
        if tables.contains_key(&request.table_name) {
            return Err(StoreError::client(
                codes::RESOURCE_IN_USE,
                format!("Table already exists: {}", request.table_name),
            ));
        }

        tracing::debug!(table = %request.table_name, "Creating in-memory table");
        let table = Table::new(
            request.hash_key,
            request.range_key,
            self.settings.activation_describes,
        );
        tables.insert(request.table_name, table);
        Ok(())
    }

    async fn describe_table(&self, table_name: &str) -> StoreResult<TableDescription> {
        self.enter(Operation::DescribeTable)?;
        let mut tables = self.state.tables.write().await;
        let table = table_mut(&mut tables, table_name)?;

        if table.hidden_describes > 0 {
            table.hidden_describes -= 1;
            return Err(StoreError::table_not_found(table_name));
        }

        if table.pending_describes > 0 {
            table.pending_describes -= 1;
        } else {
            table.status = TableStatus::Active;
        }

        Ok(TableDescription {
            table_name: table_name.to_string(),
            status: table.status,
        })
    }

    async fn list_tables(&self, request: ListTablesRequest) -> StoreResult<TableNamePage> {
        self.enter(Operation::ListTables)?;
        let tables = self.state.tables.read().await;
        let limit = request.limit.map_or(100, |limit| limit.clamp(1, 100) as usize);

        let start = match &request.exclusive_start_table_name {
            Some(name) => Bound::Excluded(name.clone()),
            None => Bound::Unbounded,
        };
        let mut names = tables.range::<String, _>((start, Bound::Unbounded)).map(|(name, _)| name);

        let table_names: Vec<String> = names.by_ref().take(limit).cloned().collect();
        let last_evaluated_table_name = match names.next() {
            Some(_) => table_names.last().cloned(),
            None => None,
        };

        Ok(TableNamePage {
            table_names,
            last_evaluated_table_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use dynamap_core::store::{
        AttributeValue, Condition, KeyAttribute, KeyCondition, RangeCondition, ScalarType,
        UpdateAction,
    };

    use super::*;

    const EVENTS: &str = "events";

    fn s(value: &str) -> AttributeValue {
        AttributeValue::S(value.to_string())
    }

    fn n(value: i64) -> AttributeValue {
        AttributeValue::N(value.to_string())
    }

    fn event(owner: &str, seq: i64, kind: &str) -> Item {
        Item::from([
            ("Owner".to_string(), s(owner)),
            ("Seq".to_string(), n(seq)),
            ("Kind".to_string(), s(kind)),
        ])
    }

    fn key(owner: &str, seq: i64) -> Item {
        Item::from([("Owner".to_string(), s(owner)), ("Seq".to_string(), n(seq))])
    }

    async fn store_with_events() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .insert_table(CreateTableRequest {
                table_name: EVENTS.to_string(),
                hash_key: KeyAttribute::new("Owner", ScalarType::S),
                range_key: Some(KeyAttribute::new("Seq", ScalarType::N)),
            })
            .await;
        for (owner, seq, kind) in [
            ("ana", 10, "click"),
            ("ana", 2, "view"),
            ("ana", 7, "click"),
            ("bob", 1, "view"),
        ] {
            store
                .put_item(PutItemRequest {
                    table_name: EVENTS.to_string(),
                    item: event(owner, seq, kind),
                    condition: None,
                })
                .await
                .unwrap();
        }
        store
    }

    fn query(condition: KeyCondition) -> QueryRequest {
        QueryRequest {
            table_name: EVENTS.to_string(),
            index_name: None,
            key_condition: condition,
            scan_forward: true,
            page_size: None,
            consistent_read: false,
            exclusive_start_key: None,
        }
    }

    fn seqs(items: &[Item]) -> Vec<String> {
        items
            .iter()
            .map(|item| item["Seq"].as_n().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_get_put_delete() {
        let store = store_with_events().await;
        let get = GetItemRequest {
            table_name: EVENTS.to_string(),
            key: key("ana", 7),
            consistent_read: true,
        };

        assert_eq!(store.get_item(get.clone()).await.unwrap(), Some(event("ana", 7, "click")));

        store
            .delete_item(DeleteItemRequest {
                table_name: EVENTS.to_string(),
                key: key("ana", 7),
                condition: None,
            })
            .await
            .unwrap();

        assert_eq!(store.get_item(get).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_missing_table_is_not_found() {
        let store = InMemoryStore::new();

        let error = store.describe_table("ghost").await.unwrap_err();

        assert_eq!(error.code, codes::RESOURCE_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_conditional_put_fails_on_existing_item() {
        let store = store_with_events().await;

        let error = store
            .put_item(PutItemRequest {
                table_name: EVENTS.to_string(),
                item: event("ana", 7, "other"),
                condition: Some(Condition::AttributeNotExists("Owner".to_string())),
            })
            .await
            .unwrap_err();

        assert_eq!(error.code, codes::CONDITIONAL_CHECK_FAILED);
        assert_eq!(store.items(EVENTS).await.len(), 4);
    }

    #[tokio::test]
    async fn test_update_returns_updated_attributes() {
        let store = store_with_events().await;

        let updated = store
            .update_item(UpdateItemRequest {
                table_name: EVENTS.to_string(),
                key: key("ana", 2),
                actions: vec![UpdateAction::Add {
                    name: "Hits".to_string(),
                    value: n(3),
                }],
                condition: None,
                return_values: ReturnValues::UpdatedNew,
            })
            .await
            .unwrap();

        assert_eq!(updated, Some(Item::from([("Hits".to_string(), n(3))])));
    }

    #[tokio::test]
    async fn test_scan_pages_in_key_order() {
        let store = store_with_events().await.with_page_size(3);
        let mut request = ScanRequest {
            table_name: EVENTS.to_string(),
            ..Default::default()
        };

        let first = store.scan(request.clone()).await.unwrap();
        request.exclusive_start_key = first.last_evaluated_key.clone();
        let second = store.scan(request).await.unwrap();

        assert_eq!(seqs(&first.items), vec!["2", "7", "10"]);
        assert_eq!(seqs(&second.items), vec!["1"]);
        assert_eq!(second.last_evaluated_key, None);
    }

    #[tokio::test]
    async fn test_query_with_range_condition_descending() {
        let store = store_with_events().await;
        let mut request = query(KeyCondition {
            hash_name: "Owner".to_string(),
            hash_value: s("ana"),
            range: Some(("Seq".to_string(), RangeCondition::Ge(n(5)))),
        });
        request.scan_forward = false;

        let page = store.query(request).await.unwrap();

        assert_eq!(seqs(&page.items), vec!["10", "7"]);
    }

    #[tokio::test]
    async fn test_query_by_secondary_attribute_resumes() {
        let store = store_with_events().await.with_page_size(1);
        let mut request = query(KeyCondition {
            hash_name: "Kind".to_string(),
            hash_value: s("click"),
            range: None,
        });
        request.index_name = Some("by_kind".to_string());

        let first = store.query(request.clone()).await.unwrap();
        request.exclusive_start_key = first.last_evaluated_key.clone();
        let second = store.query(request).await.unwrap();

        assert_eq!(seqs(&first.items), vec!["7"]);
        assert_eq!(seqs(&second.items), vec!["10"]);
        assert_eq!(second.last_evaluated_key, None);
    }

    #[tokio::test]
    async fn test_batch_write_respects_capacity() {
        let store = store_with_events().await.with_batch_write_capacity(1);

        let output = store
            .batch_write_item(BatchWriteRequest {
                table_name: EVENTS.to_string(),
                writes: vec![
                    WriteRequest::Put(event("cid", 1, "view")),
                    WriteRequest::Delete(key("ana", 2)),
                ],
            })
            .await
            .unwrap();

        assert_eq!(output.unprocessed, vec![WriteRequest::Delete(key("ana", 2))]);
        assert_eq!(store.items(EVENTS).await.len(), 5);
    }

    #[tokio::test]
    async fn test_batch_write_over_limit_is_rejected() {
        let store = store_with_events().await;
        let writes = (0..26).map(|seq| WriteRequest::Put(event("cid", seq, "view"))).collect();

        let error = store
            .batch_write_item(BatchWriteRequest {
                table_name: EVENTS.to_string(),
                writes,
            })
            .await
            .unwrap_err();

        assert_eq!(error.code, codes::VALIDATION);
    }

    #[tokio::test]
    async fn test_batch_get_skips_missing_keys() {
        let store = store_with_events().await;

        let output = store
            .batch_get_item(BatchGetRequest {
                table_name: EVENTS.to_string(),
                keys: vec![key("ana", 2), key("zoe", 1), key("bob", 1)],
                consistent_read: false,
            })
            .await
            .unwrap();

        assert_eq!(output.items.len(), 2);
        assert!(output.unprocessed_keys.is_empty());
    }

    #[tokio::test]
    async fn test_created_table_activates_after_describes() {
        let store = InMemoryStore::new().with_activation_describes(2);
        let request = CreateTableRequest {
            table_name: "t".to_string(),
            hash_key: KeyAttribute::new("Id", ScalarType::S),
            range_key: None,
        };
        store.create_table(request.clone()).await.unwrap();

        let statuses = [
            store.describe_table("t").await.unwrap().status,
            store.describe_table("t").await.unwrap().status,
            store.describe_table("t").await.unwrap().status,
        ];

        assert_eq!(
            statuses,
            [TableStatus::Creating, TableStatus::Creating, TableStatus::Active]
        );
        let again = store.create_table(request).await.unwrap_err();
        assert_eq!(again.code, codes::RESOURCE_IN_USE);
    }

    #[tokio::test]
    async fn test_list_tables_pages_names() {
        let store = InMemoryStore::new();
        for name in ["c", "a", "b"] {
            store
                .insert_table(CreateTableRequest {
                    table_name: name.to_string(),
                    hash_key: KeyAttribute::new("Id", ScalarType::S),
                    range_key: None,
                })
                .await;
        }

        let first = store
            .list_tables(ListTablesRequest {
                exclusive_start_table_name: None,
                limit: Some(2),
            })
            .await
            .unwrap();
        let second = store
            .list_tables(ListTablesRequest {
                exclusive_start_table_name: first.last_evaluated_table_name.clone(),
                limit: Some(2),
            })
            .await
            .unwrap();

        assert_eq!(first.table_names, vec!["a", "b"]);
        assert_eq!(second.table_names, vec!["c"]);
        assert_eq!(second.last_evaluated_table_name, None);
    }

    #[tokio::test]
    async fn test_injected_faults_are_counted() {
        let store = store_with_events().await;
        store.fail_next(
            Operation::GetItem,
            StoreError::server(codes::INTERNAL_SERVER_ERROR, "boom"),
        );
        let get = GetItemRequest {
            table_name: EVENTS.to_string(),
            key: key("bob", 1),
            consistent_read: false,
        };

        assert!(store.get_item(get.clone()).await.is_err());
        assert!(store.get_item(get).await.unwrap().is_some());
        assert_eq!(store.calls(Operation::GetItem), 2);
    }
}
